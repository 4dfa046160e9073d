//! # Entities
//!
//! Everything placed in the world is an [`Entity`]: a rectangle with an
//! optional horizontal motion and a kind tag.
//!
//! ## Kinds
//!
//! | Kind                    | Movable | Platform | Lethal              |
//! |-------------------------|---------|----------|---------------------|
//! | `Obstacle(Car/Train)`   | yes     | no       | always              |
//! | `Obstacle(Tree)`        | no      | no       | always (blocking)   |
//! | `Obstacle(Water)`       | no      | no       | unless on platform  |
//! | `Platform`              | either  | yes      | never               |
//! | `Collectible`           | no      | no       | never               |
//!
//! The kind set is closed, so every consumer matches it exhaustively.

use crate::geometry::Rect;

/// Hazard variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObstacleKind {
    /// Road vehicle. Moves, wraps around the lane.
    Car = 0,
    /// Railway vehicle. Wider and faster than a car.
    Train = 1,
    /// Static blocker on grass.
    Tree = 2,
    /// River surface. Lethal unless a platform covers the point.
    Water = 3,
}

impl ObstacleKind {
    /// All obstacle kinds, in tag order.
    pub const ALL: [Self; 4] = [Self::Car, Self::Train, Self::Tree, Self::Water];

    /// Returns true for kinds that travel along a lane.
    #[inline]
    #[must_use]
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Car | Self::Train)
    }

    /// Default `(width, height)` for this kind.
    ///
    /// Trees and water are sized by their generator; the values here are
    /// only used when a caller does not pick a size.
    #[must_use]
    pub const fn default_size(self) -> (i32, i32) {
        match self {
            Self::Car => (Entity::CAR_WIDTH, Entity::VEHICLE_HEIGHT),
            Self::Train => (Entity::TRAIN_WIDTH, Entity::VEHICLE_HEIGHT),
            Self::Tree => (40, 60),
            Self::Water => (150, 30),
        }
    }
}

/// Pickup variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CollectibleKind {
    /// Score coin.
    Coin = 0,
    /// Temporary invincibility power-up.
    Invincibility = 1,
}

/// Closed tag over every entity variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A hazard.
    Obstacle(ObstacleKind),
    /// Something the player can stand on over water (a log, a lily pad).
    Platform,
    /// A one-shot pickup.
    Collectible {
        /// What the pickup grants.
        kind: CollectibleKind,
        /// Whether it has already been picked up.
        collected: bool,
    },
}

/// Position and speed recorded when an entity is created.
///
/// Used to roll a run back to its starting state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct SpawnState {
    x: i32,
    y: i32,
    speed: i32,
}

/// Frame of the platform an entity rides on.
///
/// A rider advances and wraps in its carrier's frame, so it stays on the
/// carrier even when the carrier jumps across the map edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Carrier {
    offset: i32,
    width: i32,
}

/// A placed thing in the world.
///
/// Entities are small `Copy` values. Ownership lives in whoever stores
/// them (a chunk cell, a chunk's object list, or the hazard arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Entity {
    kind: EntityKind,
    bounds: Rect,
    speed: i32,
    movable: bool,
    spawn: SpawnState,
    carrier: Option<Carrier>,
}

impl Entity {
    /// Car width in pixels.
    pub const CAR_WIDTH: i32 = 50;
    /// Train width in pixels.
    pub const TRAIN_WIDTH: i32 = 200;
    /// Height shared by cars and trains.
    pub const VEHICLE_HEIGHT: i32 = 40;
    /// Side length of a collectible.
    pub const COLLECTIBLE_SIZE: i32 = 20;
    /// Side length of a static platform (lily pad).
    pub const STATIC_PLATFORM_SIZE: i32 = 50;

    /// Creates an entity from its parts.
    #[must_use]
    pub const fn new(kind: EntityKind, bounds: Rect, speed: i32, movable: bool) -> Self {
        Self {
            kind,
            bounds,
            speed,
            movable,
            spawn: SpawnState {
                x: bounds.x,
                y: bounds.y,
                speed,
            },
            carrier: None,
        }
    }

    /// Creates an obstacle with an explicit size.
    #[must_use]
    pub const fn obstacle(
        kind: ObstacleKind,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        movable: bool,
    ) -> Self {
        Self::new(
            EntityKind::Obstacle(kind),
            Rect::new(x, y, width, height),
            0,
            movable,
        )
    }

    /// Creates a moving car.
    #[must_use]
    pub const fn car(x: i32, y: i32, speed: i32) -> Self {
        Self::new(
            EntityKind::Obstacle(ObstacleKind::Car),
            Rect::new(x, y, Self::CAR_WIDTH, Self::VEHICLE_HEIGHT),
            speed,
            true,
        )
    }

    /// Creates a moving train.
    #[must_use]
    pub const fn train(x: i32, y: i32, speed: i32) -> Self {
        Self::new(
            EntityKind::Obstacle(ObstacleKind::Train),
            Rect::new(x, y, Self::TRAIN_WIDTH, Self::VEHICLE_HEIGHT),
            speed,
            true,
        )
    }

    /// Creates a square static tree.
    #[must_use]
    pub const fn tree(x: i32, y: i32, size: i32) -> Self {
        Self::obstacle(ObstacleKind::Tree, x, y, size, size, false)
    }

    /// Creates a static water sheet.
    #[must_use]
    pub const fn water(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::obstacle(ObstacleKind::Water, x, y, width, height, false)
    }

    /// Creates a platform. A non-zero speed makes it drift (a log).
    #[must_use]
    pub const fn platform(x: i32, y: i32, width: i32, height: i32, speed: i32) -> Self {
        Self::new(
            EntityKind::Platform,
            Rect::new(x, y, width, height),
            speed,
            speed != 0,
        )
    }

    /// Creates a lily pad: a fixed, square platform.
    #[must_use]
    pub const fn static_platform(x: i32, y: i32) -> Self {
        Self::platform(
            x,
            y,
            Self::STATIC_PLATFORM_SIZE,
            Self::STATIC_PLATFORM_SIZE,
            0,
        )
    }

    /// Creates an uncollected pickup.
    #[must_use]
    pub const fn collectible(kind: CollectibleKind, x: i32, y: i32) -> Self {
        Self::new(
            EntityKind::Collectible {
                kind,
                collected: false,
            },
            Rect::new(x, y, Self::COLLECTIBLE_SIZE, Self::COLLECTIBLE_SIZE),
            0,
            false,
        )
    }

    /// Returns the kind tag.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the obstacle kind, if this is an obstacle.
    #[inline]
    #[must_use]
    pub const fn obstacle_kind(&self) -> Option<ObstacleKind> {
        match self.kind {
            EntityKind::Obstacle(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns the collectible kind, if this is a collectible.
    #[inline]
    #[must_use]
    pub const fn collectible_kind(&self) -> Option<CollectibleKind> {
        match self.kind {
            EntityKind::Collectible { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Bounding rectangle.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Left edge.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.bounds.x
    }

    /// Top edge.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.bounds.y
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.bounds.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bounds.height
    }

    /// Signed horizontal speed (positive = rightwards).
    #[inline]
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }

    /// Sets the signed horizontal speed.
    #[inline]
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed;
    }

    /// Whether the entity advances on update.
    #[inline]
    #[must_use]
    pub const fn is_movable(&self) -> bool {
        self.movable
    }

    /// Enables or disables motion.
    #[inline]
    pub fn set_movable(&mut self, movable: bool) {
        self.movable = movable;
    }

    /// Whether the player may stand on this entity over water.
    #[inline]
    #[must_use]
    pub const fn is_platform(&self) -> bool {
        matches!(self.kind, EntityKind::Platform)
    }

    /// Whether touching this entity can kill the player.
    ///
    /// Water is reported as lethal here; whether a platform saves the
    /// player is decided by the chunk that owns both.
    #[inline]
    #[must_use]
    pub const fn is_lethal(&self) -> bool {
        matches!(self.kind, EntityKind::Obstacle(_))
    }

    /// Moves the entity so its top-left corner sits at `(x, y)`.
    ///
    /// The spawn snapshot moves too: placement happens before play starts.
    pub fn place_at(&mut self, x: i32, y: i32) {
        self.bounds.x = x;
        self.bounds.y = y;
        self.spawn.x = x;
        self.spawn.y = y;
    }

    /// Point-in-rectangle test.
    #[inline]
    #[must_use]
    pub const fn contains_point(&self, px: i32, py: i32) -> bool {
        self.bounds.contains_point(px, py)
    }

    /// Rectangle overlap test.
    #[inline]
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.bounds.intersects(&other.bounds)
    }

    /// Puts this entity on `platform`: centred on it, moving with it.
    ///
    /// The spawn snapshot is updated, so a reset puts the rider back on the
    /// platform's spawn position too.
    pub fn ride(&mut self, platform: &Self) {
        let offset = (platform.width() - self.width()) / 2;
        self.place_at(
            platform.x() + offset,
            platform.y() + (platform.height() - self.height()) / 2,
        );
        self.speed = platform.speed;
        self.spawn.speed = platform.speed;
        self.movable = platform.movable;
        self.carrier = Some(Carrier {
            offset,
            width: platform.width(),
        });
    }

    /// Whether this entity moves with a platform.
    #[inline]
    #[must_use]
    pub const fn is_riding(&self) -> bool {
        self.carrier.is_some()
    }

    /// Advances one tick and wraps at the map edges.
    ///
    /// Rightward movers re-enter at `-width` once past `map_width`;
    /// leftward movers re-enter at `map_width` once fully past `0`.
    /// An entity that starts inside `[-width, map_width]` never leaves it.
    /// Riders apply the rule to their carrier's extent instead of their own.
    pub fn advance(&mut self, map_width: i32) {
        if !self.movable {
            return;
        }
        let (offset, width) = self
            .carrier
            .map_or((0, self.bounds.width), |c| (c.offset, c.width));

        let mut x = self.bounds.x - offset + self.speed;
        if self.speed > 0 && x > map_width {
            x = -width;
        } else if self.speed < 0 && x + width < 0 {
            x = map_width;
        }
        self.bounds.x = x + offset;
    }

    /// Marks a collectible as picked up.
    ///
    /// Returns the kind on the first call only. Later calls, and calls on
    /// non-collectibles, return `None` and change nothing.
    pub fn collect(&mut self) -> Option<CollectibleKind> {
        match &mut self.kind {
            EntityKind::Collectible { kind, collected } if !*collected => {
                *collected = true;
                Some(*kind)
            }
            _ => None,
        }
    }

    /// Whether this collectible has been picked up. False for other kinds.
    #[inline]
    #[must_use]
    pub const fn is_collected(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Collectible {
                collected: true,
                ..
            }
        )
    }

    /// Restores the position and speed recorded at creation.
    pub fn reset(&mut self) {
        self.bounds.x = self.spawn.x;
        self.bounds.y = self.spawn.y;
        self.speed = self.spawn.speed;
    }
}
