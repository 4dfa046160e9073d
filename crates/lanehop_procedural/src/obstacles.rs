//! # Moving Obstacle Factory
//!
//! Builds cars and trains, one at a time or as an evenly spaced set that
//! shares one lane and one direction.
//!
//! ## Sets
//!
//! A set spreads `count` vehicles over `map_width + 2 × width` so the lane
//! looks full as it wraps. If that spacing would put vehicles closer than
//! the kind's minimum gap, the count shrinks until it fits. Each vehicle
//! is then nudged by a small jitter so lanes do not look stamped.

use rand::Rng;

use crate::config::GenerationConfig;
use crate::seed::MapRng;
use lanehop_core::{Entity, ObstacleKind};

/// Travel direction of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Positive speed.
    LeftToRight,
    /// Negative speed.
    RightToLeft,
}

impl Direction {
    /// Picks a direction with equal odds.
    pub fn random(rng: &mut MapRng) -> Self {
        if rng.gen_bool(0.5) {
            Self::LeftToRight
        } else {
            Self::RightToLeft
        }
    }

    /// Direction of travel for a signed speed. Zero has none.
    #[inline]
    #[must_use]
    pub const fn from_speed(speed: i32) -> Option<Self> {
        match speed.signum() {
            1 => Some(Self::LeftToRight),
            -1 => Some(Self::RightToLeft),
            _ => None,
        }
    }

    /// Applies the direction to a speed magnitude.
    #[inline]
    #[must_use]
    pub const fn signed(self, magnitude: i32) -> i32 {
        match self {
            Self::LeftToRight => magnitude,
            Self::RightToLeft => -magnitude,
        }
    }
}

/// Per-kind tuning copied out of the generation config.
#[derive(Clone, Copy, Debug)]
struct VehicleRules {
    speed_min: i32,
    speed_max: i32,
    min_gap: i32,
    jitter_divisor: i32,
    speed_variation: bool,
}

/// Builds moving hazards for one map width.
#[derive(Clone, Debug)]
pub struct MovingObstacleFactory {
    map_width: i32,
    car: VehicleRules,
    train: VehicleRules,
}

impl MovingObstacleFactory {
    /// Creates a factory for lanes `map_width` pixels wide.
    #[must_use]
    pub fn new(map_width: i32, config: &GenerationConfig) -> Self {
        Self {
            map_width,
            car: VehicleRules {
                speed_min: config.car_speed_min,
                speed_max: config.car_speed_max,
                min_gap: config.car_min_gap,
                jitter_divisor: 4,
                speed_variation: true,
            },
            train: VehicleRules {
                speed_min: config.train_speed_min,
                speed_max: config.train_speed_max,
                min_gap: config.train_min_gap,
                jitter_divisor: 6,
                speed_variation: false,
            },
        }
    }

    /// Lane width this factory builds for.
    #[inline]
    #[must_use]
    pub const fn map_width(&self) -> i32 {
        self.map_width
    }

    fn rules(&self, kind: ObstacleKind) -> VehicleRules {
        match kind {
            ObstacleKind::Car => self.car,
            ObstacleKind::Train => self.train,
            ObstacleKind::Tree | ObstacleKind::Water => {
                panic!("{kind:?} is not a moving obstacle")
            }
        }
    }

    /// Builds one vehicle at an exact spot.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a moving kind (trees and water are built by
    /// the chunk factory, never here).
    #[must_use]
    pub fn create(&self, kind: ObstacleKind, x: i32, y: i32, speed: i32) -> Entity {
        match kind {
            ObstacleKind::Car => Entity::car(x, y, speed),
            ObstacleKind::Train => Entity::train(x, y, speed),
            ObstacleKind::Tree | ObstacleKind::Water => {
                panic!("{kind:?} is not a moving obstacle")
            }
        }
    }

    /// Builds a car at `y` with random position, speed and direction.
    pub fn create_random_car(&self, rng: &mut MapRng, y: i32) -> Entity {
        self.create_random(rng, ObstacleKind::Car, y)
    }

    /// Builds a train at `y` with random position, speed and direction.
    pub fn create_random_train(&self, rng: &mut MapRng, y: i32) -> Entity {
        self.create_random(rng, ObstacleKind::Train, y)
    }

    /// Builds one vehicle of `kind` at `y` with random x, speed and direction.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a moving kind.
    pub fn create_random(&self, rng: &mut MapRng, kind: ObstacleKind, y: i32) -> Entity {
        let direction = Direction::random(rng);
        self.create_random_heading(rng, kind, y, direction)
    }

    /// Like [`create_random`](Self::create_random) but travelling in
    /// `direction`, for lanes that already have traffic.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a moving kind.
    pub fn create_random_heading(
        &self,
        rng: &mut MapRng,
        kind: ObstacleKind,
        y: i32,
        direction: Direction,
    ) -> Entity {
        let rules = self.rules(kind);
        let (width, _) = kind.default_size();
        let x = rng.gen_range(-width..=self.map_width);
        let speed = direction.signed(rng.gen_range(rules.speed_min..=rules.speed_max));
        self.create(kind, x, y, speed)
    }

    /// Builds an evenly spaced set of cars sharing lane `y`.
    pub fn create_car_set(
        &self,
        rng: &mut MapRng,
        count: u32,
        y: i32,
        direction: Direction,
    ) -> Vec<Entity> {
        self.create_set(rng, ObstacleKind::Car, count, y, direction)
    }

    /// Builds an evenly spaced set of trains sharing lane `y`.
    pub fn create_train_set(
        &self,
        rng: &mut MapRng,
        count: u32,
        y: i32,
        direction: Direction,
    ) -> Vec<Entity> {
        self.create_set(rng, ObstacleKind::Train, count, y, direction)
    }

    /// Builds a set of vehicles sharing lane `y` and `direction`.
    ///
    /// Always returns at least one vehicle. Every initial x lies inside
    /// `[-width, map_width]`, the band the wrap rule keeps them in.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a moving kind.
    pub fn create_set(
        &self,
        rng: &mut MapRng,
        kind: ObstacleKind,
        count: u32,
        y: i32,
        direction: Direction,
    ) -> Vec<Entity> {
        let rules = self.rules(kind);
        let (width, _) = kind.default_size();
        let total = self.map_width + 2 * width;

        let mut count = count.max(1) as i32;
        let mut spacing = total / count;
        if spacing < rules.min_gap {
            count = (total / rules.min_gap).max(1);
            spacing = total / count;
        }

        let base_speed = rng.gen_range(rules.speed_min..=rules.speed_max);
        let jitter = spacing / rules.jitter_divisor;

        (0..count)
            .map(|i| {
                let offset = if jitter > 0 {
                    rng.gen_range(-jitter..=jitter)
                } else {
                    0
                };
                let along = -width + i * spacing + offset;
                let x = match direction {
                    Direction::LeftToRight => along,
                    Direction::RightToLeft => self.map_width - width - along,
                }
                .clamp(-width, self.map_width);

                let variation = if rules.speed_variation {
                    rng.gen_range(0..=1)
                } else {
                    0
                };
                self.create(kind, x, y, direction.signed(base_speed + variation))
            })
            .collect()
    }
}
