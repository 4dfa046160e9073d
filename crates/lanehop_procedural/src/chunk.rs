//! # Chunk System
//!
//! A chunk is one horizontal strip of the world at a fixed world-Y.
//!
//! ## Layout
//!
//! - Cell grid: `rows × columns` cells of `cell_size` pixels, row-major.
//!   Static single-cell content (trees, collectibles) lives here.
//! - Objects: free entities that do not fit one cell (water sheets, logs,
//!   pickups riding on logs).
//! - Hazards: moving cars and trains. A freshly generated chunk holds them
//!   as pending values; once accepted into a map they are handed to the
//!   shared obstacle pool and the chunk keeps only their IDs.

use lanehop_core::{CollectibleKind, Entity, EntityId, ObstacleKind, Rect};

/// Terrain of a chunk. Decides what the factory puts in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerrainType {
    /// Cars.
    Road = 0,
    /// Trains.
    Railway = 1,
    /// Water crossed on logs.
    River = 2,
    /// Trees, mostly safe.
    Grass = 3,
}

impl TerrainType {
    /// All terrain types, in tag order.
    pub const ALL: [Self; 4] = [Self::Road, Self::Railway, Self::River, Self::Grass];

    /// The moving hazard this terrain spawns, if any.
    #[must_use]
    pub const fn hazard_kind(self) -> Option<ObstacleKind> {
        match self {
            Self::Road => Some(ObstacleKind::Car),
            Self::Railway => Some(ObstacleKind::Train),
            Self::River | Self::Grass => None,
        }
    }
}

/// One grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Row inside the chunk (0 = top).
    pub row: usize,
    /// Column inside the chunk (0 = left).
    pub col: usize,
    /// What occupies the cell.
    pub content: Option<Entity>,
}

impl Cell {
    /// Returns true if nothing occupies the cell.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

/// A horizontal strip of the world.
#[derive(Clone, Debug)]
pub struct Chunk {
    position: i32,
    terrain: TerrainType,
    width: i32,
    height: i32,
    cell_size: i32,
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
    objects: Vec<Entity>,
    pending_hazards: Vec<Entity>,
    hazard_ids: Vec<EntityId>,
}

impl Chunk {
    /// Creates an empty chunk.
    ///
    /// `width` and `height` are truncated to whole cells.
    ///
    /// # Arguments
    ///
    /// * `terrain` - Terrain type
    /// * `position` - World-Y of the top edge
    /// * `width` - Strip width in pixels
    /// * `height` - Strip height in pixels
    /// * `cell_size` - Grid cell side in pixels (must be positive)
    #[must_use]
    pub fn new(terrain: TerrainType, position: i32, width: i32, height: i32, cell_size: i32) -> Self {
        let cell_size = cell_size.max(1);
        let rows = (height / cell_size).max(0) as usize;
        let columns = (width / cell_size).max(0) as usize;
        let cells = (0..rows)
            .flat_map(|row| {
                (0..columns).map(move |col| Cell {
                    row,
                    col,
                    content: None,
                })
            })
            .collect();

        Self {
            position,
            terrain,
            width: columns as i32 * cell_size,
            height: rows as i32 * cell_size,
            cell_size,
            rows,
            columns,
            cells,
            objects: Vec::new(),
            pending_hazards: Vec::new(),
            hazard_ids: Vec::new(),
        }
    }

    /// World-Y of the top edge.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Terrain type.
    #[inline]
    #[must_use]
    pub const fn terrain(&self) -> TerrainType {
        self.terrain
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Cell side in pixels.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Number of cell rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cell columns.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// World-space rectangle of the whole strip.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, self.position, self.width, self.height)
    }

    /// Returns true if world-Y `y` falls inside the strip.
    #[inline]
    #[must_use]
    pub const fn contains_y(&self, y: i32) -> bool {
        y >= self.position && y < self.position + self.height
    }

    /// Returns true if the strip overlaps the world-Y range `[top, bottom)`.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self, top: i32, bottom: i32) -> bool {
        self.position < bottom && self.position + self.height > top
    }

    /// Looks up a cell. Out-of-range coordinates return `None`.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.rows || col >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + col)
    }

    /// Looks up a cell mutably. Out-of-range coordinates return `None`.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if row >= self.rows || col >= self.columns {
            return None;
        }
        self.cells.get_mut(row * self.columns + col)
    }

    /// All cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// World-space rectangle of a cell.
    #[must_use]
    pub fn cell_rect(&self, row: usize, col: usize) -> Option<Rect> {
        if row >= self.rows || col >= self.columns {
            return None;
        }
        Some(Rect::new(
            col as i32 * self.cell_size,
            self.position + row as i32 * self.cell_size,
            self.cell_size,
            self.cell_size,
        ))
    }

    /// Stores `entity` in an empty cell.
    ///
    /// Returns false (and drops nothing) if the cell is out of range or
    /// already occupied.
    pub fn place_in_cell(&mut self, row: usize, col: usize, entity: Entity) -> bool {
        match self.cell_mut(row, col) {
            Some(cell) if cell.is_empty() => {
                cell.content = Some(entity);
                true
            }
            _ => false,
        }
    }

    /// Number of empty cells.
    #[must_use]
    pub fn empty_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }

    /// Adds a free (non-cell) entity.
    pub fn add_object(&mut self, entity: Entity) {
        self.objects.push(entity);
    }

    /// Free entities.
    #[inline]
    #[must_use]
    pub fn objects(&self) -> &[Entity] {
        &self.objects
    }

    /// Keeps only the free entities for which `keep` returns true.
    pub fn retain_objects<F>(&mut self, keep: F)
    where
        F: FnMut(&Entity) -> bool,
    {
        self.objects.retain(keep);
    }

    /// Keeps only the cell contents for which `keep` returns true.
    ///
    /// Returns how many cells were emptied.
    pub fn retain_cell_contents<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Entity) -> bool,
    {
        let mut cleared = 0;
        for cell in &mut self.cells {
            if cell.content.as_ref().is_some_and(|e| !keep(e)) {
                cell.content = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Every chunk-owned entity: cell contents, then free objects.
    ///
    /// Pool hazards are not included.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.cells
            .iter()
            .filter_map(|c| c.content.as_ref())
            .chain(self.objects.iter())
    }

    /// Queues a moving hazard for hand-off to the obstacle pool.
    pub fn push_hazard(&mut self, hazard: Entity) {
        self.pending_hazards.push(hazard);
    }

    /// Hazards generated but not yet handed off.
    #[inline]
    #[must_use]
    pub fn pending_hazards(&self) -> &[Entity] {
        &self.pending_hazards
    }

    /// Removes and returns the pending hazards.
    pub fn take_pending_hazards(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.pending_hazards)
    }

    /// Records the pool ID of a hazard this chunk spawned.
    pub fn record_hazard(&mut self, id: EntityId) {
        self.hazard_ids.push(id);
    }

    /// Pool IDs of the hazards this chunk spawned.
    ///
    /// IDs may be stale once the pool prunes a hazard.
    #[inline]
    #[must_use]
    pub fn hazard_ids(&self) -> &[EntityId] {
        &self.hazard_ids
    }

    /// Advances every movable chunk-owned entity one tick.
    pub fn update(&mut self, map_width: i32) {
        for object in &mut self.objects {
            object.advance(map_width);
        }
        for entity in self.cells.iter_mut().filter_map(|c| c.content.as_mut()) {
            entity.advance(map_width);
        }
    }

    /// Whether standing at `(x, y)` kills the player.
    ///
    /// Water is lethal unless a platform contains the point. Every other
    /// obstacle is lethal on contact. Pool hazards are not checked here.
    #[must_use]
    pub fn is_lethal_at(&self, x: i32, y: i32) -> bool {
        let mut in_water = false;
        let mut on_platform = false;
        for entity in self.entities().filter(|e| e.contains_point(x, y)) {
            match entity.obstacle_kind() {
                Some(ObstacleKind::Water) => in_water = true,
                Some(_) => return true,
                None if entity.is_platform() => on_platform = true,
                None => {}
            }
        }
        in_water && !on_platform
    }

    /// Picks up the first uncollected item at `(x, y)`.
    pub fn try_collect(&mut self, x: i32, y: i32) -> Option<CollectibleKind> {
        let cells = self.cells.iter_mut().filter_map(|c| c.content.as_mut());
        cells
            .chain(self.objects.iter_mut())
            .filter(|e| !e.is_collected() && e.contains_point(x, y))
            .find_map(Entity::collect)
    }

    /// Restores every chunk-owned entity to its spawn state.
    pub fn reset(&mut self) {
        for object in &mut self.objects {
            object.reset();
        }
        for entity in self.cells.iter_mut().filter_map(|c| c.content.as_mut()) {
            entity.reset();
        }
    }
}
