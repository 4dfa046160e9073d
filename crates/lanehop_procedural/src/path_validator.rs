//! # Path Validator
//!
//! Guarantees that a chunk can be crossed from its top edge to its bottom
//! edge before the map accepts it.
//!
//! ## Navigation Grid
//!
//! Each cell is navigable unless
//! - a static lethal obstacle (a tree, a parked vehicle) overlaps it, or
//! - water overlaps it and the platforms spanning the cell's full width do
//!   not cover its full height.
//!
//! Moving hazards are ignored: a car crossing a column is a timing
//! problem for the player, not a wall.
//!
//! ## Acceptance
//!
//! A chunk is accepted when a breadth-first search over navigable cells
//! reaches the bottom row from the top row, and at least one column is
//! navigable end to end. The second condition is the straight-line
//! guarantee: a player walking straight up that column touches nothing
//! lethal.
//!
//! ## Repair
//!
//! 1. Rivers get a ladder of platforms (old platforms are discarded, and
//!    anything riding them moves onto the ladder). Where the ladder sits
//!    is drawn from the validator's seed and the chunk position. Other
//!    terrain gets the cheapest window of columns wide enough for the
//!    player cleared of blockers.
//! 2. If that still fails, column 0 is cleared and, over water, covered
//!    by a fixed platform. This always succeeds, so repair never loops.

use std::collections::VecDeque;

use crate::chunk::{Chunk, TerrainType};
use crate::config::MIN_FREE_PATH_WIDTH;
use crate::seed::WorldSeed;
use lanehop_core::{Entity, ObstacleKind, Rect};

/// Cell-level walkability of one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationGrid {
    rows: usize,
    columns: usize,
    navigable: Vec<bool>,
}

/// Returns true for entities that block a cell outright.
fn is_blocker(entity: &Entity) -> bool {
    !entity.is_movable()
        && matches!(
            entity.obstacle_kind(),
            Some(ObstacleKind::Tree | ObstacleKind::Car | ObstacleKind::Train)
        )
}

fn is_water(entity: &Entity) -> bool {
    entity.obstacle_kind() == Some(ObstacleKind::Water)
}

/// Returns true if the platforms spanning `cell` cover all of its rows.
fn covered_by_platforms<'a, I>(cell: Rect, platforms: I) -> bool
where
    I: Iterator<Item = &'a Entity>,
{
    let mut spans: Vec<(i32, i32)> = platforms
        .map(Entity::bounds)
        .filter(|p| cell.spans_horizontally(p) && p.intersects(&cell))
        .map(|p| (p.y.max(cell.y), p.bottom().min(cell.bottom())))
        .collect();
    spans.sort_unstable();

    let mut reached = cell.y;
    for (top, bottom) in spans {
        if top > reached {
            return false;
        }
        reached = reached.max(bottom);
    }
    reached >= cell.bottom()
}

impl NavigationGrid {
    /// Builds the grid for `chunk` from its current contents.
    #[must_use]
    pub fn build(chunk: &Chunk) -> Self {
        let (rows, columns) = (chunk.rows(), chunk.columns());
        let mut navigable = vec![true; rows * columns];

        for row in 0..rows {
            for col in 0..columns {
                let Some(rect) = chunk.cell_rect(row, col) else {
                    continue;
                };
                let touching = || chunk.entities().filter(move |e| e.bounds().intersects(&rect));

                let blocked = touching().any(is_blocker)
                    || (touching().any(is_water)
                        && !covered_by_platforms(rect, touching().filter(|e| e.is_platform())));
                navigable[row * columns + col] = !blocked;
            }
        }

        Self {
            rows,
            columns,
            navigable,
        }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Whether a cell is walkable. Out-of-range cells are not.
    #[must_use]
    pub fn is_navigable(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns && self.navigable[row * self.columns + col]
    }

    /// Number of blocked cells in a column.
    #[must_use]
    pub fn blocked_in_column(&self, col: usize) -> usize {
        (0..self.rows).filter(|&row| !self.is_navigable(row, col)).count()
    }

    /// Navigable neighbours (up, down, left, right) of a cell index.
    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = (index / self.columns, index % self.columns);
        let up = row.checked_sub(1).map(|r| (r, col));
        let down = Some((row + 1, col));
        let left = col.checked_sub(1).map(|c| (row, c));
        let right = Some((row, col + 1));

        [up, down, left, right]
            .into_iter()
            .flatten()
            .filter(|&(r, c)| self.is_navigable(r, c))
            .map(|(r, c)| r * self.columns + c)
    }

    /// Returns true if some top-row cell connects to some bottom-row cell.
    #[must_use]
    pub fn has_route(&self) -> bool {
        if self.rows == 0 || self.columns == 0 {
            return false;
        }

        let mut visited = vec![false; self.navigable.len()];
        let mut queue: VecDeque<usize> = (0..self.columns)
            .filter(|&col| self.is_navigable(0, col))
            .collect();
        for &start in &queue {
            visited[start] = true;
        }

        let bottom = self.rows - 1;
        while let Some(index) = queue.pop_front() {
            if index / self.columns == bottom {
                return true;
            }
            for next in self.neighbors(index) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Columns that are navigable in every row.
    #[must_use]
    pub fn safe_columns(&self) -> Vec<usize> {
        if self.rows == 0 {
            return Vec::new();
        }
        (0..self.columns)
            .filter(|&col| self.blocked_in_column(col) == 0)
            .collect()
    }
}

/// What the validator had to do to a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repair {
    /// The chunk was already crossable.
    None,
    /// Blockers were removed from a window of columns.
    ClearedColumns {
        /// Leftmost cleared column.
        first: usize,
        /// Number of cleared columns.
        count: usize,
        /// Entities removed.
        removed: usize,
    },
    /// Platforms were replaced with a guaranteed ladder.
    PlatformLadder {
        /// Platforms added.
        platforms: usize,
    },
    /// Column 0 was cleared (and bridged over water).
    FirstColumnFallback,
}

/// Outcome of [`PathValidator::ensure_traversability`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalReport {
    /// A top-to-bottom route exists through navigable cells.
    pub route: bool,
    /// Leftmost column that is navigable end to end.
    pub corridor: Option<usize>,
    /// Repair applied.
    pub repair: Repair,
}

impl TraversalReport {
    /// Returns true if the chunk is accepted.
    #[inline]
    #[must_use]
    pub const fn is_traversable(&self) -> bool {
        self.route && self.corridor.is_some()
    }
}

/// Checks and repairs chunk traversability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathValidator {
    min_free_path_width: i32,
    seed: WorldSeed,
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new(MIN_FREE_PATH_WIDTH)
    }
}

impl PathValidator {
    /// Creates a validator for a player `min_free_path_width` pixels wide.
    #[must_use]
    pub const fn new(min_free_path_width: i32) -> Self {
        Self {
            min_free_path_width,
            seed: WorldSeed::new(0),
        }
    }

    /// Sets the seed ladder placement is drawn from.
    #[must_use]
    pub const fn with_seed(mut self, seed: WorldSeed) -> Self {
        self.seed = seed;
        self
    }

    /// Narrowest corridor the player fits through.
    #[inline]
    #[must_use]
    pub const fn min_free_path_width(&self) -> i32 {
        self.min_free_path_width
    }

    /// Returns true if a BFS route exists through `chunk`.
    #[must_use]
    pub fn has_route(&self, chunk: &Chunk) -> bool {
        NavigationGrid::build(chunk).has_route()
    }

    /// Columns of `chunk` that are navigable end to end.
    #[must_use]
    pub fn safe_columns(&self, chunk: &Chunk) -> Vec<usize> {
        NavigationGrid::build(chunk).safe_columns()
    }

    fn inspect(chunk: &Chunk, repair: Repair) -> TraversalReport {
        let grid = NavigationGrid::build(chunk);
        TraversalReport {
            route: grid.has_route(),
            corridor: grid.safe_columns().first().copied(),
            repair,
        }
    }

    /// Makes `chunk` crossable, repairing it if needed.
    ///
    /// The returned report always satisfies
    /// [`TraversalReport::is_traversable`] for a chunk with at least one
    /// cell.
    pub fn ensure_traversability(&self, chunk: &mut Chunk) -> TraversalReport {
        let report = Self::inspect(chunk, Repair::None);
        if report.is_traversable() {
            return report;
        }

        let repair = if chunk.terrain() == TerrainType::River {
            self.build_platform_ladder(chunk)
        } else {
            self.clear_cheapest_window(chunk)
        };
        let report = Self::inspect(chunk, repair);
        if report.is_traversable() {
            tracing::debug!(
                terrain = ?chunk.terrain(),
                position = chunk.position(),
                ?repair,
                "repaired chunk traversability"
            );
            return report;
        }

        tracing::warn!(
            terrain = ?chunk.terrain(),
            position = chunk.position(),
            "repair insufficient, clearing first column"
        );
        Self::clear_first_column(chunk);
        Self::inspect(chunk, Repair::FirstColumnFallback)
    }

    /// Columns a player needs side by side in `chunk`.
    #[must_use]
    pub fn corridor_columns(&self, chunk: &Chunk) -> usize {
        let cell = chunk.cell_size();
        let needed = (self.min_free_path_width + cell - 1) / cell;
        (needed.max(1) as usize).min(chunk.columns().max(1))
    }

    fn clear_cheapest_window(&self, chunk: &mut Chunk) -> Repair {
        let columns = chunk.columns();
        if columns == 0 {
            return Repair::None;
        }
        let count = self.corridor_columns(chunk);
        let grid = NavigationGrid::build(chunk);

        let first = (0..=columns - count)
            .min_by_key(|&start| {
                (start..start + count)
                    .map(|col| grid.blocked_in_column(col))
                    .sum::<usize>()
            })
            .unwrap_or(0);

        let cell = chunk.cell_size();
        let window = Rect::new(
            first as i32 * cell,
            chunk.position(),
            count as i32 * cell,
            chunk.height(),
        );
        let removed = Self::remove_blockers(chunk, window);

        Repair::ClearedColumns {
            first,
            count,
            removed,
        }
    }

    fn build_platform_ladder(&self, chunk: &mut Chunk) -> Repair {
        let mut riders = Vec::new();
        chunk.retain_objects(|e| {
            if e.is_riding() {
                riders.push(*e);
            }
            !e.is_platform() && !e.is_riding()
        });
        chunk.retain_cell_contents(|e| !e.is_platform());

        let cell = chunk.cell_size();
        let columns = chunk.columns();
        if columns == 0 {
            return Repair::PlatformLadder { platforms: 0 };
        }
        // One cell of slack lets consecutive platforms alternate sides
        // while still sharing a corridor the player fits through.
        let width_cells = (self.corridor_columns(chunk).max(2) + 1).min(columns);
        let left_start = self.ladder_start(chunk, (width_cells + 1).min(columns));
        let right_start = (left_start + 1).min(columns - width_cells);
        let platforms = chunk.rows().max(3);
        let height = chunk.height();
        let top = chunk.position();

        let mut ladder = Vec::with_capacity(platforms);
        for i in 0..platforms {
            let left_leaning = i % 2 == 0;
            let first_col = if left_leaning { left_start } else { right_start };
            let y0 = top + (i as i32 * height) / platforms as i32;
            let y1 = top + ((i as i32 + 1) * height) / platforms as i32;
            let speed = if left_leaning { 1 } else { -1 };

            let platform = Entity::platform(
                first_col as i32 * cell,
                y0,
                width_cells as i32 * cell,
                y1 - y0,
                speed,
            );
            ladder.push(platform);
            chunk.add_object(platform);
        }

        // Pickups that rode a discarded log move to the rung at their height.
        for mut rider in riders {
            let centre = rider.y() + rider.height() / 2;
            let rung = ladder
                .iter()
                .find(|p| centre >= p.y() && centre < p.y() + p.height())
                .or_else(|| ladder.first());
            if let Some(rung) = rung {
                rider.ride(rung);
                chunk.add_object(rider);
            }
        }

        Repair::PlatformLadder { platforms }
    }

    /// Leftmost column of a ladder `span` columns wide.
    ///
    /// Picks the window with the fewest blocked cells. Ties are broken by a
    /// rotation drawn from the seed and the chunk position, so ladders do
    /// not all line up.
    fn ladder_start(&self, chunk: &Chunk, span: usize) -> usize {
        let candidates = chunk.columns() + 1 - span;
        let grid = NavigationGrid::build(chunk);
        let rotation =
            (self.seed.derive(chunk.position() as u64).value() % candidates as u64) as usize;

        (0..candidates)
            .map(|i| (rotation + i) % candidates)
            .min_by_key(|&start| {
                (start..start + span)
                    .map(|col| grid.blocked_in_column(col))
                    .sum::<usize>()
            })
            .unwrap_or(0)
    }

    fn clear_first_column(chunk: &mut Chunk) {
        let column = Rect::new(0, chunk.position(), chunk.cell_size(), chunk.height());
        Self::remove_blockers(chunk, column);

        let over_water = chunk
            .entities()
            .any(|e| is_water(e) && e.bounds().intersects(&column));
        if over_water {
            chunk.add_object(Entity::platform(
                column.x,
                column.y,
                column.width,
                column.height,
                0,
            ));
        }
    }

    fn remove_blockers(chunk: &mut Chunk, area: Rect) -> usize {
        let doomed = |e: &Entity| is_blocker(e) && e.bounds().intersects(&area);
        let before = chunk.objects().len();
        chunk.retain_objects(|e| !doomed(e));
        let from_objects = before - chunk.objects().len();
        from_objects + chunk.retain_cell_contents(|e| !doomed(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanehop_core::CollectibleKind;

    fn chunk(terrain: TerrainType) -> Chunk {
        Chunk::new(terrain, 0, 800, 120, 40)
    }

    /// Walks every column centre top to bottom and reports the first safe x.
    fn safe_ray(chunk: &Chunk) -> Option<i32> {
        (0..chunk.columns() as i32)
            .map(|col| col * chunk.cell_size() + chunk.cell_size() / 2)
            .find(|&x| {
                (chunk.position()..chunk.position() + chunk.height())
                    .all(|y| !chunk.is_lethal_at(x, y))
            })
    }

    #[test]
    fn test_empty_chunk_is_traversable() {
        let mut c = chunk(TerrainType::Grass);
        let report = PathValidator::default().ensure_traversability(&mut c);
        assert_eq!(report.repair, Repair::None);
        assert_eq!(report.corridor, Some(0));
        assert!(report.route);
    }

    #[test]
    fn test_moving_cars_do_not_block() {
        let mut c = chunk(TerrainType::Road);
        c.push_hazard(Entity::car(0, 40, 2));
        c.push_hazard(Entity::car(60, 40, 2));

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert_eq!(report.repair, Repair::None);
        assert_eq!(c.pending_hazards().len(), 2);
    }

    #[test]
    fn test_zigzag_route_without_corridor_is_repaired() {
        // Row 0 open only at column 0, row 1 open everywhere,
        // row 2 open only at column 19: a route, but no straight corridor.
        let mut c = chunk(TerrainType::Grass);
        for col in 1..20 {
            c.place_in_cell(0, col, Entity::tree(col as i32 * 40 + 5, 5, 30));
        }
        for col in 0..19 {
            c.place_in_cell(2, col, Entity::tree(col as i32 * 40 + 5, 85, 30));
        }

        let grid = NavigationGrid::build(&c);
        assert!(grid.has_route());
        assert!(grid.safe_columns().is_empty());

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert!(report.is_traversable());
        assert!(matches!(report.repair, Repair::ClearedColumns { count: 2, .. }));
        assert!(safe_ray(&c).is_some());
    }

    #[test]
    fn test_obstacles_everywhere_is_repaired() {
        let mut c = chunk(TerrainType::Grass);
        for row in 0..3 {
            for col in 0..20 {
                c.place_in_cell(
                    row,
                    col,
                    Entity::tree(col as i32 * 40, row as i32 * 40, 40),
                );
            }
        }
        assert!(!PathValidator::default().has_route(&c));

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        println!("repair: {:?}", report.repair);
        assert!(report.is_traversable());
        assert_eq!(
            report.repair,
            Repair::ClearedColumns {
                first: 0,
                count: 2,
                removed: 6
            }
        );
        assert_eq!(c.empty_cell_count(), 6);
        assert!(safe_ray(&c).is_some());
    }

    #[test]
    fn test_wide_static_wall_is_cleared() {
        let mut c = chunk(TerrainType::Railway);
        // A parked train row that spans the full width.
        for i in 0..4 {
            let mut parked = Entity::train(i * 200, 40, 0);
            parked.set_movable(false);
            c.add_object(parked);
        }

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert!(report.is_traversable());
        assert_eq!(c.objects().len(), 3);
        assert!(safe_ray(&c).is_some());
    }

    #[test]
    fn test_river_without_platforms_gets_ladder() {
        let mut c = chunk(TerrainType::River);
        c.add_object(Entity::water(0, 0, 800, 120));
        assert!(safe_ray(&c).is_none());

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert_eq!(report.repair, Repair::PlatformLadder { platforms: 3 });
        assert!(report.is_traversable());

        let platforms: Vec<_> = c.objects().iter().filter(|e| e.is_platform()).collect();
        assert!(platforms.len() >= 3);
        assert_eq!(platforms[0].speed(), 1);
        assert_eq!(platforms[1].speed(), -1);
        assert_ne!(platforms[0].x(), platforms[1].x());
        assert!(safe_ray(&c).is_some());
    }

    #[test]
    fn test_ladder_position_varies() {
        let validator = PathValidator::new(80).with_seed(WorldSeed::new(77));
        let mut starts = Vec::new();
        for i in 0..20 {
            let mut c = Chunk::new(TerrainType::River, i * 120, 800, 120, 40);
            c.add_object(Entity::water(0, i * 120, 800, 120));
            let report = validator.ensure_traversability(&mut c);
            assert!(report.is_traversable());
            assert!(safe_ray(&c).is_some());
            starts.push(c.objects().iter().find(|e| e.is_platform()).unwrap().x());
        }
        starts.sort_unstable();
        starts.dedup();
        println!("ladder x positions: {starts:?}");
        assert!(starts.len() > 1);
    }

    #[test]
    fn test_ladder_keeps_riding_coin() {
        let mut c = chunk(TerrainType::River);
        c.add_object(Entity::water(0, 0, 800, 120));
        let log = Entity::platform(500, 45, 100, 20, 2);
        let mut coin = Entity::collectible(CollectibleKind::Coin, 0, 0);
        coin.ride(&log);
        c.add_object(log);
        c.add_object(coin);

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert!(matches!(report.repair, Repair::PlatformLadder { .. }));

        let coin = c
            .objects()
            .iter()
            .find(|e| e.collectible_kind().is_some())
            .copied()
            .unwrap();
        assert!(coin.is_riding());
        // The coin sat in the middle lane, so it rides the middle rung.
        let rung = c.objects().iter().filter(|e| e.is_platform()).nth(1).unwrap();
        assert_eq!(coin.speed(), rung.speed());
        for _ in 0..300 {
            c.update(800);
            let coin = c.objects().iter().find(|e| e.is_riding()).unwrap();
            assert!(!c.is_lethal_at(coin.x() + 10, coin.y() + 10));
        }
    }

    #[test]
    fn test_river_with_aligned_logs_is_accepted() {
        let mut c = chunk(TerrainType::River);
        c.add_object(Entity::water(0, 0, 800, 120));
        for row in 0..3 {
            c.add_object(Entity::platform(200, row * 40, 120, 40, 1));
        }

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert_eq!(report.repair, Repair::None);
        assert_eq!(report.corridor, Some(5));
    }

    #[test]
    fn test_short_log_does_not_cover_cell() {
        let mut c = chunk(TerrainType::River);
        c.add_object(Entity::water(0, 0, 800, 120));
        c.add_object(Entity::platform(0, 0, 120, 30, 1));
        let grid = NavigationGrid::build(&c);
        assert!(!grid.is_navigable(0, 1));
    }

    #[test]
    fn test_stacked_platforms_cover_cell() {
        let mut c = chunk(TerrainType::River);
        c.add_object(Entity::water(0, 0, 800, 120));
        c.add_object(Entity::platform(0, 0, 80, 25, 0));
        c.add_object(Entity::platform(0, 20, 80, 25, 0));
        let grid = NavigationGrid::build(&c);
        assert!(grid.is_navigable(0, 0));
        assert!(grid.is_navigable(0, 1));
        assert!(!grid.is_navigable(0, 2));
        assert!(!grid.is_navigable(1, 0));
    }

    #[test]
    fn test_river_with_trees_falls_back_to_first_column() {
        let mut c = chunk(TerrainType::River);
        c.add_object(Entity::water(0, 0, 800, 120));
        for row in 0..3 {
            for col in 0..20 {
                c.place_in_cell(row, col, Entity::tree(col as i32 * 40, row as i32 * 40, 40));
            }
        }

        let report = PathValidator::new(80).ensure_traversability(&mut c);
        assert_eq!(report.repair, Repair::FirstColumnFallback);
        assert!(report.is_traversable());
        assert_eq!(report.corridor, Some(0));
        assert!(!c.is_lethal_at(20, 60));
    }

    #[test]
    fn test_out_of_range_is_not_navigable() {
        let grid = NavigationGrid::build(&chunk(TerrainType::Grass));
        assert!(!grid.is_navigable(3, 0));
        assert!(!grid.is_navigable(0, 20));
    }
}
