//! # Game Map
//!
//! The streaming controller. Owns the scroll position, the active chunks,
//! the shared hazard pool and the generators behind every random decision.
//! Terrain draws from the world seed itself; runtime events (spawn
//! requests, placed pickups) draw from a derived stream, so serving them
//! never shifts what terrain comes next.
//!
//! ## Tick
//!
//! ```text
//! position += speed
//!   → serve queued spawn requests
//!   → advance hazards (wrap, traffic)   → advance logs
//!   → prune hazards outside the band    → evict passed chunks
//!   → top up the lookahead buffer       → difficulty clock
//! ```
//!
//! World-Y grows in the direction of travel: chunks are generated at
//! increasing Y and retired once they fall a viewport behind.

use std::collections::VecDeque;

use crossbeam_channel::Receiver;

use crate::chunk::{Chunk, TerrainType};
use crate::chunk_factory::ChunkFactory;
use crate::config::StreamingConfig;
use crate::difficulty::DifficultyClock;
use crate::error::{MapError, MapResult};
use crate::obstacle_manager::MovingObstacleManager;
use crate::obstacles::Direction;
use crate::path_validator::Repair;
use crate::placer;
use crate::seed::{MapRng, WorldSeed};
use crate::spawner::SpawnRequest;
use lanehop_core::{CollectibleKind, Entity, ObstacleKind};
use rand::Rng;

/// Stream for spawn requests and placed pickups.
const RUNTIME_STREAM: u64 = 1;
/// Stream for ladder placement in repaired rivers.
const LADDER_STREAM: u64 = 2;

/// What one [`GameMap::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chunks appended to the buffer.
    pub chunks_generated: usize,
    /// Chunks retired behind the player.
    pub chunks_evicted: usize,
    /// Hazards dropped from the pool.
    pub hazards_pruned: usize,
    /// Spawn requests turned into hazards.
    pub spawns_served: usize,
    /// Whether the difficulty clock fired.
    pub difficulty_raised: bool,
}

/// Running totals for a map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    /// Ticks simulated.
    pub ticks: u64,
    /// Chunks generated, including the initial ones.
    pub chunks_generated: u64,
    /// Chunks retired.
    pub chunks_evicted: u64,
    /// Chunks the validator had to repair.
    pub repairs: u64,
    /// Hazards spawned from requests.
    pub spawns_served: u64,
    /// Spawn requests with no matching visible lane.
    pub spawns_dropped: u64,
}

/// The streaming map.
pub struct GameMap {
    config: StreamingConfig,
    factory: ChunkFactory,
    rng: MapRng,
    runtime_rng: MapRng,
    chunks: VecDeque<Chunk>,
    obstacles: MovingObstacleManager,
    position: i32,
    scroll_speed: i32,
    difficulty: DifficultyClock,
    spawns: Option<Receiver<SpawnRequest>>,
    stats: MapStats,
}

impl GameMap {
    /// Creates a map with a bare grass chunk at Y = 0 and a full buffer
    /// of random chunks ahead of it.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] if `config` fails validation.
    pub fn new(config: StreamingConfig, seed: WorldSeed) -> MapResult<Self> {
        config.validate()?;

        let mut map = Self {
            factory: ChunkFactory::new(&config).with_seed(seed.derive(LADDER_STREAM)),
            rng: seed.rng(),
            runtime_rng: seed.derive(RUNTIME_STREAM).rng(),
            chunks: VecDeque::with_capacity(config.buffer_chunks as usize + 8),
            obstacles: MovingObstacleManager::new(),
            position: 0,
            scroll_speed: config.initial_scroll_speed,
            difficulty: DifficultyClock::new(config.difficulty_interval_ticks),
            spawns: None,
            stats: MapStats::default(),
            config,
        };

        let start = map.factory.create_start_chunk(0, map.config.viewport_width);
        map.chunks.push_back(start);
        map.stats.chunks_generated += 1;
        for _ in 0..map.config.buffer_chunks {
            map.generate_new_chunk();
        }

        tracing::debug!(
            seed = seed.value(),
            chunks = map.chunks.len(),
            hazards = map.obstacles.len(),
            "map created"
        );
        Ok(map)
    }

    /// Feeds spawn requests from a [`SpawnScheduler`] into the tick.
    ///
    /// [`SpawnScheduler`]: crate::spawner::SpawnScheduler
    pub fn attach_spawner(&mut self, requests: Receiver<SpawnRequest>) {
        self.spawns = Some(requests);
    }

    /// Stops reading spawn requests.
    pub fn detach_spawner(&mut self) {
        self.spawns = None;
    }

    /// Advances the map one tick.
    pub fn update(&mut self) -> TickReport {
        let width = self.config.viewport_width;
        let mut report = TickReport::default();

        self.position += self.scroll_speed;
        report.spawns_served = self.serve_spawn_requests();

        self.obstacles.update_all(width);
        for chunk in &mut self.chunks {
            chunk.update(width);
        }

        let margin = self.config.offscreen_margin;
        report.hazards_pruned = self.obstacles.cleanup_offscreen(
            self.position - margin,
            self.position + self.config.viewport_height + margin,
        );
        report.chunks_evicted = self.evict_passed_chunks();
        report.chunks_generated = self.ensure_buffer_chunks();

        if self.difficulty.tick() {
            self.increase_scroll_speed();
            report.difficulty_raised = true;
        }

        self.stats.ticks += 1;
        report
    }

    fn serve_spawn_requests(&mut self) -> usize {
        let Some(requests) = self.spawns.clone() else {
            return 0;
        };

        let mut served = 0;
        for request in requests.try_iter().take(self.config.spawn_drain_limit) {
            if self.spawn_hazard(request.kind) {
                served += 1;
            } else {
                self.stats.spawns_dropped += 1;
                tracing::warn!(kind = ?request.kind, "no visible lane for spawn request");
            }
        }
        self.stats.spawns_served += served as u64;
        served
    }

    /// Spawns one random hazard of `kind` in a visible lane of the
    /// matching terrain. Returns false if no such lane is visible.
    ///
    /// The hazard travels the same way as the lane's live traffic, or a
    /// random way if the lane has none left.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a moving kind.
    pub fn spawn_hazard(&mut self, kind: ObstacleKind) -> bool {
        let terrain = match kind {
            ObstacleKind::Car => TerrainType::Road,
            ObstacleKind::Train => TerrainType::Railway,
            ObstacleKind::Tree | ObstacleKind::Water => {
                panic!("{kind:?} is not a moving obstacle")
            }
        };

        let (top, bottom) = self.view_range();
        let lanes: Vec<usize> = self
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.terrain() == terrain && c.is_visible(top, bottom))
            .map(|(i, _)| i)
            .collect();
        if lanes.is_empty() {
            return false;
        }

        let index = lanes[self.runtime_rng.gen_range(0..lanes.len())];
        let y = self.chunks[index].position() + self.config.lane_offset();
        let direction = self.chunks[index]
            .hazard_ids()
            .iter()
            .filter_map(|id| self.obstacles.get(*id))
            .find_map(|e| Direction::from_speed(e.speed()))
            .unwrap_or_else(|| Direction::random(&mut self.runtime_rng));
        let hazard = self.factory.obstacle_factory().create_random_heading(
            &mut self.runtime_rng,
            kind,
            y,
            direction,
        );
        let id = self.obstacles.add(hazard);
        self.chunks[index].record_hazard(id);
        tracing::debug!(?kind, y, "spawn request served");
        true
    }

    fn evict_passed_chunks(&mut self) -> usize {
        let limit = self.position - self.config.viewport_height;
        let mut evicted = 0;
        while self.chunks.front().is_some_and(|c| c.position() < limit) {
            if let Some(chunk) = self.chunks.pop_front() {
                tracing::trace!(position = chunk.position(), "chunk evicted");
            }
            evicted += 1;
        }
        self.stats.chunks_evicted += evicted as u64;
        evicted
    }

    fn buffer_target(&self) -> i32 {
        self.position + self.config.buffer_chunks as i32 * self.config.chunk_height
    }

    fn ensure_buffer_chunks(&mut self) -> usize {
        let mut generated = 0;
        while self
            .chunks
            .back()
            .map_or(true, |c| c.position() < self.buffer_target())
        {
            self.generate_new_chunk();
            generated += 1;
        }
        generated
    }

    /// Appends one random chunk after the farthest one (or at Y = 0 on an
    /// empty map) and hands its hazards to the shared pool.
    ///
    /// Returns the new chunk's position.
    pub fn generate_new_chunk(&mut self) -> i32 {
        let position = self
            .chunks
            .back()
            .map_or(0, |c| c.position() + self.config.chunk_height);

        let (mut chunk, report) = self.factory.create_random_chunk_with_report(
            &mut self.rng,
            position,
            self.config.viewport_width,
        );
        if report.repair != Repair::None {
            self.stats.repairs += 1;
        }

        for hazard in chunk.take_pending_hazards() {
            let id = self.obstacles.add(hazard);
            chunk.record_hazard(id);
        }

        self.chunks.push_back(chunk);
        self.stats.chunks_generated += 1;
        position
    }

    /// Raises scroll speed by one step (clamped) and every hazard's speed
    /// by the obstacle step.
    pub fn increase_scroll_speed(&mut self) {
        self.scroll_speed =
            (self.scroll_speed + self.config.scroll_speed_step).min(self.config.max_scroll_speed);
        self.obstacles.increase_speed(self.config.obstacle_speed_step);
        tracing::info!(
            scroll_speed = self.scroll_speed,
            level = self.difficulty.level(),
            "difficulty raised"
        );
    }

    /// World-Y range `[top, bottom)` the viewport shows.
    #[inline]
    #[must_use]
    pub fn view_range(&self) -> (i32, i32) {
        (self.position, self.position + self.config.viewport_height)
    }

    /// Chunks overlapping the viewport, nearest first.
    pub fn visible_chunks(&self) -> impl Iterator<Item = &Chunk> {
        let (top, bottom) = self.view_range();
        self.chunks.iter().filter(move |c| c.is_visible(top, bottom))
    }

    /// Every active chunk, nearest first.
    #[inline]
    #[must_use]
    pub fn chunks(&self) -> &VecDeque<Chunk> {
        &self.chunks
    }

    /// Current scroll position.
    #[inline]
    #[must_use]
    pub const fn current_position(&self) -> i32 {
        self.position
    }

    /// Current scroll speed.
    #[inline]
    #[must_use]
    pub const fn scroll_speed(&self) -> i32 {
        self.scroll_speed
    }

    /// The settings this map runs with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// The shared hazard pool.
    #[inline]
    #[must_use]
    pub const fn obstacle_manager(&self) -> &MovingObstacleManager {
        &self.obstacles
    }

    /// Running totals.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> MapStats {
        self.stats
    }

    /// Difficulty steps taken by the clock so far.
    #[inline]
    #[must_use]
    pub const fn difficulty_level(&self) -> u32 {
        self.difficulty.level()
    }

    /// Returns true if `(x, y)` is outside the viewport.
    #[must_use]
    pub fn is_position_out_of_bounds(&self, x: i32, y: i32) -> bool {
        let (top, bottom) = self.view_range();
        x < 0 || x >= self.config.viewport_width || y < top || y >= bottom
    }

    /// Returns true if a player at `(x, y)` dies: hit by a pool hazard, or
    /// touching a lethal static entity in the chunk under them.
    #[must_use]
    pub fn check_player_collision(&self, x: i32, y: i32) -> bool {
        self.obstacles.check_collision(x, y)
            || self
                .chunks
                .iter()
                .filter(|c| c.contains_y(y))
                .any(|c| c.is_lethal_at(x, y))
    }

    /// Picks up an uncollected item at `(x, y)` in a visible chunk.
    pub fn try_collect_item(&mut self, x: i32, y: i32) -> Option<CollectibleKind> {
        let (top, bottom) = self.view_range();
        self.chunks
            .iter_mut()
            .filter(|c| c.is_visible(top, bottom))
            .find_map(|c| c.try_collect(x, y))
    }

    /// Puts a collectible into the farthest visible chunk.
    ///
    /// An item already positioned inside that chunk keeps its position.
    /// Otherwise it goes into a random empty cell. Returns `Ok(false)` if
    /// no chunk is visible or the chunk has no room.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotCollectible`] for obstacles and platforms.
    pub fn place_collectible(&mut self, item: Entity) -> MapResult<bool> {
        if item.collectible_kind().is_none() {
            return Err(MapError::NotCollectible);
        }

        let (top, bottom) = self.view_range();
        let Some(chunk) = self
            .chunks
            .iter_mut()
            .rev()
            .find(|c| c.is_visible(top, bottom))
        else {
            return Ok(false);
        };

        let bounds = item.bounds();
        if chunk.bounds().contains_point(bounds.x, bounds.y)
            && chunk.bounds().contains_point(bounds.right() - 1, bounds.bottom() - 1)
        {
            chunk.add_object(item);
            return Ok(true);
        }
        Ok(placer::place_random(chunk, &mut self.runtime_rng, item))
    }

    /// Snapshot of pool hazards of one kind.
    #[must_use]
    pub fn obstacles_by_kind(&self, kind: ObstacleKind) -> Vec<Entity> {
        self.obstacles.obstacles_by_kind(kind)
    }

    /// Snapshot of every pool hazard.
    #[must_use]
    pub fn all_obstacles(&self) -> Vec<Entity> {
        self.obstacles.active_obstacles()
    }

    /// Rolls every hazard and log back to its spawn position and speed,
    /// and drops the scroll speed and difficulty clock back to their
    /// starting values.
    pub fn reset_obstacles(&mut self) {
        self.obstacles.reset_all();
        for chunk in &mut self.chunks {
            chunk.reset();
        }
        self.scroll_speed = self.config.initial_scroll_speed;
        self.difficulty.reset();
    }

    /// Live hazards a chunk spawned. Pruned ones are skipped.
    #[must_use]
    pub fn chunk_hazards(&self, chunk: &Chunk) -> Vec<Entity> {
        chunk
            .hazard_ids()
            .iter()
            .filter_map(|id| self.obstacles.get(*id).copied())
            .collect()
    }
}
