//! # Chunk Factory
//!
//! Builds populated chunks for each terrain type.
//!
//! Generation and validation are separate steps: the per-terrain rules
//! place content at random, then the [`PathValidator`] repairs anything
//! that would make the strip uncrossable. Every public constructor runs
//! both steps, so no chunk leaves the factory unvalidated.
//!
//! | Terrain | Hazards                    | Pickups                       |
//! |---------|----------------------------|-------------------------------|
//! | Road    | a set of cars, one lane    | 0..=3, coins favoured 3:1     |
//! | Railway | a set of trains            | rare power-up                 |
//! | River   | water + a log in each lane | sometimes a coin riding a log |
//! | Grass   | 0..=5 trees                | 0..=3, coins favoured 4:1     |

use rand::Rng;

use crate::chunk::{Chunk, TerrainType};
use crate::config::{GenerationConfig, StreamingConfig};
use crate::obstacles::{Direction, MovingObstacleFactory};
use crate::path_validator::{PathValidator, TraversalReport};
use crate::placer;
use crate::seed::{MapRng, WorldSeed};
use lanehop_core::{CollectibleKind, Entity};

/// Builds validated chunks.
#[derive(Clone, Debug)]
pub struct ChunkFactory {
    chunk_height: i32,
    cell_size: i32,
    lane_offset: i32,
    rules: GenerationConfig,
    validator: PathValidator,
    obstacles: MovingObstacleFactory,
}

impl ChunkFactory {
    /// Creates a factory from map settings.
    #[must_use]
    pub fn new(config: &StreamingConfig) -> Self {
        Self {
            chunk_height: config.chunk_height,
            cell_size: config.cell_size,
            lane_offset: config.lane_offset(),
            rules: config.generation.clone(),
            validator: PathValidator::new(config.min_free_path_width),
            obstacles: MovingObstacleFactory::new(config.viewport_width, &config.generation),
        }
    }

    /// Seeds the validator's ladder placement.
    #[must_use]
    pub const fn with_seed(mut self, seed: WorldSeed) -> Self {
        self.validator = self.validator.with_seed(seed);
        self
    }

    /// The validator every chunk goes through.
    #[inline]
    #[must_use]
    pub const fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// The vehicle factory used for roads and railways.
    #[inline]
    #[must_use]
    pub const fn obstacle_factory(&self) -> &MovingObstacleFactory {
        &self.obstacles
    }

    /// Builds the bare grass strip a run starts on.
    #[must_use]
    pub fn create_start_chunk(&self, position: i32, width: i32) -> Chunk {
        self.empty(TerrainType::Grass, position, width)
    }

    /// Builds a chunk of a uniformly random terrain.
    pub fn create_random_chunk(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        self.create_random_chunk_with_report(rng, position, width).0
    }

    /// Builds a chunk of a uniformly random terrain and reports what the
    /// validator did to it.
    pub fn create_random_chunk_with_report(
        &self,
        rng: &mut MapRng,
        position: i32,
        width: i32,
    ) -> (Chunk, TraversalReport) {
        let terrain = TerrainType::ALL[rng.gen_range(0..TerrainType::ALL.len())];
        self.create_chunk_with_report(rng, terrain, position, width)
    }

    /// Builds a chunk of the given terrain.
    pub fn create_chunk(
        &self,
        rng: &mut MapRng,
        terrain: TerrainType,
        position: i32,
        width: i32,
    ) -> Chunk {
        self.create_chunk_with_report(rng, terrain, position, width).0
    }

    /// Builds a chunk of the given terrain and reports what the validator
    /// did to it.
    pub fn create_chunk_with_report(
        &self,
        rng: &mut MapRng,
        terrain: TerrainType,
        position: i32,
        width: i32,
    ) -> (Chunk, TraversalReport) {
        let chunk = match terrain {
            TerrainType::Road => self.populate_road(rng, position, width),
            TerrainType::Railway => self.populate_railway(rng, position, width),
            TerrainType::River => self.populate_river(rng, position, width),
            TerrainType::Grass => self.populate_grass(rng, position, width),
        };
        self.finish(chunk)
    }

    /// Builds a road: one lane of cars plus scattered pickups.
    pub fn create_road_chunk(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        self.create_chunk_with_report(rng, TerrainType::Road, position, width).0
    }

    /// Builds a railway: one track of trains and a rare power-up.
    pub fn create_railway_chunk(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        self.create_chunk_with_report(rng, TerrainType::Railway, position, width).0
    }

    /// Builds a river: a water sheet crossed by drifting logs.
    pub fn create_river_chunk(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        self.create_chunk_with_report(rng, TerrainType::River, position, width).0
    }

    /// Builds grass: a few trees and plenty of coins.
    pub fn create_grass_chunk(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        self.create_chunk_with_report(rng, TerrainType::Grass, position, width).0
    }

    fn populate_road(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        let mut chunk = self.empty(TerrainType::Road, position, width);

        let count = rng.gen_range(self.rules.road_cars_min..=self.rules.road_cars_max);
        let direction = Direction::random(rng);
        for car in self
            .obstacles
            .create_car_set(rng, count, position + self.lane_offset, direction)
        {
            chunk.push_hazard(car);
        }

        let pickups = rng.gen_range(self.rules.collectibles_min..=self.rules.collectibles_max);
        let (coin, power) = (self.rules.road_coin_weight, self.rules.road_powerup_weight);
        placer::place_many(&mut chunk, rng, pickups, |rng| {
            Entity::collectible(weighted_kind(rng, coin, power), 0, 0)
        });

        chunk
    }

    fn populate_railway(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        let mut chunk = self.empty(TerrainType::Railway, position, width);

        let count = rng.gen_range(self.rules.railway_trains_min..=self.rules.railway_trains_max);
        let direction = Direction::random(rng);
        for train in self
            .obstacles
            .create_train_set(rng, count, position + self.lane_offset, direction)
        {
            chunk.push_hazard(train);
        }

        if rng.gen_bool(self.rules.railway_powerup_chance) {
            placer::place_random(
                &mut chunk,
                rng,
                Entity::collectible(CollectibleKind::Invincibility, 0, 0),
            );
        }

        chunk
    }

    /// Each log fills one lane's height so a column of logs stacked across
    /// every lane is a valid crossing on its own.
    fn populate_river(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        let mut chunk = self.empty(TerrainType::River, position, width);
        chunk.add_object(Entity::water(0, position, chunk.width(), chunk.height()));
        if chunk.rows() == 0 || chunk.columns() == 0 {
            return chunk;
        }

        // Every lane gets one log spanning a shared window of columns, so the
        // crossing exists at spawn time. The rest land anywhere.
        let span = self.validator.corridor_columns(&chunk).min(chunk.columns());
        let first = rng.gen_range(0..=chunk.columns() - span) as i32;
        let left = first * self.cell_size;
        let right = (first + span as i32) * self.cell_size;

        let lanes = chunk.rows();
        let count = rng.gen_range(self.rules.river_logs_min..=self.rules.river_logs_max) as usize;
        let mut logs = Vec::with_capacity(count.max(lanes));
        for lane in 0..lanes {
            let log_width = self.log_width(rng, chunk.width()).max(right - left);
            let x = rng.gen_range((right - log_width).max(0)..=left.min(chunk.width() - log_width));
            logs.push(self.log(rng, x, position + lane as i32 * self.cell_size, log_width));
        }
        for _ in lanes..count {
            let lane = rng.gen_range(0..lanes) as i32;
            let log_width = self.log_width(rng, chunk.width());
            let x = rng.gen_range(0..=chunk.width() - log_width);
            logs.push(self.log(rng, x, position + lane * self.cell_size, log_width));
        }
        for log in &logs {
            chunk.add_object(*log);
        }

        if rng.gen_bool(self.rules.river_coin_chance) {
            let mut coin = Entity::collectible(CollectibleKind::Coin, 0, 0);
            coin.ride(&logs[rng.gen_range(0..logs.len())]);
            chunk.add_object(coin);
        }

        chunk
    }

    fn log_width(&self, rng: &mut MapRng, chunk_width: i32) -> i32 {
        rng.gen_range(self.rules.log_width_min..=self.rules.log_width_max)
            .min(chunk_width)
    }

    /// A lane-high log at `(x, y)` drifting at a random speed and heading.
    fn log(&self, rng: &mut MapRng, x: i32, y: i32, width: i32) -> Entity {
        let speed = Direction::random(rng).signed(rng.gen_range(1..=self.rules.log_speed_max));
        Entity::platform(x, y, width, self.cell_size, speed)
    }

    fn populate_grass(&self, rng: &mut MapRng, position: i32, width: i32) -> Chunk {
        let mut chunk = self.empty(TerrainType::Grass, position, width);

        let trees = rng.gen_range(self.rules.grass_trees_min..=self.rules.grass_trees_max);
        let (min, max) = (self.rules.tree_size_min, self.rules.tree_size_max);
        placer::place_many(&mut chunk, rng, trees, |rng| {
            Entity::tree(0, 0, rng.gen_range(min..=max))
        });

        let pickups = rng.gen_range(self.rules.collectibles_min..=self.rules.collectibles_max);
        let (coin, power) = (self.rules.grass_coin_weight, self.rules.grass_powerup_weight);
        placer::place_many(&mut chunk, rng, pickups, |rng| {
            Entity::collectible(weighted_kind(rng, coin, power), 0, 0)
        });

        chunk
    }

    fn empty(&self, terrain: TerrainType, position: i32, width: i32) -> Chunk {
        Chunk::new(terrain, position, width, self.chunk_height, self.cell_size)
    }

    fn finish(&self, mut chunk: Chunk) -> (Chunk, TraversalReport) {
        let report = self.validator.ensure_traversability(&mut chunk);
        tracing::debug!(
            terrain = ?chunk.terrain(),
            position = chunk.position(),
            hazards = chunk.pending_hazards().len(),
            repair = ?report.repair,
            "chunk generated"
        );
        (chunk, report)
    }
}

fn weighted_kind(rng: &mut MapRng, coin_weight: u32, power_weight: u32) -> CollectibleKind {
    let total = u64::from(coin_weight) + u64::from(power_weight);
    if total == 0 || rng.gen_range(0..total) < u64::from(coin_weight) {
        CollectibleKind::Coin
    } else {
        CollectibleKind::Invincibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_validator::Repair;
    use lanehop_core::ObstacleKind;

    fn factory() -> ChunkFactory {
        ChunkFactory::new(&StreamingConfig::default())
    }

    #[test]
    fn test_road_has_one_lane_of_cars() {
        let f = factory();
        let mut rng = WorldSeed::new(11).rng();
        for i in 0..50 {
            let chunk = f.create_road_chunk(&mut rng, i * 120, 800);
            let cars = chunk.pending_hazards();
            assert!((1..=4).contains(&cars.len()));
            let lane = cars[0].y();
            let direction = cars[0].speed().signum();
            for car in cars {
                assert_eq!(car.obstacle_kind(), Some(ObstacleKind::Car));
                assert_eq!(car.y(), lane);
                assert_eq!(car.speed().signum(), direction);
            }
            assert!(chunk.contains_y(lane));
        }
    }

    #[test]
    fn test_railway_has_trains() {
        let f = factory();
        let mut rng = WorldSeed::new(12).rng();
        for _ in 0..50 {
            let chunk = f.create_railway_chunk(&mut rng, 0, 800);
            assert!((1..=2).contains(&chunk.pending_hazards().len()));
            assert!(chunk
                .entities()
                .all(|e| e.collectible_kind() != Some(CollectibleKind::Coin)));
        }
    }

    #[test]
    fn test_river_is_water_with_platforms() {
        let f = factory();
        let mut rng = WorldSeed::new(13).rng();
        for _ in 0..50 {
            let chunk = f.create_river_chunk(&mut rng, 360, 800);
            assert!(chunk
                .objects()
                .iter()
                .any(|e| e.obstacle_kind() == Some(ObstacleKind::Water)));
            assert!(chunk.objects().iter().filter(|e| e.is_platform()).count() >= 2);
            assert!(chunk.pending_hazards().is_empty());
        }
    }

    #[test]
    fn test_river_logs_cross_without_repair() {
        let f = factory();
        let mut rng = WorldSeed::new(7).rng();
        let mut untouched = 0;
        let mut coins = 0;
        for i in 0..1000 {
            let (chunk, report) =
                f.create_chunk_with_report(&mut rng, TerrainType::River, i * 120, 800);
            if report.repair == Repair::None {
                untouched += 1;
            }
            for coin in chunk.objects().iter().filter(|e| e.collectible_kind().is_some()) {
                assert!(coin.is_riding());
                coins += 1;
            }
        }
        println!("untouched rivers: {untouched}/1000, coins: {coins}");
        assert_eq!(untouched, 1000);
        assert!((400..=600).contains(&coins));
    }

    #[test]
    fn test_river_coin_stays_on_its_log() {
        let f = factory();
        let mut rng = WorldSeed::new(8).rng();
        let mut chunk = (0..100)
            .map(|_| f.create_river_chunk(&mut rng, 0, 800))
            .find(|c| c.objects().iter().any(Entity::is_riding))
            .unwrap();

        for _ in 0..500 {
            chunk.update(800);
            let coin = chunk.objects().iter().find(|e| e.is_riding()).unwrap();
            let (cx, cy) = (coin.x() + coin.width() / 2, coin.y() + coin.height() / 2);
            assert!(chunk
                .objects()
                .iter()
                .any(|e| e.is_platform() && e.contains_point(cx, cy)));
            if (0..800).contains(&cx) {
                assert!(!chunk.is_lethal_at(cx, cy));
            }
        }
    }

    #[test]
    fn test_grass_tree_count_bounded() {
        let f = factory();
        let mut rng = WorldSeed::new(14).rng();
        for _ in 0..50 {
            let chunk = f.create_grass_chunk(&mut rng, 0, 800);
            let trees = chunk
                .entities()
                .filter(|e| e.obstacle_kind() == Some(ObstacleKind::Tree))
                .count();
            let pickups = chunk
                .entities()
                .filter(|e| e.collectible_kind().is_some())
                .count();
            assert!(trees <= 5);
            assert!(pickups <= 3);
        }
    }

    #[test]
    fn test_start_chunk_is_bare_grass() {
        let chunk = factory().create_start_chunk(0, 800);
        assert_eq!(chunk.terrain(), TerrainType::Grass);
        assert_eq!(chunk.entities().count(), 0);
    }

    #[test]
    fn test_random_chunk_covers_every_terrain() {
        let f = factory();
        let mut rng = WorldSeed::new(15).rng();
        let mut seen = [false; 4];
        for i in 0..200 {
            let chunk = f.create_random_chunk(&mut rng, i * 120, 800);
            seen[chunk.terrain() as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_weighted_kind_extremes() {
        let mut rng = WorldSeed::new(16).rng();
        assert!((0..100).all(|_| weighted_kind(&mut rng, 1, 0) == CollectibleKind::Coin));
        assert!(
            (0..100).all(|_| weighted_kind(&mut rng, 0, 1) == CollectibleKind::Invincibility)
        );
        // Weights near the top of the range still pick without overflowing.
        let kinds: Vec<_> = (0..100)
            .map(|_| weighted_kind(&mut rng, u32::MAX, u32::MAX))
            .collect();
        assert!(kinds.contains(&CollectibleKind::Coin));
        assert!(kinds.contains(&CollectibleKind::Invincibility));
    }
}
