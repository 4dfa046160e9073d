//! # Streaming Configuration
//!
//! The compile-time constants below are the source of truth. A
//! [`StreamingConfig`] is built from them and can be partially overridden
//! from a TOML document at startup:
//!
//! ```toml
//! buffer_chunks = 6
//! max_scroll_speed = 8
//!
//! [generation]
//! road_cars_max = 3
//! ```
//!
//! Any field left out keeps its default. The result is always checked
//! with [`StreamingConfig::validate`] before a map accepts it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use lanehop_core::Entity;

/// Default viewport width in pixels. Chunks span the full width.
pub const VIEWPORT_WIDTH: i32 = 800;
/// Default viewport height in pixels.
pub const VIEWPORT_HEIGHT: i32 = 600;
/// Height of one chunk strip.
pub const CHUNK_HEIGHT: i32 = 120;
/// Side length of one grid cell.
pub const CELL_SIZE: i32 = 40;
/// Chunks kept generated ahead of the scroll position.
pub const BUFFER_CHUNKS: u32 = 5;
/// Scroll speed at the start of a run.
pub const INITIAL_SCROLL_SPEED: i32 = 1;
/// Scroll speed ceiling.
pub const MAX_SCROLL_SPEED: i32 = 10;
/// Pixels around the viewport in which hazards stay alive.
pub const OFFSCREEN_MARGIN: i32 = 200;
/// Narrowest corridor a player fits through.
pub const MIN_FREE_PATH_WIDTH: i32 = 80;
/// Ticks between automatic difficulty steps (30 s at 60 Hz).
pub const DIFFICULTY_INTERVAL_TICKS: u64 = 1_800;
/// Spawn requests served per tick at most.
pub const SPAWN_DRAIN_LIMIT: usize = 8;

/// Map-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Viewport (and chunk) width in pixels.
    pub viewport_width: i32,
    /// Viewport height in pixels.
    pub viewport_height: i32,
    /// Height of each chunk strip.
    pub chunk_height: i32,
    /// Grid cell size. Must divide both the width and the chunk height.
    pub cell_size: i32,
    /// Chunks kept generated ahead of the scroll position.
    pub buffer_chunks: u32,
    /// Scroll speed at the start of a run.
    pub initial_scroll_speed: i32,
    /// Scroll speed ceiling.
    pub max_scroll_speed: i32,
    /// Scroll speed added per difficulty step.
    pub scroll_speed_step: i32,
    /// Hazard speed magnitude added per difficulty step.
    pub obstacle_speed_step: i32,
    /// Pixels above and below the viewport in which hazards stay alive.
    pub offscreen_margin: i32,
    /// Narrowest corridor a player fits through.
    pub min_free_path_width: i32,
    /// Ticks between automatic difficulty steps. Zero disables them.
    pub difficulty_interval_ticks: u64,
    /// Spawn requests served per tick at most.
    pub spawn_drain_limit: usize,
    /// Per-terrain density rules.
    pub generation: GenerationConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            chunk_height: CHUNK_HEIGHT,
            cell_size: CELL_SIZE,
            buffer_chunks: BUFFER_CHUNKS,
            initial_scroll_speed: INITIAL_SCROLL_SPEED,
            max_scroll_speed: MAX_SCROLL_SPEED,
            scroll_speed_step: 1,
            obstacle_speed_step: 1,
            offscreen_margin: OFFSCREEN_MARGIN,
            min_free_path_width: MIN_FREE_PATH_WIDTH,
            difficulty_interval_ticks: DIFFICULTY_INTERVAL_TICKS,
            spawn_drain_limit: SPAWN_DRAIN_LIMIT,
            generation: GenerationConfig::default(),
        }
    }
}

/// Per-terrain density rules used by the chunk factory.
///
/// Ranges are inclusive. Weights pick between coin and power-up when a
/// collectible is placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Fewest cars per road chunk.
    pub road_cars_min: u32,
    /// Most cars per road chunk.
    pub road_cars_max: u32,
    /// Minimum distance between car origins in one set.
    pub car_min_gap: i32,
    /// Slowest car speed magnitude.
    pub car_speed_min: i32,
    /// Fastest car speed magnitude.
    pub car_speed_max: i32,
    /// Fewest trains per railway chunk.
    pub railway_trains_min: u32,
    /// Most trains per railway chunk.
    pub railway_trains_max: u32,
    /// Minimum distance between train origins in one set.
    pub train_min_gap: i32,
    /// Slowest train speed magnitude.
    pub train_speed_min: i32,
    /// Fastest train speed magnitude.
    pub train_speed_max: i32,
    /// Chance of one power-up on a railway chunk.
    pub railway_powerup_chance: f64,
    /// Fewest logs per river chunk.
    pub river_logs_min: u32,
    /// Most logs per river chunk.
    pub river_logs_max: u32,
    /// Narrowest log.
    pub log_width_min: i32,
    /// Widest log.
    pub log_width_max: i32,
    /// Fastest log speed magnitude.
    pub log_speed_max: i32,
    /// Chance of a coin riding on one log.
    pub river_coin_chance: f64,
    /// Fewest trees per grass chunk.
    pub grass_trees_min: u32,
    /// Most trees per grass chunk.
    pub grass_trees_max: u32,
    /// Smallest tree side.
    pub tree_size_min: i32,
    /// Largest tree side.
    pub tree_size_max: i32,
    /// Fewest collectibles per road or grass chunk.
    pub collectibles_min: u32,
    /// Most collectibles per road or grass chunk.
    pub collectibles_max: u32,
    /// Coin weight on roads.
    pub road_coin_weight: u32,
    /// Power-up weight on roads.
    pub road_powerup_weight: u32,
    /// Coin weight on grass.
    pub grass_coin_weight: u32,
    /// Power-up weight on grass.
    pub grass_powerup_weight: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            road_cars_min: 2,
            road_cars_max: 4,
            car_min_gap: 100,
            car_speed_min: 1,
            car_speed_max: 3,
            railway_trains_min: 1,
            railway_trains_max: 2,
            train_min_gap: 300,
            train_speed_min: 2,
            train_speed_max: 5,
            railway_powerup_chance: 0.25,
            river_logs_min: 2,
            river_logs_max: 4,
            log_width_min: 80,
            log_width_max: 119,
            log_speed_max: 2,
            river_coin_chance: 0.5,
            grass_trees_min: 0,
            grass_trees_max: 5,
            tree_size_min: 30,
            tree_size_max: 49,
            collectibles_min: 0,
            collectibles_max: 3,
            road_coin_weight: 3,
            road_powerup_weight: 1,
            grass_coin_weight: 4,
            grass_powerup_weight: 1,
        }
    }
}

impl StreamingConfig {
    /// Parses a TOML override document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values the map cannot run with.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of cell columns per chunk.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        (self.viewport_width / self.cell_size) as usize
    }

    /// Number of cell rows per chunk.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        (self.chunk_height / self.cell_size) as usize
    }

    /// Vertical offset of a vehicle lane inside its chunk.
    #[inline]
    #[must_use]
    pub const fn lane_offset(&self) -> i32 {
        (self.chunk_height - Entity::VEHICLE_HEIGHT) / 2
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("viewport_width", self.viewport_width)?;
        positive("viewport_height", self.viewport_height)?;
        positive("chunk_height", self.chunk_height)?;
        positive("cell_size", self.cell_size)?;
        positive("initial_scroll_speed", self.initial_scroll_speed)?;
        positive("min_free_path_width", self.min_free_path_width)?;

        if self.viewport_width % self.cell_size != 0 {
            return Err(ConfigError::invalid(
                "viewport_width",
                format!("must be a multiple of cell_size ({})", self.cell_size),
            ));
        }
        if self.chunk_height % self.cell_size != 0 {
            return Err(ConfigError::invalid(
                "chunk_height",
                format!("must be a multiple of cell_size ({})", self.cell_size),
            ));
        }
        if self.columns() < 2 {
            return Err(ConfigError::invalid(
                "viewport_width",
                "must hold at least two cell columns",
            ));
        }
        if self.chunk_height < Entity::VEHICLE_HEIGHT {
            return Err(ConfigError::invalid(
                "chunk_height",
                format!("must fit a vehicle ({} px)", Entity::VEHICLE_HEIGHT),
            ));
        }
        if self.buffer_chunks == 0 {
            return Err(ConfigError::invalid("buffer_chunks", "must be at least 1"));
        }
        if self.max_scroll_speed < self.initial_scroll_speed {
            return Err(ConfigError::invalid(
                "max_scroll_speed",
                format!(
                    "{} is below initial_scroll_speed {}",
                    self.max_scroll_speed, self.initial_scroll_speed
                ),
            ));
        }
        if self.max_scroll_speed >= self.chunk_height {
            return Err(ConfigError::invalid(
                "max_scroll_speed",
                "must be below chunk_height",
            ));
        }
        if self.scroll_speed_step < 0 || self.obstacle_speed_step < 0 {
            return Err(ConfigError::invalid(
                "scroll_speed_step",
                "speed steps must not be negative",
            ));
        }
        if self.offscreen_margin < 0 {
            return Err(ConfigError::invalid("offscreen_margin", "must not be negative"));
        }
        if self.min_free_path_width > self.viewport_width {
            return Err(ConfigError::invalid(
                "min_free_path_width",
                format!("exceeds viewport_width {}", self.viewport_width),
            ));
        }

        // The farthest lane generated must still be inside the keep-alive
        // band, otherwise its hazards are pruned the tick they appear.
        let farthest_lane =
            (i64::from(self.buffer_chunks) + 1) * i64::from(self.chunk_height)
                + i64::from(self.lane_offset());
        let band_end = i64::from(self.viewport_height) + i64::from(self.offscreen_margin);
        if farthest_lane > band_end {
            return Err(ConfigError::invalid(
                "offscreen_margin",
                format!(
                    "lanes are generated up to {farthest_lane} px ahead but hazards are kept only up to {band_end} px"
                ),
            ));
        }

        self.generation.validate()
    }
}

impl GenerationConfig {
    /// Checks that every range is ordered and every weight usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ordered("generation.road_cars_max", self.road_cars_min, self.road_cars_max)?;
        ordered(
            "generation.railway_trains_max",
            self.railway_trains_min,
            self.railway_trains_max,
        )?;
        ordered("generation.river_logs_max", self.river_logs_min, self.river_logs_max)?;
        ordered("generation.grass_trees_max", self.grass_trees_min, self.grass_trees_max)?;
        ordered(
            "generation.collectibles_max",
            self.collectibles_min,
            self.collectibles_max,
        )?;
        ordered("generation.car_speed_max", self.car_speed_min, self.car_speed_max)?;
        ordered("generation.train_speed_max", self.train_speed_min, self.train_speed_max)?;
        ordered("generation.log_width_max", self.log_width_min, self.log_width_max)?;
        ordered("generation.tree_size_max", self.tree_size_min, self.tree_size_max)?;

        positive("generation.car_speed_min", self.car_speed_min)?;
        positive("generation.train_speed_min", self.train_speed_min)?;
        positive("generation.log_speed_max", self.log_speed_max)?;
        positive("generation.log_width_min", self.log_width_min)?;
        positive("generation.tree_size_min", self.tree_size_min)?;
        positive("generation.car_min_gap", self.car_min_gap)?;
        positive("generation.train_min_gap", self.train_min_gap)?;

        probability("generation.railway_powerup_chance", self.railway_powerup_chance)?;
        probability("generation.river_coin_chance", self.river_coin_chance)?;

        if u64::from(self.road_coin_weight) + u64::from(self.road_powerup_weight) == 0 {
            return Err(ConfigError::invalid(
                "generation.road_coin_weight",
                "road weights must not both be zero",
            ));
        }
        if u64::from(self.grass_coin_weight) + u64::from(self.grass_powerup_weight) == 0 {
            return Err(ConfigError::invalid(
                "generation.grass_coin_weight",
                "grass weights must not both be zero",
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: i32) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn ordered<T: PartialOrd + std::fmt::Display>(
    field: &'static str,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{max} is below its minimum {min}")))
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is not in 0..=1")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StreamingConfig::default();
        config.validate().unwrap();
        assert_eq!(config.columns(), 20);
        assert_eq!(config.rows(), 3);
        assert_eq!(config.lane_offset(), 40);
    }

    #[test]
    fn test_partial_override() {
        let config = StreamingConfig::from_toml_str(
            r#"
            max_scroll_speed = 8

            [generation]
            road_cars_max = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.max_scroll_speed, 8);
        assert_eq!(config.generation.road_cars_max, 3);
        assert_eq!(config.viewport_width, VIEWPORT_WIDTH);
        assert_eq!(config.generation.road_cars_min, 2);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(
            StreamingConfig::from_toml_str("").unwrap(),
            StreamingConfig::default()
        );
    }

    #[test]
    fn test_malformed_toml() {
        let err = StreamingConfig::from_toml_str("buffer_chunks = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let err = StreamingConfig::from_toml_str("buffer_chunks = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "buffer_chunks",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = StreamingConfig::from_toml_str(
            "[generation]\nroad_cars_min = 5\nroad_cars_max = 2",
        )
        .unwrap_err();
        println!("{err}");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "generation.road_cars_max",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_cell_size_not_dividing_height() {
        let err = StreamingConfig::from_toml_str("cell_size = 50").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_extreme_weights_do_not_overflow() {
        let config = StreamingConfig::from_toml_str(
            "[generation]\nroad_coin_weight = 4294967295\nroad_powerup_weight = 1",
        )
        .unwrap();
        assert_eq!(config.generation.road_coin_weight, u32::MAX);

        let err = StreamingConfig::from_toml_str(
            "[generation]\ngrass_coin_weight = 0\ngrass_powerup_weight = 0",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "generation.grass_coin_weight",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_margin_too_small_for_buffer() {
        let err = StreamingConfig::from_toml_str("buffer_chunks = 9").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "offscreen_margin",
                ..
            }
        ));
    }
}
