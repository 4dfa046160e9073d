//! # LANEHOP Procedural Map Streaming
//!
//! Endless, deterministic lane-hopping levels.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same map
//! 2. **Chunked**: The world is a stack of fixed-height strips
//! 3. **Streamable**: Strips are generated ahead and retired behind
//! 4. **Crossable**: No strip is accepted without a safe vertical path
//!
//! ## Core Components
//!
//! - `ChunkFactory`: Populates road, railway, river and grass strips
//! - `PathValidator`: BFS over the cell grid, with corridor repair
//! - `MovingObstacleManager`: Shared pool of cars and trains
//! - `GameMap`: Scrolling, buffering, eviction and difficulty
//! - `SpawnScheduler`: Optional timer feeding extra hazards through a channel
//!
//! ## Example
//!
//! ```rust,ignore
//! use lanehop_procedural::{GameMap, StreamingConfig, WorldSeed};
//!
//! let mut map = GameMap::new(StreamingConfig::default(), WorldSeed::new(12345))?;
//!
//! // Once per frame
//! map.update();
//! if map.check_player_collision(400, map.current_position() + 550) {
//!     // game over
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod chunk_factory;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod game_map;
pub mod obstacle_manager;
pub mod obstacles;
pub mod path_validator;
pub mod placer;
pub mod seed;
pub mod spawner;

pub use chunk::{Cell, Chunk, TerrainType};
pub use chunk_factory::ChunkFactory;
pub use config::{GenerationConfig, StreamingConfig};
pub use difficulty::DifficultyClock;
pub use error::{ConfigError, MapError, MapResult};
pub use game_map::{GameMap, MapStats, TickReport};
pub use obstacle_manager::MovingObstacleManager;
pub use obstacles::{Direction, MovingObstacleFactory};
pub use path_validator::{NavigationGrid, PathValidator, Repair, TraversalReport};
pub use seed::{MapRng, WorldSeed};
pub use spawner::{SpawnRequest, SpawnScheduler, SpawnerStats};
