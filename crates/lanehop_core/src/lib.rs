//! # LANEHOP Core
//!
//! Shared world types for the lane-hopping map:
//! - Pixel-space rectangles and collision tests
//! - The closed set of entity kinds (obstacles, platforms, collectibles)
//! - A generational arena for entities that outlive a single chunk
//!
//! ## Architecture Rules
//!
//! 1. **No I/O** - this crate is pure data and arithmetic
//! 2. **Integer pixels** - positions and speeds are `i32`, no float drift
//! 3. **Copy entities** - every entity is a small value type
//!
//! ## Example
//!
//! ```rust,ignore
//! use lanehop_core::{Entity, EntityArena};
//!
//! let mut hazards = EntityArena::new();
//! let id = hazards.insert(Entity::car(0, 120, 2));
//! hazards.get_mut(id).map(|car| car.advance(800));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arena;
pub mod entity;
pub mod geometry;

pub use arena::{EntityArena, EntityId};
pub use entity::{CollectibleKind, Entity, EntityKind, ObstacleKind};
pub use geometry::Rect;
