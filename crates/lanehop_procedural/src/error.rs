//! # Map Error Types
//!
//! Generation itself never fails: degenerate content is repaired, absent
//! lookups return `None`. What can fail is loading a configuration and a
//! caller handing the map the wrong kind of entity.

use thiserror::Error;

/// Errors produced while loading or validating a [`StreamingConfig`].
///
/// [`StreamingConfig`]: crate::config::StreamingConfig
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document is not valid TOML or has wrong field types.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the map cannot run with.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// Field path, e.g. `generation.road_cars_max`.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors surfaced by the [`GameMap`] API.
///
/// [`GameMap`]: crate::game_map::GameMap
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Configuration rejected at construction.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `place_collectible` was given an obstacle or platform.
    #[error("entity is not a collectible")]
    NotCollectible,
}

/// Result alias for map operations.
pub type MapResult<T> = Result<T, MapError>;

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
