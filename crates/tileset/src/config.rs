//! Configuration for a tileset.

use serde::{Deserialize, Serialize};

/// Deepest pyramid accepted by [`TilesetConfig::validate`].
pub const MAX_PYRAMID_LEVEL: u32 = 30;

/// Largest tile edge, in pixels, accepted by [`TilesetConfig::validate`].
pub const MAX_TILE_SIZE: usize = 4096;

/// Configuration for a tileset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilesetConfig {
    /// Projection definition, e.g. `"+proj=merc"`.
    pub projection: String,

    /// Pixels per tile edge.
    pub tile_size: usize,

    /// Number of pyramid levels above the source's native resolution.
    pub max_level: u32,

    /// Unprojection-table cells per tile edge.
    pub table_divisions: usize,

    /// Maximum number of rendered tiles kept in memory. `None` keeps all.
    pub cache_count_limit: Option<usize>,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self {
            projection: "+proj=eqc".to_string(),
            tile_size: 256,
            max_level: 8,
            table_divisions: 16,
            cache_count_limit: Some(512),
        }
    }
}

impl TilesetConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TILESET_PROJECTION") {
            if !val.trim().is_empty() {
                config.projection = val;
            }
        }

        if let Ok(val) = std::env::var("TILESET_TILE_SIZE") {
            if let Ok(size) = val.parse() {
                config.tile_size = size;
            }
        }

        if let Ok(val) = std::env::var("TILESET_MAX_LEVEL") {
            if let Ok(level) = val.parse() {
                config.max_level = level;
            }
        }

        if let Ok(val) = std::env::var("TILESET_TABLE_DIVISIONS") {
            if let Ok(divisions) = val.parse() {
                config.table_divisions = divisions;
            }
        }

        if let Ok(val) = std::env::var("TILESET_CACHE_LIMIT") {
            if val.eq_ignore_ascii_case("none") || val == "0" {
                config.cache_count_limit = None;
            } else if let Ok(limit) = val.parse() {
                config.cache_count_limit = Some(limit);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.projection.trim().is_empty() {
            return Err("projection must not be empty".to_string());
        }

        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(format!(
                "tile_size must be between 1 and {}, got {}",
                MAX_TILE_SIZE, self.tile_size
            ));
        }

        if self.table_divisions == 0 {
            return Err("table_divisions must be > 0".to_string());
        }

        if self.max_level > MAX_PYRAMID_LEVEL {
            return Err(format!("max_level must be <= {}", MAX_PYRAMID_LEVEL));
        }

        Ok(())
    }
}
