//! Error types for tileset operations.

use map_common::GeoError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while producing tile pixels.
#[derive(Error, Debug)]
pub enum TilesetError {
    /// No tile content exists at the requested coordinate.
    #[error("no data at ({lon}, {lat})")]
    NoData { lon: f64, lat: f64 },

    /// The request itself is malformed (non-finite coordinate, bad scale).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid tileset configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Projection or unprojection failure.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Tile geometry produced invalid geographic bounds.
    #[error("geometry error: {0}")]
    Geo(#[from] GeoError),

    /// The tile content source failed.
    #[error("tile source error: {0}")]
    Source(String),
}

impl TilesetError {
    /// True when the caller should treat the result as "no imagery here".
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

/// Result type for tileset operations.
pub type Result<T> = std::result::Result<T, TilesetError>;
