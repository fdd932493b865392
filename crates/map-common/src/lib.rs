//! Common coordinate types shared across the geotag-map crates.

pub mod bbox;
pub mod coord;
pub mod error;

pub use bbox::Bounds;
pub use coord::{GeoCoordinate, PlanarPoint, PlanarSize};
pub use error::{GeoError, GeoResult};
