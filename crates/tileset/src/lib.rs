//! Cached, reprojected map tiles.
//!
//! A [`Tileset`] turns a plate-carrée [`TileSource`] into tiles in any
//! supported projection, answering pixel requests for a geographic
//! coordinate at a given degrees-per-pixel.
//!
//! # Example
//!
//! ```
//! use map_common::GeoCoordinate;
//! use tileset::{RasterSource, Tileset, TilesetConfig};
//!
//! // 4x2 world image, 90 degrees per pixel, 1 byte per pixel
//! let source = RasterSource::world(4, 2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
//! let config = TilesetConfig { tile_size: 4, max_level: 2, ..Default::default() };
//! let mut tileset = Tileset::new(config, source).unwrap();
//!
//! assert_eq!(tileset.minimum_degrees_per_pixel(), 90.0);
//! let pixel = tileset.pixel_for_coordinate(GeoCoordinate::new(100.0, 45.0), 90.0).unwrap();
//! assert_eq!(pixel, vec![4]);
//! ```

pub mod config;
pub mod error;
pub mod source;
pub mod tile;
pub mod tileset;

pub use config::TilesetConfig;
pub use error::{Result, TilesetError};
pub use source::{RasterSource, SourceRaster, SourceRequest, TileSource};
pub use tile::{TileKey, TilePyramid};
pub use tileset::{RenderedTile, Tileset};
