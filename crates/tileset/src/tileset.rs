//! Reprojected, cached map tiles.
//!
//! A request for a coordinate at some degrees-per-pixel is mapped to a tile
//! of the pyramid. Tiles are rendered on first use and kept in a
//! [`Cache`]:
//!
//! 1. Clip the tile to the projected world and unproject its corners
//! 2. Fetch source pixels for the part of that region the source covers
//! 3. Build one [`UnprojectionTable`] for the tile
//! 4. Fill every pixel row in parallel by unprojecting pixel centres
//!    through the table and sampling the nearest source pixel
//!
//! Pixels whose footprint misses the source coverage stay zero.

use crate::config::TilesetConfig;
use crate::error::{Result, TilesetError};
use crate::source::{SourceRaster, SourceRequest, TileSource};
use crate::tile::{TileKey, TilePyramid};
use cache::{Cache, CacheStats};
use map_common::{Bounds, GeoCoordinate, PlanarPoint, PlanarSize};
use projection::{MapProjection, Projection, UnprojectionTable};
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An immutable rendered tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTile {
    pub key: TileKey,
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
    /// Pixel bytes, row 0 at the northern edge
    pub data: Vec<u8>,
    /// Planar corners of the full tile
    pub planar_min: PlanarPoint,
    pub planar_max: PlanarPoint,
    /// Pixels that received source content
    mask: Vec<bool>,
}

impl RenderedTile {
    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * self.bytes_per_pixel
    }

    /// Count pixels with content.
    pub fn valid_pixels(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn is_mapped(&self, col: usize, row: usize) -> bool {
        col < self.width && row < self.height && self.mask[row * self.width + col]
    }

    /// Bytes of a pixel with content.
    pub fn pixel(&self, col: usize, row: usize) -> Option<&[u8]> {
        if !self.is_mapped(col, row) {
            return None;
        }
        let offset = row * self.stride() + col * self.bytes_per_pixel;
        Some(&self.data[offset..offset + self.bytes_per_pixel])
    }

    /// (col, row) of the pixel containing a planar point, clamped onto the
    /// tile.
    pub fn pixel_index_for_point(&self, point: PlanarPoint) -> (usize, usize) {
        let size = (self.planar_max.x - self.planar_min.x) / self.width as f64;
        let col = ((point.x - self.planar_min.x) / size).floor();
        let row = ((self.planar_max.y - point.y) / size).floor();
        (
            (col.max(0.0) as usize).min(self.width - 1),
            (row.max(0.0) as usize).min(self.height - 1),
        )
    }
}

/// Tiles for one source in one projection.
///
/// Rendering mutates the cache, so requests take `&mut self`. Share a
/// tileset between threads behind a `Mutex`.
pub struct Tileset<S> {
    config: TilesetConfig,
    projection: Projection,
    pyramid: TilePyramid,
    source: S,
    cache: Cache<TileKey, Arc<RenderedTile>>,
}

impl<S: TileSource> Tileset<S> {
    /// Create a tileset with a cache sized from `config`.
    pub fn new(config: TilesetConfig, source: S) -> Result<Self> {
        let cache = match config.cache_count_limit.and_then(NonZeroUsize::new) {
            Some(limit) => Cache::with_count_limit(limit),
            None => Cache::new(),
        };
        Self::with_cache(config, source, cache)
    }

    /// Create a tileset around an existing cache.
    pub fn with_cache(
        config: TilesetConfig,
        source: S,
        cache: Cache<TileKey, Arc<RenderedTile>>,
    ) -> Result<Self> {
        config.validate().map_err(TilesetError::Config)?;

        let projection = Projection::from_definition(&config.projection)?;
        if projection.central_meridian() != 0.0 {
            return Err(TilesetError::Config(format!(
                "projection '{}' must be centred on the prime meridian",
                config.projection
            )));
        }

        let native = source.native_degrees_per_pixel();
        if !native.is_finite() || native <= 0.0 {
            return Err(TilesetError::Config(format!(
                "source resolution must be positive, got {} degrees per pixel",
                native
            )));
        }
        if source.bytes_per_pixel() == 0 {
            return Err(TilesetError::Config(
                "source bytes_per_pixel must be > 0".to_string(),
            ));
        }

        let pyramid = TilePyramid::new(
            native,
            config.max_level,
            config.tile_size,
            projection.radius(),
            projection.planar_extent(),
        );

        info!(
            projection = %config.projection,
            tile_size = config.tile_size,
            max_level = config.max_level,
            native_dpp = native,
            cache_limit = ?cache.count_limit(),
            "Created tileset"
        );

        Ok(Self {
            config,
            projection,
            pyramid,
            source,
            cache,
        })
    }

    /// Finest resolution the source supports.
    pub fn minimum_degrees_per_pixel(&self) -> f64 {
        self.pyramid.degrees_per_pixel(self.pyramid.max_level())
    }

    /// Stride of one pixel in tile buffers.
    pub fn bytes_per_pixel(&self) -> usize {
        self.source.bytes_per_pixel()
    }

    /// Pyramid level used for a requested degrees-per-pixel.
    pub fn level_for_scale(&self, degrees_per_pixel: f64) -> u32 {
        self.pyramid.level_for_scale(degrees_per_pixel)
    }

    /// Key of the tile holding `coordinate` at `degrees_per_pixel`.
    pub fn tile_key_for(&self, coordinate: GeoCoordinate, degrees_per_pixel: f64) -> Result<TileKey> {
        self.locate(coordinate, degrees_per_pixel).map(|(_, key)| key)
    }

    /// The tile holding `coordinate`, rendered on first request.
    pub fn tile_for_coordinate(
        &mut self,
        coordinate: GeoCoordinate,
        degrees_per_pixel: f64,
    ) -> Result<Arc<RenderedTile>> {
        let (_, key) = self.locate(coordinate, degrees_per_pixel)?;
        self.tile(key)
    }

    /// Copy of the pixel representing `coordinate` at `degrees_per_pixel`.
    ///
    /// Fails with [`TilesetError::NoData`] outside the source coverage or
    /// the projection's latitude limit.
    pub fn pixel_for_coordinate(
        &mut self,
        coordinate: GeoCoordinate,
        degrees_per_pixel: f64,
    ) -> Result<Vec<u8>> {
        let (point, key) = self.locate(coordinate, degrees_per_pixel)?;
        let tile = self.tile(key)?;
        let (col, row) = tile.pixel_index_for_point(point);
        tile.pixel(col, row)
            .map(<[u8]>::to_vec)
            .ok_or(TilesetError::NoData {
                lon: coordinate.lon,
                lat: coordinate.lat,
            })
    }

    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    /// Number of rendered tiles held.
    pub fn cached_tiles(&self) -> usize {
        self.cache.len()
    }

    /// Change or disable (`None`/`Some(0)`) the tile cache limit.
    pub fn set_cache_count_limit(&mut self, limit: Option<usize>) {
        self.cache
            .set_count_limit(limit.and_then(NonZeroUsize::new));
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn config(&self) -> &TilesetConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validate a request and find its planar point and tile.
    fn locate(
        &self,
        coordinate: GeoCoordinate,
        degrees_per_pixel: f64,
    ) -> Result<(PlanarPoint, TileKey)> {
        if !coordinate.is_finite() {
            return Err(TilesetError::InvalidRequest(format!(
                "coordinate ({}, {}) is not finite",
                coordinate.lon, coordinate.lat
            )));
        }
        if !degrees_per_pixel.is_finite() || degrees_per_pixel <= 0.0 {
            return Err(TilesetError::InvalidRequest(format!(
                "degrees per pixel must be positive, got {}",
                degrees_per_pixel
            )));
        }

        let coverage = self.source.coverage();
        let mut normalized = coordinate.normalized();
        // +180 wraps to -180; keep it on the east edge for coverage ending there
        if normalized.lon == -180.0 && !coverage.contains(&normalized) {
            normalized.lon = 180.0;
        }
        if normalized.lat.abs() > self.projection.latitude_limit()
            || !coverage.contains(&normalized)
        {
            return Err(TilesetError::NoData {
                lon: coordinate.lon,
                lat: coordinate.lat,
            });
        }

        let level = self.pyramid.level_for_scale(degrees_per_pixel);
        let point = self
            .pyramid
            .clamp_to_world(level, self.projection.forward(normalized)?);
        Ok((point, self.pyramid.key_for_point(level, point)))
    }

    fn tile(&mut self, key: TileKey) -> Result<Arc<RenderedTile>> {
        if let Some(tile) = self.cache.get(&key) {
            return Ok(Arc::clone(tile));
        }

        let tile = Arc::new(self.render(key)?);
        self.cache.set(key, Arc::clone(&tile));
        Ok(tile)
    }

    fn render(&self, key: TileKey) -> Result<RenderedTile> {
        let size = self.pyramid.tile_size();
        let bpp = self.source.bytes_per_pixel();
        let (planar_min, planar_max) = self.pyramid.tile_rect(&key);

        let len = size
            .checked_mul(size)
            .and_then(|n| n.checked_mul(bpp))
            .ok_or_else(|| {
                TilesetError::Config(format!(
                    "tile of {} x {} pixels at {} bytes per pixel is too large",
                    size, size, bpp
                ))
            })?;
        let mut data = vec![0u8; len];
        let mut mask = vec![false; size * size];

        if let Some((lo, hi)) = self.pyramid.clip_to_world(&key) {
            let sw = self.projection.inverse(lo)?;
            let ne = self.projection.inverse(hi)?;
            let tile_bounds = Bounds::new(sw.lon, sw.lat, ne.lon, ne.lat)?;
            let coverage = self.source.coverage();

            if let Some(fetch_bounds) = overlap(&tile_bounds, &coverage) {
                let raster = self.source.fetch(&SourceRequest {
                    bounds: fetch_bounds,
                    degrees_per_pixel: self.pyramid.degrees_per_pixel(key.level),
                })?;
                if raster.bytes_per_pixel != bpp {
                    return Err(TilesetError::Source(format!(
                        "source returned {} bytes per pixel, expected {}",
                        raster.bytes_per_pixel, bpp
                    )));
                }

                // Fit whole cells to the clipped rectangle so the last
                // nodes sit on its edges rather than past a pole
                let nominal =
                    self.pyramid.tile_span(key.level) / self.config.table_divisions as f64;
                let fit = |extent: f64| extent / (extent / nominal).ceil().max(1.0);
                let spacing = PlanarSize::new(fit(hi.x - lo.x), fit(hi.y - lo.y));
                let table = UnprojectionTable::build(&tile_bounds, spacing, &self.projection)?;

                let (domain_min, domain_max) = (table.origin(), table.domain_max());
                let sampler = PixelSampler {
                    table: &table,
                    raster: &raster,
                    coverage,
                    lo,
                    hi,
                    domain_min,
                    domain_max,
                    half_pixel: self.pyramid.pixel_size(key.level) / 2.0,
                };

                data.par_chunks_mut(size * bpp)
                    .zip(mask.par_chunks_mut(size))
                    .enumerate()
                    .for_each(|(row, (row_data, row_mask))| {
                        let y = planar_max.y - (2 * row + 1) as f64 * sampler.half_pixel;
                        for col in 0..size {
                            let x = planar_min.x + (2 * col + 1) as f64 * sampler.half_pixel;
                            if let Some(pixel) = sampler.sample(x, y) {
                                row_data[col * bpp..(col + 1) * bpp].copy_from_slice(pixel);
                                row_mask[col] = true;
                            }
                        }
                    });

                debug!(
                    tile = %key,
                    fetched_cols = raster.width,
                    fetched_rows = raster.height,
                    table_nodes = table.table_width() * table.table_length(),
                    "Rendered tile"
                );
            }
        }

        let tile = RenderedTile {
            key,
            width: size,
            height: size,
            bytes_per_pixel: bpp,
            data,
            planar_min,
            planar_max,
            mask,
        };

        if tile.valid_pixels() == 0 {
            warn!(tile = %key, "Rendered tile has no source content");
        }

        Ok(tile)
    }
}

/// Per-tile state for filling pixels.
struct PixelSampler<'a> {
    table: &'a UnprojectionTable,
    raster: &'a SourceRaster,
    coverage: Bounds,
    /// Tile rectangle clipped to the world
    lo: PlanarPoint,
    hi: PlanarPoint,
    /// Planar rectangle the table answers for
    domain_min: PlanarPoint,
    domain_max: PlanarPoint,
    half_pixel: f64,
}

impl PixelSampler<'_> {
    /// Source bytes for the pixel centred at (x, y), or None when the
    /// pixel's footprint misses the coverage.
    fn sample(&self, x: f64, y: f64) -> Option<&[u8]> {
        if x < self.lo.x || x > self.hi.x || y < self.lo.y || y > self.hi.y {
            return None;
        }

        let at = |px: f64, py: f64| {
            self.table
                .coordinate_for_point(PlanarPoint::new(
                    px.clamp(self.domain_min.x, self.domain_max.x),
                    py.clamp(self.domain_min.y, self.domain_max.y),
                ))
                .ok()
        };
        let center = at(x, y)?;
        let west = at(x - self.half_pixel, y)?;
        let east = at(x + self.half_pixel, y)?;
        let south = at(x, y - self.half_pixel)?;
        let north = at(x, y + self.half_pixel)?;

        let overlaps = east.lon >= self.coverage.min.lon
            && west.lon <= self.coverage.max.lon
            && north.lat >= self.coverage.min.lat
            && south.lat <= self.coverage.max.lat;

        overlaps.then(|| self.raster.sample(center))
    }
}

/// Intersection of two bounds, edges included.
fn overlap(a: &Bounds, b: &Bounds) -> Option<Bounds> {
    Bounds::new(
        a.min.lon.max(b.min.lon),
        a.min.lat.max(b.min.lat),
        a.max.lon.min(b.max.lon),
        a.max.lat.min(b.max.lat),
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RasterSource;
    use test_utils::{create_position_raster, RGBA_BYTES};

    fn world_tileset(max_level: u32, tile_size: usize) -> Tileset<RasterSource> {
        let source =
            RasterSource::world(360, 180, RGBA_BYTES, create_position_raster(360, 180)).unwrap();
        let config = TilesetConfig {
            max_level,
            tile_size,
            ..Default::default()
        };
        Tileset::new(config, source).unwrap()
    }

    #[test]
    fn test_overlap_inclusive() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = Bounds::new(10.0, 0.0, 20.0, 10.0).unwrap();
        let edge = overlap(&a, &b).unwrap();
        assert_eq!(edge.width(), 0.0);
        let c = Bounds::new(11.0, 0.0, 20.0, 10.0).unwrap();
        assert!(overlap(&a, &c).is_none());
    }

    #[test]
    fn test_pixel_matches_source() {
        let mut tileset = world_tileset(0, 64);
        let pixel = tileset
            .pixel_for_coordinate(GeoCoordinate::new(0.5, -0.5), 1.0)
            .unwrap();
        assert_eq!(pixel, vec![180, 90, 0, 255]);

        let pixel = tileset
            .pixel_for_coordinate(GeoCoordinate::new(-179.5, 89.5), 1.0)
            .unwrap();
        assert_eq!(pixel, vec![0, 0, 0, 255]);
    }

    #[test]
    fn test_tile_is_north_up() {
        let mut tileset = world_tileset(0, 64);
        let tile = tileset
            .tile_for_coordinate(GeoCoordinate::new(10.0, 10.0), 1.0)
            .unwrap();
        assert_eq!(tile.key, TileKey::new(0, 0, 0));
        assert_eq!(tile.stride(), 64 * RGBA_BYTES);
        // Top-left pixel is (0.5°, 63.5°): source row 26
        assert_eq!(tile.pixel(0, 0), Some(&[180, 26, 0, 255][..]));
        // Bottom-left pixel is (0.5°, 0.5°): source row 89
        assert_eq!(tile.pixel(0, 63), Some(&[180, 89, 0, 255][..]));
    }

    #[test]
    fn test_tile_past_pole_is_partly_empty() {
        let mut tileset = world_tileset(0, 64);
        // Row 1 spans 64°..128° of latitude; only 26 rows are on the globe
        let tile = tileset
            .tile_for_coordinate(GeoCoordinate::new(10.0, 80.0), 1.0)
            .unwrap();
        assert_eq!(tile.valid_pixels(), 64 * 26);
        assert!(!tile.is_mapped(0, 0));
        assert_eq!(&tile.data[0..4], &[0, 0, 0, 0]);
        assert!(tile.is_mapped(0, 63));
    }
}
