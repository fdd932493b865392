//! Tile content sources.
//!
//! A [`TileSource`] supplies raw, north-up, plate-carrée pixels for a
//! geographic region. The tileset reprojects them into tiles.

use crate::error::{Result, TilesetError};
use map_common::{Bounds, GeoCoordinate};
use tracing::debug;

/// Region and scale the tileset needs pixels for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRequest {
    pub bounds: Bounds,
    /// Coarsest useful resolution. Sources may return finer data.
    pub degrees_per_pixel: f64,
}

/// A block of pixels covering `bounds`.
///
/// Row 0 is the northern edge; each row is `width * bytes_per_pixel` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRaster {
    pub bounds: Bounds,
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
    pub data: Vec<u8>,
}

impl SourceRaster {
    /// Create a raster, checking the buffer length.
    pub fn new(
        bounds: Bounds,
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 || bytes_per_pixel == 0 {
            return Err(TilesetError::Source(format!(
                "empty raster {}x{} at {} bytes per pixel",
                width, height, bytes_per_pixel
            )));
        }
        let expected = width.checked_mul(height).and_then(|n| n.checked_mul(bytes_per_pixel));
        if expected != Some(data.len()) {
            return Err(TilesetError::Source(format!(
                "raster buffer holds {} bytes, expected {} x {} x {}",
                data.len(),
                width,
                height,
                bytes_per_pixel
            )));
        }
        Ok(Self {
            bounds,
            width,
            height,
            bytes_per_pixel,
            data,
        })
    }

    /// Degrees per pixel along (longitude, latitude).
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.bounds.width() / self.width as f64,
            self.bounds.height() / self.height as f64,
        )
    }

    /// Nearest pixel to `coord`, clamped onto the raster.
    pub fn sample(&self, coord: GeoCoordinate) -> &[u8] {
        let (col, row) = self.pixel_index(coord);
        let offset = (row * self.width + col) * self.bytes_per_pixel;
        &self.data[offset..offset + self.bytes_per_pixel]
    }

    fn pixel_index(&self, coord: GeoCoordinate) -> (usize, usize) {
        let (dx, dy) = self.resolution();
        let col = if dx > 0.0 {
            ((coord.lon - self.bounds.min.lon) / dx).floor()
        } else {
            0.0
        };
        let row = if dy > 0.0 {
            ((self.bounds.max.lat - coord.lat) / dy).floor()
        } else {
            0.0
        };
        // `as usize` saturates negatives and NaN to 0
        (
            (col as usize).min(self.width - 1),
            (row as usize).min(self.height - 1),
        )
    }
}

/// Supplies pixel content for a tileset.
pub trait TileSource: Send + Sync {
    /// Region with content.
    fn coverage(&self) -> Bounds;

    /// Finest resolution available.
    fn native_degrees_per_pixel(&self) -> f64;

    fn bytes_per_pixel(&self) -> usize;

    /// Fetch pixels covering at least `request.bounds`.
    fn fetch(&self, request: &SourceRequest) -> Result<SourceRaster>;
}

/// An in-memory plate-carrée image, e.g. a world basemap.
#[derive(Debug, Clone)]
pub struct RasterSource {
    raster: SourceRaster,
}

impl RasterSource {
    pub fn new(raster: SourceRaster) -> Self {
        Self { raster }
    }

    /// Image of the whole globe.
    pub fn world(width: usize, height: usize, bytes_per_pixel: usize, data: Vec<u8>) -> Result<Self> {
        Ok(Self::new(SourceRaster::new(
            Bounds::world(),
            width,
            height,
            bytes_per_pixel,
            data,
        )?))
    }

    pub fn raster(&self) -> &SourceRaster {
        &self.raster
    }
}

impl TileSource for RasterSource {
    fn coverage(&self) -> Bounds {
        self.raster.bounds
    }

    fn native_degrees_per_pixel(&self) -> f64 {
        let (dx, dy) = self.raster.resolution();
        dx.min(dy)
    }

    fn bytes_per_pixel(&self) -> usize {
        self.raster.bytes_per_pixel
    }

    /// Crop to the requested bounds, decimating when the request is coarser
    /// than the image.
    fn fetch(&self, request: &SourceRequest) -> Result<SourceRaster> {
        let src = &self.raster;
        let cov = src.bounds;
        let (dx, dy) = src.resolution();

        let col_span = |lon: f64| ((lon - cov.min.lon) / dx).clamp(0.0, src.width as f64);
        let row_span = |lat: f64| ((cov.max.lat - lat) / dy).clamp(0.0, src.height as f64);

        let c0 = (col_span(request.bounds.min.lon).floor() as usize).min(src.width - 1);
        let c1 = (col_span(request.bounds.max.lon).ceil() as usize).max(c0 + 1);
        let r0 = (row_span(request.bounds.max.lat).floor() as usize).min(src.height - 1);
        let r1 = (row_span(request.bounds.min.lat).ceil() as usize).max(r0 + 1);

        // One output pixel at most once the step covers the whole image
        let max_step = src.width.max(src.height);
        let step = if request.degrees_per_pixel.is_finite() {
            ((request.degrees_per_pixel / dx.min(dy)).floor() as usize).clamp(1, max_step)
        } else {
            1
        };
        let out_w = (c1 - c0).div_ceil(step);
        let out_h = (r1 - r0).div_ceil(step);
        let bpp = src.bytes_per_pixel;

        let mut data = Vec::with_capacity(out_w * out_h * bpp);
        for r in 0..out_h {
            let src_row = r0 + r * step;
            for c in 0..out_w {
                let offset = (src_row * src.width + c0 + c * step) * bpp;
                data.extend_from_slice(&src.data[offset..offset + bpp]);
            }
        }

        let bounds = Bounds::new(
            cov.min.lon + c0 as f64 * dx,
            cov.max.lat - (r0 + out_h * step) as f64 * dy,
            cov.min.lon + (c0 + out_w * step) as f64 * dx,
            cov.max.lat - r0 as f64 * dy,
        )
        .map_err(|e| TilesetError::Source(e.to_string()))?;

        debug!(
            cols = out_w,
            rows = out_h,
            step = step,
            "Cropped raster source"
        );

        SourceRaster::new(bounds, out_w, out_h, bpp, data)
    }
}
