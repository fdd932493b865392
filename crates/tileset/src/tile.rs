//! Tile pyramid addressing.
//!
//! Level `max_level` renders at the source's native degrees-per-pixel and
//! each coarser level doubles it. At level `l` one tile pixel spans
//! `R·rad(dpp_l)` planar units, so a tile spans `tile_size` times that.
//! Tiles are addressed by `floor(x / span)`, `floor(y / span)` with rows
//! growing northward.

use map_common::PlanarPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key for a rendered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub level: u32,
    pub col: i64,
    pub row: i64,
}

impl TileKey {
    pub fn new(level: u32, col: i64, row: i64) -> Self {
        Self { level, col, row }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.col, self.row)
    }
}

/// Level and tile arithmetic for one tileset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePyramid {
    native_degrees_per_pixel: f64,
    max_level: u32,
    tile_size: usize,
    radius: f64,
    /// Planar world rectangle
    world_min: PlanarPoint,
    world_max: PlanarPoint,
}

impl TilePyramid {
    pub fn new(
        native_degrees_per_pixel: f64,
        max_level: u32,
        tile_size: usize,
        radius: f64,
        world: (PlanarPoint, PlanarPoint),
    ) -> Self {
        Self {
            native_degrees_per_pixel,
            max_level,
            tile_size,
            radius,
            world_min: world.0,
            world_max: world.1,
        }
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Degrees per pixel rendered at `level`.
    pub fn degrees_per_pixel(&self, level: u32) -> f64 {
        let doublings = self.max_level.saturating_sub(level);
        self.native_degrees_per_pixel * 2f64.powi(doublings as i32)
    }

    /// Coarsest level at least as fine as `degrees_per_pixel`, clamped to
    /// the pyramid.
    pub fn level_for_scale(&self, degrees_per_pixel: f64) -> u32 {
        // Slack so a request at exactly a level's scale picks that level
        let target = degrees_per_pixel * (1.0 + 1e-9);
        (0..=self.max_level)
            .find(|&level| self.degrees_per_pixel(level) <= target)
            .unwrap_or(self.max_level)
    }

    /// Planar size of one tile pixel at `level`.
    pub fn pixel_size(&self, level: u32) -> f64 {
        self.radius * self.degrees_per_pixel(level).to_radians()
    }

    /// Planar edge length of a tile at `level`.
    pub fn tile_span(&self, level: u32) -> f64 {
        self.pixel_size(level) * self.tile_size as f64
    }

    /// Tile containing a planar point.
    ///
    /// Points on the northern or eastern world edge belong to the tile
    /// inside the world.
    pub fn key_for_point(&self, level: u32, point: PlanarPoint) -> TileKey {
        let span = self.tile_span(level);
        let last_col = (self.world_max.x / span).ceil() - 1.0;
        let last_row = (self.world_max.y / span).ceil() - 1.0;
        let col = (point.x / span).floor().min(last_col);
        let row = (point.y / span).floor().min(last_row);
        TileKey::new(level, col as i64, row as i64)
    }

    /// Pull a point on the world edge a hair inside, so it lands in a pixel
    /// that lies on the globe.
    pub fn clamp_to_world(&self, level: u32, point: PlanarPoint) -> PlanarPoint {
        let inset = self.pixel_size(level) * 1e-6;
        PlanarPoint::new(
            point.x.clamp(self.world_min.x + inset, self.world_max.x - inset),
            point.y.clamp(self.world_min.y + inset, self.world_max.y - inset),
        )
    }

    /// Planar (min, max) corners of a tile.
    pub fn tile_rect(&self, key: &TileKey) -> (PlanarPoint, PlanarPoint) {
        let span = self.tile_span(key.level);
        let min = PlanarPoint::new(key.col as f64 * span, key.row as f64 * span);
        (min, min.offset(span, span))
    }

    /// Part of a tile inside the projected world, or None when they do not
    /// overlap.
    pub fn clip_to_world(&self, key: &TileKey) -> Option<(PlanarPoint, PlanarPoint)> {
        let (min, max) = self.tile_rect(key);
        let lo = PlanarPoint::new(min.x.max(self.world_min.x), min.y.max(self.world_min.y));
        let hi = PlanarPoint::new(max.x.min(self.world_max.x), max.y.min(self.world_max.y));
        if lo.x >= hi.x || lo.y >= hi.y {
            return None;
        }
        Some((lo, hi))
    }
}
