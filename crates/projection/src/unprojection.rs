//! Unprojection table for fast planar → geographic lookups.
//!
//! Samples the inverse projection once per node of a regular planar grid
//! covering a geographic region, then answers point queries by bilinear
//! interpolation of the four nodes around the point. Interpolation error
//! shrinks with the square of the sample spacing.
//!
//! # Memory Usage
//!
//! 16 bytes per node plus one validity bit. A 256x256 tile sampled every 16
//! pixels needs 17x17 nodes (~4.6KB).

use crate::error::{ProjectionError, Result};
use crate::{MapProjection, Projection};
use map_common::coord::wrap_longitude;
use map_common::{Bounds, GeoCoordinate, PlanarPoint, PlanarSize};
use tracing::debug;

/// Largest number of nodes a single table may hold.
pub const MAX_TABLE_NODES: usize = 16_777_216;

/// Points sampled along each edge of the bounds when computing the planar
/// envelope.
const EDGE_SAMPLES: usize = 16;

/// Slack, in cells, when counting the cells needed to cover an extent.
const GRID_EPS: f64 = 1e-9;

/// Precomputed inverse projection over a bounded planar grid.
///
/// Node `(i, j)` holds `inverse(origin + (i·dx, j·dy))`. Nodes whose inverse
/// failed (e.g. past a pole) are NaN and clear in the validity bitmap.
#[derive(Debug, Clone)]
pub struct UnprojectionTable {
    projection: Projection,
    bounds: Bounds,
    origin: PlanarPoint,
    division_size: PlanarSize,
    table_width: usize,
    table_length: usize,
    /// Row-major: nodes[j * table_width + i]
    nodes: Vec<GeoCoordinate>,
    valid_bitmap: Vec<u64>,
}

impl UnprojectionTable {
    /// Build a table covering `bounds` at the given planar sample spacing.
    ///
    /// The table keeps its own copy of `projection`. Bounds reaching past the
    /// projection's latitude limit are clipped to it first.
    pub fn build(
        bounds: &Bounds,
        sample_spacing: PlanarSize,
        projection: &Projection,
    ) -> Result<Self> {
        if !sample_spacing.is_positive() {
            return Err(ProjectionError::configuration(format!(
                "sample spacing must be finite and positive, got {} x {}",
                sample_spacing.width, sample_spacing.height
            )));
        }

        let limit = projection.latitude_limit();
        let clipped = bounds.clamp_latitude(limit).ok_or_else(|| {
            ProjectionError::configuration(format!(
                "bounds {:?} lie entirely beyond latitude ±{}",
                bounds, limit
            ))
        })?;

        let (min, max) = planar_envelope(&clipped, projection)?;
        let (table_width, table_length, total) = match (
            node_count(max.x - min.x, sample_spacing.width),
            node_count(max.y - min.y, sample_spacing.height),
        ) {
            (Some(w), Some(l)) if w.checked_mul(l).is_some_and(|n| n <= MAX_TABLE_NODES) => {
                (w, l, w * l)
            }
            _ => {
                return Err(ProjectionError::configuration(format!(
                    "table over {:?} at spacing {} x {} exceeds {} nodes",
                    clipped, sample_spacing.width, sample_spacing.height, MAX_TABLE_NODES
                )))
            }
        };

        let mut nodes = Vec::with_capacity(total);
        let mut valid_bitmap = vec![0u64; total.div_ceil(64)];

        for j in 0..table_length {
            for i in 0..table_width {
                let point = min.offset(
                    i as f64 * sample_spacing.width,
                    j as f64 * sample_spacing.height,
                );
                let idx = j * table_width + i;
                match projection.inverse(point) {
                    Ok(coord) => {
                        nodes.push(coord);
                        valid_bitmap[idx / 64] |= 1u64 << (idx % 64);
                    }
                    Err(_) => nodes.push(GeoCoordinate::new(f64::NAN, f64::NAN)),
                }
            }
        }

        let table = Self {
            projection: projection.clone(),
            bounds: clipped,
            origin: min,
            division_size: sample_spacing,
            table_width,
            table_length,
            nodes,
            valid_bitmap,
        };

        debug!(
            family = table.projection.family().name(),
            width = table_width,
            length = table_length,
            valid = table.valid_count(),
            invalid = total - table.valid_count(),
            "Built unprojection table"
        );

        Ok(table)
    }

    /// Interpolated inverse projection of a planar point.
    ///
    /// Points outside `[origin, origin + (width-1, length-1)·division_size]`,
    /// or in a cell touching an invalid node, fail with
    /// [`ProjectionError::OutOfDomain`].
    pub fn coordinate_for_point(&self, point: PlanarPoint) -> Result<GeoCoordinate> {
        let out_of_domain = || ProjectionError::OutOfDomain {
            x: point.x,
            y: point.y,
        };

        let far = self.domain_max();
        // Negated comparisons so NaN lands outside.
        if !(point.x >= self.origin.x && point.x <= far.x && point.y >= self.origin.y && point.y <= far.y)
        {
            return Err(out_of_domain());
        }

        // Clamp only absorbs division rounding at the far edge
        let max_i = (self.table_width - 1) as f64;
        let max_j = (self.table_length - 1) as f64;
        let fx = ((point.x - self.origin.x) / self.division_size.width).clamp(0.0, max_i);
        let fy = ((point.y - self.origin.y) / self.division_size.height).clamp(0.0, max_j);

        let i0 = (fx.floor() as usize).min(self.table_width.saturating_sub(2));
        let j0 = (fy.floor() as usize).min(self.table_length.saturating_sub(2));
        let i1 = (i0 + 1).min(self.table_width - 1);
        let j1 = (j0 + 1).min(self.table_length - 1);
        let tx = fx - i0 as f64;
        let ty = fy - j0 as f64;

        let (Some(c00), Some(c10), Some(c01), Some(c11)) = (
            self.sample(i0, j0),
            self.sample(i1, j0),
            self.sample(i0, j1),
            self.sample(i1, j1),
        ) else {
            return Err(out_of_domain());
        };

        // Keep the four longitudes on one side of the antimeridian.
        let reference = c00.lon;
        let lon10 = unwrap_near(c10.lon, reference);
        let lon01 = unwrap_near(c01.lon, reference);
        let lon11 = unwrap_near(c11.lon, reference);

        let lon = lerp(lerp(c00.lon, lon10, tx), lerp(lon01, lon11, tx), ty);
        let lat = lerp(lerp(c00.lat, c10.lat, tx), lerp(c01.lat, c11.lat, tx), ty);

        let lon = if lon.abs() > 180.0 {
            wrap_longitude(lon)
        } else {
            lon
        };
        Ok(GeoCoordinate::new(lon, lat))
    }

    /// Stored node at column `i`, row `j`, or None if the node is invalid or
    /// out of range.
    #[inline]
    pub fn sample(&self, i: usize, j: usize) -> Option<GeoCoordinate> {
        if i >= self.table_width || j >= self.table_length {
            return None;
        }
        let idx = j * self.table_width + i;
        if self.is_valid(idx) {
            Some(self.nodes[idx])
        } else {
            None
        }
    }

    #[inline]
    fn is_valid(&self, idx: usize) -> bool {
        (self.valid_bitmap[idx / 64] & (1u64 << (idx % 64))) != 0
    }

    /// Count valid nodes in this table.
    pub fn valid_count(&self) -> usize {
        self.valid_bitmap
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// Nodes along x.
    pub fn table_width(&self) -> usize {
        self.table_width
    }

    /// Nodes along y.
    pub fn table_length(&self) -> usize {
        self.table_length
    }

    /// Planar position of node (0, 0).
    pub fn origin(&self) -> PlanarPoint {
        self.origin
    }

    pub fn division_size(&self) -> PlanarSize {
        self.division_size
    }

    /// Planar position of the last node, `origin + (width-1, length-1)·division_size`.
    pub fn domain_max(&self) -> PlanarPoint {
        self.origin.offset(
            (self.table_width - 1) as f64 * self.division_size.width,
            (self.table_length - 1) as f64 * self.division_size.height,
        )
    }

    /// Geographic region the table was built for, after latitude clipping.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// Min/max planar corners of the forward-projected bounds edges.
fn planar_envelope(bounds: &Bounds, projection: &Projection) -> Result<(PlanarPoint, PlanarPoint)> {
    let mut min = PlanarPoint::new(f64::INFINITY, f64::INFINITY);
    let mut max = PlanarPoint::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

    for k in 0..=EDGE_SAMPLES {
        let t = k as f64 / EDGE_SAMPLES as f64;
        let lon = lerp(bounds.min.lon, bounds.max.lon, t);
        let lat = lerp(bounds.min.lat, bounds.max.lat, t);
        for coord in [
            GeoCoordinate::new(lon, bounds.min.lat),
            GeoCoordinate::new(lon, bounds.max.lat),
            GeoCoordinate::new(bounds.min.lon, lat),
            GeoCoordinate::new(bounds.max.lon, lat),
        ] {
            let p = projection.forward(coord)?;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
    }

    Ok((min, max))
}

/// `ceil(extent / step) + 1`, or None when the count is not representable.
fn node_count(extent: f64, step: f64) -> Option<usize> {
    let cells = extent / step;
    if !cells.is_finite() || cells > MAX_TABLE_NODES as f64 {
        return None;
    }
    Some((cells - GRID_EPS).ceil().max(0.0) as usize + 1)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
fn unwrap_near(lon: f64, reference: f64) -> f64 {
    if lon - reference > 180.0 {
        lon - 360.0
    } else if lon - reference < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
