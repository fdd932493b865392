//! Geographic bounds.

use crate::coord::GeoCoordinate;
use crate::error::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A geographic rectangle in degrees.
///
/// Always satisfies `min.lon <= max.lon` and `min.lat <= max.lat`; there is
/// no antimeridian wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: GeoCoordinate,
    pub max: GeoCoordinate,
}

impl Bounds {
    /// Create bounds from corner values, validating order and finiteness.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> GeoResult<Self> {
        let values = [min_lon, min_lat, max_lon, max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoError::InvalidBounds(format!(
                "non-finite corner in {:?}",
                values
            )));
        }
        if min_lon > max_lon {
            return Err(GeoError::InvalidBounds(format!(
                "min longitude {} exceeds max longitude {}",
                min_lon, max_lon
            )));
        }
        if min_lat > max_lat {
            return Err(GeoError::InvalidBounds(format!(
                "min latitude {} exceeds max latitude {}",
                min_lat, max_lat
            )));
        }

        Ok(Self {
            min: GeoCoordinate::new(min_lon, min_lat),
            max: GeoCoordinate::new(max_lon, max_lat),
        })
    }

    /// The whole globe.
    pub fn world() -> Self {
        Self {
            min: GeoCoordinate::new(-180.0, -90.0),
            max: GeoCoordinate::new(180.0, 90.0),
        }
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max.lat - self.min.lat
    }

    pub fn center(&self) -> GeoCoordinate {
        GeoCoordinate::new(
            (self.min.lon + self.max.lon) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }

    /// Check if a coordinate lies inside (edges included).
    pub fn contains(&self, coord: &GeoCoordinate) -> bool {
        coord.lon >= self.min.lon
            && coord.lon <= self.max.lon
            && coord.lat >= self.min.lat
            && coord.lat <= self.max.lat
    }

    /// Check if these bounds overlap another with non-zero area.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.lon < other.max.lon
            && self.max.lon > other.min.lon
            && self.min.lat < other.max.lat
            && self.max.lat > other.min.lat
    }

    /// Compute the overlapping region of two bounds.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        if !self.intersects(other) {
            return None;
        }

        Some(Bounds {
            min: GeoCoordinate::new(
                self.min.lon.max(other.min.lon),
                self.min.lat.max(other.min.lat),
            ),
            max: GeoCoordinate::new(
                self.max.lon.min(other.max.lon),
                self.max.lat.min(other.max.lat),
            ),
        })
    }

    /// Restrict latitude to `[-limit, limit]`.
    ///
    /// Returns None when nothing of the bounds survives.
    pub fn clamp_latitude(&self, limit: f64) -> Option<Bounds> {
        let min_lat = self.min.lat.max(-limit);
        let max_lat = self.max.lat.min(limit);
        if min_lat > max_lat {
            return None;
        }
        Some(Bounds {
            min: GeoCoordinate::new(self.min.lon, min_lat),
            max: GeoCoordinate::new(self.max.lon, max_lat),
        })
    }
}

impl FromStr for Bounds {
    type Err = GeoError;

    /// Parse "minlon,minlat,maxlon,maxlat".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeoError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| GeoError::InvalidNumber(part.to_string()))?;
        }

        Bounds::new(values[0], values[1], values[2], values[3])
    }
}
