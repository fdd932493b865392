//! Geographic and planar coordinate types.

use serde::{Deserialize, Serialize};

/// A geographic position in degrees.
///
/// Values are stored as given. Use [`GeoCoordinate::normalized`] before
/// comparing against bounds or deriving cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lon: f64,
    pub lat: f64,
}

impl GeoCoordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Build a coordinate from radians.
    pub fn from_radians(lon_rad: f64, lat_rad: f64) -> Self {
        Self {
            lon: lon_rad.to_degrees(),
            lat: lat_rad.to_degrees(),
        }
    }

    /// (lon, lat) in radians.
    pub fn to_radians(&self) -> (f64, f64) {
        (self.lon.to_radians(), self.lat.to_radians())
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Wrap longitude into [-180, 180) and clamp latitude to [-90, 90].
    ///
    /// +180 maps to -180. Non-finite components pass through unchanged so
    /// callers can reject them explicitly.
    pub fn normalized(&self) -> Self {
        Self {
            lon: wrap_longitude(self.lon),
            lat: if self.lat.is_nan() {
                self.lat
            } else {
                self.lat.clamp(-90.0, 90.0)
            },
        }
    }
}

/// Wrap a longitude in degrees into [-180, 180).
pub fn wrap_longitude(lon: f64) -> f64 {
    if !lon.is_finite() {
        return lon;
    }
    let mut wrapped = (lon + 180.0).rem_euclid(360.0);
    // rem_euclid can round up to the divisor for tiny negative inputs
    if wrapped >= 360.0 {
        wrapped = 0.0;
    }
    wrapped - 180.0
}

/// A position in a projection's linear units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a planar offset.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A planar extent, used for sample spacing and cell sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarSize {
    pub width: f64,
    pub height: f64,
}

impl PlanarSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Square size with equal sides.
    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}
