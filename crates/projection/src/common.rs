//! Helpers shared by the spherical projections.

use crate::error::{ProjectionError, Result};
use map_common::GeoCoordinate;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Slack allowed past ±π and ±π/2 before a value counts as out of range.
const ANGLE_EPS: f64 = 1e-12;

/// Smallest accepted true-scale cosine.
///
/// cos(90°) evaluates to ~6e-17 in f64, so a plain `> 0` check would accept
/// a polar true-scale latitude.
pub(crate) const MIN_SCALE_COS: f64 = 1e-10;

/// Wrap a longitude in radians into [-π, π], leaving values already in
/// range (including ±π) untouched.
pub(crate) fn adjust_lon(lam: f64) -> f64 {
    if lam.abs() <= PI + ANGLE_EPS {
        return lam;
    }
    lam - TAU * ((lam + PI) / TAU).floor()
}

/// Convert a geographic coordinate to (λ - λ₀, φ) in radians, validating
/// the latitude.
pub(crate) fn to_lambda_phi(coord: GeoCoordinate, lon0: f64) -> Result<(f64, f64)> {
    let (lon, lat) = coord.to_radians();
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > FRAC_PI_2 + ANGLE_EPS {
        return Err(ProjectionError::OutOfDomainCoordinate {
            lon: coord.lon,
            lat: coord.lat,
        });
    }
    Ok((adjust_lon(lon - lon0), lat.clamp(-FRAC_PI_2, FRAC_PI_2)))
}

/// Convert (λ - λ₀, φ) in radians back to a geographic coordinate.
pub(crate) fn from_lambda_phi(lam: f64, phi: f64, lon0: f64) -> GeoCoordinate {
    GeoCoordinate::from_radians(adjust_lon(lam + lon0), phi)
}

/// Validate a true-scale latitude (degrees) and return its cosine.
pub(crate) fn true_scale_cosine(family: &str, lat_ts_deg: f64) -> Result<f64> {
    let rc = lat_ts_deg.to_radians().cos();
    if rc <= MIN_SCALE_COS {
        return Err(ProjectionError::configuration(format!(
            "{}: cosine of true-scale latitude {}° is {:e}, must be positive",
            family, lat_ts_deg, rc
        )));
    }
    Ok(rc)
}
