//! Mercator projection, spherical form.
//!
//! forward: x = R·k₀·(λ - λ₀), y = R·k₀·ln(tan(π/4 + φ/2))
//! inverse: λ = λ₀ + x/(R·k₀), φ = π/2 - 2·atan(exp(-y/(R·k₀)))
//!
//! with k₀ = cos(lat_ts).

use crate::common::{from_lambda_phi, to_lambda_phi, true_scale_cosine};
use crate::error::{ProjectionError, Result};
use crate::params::ProjectionParams;
use crate::{MapProjection, ProjectionFamily};
use map_common::{GeoCoordinate, PlanarPoint};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Parameters accepted by `merc`.
pub const PARAMETERS: &[&str] = &["lat_ts", "lon_0", "R"];

/// Latitude at which the spherical Mercator world becomes square (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Latitudes closer than this to a pole (radians) have no finite y.
const POLE_EPS: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub struct Mercator {
    lon0: f64,
    k0: f64,
    radius: f64,
}

impl Mercator {
    pub fn from_params(params: &ProjectionParams) -> Result<Self> {
        let family = ProjectionFamily::Mercator.name();
        params.ensure_only(family, PARAMETERS)?;

        let lat_ts = params.get("lat_ts").unwrap_or(0.0);
        let lon0 = params.get("lon_0").unwrap_or(0.0);

        Ok(Self {
            lon0: lon0.to_radians(),
            k0: true_scale_cosine(family, lat_ts)?,
            radius: params.radius()?,
        })
    }

    /// Unit-sphere Mercator with true scale at the equator.
    pub fn unit() -> Self {
        Self {
            lon0: 0.0,
            k0: 1.0,
            radius: 1.0,
        }
    }

    /// Scale factor at the equator.
    pub fn scale_factor(&self) -> f64 {
        self.k0
    }
}

impl MapProjection for Mercator {
    fn family(&self) -> ProjectionFamily {
        ProjectionFamily::Mercator
    }

    fn forward(&self, coord: GeoCoordinate) -> Result<PlanarPoint> {
        let (lam, phi) = to_lambda_phi(coord, self.lon0)?;
        if phi.abs() >= FRAC_PI_2 - POLE_EPS {
            return Err(ProjectionError::OutOfDomainCoordinate {
                lon: coord.lon,
                lat: coord.lat,
            });
        }
        let scale = self.radius * self.k0;
        Ok(PlanarPoint::new(
            scale * lam,
            scale * (FRAC_PI_4 + phi / 2.0).tan().ln(),
        ))
    }

    fn inverse(&self, point: PlanarPoint) -> Result<GeoCoordinate> {
        let scale = self.radius * self.k0;
        let lam = point.x / scale;
        let phi = FRAC_PI_2 - 2.0 * (-point.y / scale).exp().atan();
        if !lam.is_finite() || !phi.is_finite() {
            return Err(ProjectionError::OutOfDomain {
                x: point.x,
                y: point.y,
            });
        }
        Ok(from_lambda_phi(lam, phi, self.lon0))
    }

    fn latitude_limit(&self) -> f64 {
        MAX_LATITUDE
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    fn planar_extent(&self) -> (PlanarPoint, PlanarPoint) {
        let scale = self.radius * self.k0;
        let x = scale * PI;
        let y = scale * (FRAC_PI_4 + MAX_LATITUDE.to_radians() / 2.0).tan().ln();
        (PlanarPoint::new(-x, -y), PlanarPoint::new(x, y))
    }
}
