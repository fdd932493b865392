//! Equidistant Cylindrical (Plate Carrée) projection, spherical form.
//!
//! forward: x = R·rc·(λ - λ₀), y = R·φ
//! inverse: λ = λ₀ + x/(R·rc), φ = y/R
//!
//! where rc = cos(lat_ts). The true-scale latitude defaults to `lat_0`.

use crate::common::{from_lambda_phi, to_lambda_phi, true_scale_cosine};
use crate::error::{ProjectionError, Result};
use crate::params::ProjectionParams;
use crate::{MapProjection, ProjectionFamily};
use map_common::{GeoCoordinate, PlanarPoint};
use std::f64::consts::{FRAC_PI_2, PI};

/// Parameters accepted by `eqc`.
pub const PARAMETERS: &[&str] = &["lat_ts", "lat_0", "lon_0", "R"];

#[derive(Debug, Clone, PartialEq)]
pub struct EquidistantCylindrical {
    /// Central meridian (radians)
    lon0: f64,
    /// Latitude of true scale (degrees)
    lat_ts: f64,
    /// Cosine of the true-scale latitude
    rc: f64,
    /// Sphere radius
    radius: f64,
}

impl EquidistantCylindrical {
    /// Build from a parameter set. Fails when cos(lat_ts) is not positive.
    pub fn from_params(params: &ProjectionParams) -> Result<Self> {
        let family = ProjectionFamily::EquidistantCylindrical.name();
        params.ensure_only(family, PARAMETERS)?;

        let lat0 = params.get("lat_0").unwrap_or(0.0);
        let lat_ts = params.get("lat_ts").unwrap_or(lat0);
        let lon0 = params.get("lon_0").unwrap_or(0.0);

        Ok(Self {
            lon0: lon0.to_radians(),
            lat_ts,
            rc: true_scale_cosine(family, lat_ts)?,
            radius: params.radius()?,
        })
    }

    /// Unit-sphere plate carrée with true scale at the equator.
    pub fn plate_carree() -> Self {
        Self {
            lon0: 0.0,
            lat_ts: 0.0,
            rc: 1.0,
            radius: 1.0,
        }
    }

    /// Cosine of the true-scale latitude.
    pub fn scale_cosine(&self) -> f64 {
        self.rc
    }

    pub fn true_scale_latitude(&self) -> f64 {
        self.lat_ts
    }
}

impl MapProjection for EquidistantCylindrical {
    fn family(&self) -> ProjectionFamily {
        ProjectionFamily::EquidistantCylindrical
    }

    fn forward(&self, coord: GeoCoordinate) -> Result<PlanarPoint> {
        let (lam, phi) = to_lambda_phi(coord, self.lon0)?;
        Ok(PlanarPoint::new(
            self.radius * self.rc * lam,
            self.radius * phi,
        ))
    }

    fn inverse(&self, point: PlanarPoint) -> Result<GeoCoordinate> {
        let phi = point.y / self.radius;
        let lam = point.x / (self.radius * self.rc);
        if !lam.is_finite() || !phi.is_finite() || phi.abs() > FRAC_PI_2 + 1e-12 {
            return Err(ProjectionError::OutOfDomain {
                x: point.x,
                y: point.y,
            });
        }
        Ok(from_lambda_phi(lam, phi.clamp(-FRAC_PI_2, FRAC_PI_2), self.lon0))
    }

    fn latitude_limit(&self) -> f64 {
        90.0
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    fn planar_extent(&self) -> (PlanarPoint, PlanarPoint) {
        let x = self.radius * self.rc * PI;
        let y = self.radius * FRAC_PI_2;
        (PlanarPoint::new(-x, -y), PlanarPoint::new(x, y))
    }
}
