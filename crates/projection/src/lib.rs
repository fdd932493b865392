//! Map projections and inverse-projection lookup tables.
//!
//! Implements spherical projections from scratch without external
//! dependencies. Geographic coordinates are in degrees at the API surface
//! and radians internally; planar units are radians on a sphere of radius
//! `R` (the unit sphere unless `R` is given).

mod common;
pub mod equidistant;
pub mod error;
pub mod mercator;
pub mod params;
pub mod unprojection;

pub use equidistant::EquidistantCylindrical;
pub use error::{ProjectionError, Result};
pub use mercator::Mercator;
pub use params::ProjectionParams;
pub use unprojection::UnprojectionTable;

use map_common::{GeoCoordinate, PlanarPoint};

/// Capabilities every projection family provides.
///
/// Implementations are immutable after construction and safe to share
/// between threads.
pub trait MapProjection: Send + Sync {
    fn family(&self) -> ProjectionFamily;

    /// Geographic (degrees) → planar.
    fn forward(&self, coord: GeoCoordinate) -> Result<PlanarPoint>;

    /// Planar → geographic (degrees), longitude within [-180, 180].
    fn inverse(&self, point: PlanarPoint) -> Result<GeoCoordinate>;

    /// Largest absolute latitude (degrees) `forward` accepts.
    fn latitude_limit(&self) -> f64;

    /// Sphere radius in planar units.
    fn radius(&self) -> f64;

    /// Central meridian in degrees.
    fn central_meridian(&self) -> f64;

    /// Planar rectangle (min, max) holding the whole world up to the
    /// latitude limit.
    fn planar_extent(&self) -> (PlanarPoint, PlanarPoint);
}

/// Supported projection families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionFamily {
    /// Equidistant cylindrical / plate carrée (`eqc`)
    EquidistantCylindrical,
    /// Spherical Mercator (`merc`)
    Mercator,
}

impl ProjectionFamily {
    /// Parse a PROJ-style family name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "eqc" => Some(Self::EquidistantCylindrical),
            "merc" => Some(Self::Mercator),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EquidistantCylindrical => "eqc",
            Self::Mercator => "merc",
        }
    }
}

/// A constructed projection of any supported family.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    EquidistantCylindrical(EquidistantCylindrical),
    Mercator(Mercator),
}

impl Projection {
    /// Construct a projection from a family name and parameters.
    ///
    /// Unknown families, unknown parameters and degenerate derived
    /// constants fail with [`ProjectionError::Configuration`].
    pub fn new(family: &str, params: &ProjectionParams) -> Result<Self> {
        match ProjectionFamily::from_name(family) {
            Some(ProjectionFamily::EquidistantCylindrical) => Ok(Self::EquidistantCylindrical(
                EquidistantCylindrical::from_params(params)?,
            )),
            Some(ProjectionFamily::Mercator) => {
                Ok(Self::Mercator(Mercator::from_params(params)?))
            }
            None => Err(ProjectionError::configuration(format!(
                "unknown projection family '{}'",
                family
            ))),
        }
    }

    /// Construct from a definition string such as `"+proj=eqc +lat_ts=30"`.
    pub fn from_definition(definition: &str) -> Result<Self> {
        let (family, params) = ProjectionParams::parse_definition(definition)?;
        Self::new(&family, &params)
    }

    /// Unit-sphere plate carrée.
    pub fn plate_carree() -> Self {
        Self::EquidistantCylindrical(EquidistantCylindrical::plate_carree())
    }

    fn inner(&self) -> &dyn MapProjection {
        match self {
            Self::EquidistantCylindrical(p) => p,
            Self::Mercator(p) => p,
        }
    }
}

impl MapProjection for Projection {
    fn family(&self) -> ProjectionFamily {
        self.inner().family()
    }

    fn forward(&self, coord: GeoCoordinate) -> Result<PlanarPoint> {
        self.inner().forward(coord)
    }

    fn inverse(&self, point: PlanarPoint) -> Result<GeoCoordinate> {
        self.inner().inverse(point)
    }

    fn latitude_limit(&self) -> f64 {
        self.inner().latitude_limit()
    }

    fn radius(&self) -> f64 {
        self.inner().radius()
    }

    fn central_meridian(&self) -> f64 {
        self.inner().central_meridian()
    }

    fn planar_extent(&self) -> (PlanarPoint, PlanarPoint) {
        self.inner().planar_extent()
    }
}
