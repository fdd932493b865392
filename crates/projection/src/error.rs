//! Error types for projection and unprojection.

use thiserror::Error;

/// Errors raised by projections and unprojection tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Parameters produce an invalid projection or table. Fatal to that
    /// construction attempt.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A planar point lies outside the region a table or projection covers.
    #[error("planar point ({x}, {y}) is outside the projection domain")]
    OutOfDomain { x: f64, y: f64 },

    /// A geographic coordinate cannot be projected.
    #[error("coordinate ({lon}, {lat}) is outside the projection domain")]
    OutOfDomainCoordinate { lon: f64, lat: f64 },
}

impl ProjectionError {
    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for errors a caller can recover from (e.g. by falling back to
    /// exact inverse projection).
    pub fn is_out_of_domain(&self) -> bool {
        matches!(
            self,
            Self::OutOfDomain { .. } | Self::OutOfDomainCoordinate { .. }
        )
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
