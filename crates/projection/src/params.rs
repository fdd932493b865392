//! Projection parameter sets.
//!
//! Parameters are name→value pairs with angles in degrees, written either
//! programmatically or as a PROJ-style definition string:
//!
//! ```
//! use projection::ProjectionParams;
//!
//! let (family, params) = ProjectionParams::parse_definition("+proj=eqc +lat_ts=30").unwrap();
//! assert_eq!(family, "eqc");
//! assert_eq!(params.get("lat_ts"), Some(30.0));
//! ```

use crate::error::{ProjectionError, Result};
use std::collections::BTreeMap;

/// Named numeric projection parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionParams {
    values: BTreeMap<String, f64>,
}

impl ProjectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Split a definition like `"+proj=merc +lon_0=10 +R=6371000"` into its
    /// family name and remaining parameters.
    pub fn parse_definition(definition: &str) -> Result<(String, Self)> {
        let mut family = None;
        let mut params = Self::new();

        for token in definition.split_whitespace() {
            let token = token.strip_prefix('+').unwrap_or(token);
            let (name, value) = token.split_once('=').ok_or_else(|| {
                ProjectionError::configuration(format!("parameter '{}' has no value", token))
            })?;

            if name == "proj" {
                family = Some(value.to_string());
                continue;
            }

            let parsed: f64 = value.parse().map_err(|_| {
                ProjectionError::configuration(format!(
                    "parameter '{}' has non-numeric value '{}'",
                    name, value
                ))
            })?;
            params.set(name, parsed);
        }

        let family = family.ok_or_else(|| {
            ProjectionError::configuration(format!("no +proj= in '{}'", definition))
        })?;
        Ok((family, params))
    }

    /// Fail on any parameter not listed in `allowed`, or on non-finite values.
    pub(crate) fn ensure_only(&self, family: &str, allowed: &[&str]) -> Result<()> {
        for (name, value) in &self.values {
            if !allowed.contains(&name.as_str()) {
                return Err(ProjectionError::configuration(format!(
                    "parameter '{}' is not recognized by projection '{}'",
                    name, family
                )));
            }
            if !value.is_finite() {
                return Err(ProjectionError::configuration(format!(
                    "parameter '{}' must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Sphere radius, defaulting to the unit sphere.
    pub(crate) fn radius(&self) -> Result<f64> {
        let radius = self.get("R").unwrap_or(1.0);
        if radius <= 0.0 {
            return Err(ProjectionError::configuration(format!(
                "sphere radius must be positive, got {}",
                radius
            )));
        }
        Ok(radius)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ProjectionParams {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}
