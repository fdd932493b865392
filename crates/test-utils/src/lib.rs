//! Test helpers shared by the map crates.
//!
//! - `assert_approx_eq!` / `assert_coords_approx_eq!` for float results of
//!   projection math
//! - [`generators`] for synthetic RGBA world rasters whose pixels encode
//!   their own position
//! - [`fixtures`] with named regions and cities

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Assert two numbers differ by at most `epsilon`. NaN never passes.
///
/// ```ignore
/// assert_approx_eq!(projected.x, 0.5235987755982988, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: {} ≈ {} (|diff| = {:e}, epsilon = {:e})",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert two (lon, lat) or (x, y) pairs agree per axis within `epsilon`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_within_epsilon() {
        assert_approx_eq!(0.1 + 0.2, 0.3, 1e-15);
        assert_approx_eq!(-180.0, -180.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_outside_epsilon() {
        assert_approx_eq!(85.06, 85.05, 1e-3);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_nan_never_matches() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }

    #[test]
    fn test_coordinate_pairs() {
        assert_coords_approx_eq!((-73.9857, 40.7484), (-73.9856, 40.7485), 1e-3);
    }
}
