//! Common test fixtures for geotag-map tests.
//!
//! Bounds are plain `(min_lon, min_lat, max_lon, max_lat)` tuples so this
//! crate stays free of workspace dependencies.

/// Common bounds definitions for testing.
pub mod bounds {
    /// Global bounds (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Continental United States
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Europe
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// Twenty degrees square centred on the origin
    pub const SCENARIO: (f64, f64, f64, f64) = (-10.0, -10.0, 10.0, 10.0);

    /// Single point (degenerate bounds)
    pub const POINT: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);

    /// Crosses antimeridian (Pacific-centric)
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);

    /// Invalid bounds (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// Sample coordinates as `(lon, lat)` in degrees.
pub mod coords {
    pub const NEW_YORK: (f64, f64) = (-73.9857, 40.7484);
    pub const TOKYO: (f64, f64) = (139.6917, 35.6895);
    pub const SYDNEY: (f64, f64) = (151.2093, -33.8688);
    pub const NULL_ISLAND: (f64, f64) = (0.0, 0.0);
}
