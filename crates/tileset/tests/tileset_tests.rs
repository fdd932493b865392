//! Integration tests for tilesets.

use map_common::{Bounds, GeoCoordinate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_utils::{
    bounds, coords, create_latitude_gradient, create_position_raster, create_solid_raster,
    RGBA_BYTES,
};
use tileset::{
    RasterSource, Result, SourceRaster, SourceRequest, TileSource, Tileset, TilesetConfig,
    TilesetError,
};

/// Wraps a source and counts fetches.
struct CountingSource {
    inner: RasterSource,
    fetches: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(inner: RasterSource) -> (Self, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                fetches: Arc::clone(&fetches),
            },
            fetches,
        )
    }
}

impl TileSource for CountingSource {
    fn coverage(&self) -> Bounds {
        self.inner.coverage()
    }

    fn native_degrees_per_pixel(&self) -> f64 {
        self.inner.native_degrees_per_pixel()
    }

    fn bytes_per_pixel(&self) -> usize {
        self.inner.bytes_per_pixel()
    }

    fn fetch(&self, request: &SourceRequest) -> Result<SourceRaster> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(request)
    }
}

/// Source that always fails.
struct BrokenSource;

impl TileSource for BrokenSource {
    fn coverage(&self) -> Bounds {
        Bounds::world()
    }

    fn native_degrees_per_pixel(&self) -> f64 {
        1.0
    }

    fn bytes_per_pixel(&self) -> usize {
        RGBA_BYTES
    }

    fn fetch(&self, _request: &SourceRequest) -> Result<SourceRaster> {
        Err(TilesetError::Source("connection refused".to_string()))
    }
}

fn world_source() -> RasterSource {
    // 1 degree per pixel
    RasterSource::world(360, 180, RGBA_BYTES, create_position_raster(360, 180)).unwrap()
}

fn small_config() -> TilesetConfig {
    TilesetConfig {
        tile_size: 32,
        max_level: 3,
        table_divisions: 8,
        ..Default::default()
    }
}

fn coord(c: (f64, f64)) -> GeoCoordinate {
    GeoCoordinate::new(c.0, c.1)
}

// =============================================================================
// Memoization and caching
// =============================================================================

#[test]
fn test_identical_requests_fetch_once() {
    let (source, fetches) = CountingSource::new(world_source());
    let mut tileset = Tileset::new(small_config(), source).unwrap();

    let first = tileset
        .pixel_for_coordinate(coord(coords::TOKYO), 1.0)
        .unwrap();
    let second = tileset
        .pixel_for_coordinate(coord(coords::TOKYO), 1.0)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(tileset.cache_stats().hits(), 1);
    assert_eq!(tileset.cache_stats().misses(), 1);
}

#[test]
fn test_same_tile_shared_between_coordinates() {
    let (source, fetches) = CountingSource::new(world_source());
    let mut tileset = Tileset::new(small_config(), source).unwrap();

    let a = tileset
        .tile_for_coordinate(GeoCoordinate::new(1.0, 1.0), 1.0)
        .unwrap();
    let b = tileset
        .tile_for_coordinate(GeoCoordinate::new(20.0, 20.0), 1.0)
        .unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(tileset.cached_tiles(), 1);
}

#[test]
fn test_count_limit_evicts_tiles() {
    let (source, fetches) = CountingSource::new(world_source());
    let config = TilesetConfig {
        cache_count_limit: Some(2),
        ..small_config()
    };
    let mut tileset = Tileset::new(config, source).unwrap();

    // Three distinct 32-degree tiles
    for lon in [1.0, 40.0, 80.0] {
        tileset
            .pixel_for_coordinate(GeoCoordinate::new(lon, 1.0), 1.0)
            .unwrap();
    }
    assert_eq!(tileset.cached_tiles(), 2);
    assert_eq!(tileset.cache_stats().evictions(), 1);

    // The first tile was evicted and must be rendered again
    tileset
        .pixel_for_coordinate(GeoCoordinate::new(1.0, 1.0), 1.0)
        .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 4);

    tileset.set_cache_count_limit(None);
    tileset
        .pixel_for_coordinate(GeoCoordinate::new(120.0, 1.0), 1.0)
        .unwrap();
    assert_eq!(tileset.cached_tiles(), 3);

    tileset.clear_cache();
    assert_eq!(tileset.cached_tiles(), 0);
}

// =============================================================================
// Pixel content
// =============================================================================

#[test]
fn test_pixels_come_from_source_location() {
    let mut tileset = Tileset::new(small_config(), world_source()).unwrap();

    for (lon, lat) in [(0.5, -0.5), (-73.5, 40.5), (139.5, 35.5), (-179.5, -89.5)] {
        let pixel = tileset
            .pixel_for_coordinate(GeoCoordinate::new(lon, lat), 1.0)
            .unwrap();
        let col = (lon + 180.0).floor() as usize;
        let row = (90.0 - lat).floor() as usize;
        let expected = [(col % 256) as u8, row as u8, (col / 256) as u8, 255];
        assert_eq!(pixel, expected, "at ({}, {})", lon, lat);
    }
}

#[test]
fn test_longitude_wraps() {
    let mut tileset = Tileset::new(small_config(), world_source()).unwrap();
    let wrapped = tileset
        .pixel_for_coordinate(GeoCoordinate::new(190.5, 10.5), 1.0)
        .unwrap();
    let direct = tileset
        .pixel_for_coordinate(GeoCoordinate::new(-169.5, 10.5), 1.0)
        .unwrap();
    assert_eq!(wrapped, direct);
    assert_eq!(
        tileset.tile_key_for(GeoCoordinate::new(190.5, 10.5), 1.0).unwrap(),
        tileset.tile_key_for(GeoCoordinate::new(-169.5, 10.5), 1.0).unwrap()
    );
}

#[test]
fn test_mercator_tile_is_north_up() {
    let source = RasterSource::world(
        360,
        180,
        RGBA_BYTES,
        create_latitude_gradient(360, 180),
    )
    .unwrap();
    let config = TilesetConfig {
        projection: "+proj=merc".to_string(),
        ..small_config()
    };
    let mut tileset = Tileset::new(config, source).unwrap();
    let tile = tileset
        .tile_for_coordinate(GeoCoordinate::new(10.0, 10.0), 1.0)
        .unwrap();

    let top = tile.pixel(0, 0).unwrap()[0];
    let bottom = tile.pixel(0, tile.height - 1).unwrap()[0];
    assert!(top > bottom, "top {} bottom {}", top, bottom);
    assert_eq!(tile.valid_pixels(), tile.width * tile.height);
}

#[test]
fn test_coarse_scale_uses_coarse_level() {
    let (source, fetches) = CountingSource::new(world_source());
    let mut tileset = Tileset::new(small_config(), source).unwrap();

    assert_eq!(tileset.minimum_degrees_per_pixel(), 1.0);
    assert_eq!(tileset.level_for_scale(8.0), 0);
    assert_eq!(tileset.level_for_scale(3.0), 2);
    assert_eq!(tileset.level_for_scale(0.25), 3);

    let fine = tileset.tile_key_for(coord(coords::SYDNEY), 1.0).unwrap();
    let coarse = tileset.tile_key_for(coord(coords::SYDNEY), 8.0).unwrap();
    assert_eq!(fine.level, 3);
    assert_eq!(coarse.level, 0);
    assert_ne!(fine, coarse);

    // Requests between levels share a tile
    tileset
        .pixel_for_coordinate(coord(coords::SYDNEY), 5.0)
        .unwrap();
    tileset
        .pixel_for_coordinate(coord(coords::SYDNEY), 6.0)
        .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bytes_per_pixel() {
    let gray = RasterSource::world(36, 18, 1, vec![7; 36 * 18]).unwrap();
    let mut tileset = Tileset::new(small_config(), gray).unwrap();
    assert_eq!(tileset.bytes_per_pixel(), 1);
    let tile = tileset
        .tile_for_coordinate(coord(coords::NULL_ISLAND), 10.0)
        .unwrap();
    assert_eq!(tile.bytes_per_pixel, 1);
    assert_eq!(tile.stride(), tile.width);
    assert_eq!(tile.data.len(), tile.width * tile.height);
}

// =============================================================================
// Failure modes
// =============================================================================

#[test]
fn test_no_data_outside_coverage() {
    let europe = Bounds::new(
        bounds::EUROPE.0,
        bounds::EUROPE.1,
        bounds::EUROPE.2,
        bounds::EUROPE.3,
    )
    .unwrap();
    let raster = SourceRaster::new(
        europe,
        60,
        37,
        RGBA_BYTES,
        create_solid_raster(60, 37, [0, 128, 0]),
    )
    .unwrap();
    let (source, fetches) = CountingSource::new(RasterSource::new(raster));
    let mut tileset = Tileset::new(small_config(), source).unwrap();

    let err = tileset
        .pixel_for_coordinate(coord(coords::NEW_YORK), 1.0)
        .unwrap_err();
    assert!(err.is_no_data());
    assert_eq!(fetches.load(Ordering::SeqCst), 0);

    let pixel = tileset
        .pixel_for_coordinate(GeoCoordinate::new(2.35, 48.85), 1.0)
        .unwrap();
    assert_eq!(pixel, vec![0, 128, 0, 255]);

    // Tiles straddling the coverage edge leave outside pixels empty
    let tile = tileset
        .tile_for_coordinate(GeoCoordinate::new(2.35, 48.85), 1.0)
        .unwrap();
    assert!(tile.valid_pixels() > 0);
    assert!(tile.valid_pixels() < tile.width * tile.height);
}

#[test]
fn test_coverage_ending_at_antimeridian_includes_edge() {
    // 1 degree per pixel, value = col + 10 * row
    let pacific_edge = Bounds::new(170.0, -10.0, 180.0, 10.0).unwrap();
    let data = (0..200).map(|v| v as u8).collect();
    let raster = SourceRaster::new(pacific_edge, 10, 20, 1, data).unwrap();
    let mut tileset = Tileset::new(small_config(), RasterSource::new(raster)).unwrap();

    let inside = tileset
        .pixel_for_coordinate(GeoCoordinate::new(179.999, 0.0), 1.0)
        .unwrap();
    let east_edge = tileset
        .pixel_for_coordinate(GeoCoordinate::new(180.0, 0.0), 1.0)
        .unwrap();
    let wrapped = tileset
        .pixel_for_coordinate(GeoCoordinate::new(-180.0, 0.0), 1.0)
        .unwrap();
    assert_eq!(east_edge, inside);
    assert_eq!(wrapped, inside);

    assert!(tileset
        .pixel_for_coordinate(GeoCoordinate::new(-179.5, 0.0), 1.0)
        .unwrap_err()
        .is_no_data());
}

#[test]
fn test_no_data_beyond_mercator_limit() {
    let config = TilesetConfig {
        projection: "+proj=merc".to_string(),
        ..small_config()
    };
    let mut tileset = Tileset::new(config, world_source()).unwrap();
    let err = tileset
        .pixel_for_coordinate(GeoCoordinate::new(0.0, 88.0), 1.0)
        .unwrap_err();
    assert!(matches!(err, TilesetError::NoData { .. }));
    assert!(tileset
        .pixel_for_coordinate(GeoCoordinate::new(0.0, 84.0), 1.0)
        .is_ok());
}

#[test]
fn test_pole_has_data_in_plate_carree() {
    let mut tileset = Tileset::new(small_config(), world_source()).unwrap();
    let pixel = tileset
        .pixel_for_coordinate(GeoCoordinate::new(0.5, 90.0), 1.0)
        .unwrap();
    assert_eq!(pixel, vec![180, 0, 0, 255]);
}

#[test]
fn test_invalid_requests() {
    let mut tileset = Tileset::new(small_config(), world_source()).unwrap();
    for (c, dpp) in [
        (GeoCoordinate::new(f64::NAN, 0.0), 1.0),
        (GeoCoordinate::new(0.0, f64::INFINITY), 1.0),
        (GeoCoordinate::new(0.0, 0.0), 0.0),
        (GeoCoordinate::new(0.0, 0.0), -1.0),
        (GeoCoordinate::new(0.0, 0.0), f64::NAN),
    ] {
        let err = tileset.pixel_for_coordinate(c, dpp).unwrap_err();
        assert!(matches!(err, TilesetError::InvalidRequest(_)), "{:?}", err);
    }
}

#[test]
fn test_source_errors_propagate() {
    let mut tileset = Tileset::new(small_config(), BrokenSource).unwrap();
    let err = tileset
        .pixel_for_coordinate(coord(coords::NULL_ISLAND), 1.0)
        .unwrap_err();
    assert!(matches!(err, TilesetError::Source(_)));
    // Failures are not cached
    assert_eq!(tileset.cached_tiles(), 0);
}

#[test]
fn test_invalid_configuration() {
    let bad_tile_size = TilesetConfig {
        tile_size: 0,
        ..Default::default()
    };
    assert!(matches!(
        Tileset::new(bad_tile_size, world_source()),
        Err(TilesetError::Config(_))
    ));

    let huge_tiles = TilesetConfig {
        tile_size: 1_000_000,
        max_level: 0,
        ..Default::default()
    };
    assert!(matches!(
        Tileset::new(huge_tiles, world_source()),
        Err(TilesetError::Config(_))
    ));

    let shifted = TilesetConfig {
        projection: "+proj=eqc +lon_0=90".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        Tileset::new(shifted, world_source()),
        Err(TilesetError::Config(_))
    ));

    let polar = TilesetConfig {
        projection: "+proj=eqc +lat_ts=90".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        Tileset::new(polar, world_source()),
        Err(TilesetError::Projection(_))
    ));
}

/// Claims a pixel format too wide for any tile buffer.
struct OversizedPixelSource;

impl TileSource for OversizedPixelSource {
    fn coverage(&self) -> Bounds {
        Bounds::world()
    }

    fn native_degrees_per_pixel(&self) -> f64 {
        1.0
    }

    fn bytes_per_pixel(&self) -> usize {
        usize::MAX / 8
    }

    fn fetch(&self, _request: &SourceRequest) -> Result<SourceRaster> {
        Err(TilesetError::Source("not reached".to_string()))
    }
}

#[test]
fn test_oversized_tile_buffer_is_config_error() {
    let config = TilesetConfig {
        tile_size: 4096,
        max_level: 0,
        ..Default::default()
    };
    let mut tileset = Tileset::new(config, OversizedPixelSource).unwrap();
    let err = tileset
        .pixel_for_coordinate(GeoCoordinate::new(10.0, 10.0), 1.0)
        .unwrap_err();
    assert!(matches!(err, TilesetError::Config(_)), "{:?}", err);
}

#[test]
fn test_shared_behind_mutex() {
    let tileset = Arc::new(Mutex::new(
        Tileset::new(small_config(), world_source()).unwrap(),
    ));

    let handles: Vec<_> = [coords::NEW_YORK, coords::TOKYO, coords::SYDNEY]
        .into_iter()
        .map(|c| {
            let tileset = Arc::clone(&tileset);
            std::thread::spawn(move || {
                tileset
                    .lock()
                    .unwrap()
                    .pixel_for_coordinate(coord(c), 1.0)
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().len(), RGBA_BYTES);
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_json_defaults() {
    let config: TilesetConfig =
        serde_json::from_str(r#"{"tile_size": 128, "cache_count_limit": null}"#).unwrap();
    assert_eq!(config.tile_size, 128);
    assert_eq!(config.cache_count_limit, None);
    assert_eq!(config.max_level, TilesetConfig::default().max_level);

    let json = serde_json::to_string(&config).unwrap();
    let back: TilesetConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_config_from_env() {
    std::env::set_var("TILESET_TILE_SIZE", "64");
    std::env::set_var("TILESET_MAX_LEVEL", "not-a-number");
    std::env::set_var("TILESET_CACHE_LIMIT", "none");
    std::env::set_var("TILESET_PROJECTION", "+proj=merc");

    let config = TilesetConfig::from_env();
    assert_eq!(config.tile_size, 64);
    assert_eq!(config.max_level, 8);
    assert_eq!(config.cache_count_limit, None);
    assert_eq!(config.projection, "+proj=merc");

    std::env::set_var("TILESET_CACHE_LIMIT", "12");
    assert_eq!(TilesetConfig::from_env().cache_count_limit, Some(12));

    for var in [
        "TILESET_TILE_SIZE",
        "TILESET_MAX_LEVEL",
        "TILESET_CACHE_LIMIT",
        "TILESET_PROJECTION",
    ] {
        std::env::remove_var(var);
    }
}
