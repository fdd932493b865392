//! Compare exact inverse projection with unprojection-table lookups.
//!
//! Builds a table over a region, then unprojects a dense grid of planar
//! points both ways and reports timing, speedup and the largest error.
//!
//! Run with: cargo run --release --bin unprojection-bench -- --help

use anyhow::{Context, Result};
use clap::Parser;
use map_common::{Bounds, PlanarPoint, PlanarSize};
use projection::{MapProjection, Projection, UnprojectionTable};
use std::hint::black_box;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "unprojection-bench")]
#[command(about = "Benchmark unprojection tables against exact inverse projection")]
struct Args {
    /// Projection definition
    #[arg(short, long, default_value = "+proj=merc")]
    projection: String,

    /// Region as minlon,minlat,maxlon,maxlat
    #[arg(short, long, default_value = "-130,20,-60,55")]
    bounds: String,

    /// Table sample spacings to test (planar units)
    #[arg(short, long, value_delimiter = ',', default_value = "0.05,0.02,0.01")]
    spacing: Vec<f64>,

    /// Query points per axis
    #[arg(short, long, default_value = "512")]
    queries: usize,

    /// Repetitions per measurement
    #[arg(short, long, default_value = "5")]
    iterations: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let projection = Projection::from_definition(&args.projection)
        .with_context(|| format!("invalid projection '{}'", args.projection))?;
    let bounds: Bounds = args
        .bounds
        .parse()
        .with_context(|| format!("invalid bounds '{}'", args.bounds))?;

    info!(
        projection = %args.projection,
        bounds = %args.bounds,
        queries = args.queries * args.queries,
        "Starting unprojection benchmark"
    );

    println!(
        "{:<10} {:>10} {:>12} {:>12} {:>9} {:>14}",
        "Spacing", "Nodes", "Exact", "Table", "Speedup", "Max error (°)"
    );
    println!("{:-<72}", "");

    for &spacing in &args.spacing {
        let table = UnprojectionTable::build(&bounds, PlanarSize::square(spacing), &projection)
            .with_context(|| format!("failed to build table at spacing {}", spacing))?;
        let points = query_points(&table, args.queries);

        let start = Instant::now();
        for _ in 0..args.iterations {
            for &p in &points {
                let _ = black_box(projection.inverse(p));
            }
        }
        let exact_us = start.elapsed().as_micros() / args.iterations.max(1) as u128;

        let start = Instant::now();
        for _ in 0..args.iterations {
            for &p in &points {
                let _ = black_box(table.coordinate_for_point(p));
            }
        }
        let table_us = start.elapsed().as_micros() / args.iterations.max(1) as u128;

        let mut max_error = 0.0_f64;
        for &p in &points {
            if let (Ok(a), Ok(b)) = (table.coordinate_for_point(p), projection.inverse(p)) {
                max_error = max_error.max((a.lon - b.lon).abs()).max((a.lat - b.lat).abs());
            }
        }

        println!(
            "{:<10} {:>10} {:>9} µs {:>9} µs {:>8.1}x {:>14.3e}",
            spacing,
            table.table_width() * table.table_length(),
            exact_us,
            table_us,
            exact_us as f64 / table_us.max(1) as f64,
            max_error
        );
    }

    Ok(())
}

/// A regular `n`x`n` grid of points spanning the table's domain.
fn query_points(table: &UnprojectionTable, n: usize) -> Vec<PlanarPoint> {
    let n = n.max(2);
    let step = table.division_size();
    let extent_x = (table.table_width() - 1) as f64 * step.width;
    let extent_y = (table.table_length() - 1) as f64 * step.height;
    let origin = table.origin();

    let mut points = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            points.push(origin.offset(
                extent_x * (i as f64 / (n - 1) as f64),
                extent_y * (j as f64 / (n - 1) as f64),
            ));
        }
    }
    points
}
