//! Command line driver for batch isochrone generation.
//!
//! Loads a road network from a `GeoJSON` file and seed points from a CSV file
//! (`id,lat,lng,radius`), computes one isochrone per seed and writes the
//! polygons, lines, nodes and per-point statistics to an output directory.
//!
//! ```bash
//! isonet --network roads.geojson --seeds points.csv --output out/ \
//!   --detail-level mid --buffer-size 50
//! ```

mod io;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use isonet_core::{
    DetailLevel, InMemoryNetwork, IsochroneOptions, LocalTangentPlaneResolver,
    compute_isochrone_batch,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Geojson,
    Wkt,
}

/// Network isochrones for a batch of seed points
#[derive(Parser, Debug)]
#[command(name = "isonet", version)]
struct Args {
    /// Road network as a GeoJSON FeatureCollection of (Multi)LineStrings
    #[arg(long)]
    network: PathBuf,

    /// Seed points CSV with `id,lat,lng,radius` columns
    #[arg(long)]
    seeds: PathBuf,

    /// Directory receiving the results
    #[arg(long, short, default_value = "isonet-out")]
    output: PathBuf,

    /// TOML file with isochrone options, command line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Buffer width around the reached network, in metres
    #[arg(long)]
    buffer_size: Option<f64>,

    /// Polygon detail level: high, mid or low
    #[arg(long)]
    detail_level: Option<String>,

    /// Concave hull threshold used by the low detail level, in metres
    #[arg(long)]
    concave_hull_threshold: Option<f64>,

    /// Keep only the outer ring of every polygon
    #[arg(long)]
    remove_holes: bool,

    /// Worker threads, defaults to the available parallelism
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long, value_enum, default_value = "geojson")]
    format: OutputFormat,
}

impl Args {
    fn options(&self) -> Result<IsochroneOptions, isonet_core::Error> {
        let mut options = match &self.config {
            Some(path) => IsochroneOptions::from_toml_file(path)?,
            None => IsochroneOptions::default(),
        };

        if let Some(buffer_size) = self.buffer_size {
            options.buffer_size = buffer_size;
        }
        if let Some(level) = &self.detail_level {
            options.detail_level = DetailLevel::from(level.clone());
        }
        if let Some(threshold) = self.concave_hull_threshold {
            options.concave_hull_threshold = threshold;
        }
        if self.remove_holes {
            options.remove_holes = true;
        }
        if let Some(threads) = self.threads {
            options.worker_threads = Some(threads);
        }

        options.validate()?;
        Ok(options)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let options = args.options()?;

    info!(
        network = %args.network.display(),
        seeds = %args.seeds.display(),
        detail_level = %options.detail_level,
        buffer_size = options.buffer_size,
        "Starting isochrone batch"
    );

    let network = InMemoryNetwork::from_geojson_file(&args.network)?;
    let seeds = io::read_seeds(&args.seeds)?;
    info!(
        "Loaded {} network features and {} seed points",
        network.len(),
        seeds.len()
    );

    let batch = compute_isochrone_batch(&network, &LocalTangentPlaneResolver, &seeds, &options)?;
    for failed in batch.failures() {
        if let Some(failure) = &failed.failure {
            warn!(id = %failed.id, code = %failure.code, "{}", failure.message);
        }
    }

    std::fs::create_dir_all(&args.output)?;
    match args.format {
        OutputFormat::Geojson => io::write_geojson(&args.output, &batch)?,
        OutputFormat::Wkt => io::write_wkt(&args.output, &batch)?,
    }
    io::write_stats(&args.output, &batch)?;

    info!(
        output = %args.output.display(),
        "Wrote {} isochrones ({} failed)",
        batch.len(),
        batch.len() - batch.success_count()
    );
    Ok(())
}
