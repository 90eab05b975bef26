//! Parallel dispatch of the isochrone pipeline over a batch of seed points

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use geo::{MultiPolygon, Point};
use geojson::{Feature, FeatureCollection};
use log::{info, warn};
use rayon::prelude::*;
use serde_json::{Value, json};

use super::isochrone::{compute_isochrone, seed_disc};
use crate::config::IsochroneOptions;
use crate::loading::{CrsResolver, NetworkSource};
use crate::model::IsochroneResult;
use crate::{Distance, Error};

/// A point of interest with its own reach distance
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPoint {
    pub id: String,
    /// Geographic location (x = longitude, y = latitude)
    pub location: Point<f64>,
    pub reach_distance: Distance,
}

impl SeedPoint {
    pub fn new(id: impl Into<String>, location: Point<f64>, reach_distance: Distance) -> Self {
        Self {
            id: id.into(),
            location,
            reach_distance,
        }
    }

    /// Pairs points with reach distances, ids are the input positions.
    ///
    /// A single reach distance applies to every point.
    pub fn from_arrays(
        points: &[Point<f64>],
        reach_distances: &[Distance],
    ) -> Result<Vec<Self>, Error> {
        match reach_distances {
            [reach] => Ok(points
                .iter()
                .enumerate()
                .map(|(index, &point)| Self::new(index.to_string(), point, *reach))
                .collect()),
            _ if reach_distances.len() == points.len() => Ok(points
                .iter()
                .zip(reach_distances)
                .enumerate()
                .map(|(index, (&point, &reach))| Self::new(index.to_string(), point, reach))
                .collect()),
            _ => Err(Error::InvalidData(format!(
                "Got {} reach distances for {} points",
                reach_distances.len(),
                points.len()
            ))),
        }
    }
}

/// Results of a batch, one per seed point in input order
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub results: Vec<IsochroneResult>,
    pub elapsed: Duration,
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &IsochroneResult> {
        self.results.iter().filter(|r| r.failure.is_some())
    }

    /// One polygon feature per seed point
    pub fn polygons_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .results
            .iter()
            .map(IsochroneResult::polygon_feature)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(collection(features))
    }

    pub fn lines_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = Vec::new();
        for result in &self.results {
            features.extend(result.line_features()?);
        }
        Ok(collection(features))
    }

    pub fn nodes_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = Vec::new();
        for result in &self.results {
            features.extend(result.node_features()?);
        }
        Ok(collection(features))
    }

    /// Per-point statistics as a JSON array, failed points carry their error
    pub fn stats_json(&self) -> Value {
        let entries = self
            .results
            .iter()
            .map(|result| match (&result.stats, &result.failure) {
                (Some(stats), _) => json!({
                    "id": result.id,
                    "calcstatus": result.status,
                    "stats": stats,
                }),
                (None, failure) => json!({
                    "id": result.id,
                    "calcstatus": result.status,
                    "error": failure,
                }),
            })
            .collect();
        Value::Array(entries)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

fn run_point<N, R>(
    network: &N,
    resolver: &R,
    seed: &SeedPoint,
    options: &IsochroneOptions,
) -> IsochroneResult
where
    N: NetworkSource + ?Sized,
    R: CrsResolver + ?Sized,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        compute_isochrone(network, resolver, seed, options)
    }));

    let error = match outcome {
        Ok(Ok(result)) => return result,
        Ok(Err(error)) => error,
        Err(payload) => Error::WorkerPanic(panic_message(payload)),
    };
    warn!("Isochrone for point {} failed: {error}", seed.id);

    let fallback = seed_disc(resolver, seed.location, options.buffer_size)
        .unwrap_or_else(|| MultiPolygon::new(vec![]));
    IsochroneResult::failed(
        seed.id.clone(),
        seed.location,
        seed.reach_distance,
        options.buffer_size,
        &error,
        fallback,
    )
}

/// Computes isochrones for every seed point on a dedicated worker pool.
///
/// Each point runs the full pipeline independently. A point that fails, or
/// panics, gets a failure slot and does not affect the other points.
///
/// # Errors
///
/// Returns an error only for invalid options or when the worker pool cannot
/// be created.
pub fn compute_isochrone_batch<N, R>(
    network: &N,
    resolver: &R,
    seeds: &[SeedPoint],
    options: &IsochroneOptions,
) -> Result<BatchResult, Error>
where
    N: NetworkSource + Sync + ?Sized,
    R: CrsResolver + Sync + ?Sized,
{
    options.validate()?;
    let started = Instant::now();

    let threads = options.worker_threads.unwrap_or_else(|| {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    });
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("isochrone-{index}"))
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    let results: Vec<IsochroneResult> = pool.install(|| {
        seeds
            .par_iter()
            .map(|seed| run_point(network, resolver, seed, options))
            .collect()
    });

    let batch = BatchResult {
        results,
        elapsed: started.elapsed(),
    };
    info!(
        "Completed {} isochrones for {} points ({} failed) in {:.2}s on {threads} threads",
        batch.success_count(),
        batch.len(),
        batch.failures().count(),
        batch.elapsed.as_secs_f64()
    );

    Ok(batch)
}
