//! Seed point input and result output files

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Point;
use geojson::FeatureCollection;
use isonet_core::{BatchResult, SeedPoint};
use serde::Deserialize;
use wkt::ToWkt;

#[derive(Debug, Deserialize)]
struct SeedRecord {
    id: Option<String>,
    lat: f64,
    lng: f64,
    radius: f64,
}

/// Reads seed points, rows without an id are named by their position
pub fn read_seeds(path: &Path) -> Result<Vec<SeedPoint>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let mut seeds = Vec::new();
    for (index, record) in reader.deserialize::<SeedRecord>().enumerate() {
        let record = record?;
        let id = record
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| index.to_string());
        seeds.push(SeedPoint::new(id, Point::new(record.lng, record.lat), record.radius));
    }
    Ok(seeds)
}

fn write_collection(
    path: &Path,
    collection: &FeatureCollection,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, collection)?;
    writer.flush()?;
    Ok(())
}

pub fn write_geojson(dir: &Path, batch: &BatchResult) -> Result<(), Box<dyn std::error::Error>> {
    write_collection(&dir.join("polygons.geojson"), &batch.polygons_geojson()?)?;
    write_collection(&dir.join("lines.geojson"), &batch.lines_geojson()?)?;
    write_collection(&dir.join("nodes.geojson"), &batch.nodes_geojson()?)?;
    Ok(())
}

/// Writes one CSV row per polygon with its geometry as WKT
pub fn write_wkt(dir: &Path, batch: &BatchResult) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(dir.join("polygons.csv"))?;
    writer.write_record(["id", "seedcoord", "calcstatus", "roadarea", "wkt"])?;

    for result in &batch.results {
        writer.write_record([
            result.id.clone(),
            result.seed_coord(),
            result.status.to_string(),
            result.road_area.to_string(),
            result.polygon.wkt_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_stats(dir: &Path, batch: &BatchResult) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(dir.join("stats.json"))?);
    serde_json::to_writer_pretty(&mut writer, &batch.stats_json())?;
    writer.flush()?;
    Ok(())
}
