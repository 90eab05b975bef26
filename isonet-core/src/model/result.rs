//! Per-point isochrone results

use std::fmt;

use geo::{LineString, MultiPolygon, Point};
use serde::Serialize;

use crate::{Distance, Error, NodeId};

/// Outcome tag carried by every polygon feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcStatus {
    Success,
    Failure,
}

impl fmt::Display for CalcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcStatus::Success => f.write_str("success"),
            CalcStatus::Failure => f.write_str("failure"),
        }
    }
}

/// Reason a point could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointFailure {
    pub code: String,
    pub message: String,
}

impl From<&Error> for PointFailure {
    fn from(error: &Error) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// A retained whole or chopped edge
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneLine {
    pub geometry: LineString<f64>,
    pub is_leaf: bool,
    pub is_chopped: bool,
    pub length: Distance,
    pub traverse_distance: Distance,
}

/// A retained node position
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneVertex {
    pub geometry: Point<f64>,
    pub node_id: NodeId,
    pub is_leaf: bool,
    pub traverse_distance: Distance,
}

/// Wall time of each pipeline section, in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionTimings {
    pub region_query: f64,
    pub snap: f64,
    pub graph_build: f64,
    pub traversal: f64,
    pub synthesis: f64,
    pub reprojection: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub num_raw_links: usize,
    pub num_iso_links: usize,
    pub num_iso_nodes: usize,
    pub num_iso_leaf_nodes: usize,
    pub radius: Distance,
    pub buffer_size: Distance,
    pub seed_coord: String,
    pub timings: SectionTimings,
}

/// Isochrone of a single seed point.
///
/// Geometries are in geographic coordinates (x = longitude, y = latitude).
#[derive(Debug, Clone)]
pub struct IsochroneResult {
    pub id: String,
    pub seed: Point<f64>,
    pub reach_distance: Distance,
    pub buffer_size: Distance,
    pub status: CalcStatus,
    pub failure: Option<PointFailure>,
    pub polygon: MultiPolygon<f64>,
    /// Area of the polygon in projected units, before reprojection
    pub road_area: f64,
    pub lines: Vec<IsochroneLine>,
    pub nodes: Vec<IsochroneVertex>,
    pub stats: Option<PerformanceStats>,
}

impl IsochroneResult {
    /// Failure slot for a point whose pipeline returned an error
    pub fn failed(
        id: impl Into<String>,
        seed: Point<f64>,
        reach_distance: Distance,
        buffer_size: Distance,
        error: &Error,
        fallback: MultiPolygon<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            seed,
            reach_distance,
            buffer_size,
            status: CalcStatus::Failure,
            failure: Some(PointFailure::from(error)),
            polygon: fallback,
            road_area: 0.0,
            lines: Vec::new(),
            nodes: Vec::new(),
            stats: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CalcStatus::Success
    }

    /// Seed coordinate as "lat,lng"
    pub fn seed_coord(&self) -> String {
        seed_coord(&self.seed)
    }
}

pub(crate) fn seed_coord(seed: &Point<f64>) -> String {
    format!("{},{}", seed.y(), seed.x())
}
