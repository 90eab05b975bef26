//! Data model for network isochrones
//!
//! Contains the network graph, the classified traversal records and the
//! per-point results.

pub mod isochrone;
pub mod network;
pub mod result;
mod to_geojson;

pub use isochrone::{ChoppedEdgeKey, IsochroneEdge, IsochroneNode};
pub use network::{IndexedPoint, NetworkEdge, NetworkGraph, NetworkNode};
pub use result::{
    CalcStatus, IsochroneLine, IsochroneResult, IsochroneVertex, PerformanceStats, PointFailure,
    SectionTimings,
};
