//! Network service areas ("isochrones") computed by distance-bounded
//! traversal of a road network.
//!
//! A seed point is snapped onto the nearest network edge, the reachable
//! sub-network is discovered by a breadth-first walk bounded by a distance
//! budget, and the visited edges are turned into a polygon by buffering.

pub mod algo;
pub mod config;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;

pub use error::Error;

pub use algo::batch::{BatchResult, SeedPoint, compute_isochrone_batch};
pub use algo::isochrone::compute_isochrone;
pub use config::{DetailLevel, IsochroneOptions};
pub use loading::{
    CrsResolver, InMemoryNetwork, LocalTangentPlane, LocalTangentPlaneResolver, NetworkSource,
    Projection,
};
pub use model::{CalcStatus, IsochroneResult, NetworkGraph};

/// Identifier of a graph node. Real nodes are non-negative, nodes synthesized
/// at the end of chopped edges are negative.
pub type NodeId = i64;

/// Identifier of a graph edge, shared by both directions of travel.
pub type EdgeId = usize;

/// Distances along the network, in projected units.
pub type Distance = f64;

/// Node id reported for the seed point in node outputs.
pub const SEED_NODE_ID: NodeId = 0;
