// Re-export key components
pub use crate::algo::batch::{BatchResult, SeedPoint, compute_isochrone_batch};
pub use crate::algo::isochrone::compute_isochrone;
pub use crate::algo::synthesis::{SynthesizedArea, synthesize_area};
pub use crate::algo::traversal::{TraversalResult, traverse};
pub use crate::config::{DetailLevel, IsochroneOptions};
pub use crate::loading::{
    CrsResolver, InMemoryNetwork, LocalTangentPlane, LocalTangentPlaneResolver, NetworkSource,
    Projection, SpatialIndex, build_graph, snap_to_network,
};
pub use crate::model::{
    CalcStatus, IsochroneEdge, IsochroneNode, IsochroneResult, NetworkGraph, PerformanceStats,
};

// Core identifier types
pub use crate::Distance;
pub use crate::EdgeId;
pub use crate::Error;
pub use crate::NodeId;
