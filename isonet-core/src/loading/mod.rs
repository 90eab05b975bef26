//! This module is responsible for loading network edges from a data source,
//! projecting them, snapping the seed point and building the routing graph.

mod builder;
mod index;
mod projection;
mod snapper;
mod source;

pub use builder::build_graph;
pub use index::{NearestLine, SpatialIndex};
pub use projection::{CrsResolver, LocalTangentPlane, LocalTangentPlaneResolver, Projection};
pub use snapper::{SnappedNetwork, snap_to_network};
pub use source::{InMemoryNetwork, NetworkSource};
