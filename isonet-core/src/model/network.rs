//! Road network graph - nodes, edges and node lookup

use geo::{LineString, Point};
use itertools::Itertools;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::{Distance, EdgeId, NodeId};

/// Node position in the R-tree with its graph index
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Network graph node, one per distinct segment endpoint
#[derive(Debug, Clone)]
pub struct NetworkNode {
    pub id: NodeId,
    pub geometry: Point<f64>,
    /// Number of edge endpoints attached to this node
    pub degree: usize,
}

/// Network graph edge (one line segment of the source network)
#[derive(Debug, Clone)]
pub struct NetworkEdge {
    pub id: EdgeId,
    pub geometry: LineString<f64>,
    /// Cached length of `geometry`
    pub length: Distance,
}

/// Undirected road network graph for a single pipeline run.
///
/// Nodes and edges live in a petgraph arena and are addressed by integer ids,
/// adjacency is resolved through the arena rather than by references.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    pub(crate) graph: UnGraph<NetworkNode, NetworkEdge>,
    rtree: RTree<IndexedPoint>,
}

impl NetworkGraph {
    pub(crate) fn new(graph: UnGraph<NetworkNode, NetworkEdge>) -> Self {
        let points = graph
            .node_indices()
            .map(|index| {
                let geometry = graph[index].geometry;
                IndexedPoint::new([geometry.x(), geometry.y()], index)
            })
            .collect();

        Self {
            graph,
            rtree: RTree::bulk_load(points),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        usize::try_from(id)
            .ok()
            .filter(|&index| index < self.graph.node_count())
            .map(NodeIndex::new)
    }

    pub fn node(&self, id: NodeId) -> Option<&NetworkNode> {
        self.node_index(id).map(|index| &self.graph[index])
    }

    pub fn edge(&self, id: EdgeId) -> Option<&NetworkEdge> {
        self.graph.edge_weight(EdgeIndex::new(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &NetworkEdge> {
        self.graph.edge_weights()
    }

    /// Ids of the two endpoint nodes of an edge, in geometry order
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph
            .edge_endpoints(EdgeIndex::new(id))
            .map(|(a, b)| (self.graph[a].id, self.graph[b].id))
    }

    /// Ids of all edges attached to a node, sorted and without duplicates
    pub fn incident_edges(&self, id: NodeId) -> Vec<EdgeId> {
        self.node_index(id)
            .map(|index| {
                self.graph
                    .edges(index)
                    .map(|edge| edge.id().index())
                    .sorted_unstable()
                    .dedup()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds the node closest to `point`
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<NodeId> {
        self.rtree
            .nearest_neighbor(&[point.x(), point.y()])
            .map(|indexed| self.graph[indexed.data].id)
    }
}
