//! Classified records produced by the network traversal

use geo::{Coord, LineString};

use crate::{Distance, EdgeId, NodeId};

/// Key of a chopped edge: the chopped edge id and the node it was chopped from
pub type ChoppedEdgeKey = (EdgeId, NodeId);

/// A node reached by the traversal.
///
/// The same record is used for pending frontier entries and for the best
/// entry kept per node id once visited.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneNode {
    pub node: NodeId,
    /// Network distance accumulated from the seed
    pub traverse_distance: Distance,
    /// The edge used to reach this node, `None` for the seed
    pub in_edge: Option<EdgeId>,
    pub from_node: Option<NodeId>,
    pub is_leaf: bool,
    /// Node synthesized at the end of a chopped edge
    pub is_chopped: bool,
    pub coord: Coord<f64>,
}

impl IsochroneNode {
    pub(crate) fn seed(node: NodeId, coord: Coord<f64>) -> Self {
        Self {
            node,
            traverse_distance: 0.0,
            in_edge: None,
            from_node: None,
            is_leaf: false,
            is_chopped: false,
            coord,
        }
    }
}

/// An edge traversed towards `to_node`, either whole or chopped at the
/// distance budget.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneEdge {
    pub edge: EdgeId,
    /// Edge geometry oriented from `from_node` to `to_node`
    pub geometry: LineString<f64>,
    /// Length of `geometry`
    pub length: Distance,
    /// Network distance from the seed to `to_node`
    pub traverse_distance: Distance,
    pub is_leaf: bool,
    pub is_chopped: bool,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub to_coord: Coord<f64>,
}
