//! Distance-bounded breadth-first traversal of the network graph

use std::collections::VecDeque;

use geo::{Buffer, Contains, Coord, LineString, MultiPolygon};
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use log::trace;

use crate::geometry::{coord_distance, extract_line, line_length, oriented_from};
use crate::model::{ChoppedEdgeKey, IsochroneEdge, IsochroneNode, NetworkEdge, NetworkGraph};
use crate::{Distance, EdgeId, Error, NodeId};

/// Registries left by a traversal, after cleanup
#[derive(Debug, Clone)]
pub struct TraversalResult {
    start: NodeId,
    budget: Distance,
    visited: HashMap<NodeId, IsochroneNode>,
    whole: HashMap<EdgeId, IsochroneEdge>,
    chopped: HashMap<ChoppedEdgeKey, IsochroneEdge>,
}

impl TraversalResult {
    pub fn start_node(&self) -> NodeId {
        self.start
    }

    pub fn budget(&self) -> Distance {
        self.budget
    }

    /// True when no edge was reached from the start node
    pub fn is_empty(&self) -> bool {
        self.whole.is_empty() && self.chopped.is_empty()
    }

    pub fn visited_node(&self, id: NodeId) -> Option<&IsochroneNode> {
        self.visited.get(&id)
    }

    /// Visited nodes ordered by node id, synthetic nodes first
    pub fn visited_nodes(&self) -> Vec<&IsochroneNode> {
        let mut nodes: Vec<_> = self.visited.values().collect();
        nodes.sort_unstable_by_key(|node| node.node);
        nodes
    }

    pub fn leaf_nodes(&self) -> Vec<&IsochroneNode> {
        let mut nodes = self.visited_nodes();
        nodes.retain(|node| node.is_leaf);
        nodes
    }

    pub fn whole_edge(&self, id: EdgeId) -> Option<&IsochroneEdge> {
        self.whole.get(&id)
    }

    /// Whole edges ordered by edge id
    pub fn whole_edges(&self) -> Vec<&IsochroneEdge> {
        let mut edges: Vec<_> = self.whole.values().collect();
        edges.sort_unstable_by_key(|edge| edge.edge);
        edges
    }

    /// Chopped edges ordered by (edge id, chopped-from node id)
    pub fn chopped_edges(&self) -> Vec<&IsochroneEdge> {
        let mut edges: Vec<_> = self.chopped.values().collect();
        edges.sort_unstable_by_key(|edge| (edge.edge, edge.from_node));
        edges
    }
}

struct Traversal<'a> {
    graph: &'a NetworkGraph,
    budget: Distance,
    cover_radius: f64,
    frontier: VecDeque<IsochroneNode>,
    visited: HashMap<NodeId, IsochroneNode>,
    /// Distance at which each node was last expanded
    expanded: HashMap<NodeId, Distance>,
    whole: HashMap<EdgeId, IsochroneEdge>,
    covers: HashMap<EdgeId, MultiPolygon<f64>>,
    chopped: HashMap<ChoppedEdgeKey, IsochroneEdge>,
    next_synthetic: NodeId,
}

/// Walks `graph` from `start` until every path has used up `budget`.
///
/// Edges that fit within the budget are kept whole, edges that cross it are
/// chopped at the budget and end in a synthetic leaf node with a negative id.
/// Chopped stretches already covered by a whole edge buffered by
/// `cover_radius` are discarded.
///
/// # Errors
///
/// Returns an error if `start` is not a node of `graph` or the budget is
/// negative or not finite.
pub fn traverse(
    graph: &NetworkGraph,
    start: NodeId,
    budget: Distance,
    cover_radius: f64,
) -> Result<TraversalResult, Error> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(Error::InvalidData(format!(
            "Distance budget must be a non-negative number, got {budget}"
        )));
    }
    let seed = graph
        .node(start)
        .ok_or_else(|| Error::InvalidData(format!("Start node {start} is not in the graph")))?;

    let mut traversal = Traversal {
        graph,
        budget,
        cover_radius,
        frontier: VecDeque::from([IsochroneNode::seed(start, seed.geometry.0)]),
        visited: HashMap::new(),
        expanded: HashMap::new(),
        whole: HashMap::new(),
        covers: HashMap::new(),
        chopped: HashMap::new(),
        next_synthetic: -1,
    };

    traversal.run()?;
    traversal.cleanup();

    trace!(
        "Traversal from node {start} kept {} whole and {} chopped edges",
        traversal.whole.len(),
        traversal.chopped.len()
    );

    Ok(TraversalResult {
        start,
        budget,
        visited: traversal.visited,
        whole: traversal.whole,
        chopped: traversal.chopped,
    })
}

impl Traversal<'_> {
    fn run(&mut self) -> Result<(), Error> {
        let graph = self.graph;
        let mut is_start = true;

        while let Some(current) = self.frontier.pop_front() {
            // Superseded by a shorter path found after this entry was queued
            if self
                .visited
                .get(&current.node)
                .is_some_and(|best| best.traverse_distance < current.traverse_distance)
            {
                continue;
            }
            if self
                .expanded
                .get(&current.node)
                .is_some_and(|&distance| distance <= current.traverse_distance)
            {
                continue;
            }

            self.visited.insert(current.node, current.clone());
            self.expanded.insert(current.node, current.traverse_distance);

            for edge_id in graph.incident_edges(current.node) {
                let edge = graph
                    .edge(edge_id)
                    .ok_or_else(|| Error::InvalidData(format!("Edge {edge_id} is missing")))?;

                let candidate = current.traverse_distance + edge.length;
                if candidate <= self.budget {
                    self.visit_whole(&current, edge, candidate, is_start)?;
                } else {
                    self.chop(&current, edge);
                }
            }

            is_start = false;
        }

        Ok(())
    }

    /// Endpoint of `edge` geometrically farther from `current`, with its
    /// coordinate and degree
    fn far_endpoint(
        &self,
        current: &IsochroneNode,
        edge: EdgeId,
    ) -> Result<(NodeId, Coord<f64>, usize), Error> {
        let (a, b) = self
            .graph
            .edge_endpoints(edge)
            .ok_or_else(|| Error::InvalidData(format!("Edge {edge} has no endpoints")))?;

        let endpoint = |id: NodeId| {
            self.graph
                .node(id)
                .map(|node| (id, node.geometry.0, node.degree))
                .ok_or_else(|| Error::InvalidData(format!("Node {id} is missing")))
        };
        let (a, b) = (endpoint(a)?, endpoint(b)?);

        if coord_distance(a.1, current.coord) > coord_distance(b.1, current.coord) {
            Ok(a)
        } else {
            Ok(b)
        }
    }

    fn visit_whole(
        &mut self,
        current: &IsochroneNode,
        edge: &NetworkEdge,
        candidate: Distance,
        is_start: bool,
    ) -> Result<(), Error> {
        let (far, far_coord, far_degree) = self.far_endpoint(current, edge.id)?;
        let is_leaf = far_degree == 1 && !is_start;

        let record = IsochroneEdge {
            edge: edge.id,
            geometry: oriented_from(&edge.geometry, current.coord),
            length: edge.length,
            traverse_distance: candidate,
            is_leaf,
            is_chopped: false,
            from_node: current.node,
            to_node: far,
            to_coord: far_coord,
        };

        let registered = match self.whole.entry(edge.id) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(mut slot) => {
                if candidate < slot.get().traverse_distance {
                    slot.insert(record);
                    true
                } else {
                    false
                }
            }
        };
        if registered && !self.covers.contains_key(&edge.id) {
            self.covers
                .insert(edge.id, edge.geometry.buffer(self.cover_radius));
        }

        let reached = IsochroneNode {
            node: far,
            traverse_distance: candidate,
            in_edge: Some(edge.id),
            from_node: Some(current.node),
            is_leaf,
            is_chopped: false,
            coord: far_coord,
        };

        match self.visited.entry(far) {
            Entry::Vacant(slot) => {
                if is_leaf {
                    slot.insert(reached);
                } else {
                    self.frontier.push_back(reached);
                }
            }
            Entry::Occupied(mut slot) => {
                if candidate < slot.get().traverse_distance {
                    slot.insert(reached.clone());
                    if !is_leaf {
                        self.frontier.push_back(reached);
                    }
                }
            }
        }

        Ok(())
    }

    fn is_covered(&self, edge: EdgeId, line: &LineString<f64>) -> bool {
        self.covers
            .get(&edge)
            .is_some_and(|cover| cover.contains(line))
    }

    fn chop(&mut self, current: &IsochroneNode, edge: &NetworkEdge) {
        let remaining = self.budget - current.traverse_distance;
        // A node reached exactly at the budget gets no chop, so no leaf for the hull
        if remaining <= 0.0 {
            return;
        }

        let oriented = oriented_from(&edge.geometry, current.coord);
        let geometry = extract_line(&oriented, 0.0, remaining);
        let length = line_length(&geometry);
        let Some(&to_coord) = geometry.0.last() else {
            return;
        };

        if self.is_covered(edge.id, &geometry) {
            return;
        }

        let key = (edge.id, current.node);
        if let Some(existing) = self.chopped.get(&key) {
            if length <= existing.length {
                return;
            }
            self.visited.remove(&existing.to_node);
        }

        let synthetic = self.next_synthetic;
        self.next_synthetic -= 1;

        self.visited.insert(
            synthetic,
            IsochroneNode {
                node: synthetic,
                traverse_distance: self.budget,
                in_edge: Some(edge.id),
                from_node: Some(current.node),
                is_leaf: true,
                is_chopped: true,
                coord: to_coord,
            },
        );
        self.chopped.insert(
            key,
            IsochroneEdge {
                edge: edge.id,
                geometry,
                length,
                traverse_distance: self.budget,
                is_leaf: true,
                is_chopped: true,
                from_node: current.node,
                to_node: synthetic,
                to_coord,
            },
        );
    }

    /// Drops chopped leaves that a whole edge registered later already covers
    fn cleanup(&mut self) {
        let redundant: Vec<ChoppedEdgeKey> = self
            .chopped
            .iter()
            .filter(|(_, chop)| self.is_covered(chop.edge, &chop.geometry))
            .map(|(&key, _)| key)
            .collect();

        for key in redundant {
            if let Some(chop) = self.chopped.remove(&key) {
                self.visited.remove(&chop.to_node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::loading::build_graph;

    fn straight() -> NetworkGraph {
        build_graph(&[line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]], 100.0)
    }

    fn y_shape() -> NetworkGraph {
        build_graph(
            &[
                line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
                line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 100.0)],
                line_string![(x: 100.0, y: 0.0), (x: 200.0, y: -100.0)],
            ],
            100.0,
        )
    }

    /// Square block with a tail: 0-1-2-3-0 plus 2-4
    fn block() -> NetworkGraph {
        build_graph(
            &[
                line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
                line_string![(x: 100.0, y: 0.0), (x: 100.0, y: 100.0)],
                line_string![(x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
                line_string![(x: 0.0, y: 100.0), (x: 0.0, y: 0.0)],
                line_string![(x: 100.0, y: 100.0), (x: 200.0, y: 100.0)],
            ],
            100.0,
        )
    }

    #[test]
    fn chops_a_long_edge_at_the_budget() {
        let graph = straight();
        let result = traverse(&graph, 0, 400.0, 1.0).unwrap();

        assert!(result.whole_edges().is_empty());
        let chopped = result.chopped_edges();
        assert_eq!(chopped.len(), 1);
        assert_eq!(chopped[0].traverse_distance, 400.0);
        assert!((chopped[0].length - 400.0).abs() < 1e-9);
        assert!(chopped[0].to_node < 0);

        let leaves = result.leaf_nodes();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].is_chopped);
        assert!((leaves[0].coord.x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn dead_end_seed_still_expands() {
        let graph = straight();
        let result = traverse(&graph, 0, 2000.0, 1.0).unwrap();

        let whole = result.whole_edges();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].to_node, 1);
        assert!(!whole[0].is_leaf);
        assert!(result.chopped_edges().is_empty());
        assert_eq!(result.visited_node(1).map(|n| n.traverse_distance), Some(1000.0));
    }

    #[test]
    fn node_reached_at_the_budget_is_not_chopped() {
        let graph = build_graph(
            &[
                line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
                line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 0.0)],
            ],
            100.0,
        );
        let result = traverse(&graph, 0, 100.0, 1.0).unwrap();

        assert_eq!(result.whole_edges().len(), 1);
        assert!(result.chopped_edges().is_empty());
        assert!(result.leaf_nodes().is_empty());
    }

    #[test]
    fn degree_one_nodes_become_leaves() {
        let graph = y_shape();
        let result = traverse(&graph, 0, 1000.0, 1.0).unwrap();

        assert_eq!(result.whole_edges().len(), 3);
        let leaves: Vec<NodeId> = result.leaf_nodes().iter().map(|n| n.node).collect();
        assert_eq!(leaves, vec![2, 3]);
        assert!(result.chopped_edges().is_empty());
    }

    #[test]
    fn y_shape_chops_both_branches() {
        let graph = y_shape();
        let result = traverse(&graph, 0, 150.0, 1.0).unwrap();

        let whole = result.whole_edges();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].edge, 0);

        let chopped = result.chopped_edges();
        assert_eq!(chopped.len(), 2);
        for chop in chopped {
            assert_eq!(chop.traverse_distance, 150.0);
            assert!((chop.length - 50.0).abs() < 1e-9);
            assert_eq!(chop.from_node, 1);
        }
    }

    #[test]
    fn whole_edges_stay_within_budget() {
        let graph = block();
        for budget in [0.0, 50.0, 150.0, 250.0, 333.0, 1000.0] {
            let result = traverse(&graph, 0, budget, 1.0).unwrap();
            for edge in result.whole_edges() {
                assert!(edge.traverse_distance <= budget);
            }
            for edge in result.chopped_edges() {
                assert_eq!(edge.traverse_distance, budget);
            }
        }
    }

    #[test]
    fn shortest_distance_wins_in_a_loop() {
        let graph = block();
        let result = traverse(&graph, 0, 1000.0, 1.0).unwrap();

        assert_eq!(result.visited_node(2).map(|n| n.traverse_distance), Some(200.0));
        assert_eq!(result.visited_node(4).map(|n| n.traverse_distance), Some(300.0));
        assert!(result.visited_node(4).is_some_and(|n| n.is_leaf));
        // the far side of the block is kept from its nearer end
        assert_eq!(result.whole_edge(2).map(|e| e.traverse_distance), Some(200.0));
    }

    #[test]
    fn covered_chops_are_removed() {
        let graph = block();
        let result = traverse(&graph, 0, 250.0, 1.0).unwrap();

        for chop in result.chopped_edges() {
            assert!(result.whole_edge(chop.edge).is_none());
            assert!(result.visited_node(chop.to_node).is_some());
        }
        // only the tail beyond node 2 is chopped, the square is covered whole
        assert_eq!(result.chopped_edges().len(), 1);
        assert_eq!(result.chopped_edges()[0].edge, 4);
    }

    /// Start 0 reaches node 1 over a long detour first, then over a shortcut
    /// through node 2, so node 1 is expanded twice towards the tail at node 3.
    fn detour() -> NetworkGraph {
        build_graph(
            &[
                line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 8.0), (x: 10.0, y: 0.0)],
                line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
                line_string![(x: 1.0, y: 0.0), (x: 10.0, y: 0.0)],
                line_string![(x: 10.0, y: 0.0), (x: 110.0, y: 0.0)],
            ],
            100.0,
        )
    }

    #[test]
    fn longer_chop_replaces_earlier_one() {
        let graph = detour();
        let result = traverse(&graph, 0, 50.0, 1.0).unwrap();

        assert_eq!(result.visited_node(1).map(|n| n.traverse_distance), Some(10.0));

        let chopped = result.chopped_edges();
        assert_eq!(chopped.len(), 1);
        assert_eq!(chopped[0].edge, 3);
        assert_eq!(chopped[0].from_node, 1);
        assert!((chopped[0].length - 40.0).abs() < 1e-9);
        // the 31.13 chop from the detour took id -1 and was dropped
        assert_eq!(chopped[0].to_node, -2);

        let synthetic: Vec<NodeId> = result
            .visited_nodes()
            .iter()
            .map(|n| n.node)
            .filter(|&id| id < 0)
            .collect();
        assert_eq!(synthetic, vec![chopped[0].to_node]);

        let visited: Vec<NodeId> = result.visited_nodes().iter().map(|n| n.node).collect();
        assert_eq!(visited, vec![chopped[0].to_node, 0, 1, 2]);
    }

    #[test]
    fn traversal_is_deterministic() {
        let graph = block();
        let first = traverse(&graph, 1, 180.0, 1.0).unwrap();
        let second = traverse(&graph, 1, 180.0, 1.0).unwrap();

        assert_eq!(first.whole_edges(), second.whole_edges());
        assert_eq!(first.chopped_edges(), second.chopped_edges());
        assert_eq!(first.visited_nodes(), second.visited_nodes());
    }

    #[test]
    fn unknown_start_is_an_error() {
        let graph = straight();
        assert!(traverse(&graph, 7, 100.0, 1.0).is_err());
        assert!(traverse(&graph, 0, f64::NAN, 1.0).is_err());
    }
}
