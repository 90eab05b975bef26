//! Builds the routing graph from a flat set of projected lines

use geo::{Coord, LineString, Point};
use hashbrown::HashMap;
use log::{debug, trace};
use petgraph::graph::{NodeIndex, UnGraph};

use crate::geometry::{line_length, snap_line};
use crate::model::{NetworkEdge, NetworkGraph, NetworkNode};
use crate::{EdgeId, NodeId};

/// Endpoint key: coordinates are grid snapped, so equal bits mean equal nodes
fn coord_key(coord: Coord<f64>) -> (u64, u64) {
    (coord.x.to_bits(), coord.y.to_bits())
}

fn node_for(
    graph: &mut UnGraph<NetworkNode, NetworkEdge>,
    nodes: &mut HashMap<(u64, u64), NodeIndex>,
    coord: Coord<f64>,
) -> NodeIndex {
    *nodes.entry(coord_key(coord)).or_insert_with(|| {
        let id = graph.node_count() as NodeId;
        graph.add_node(NetworkNode {
            id,
            geometry: Point(coord),
            degree: 0,
        })
    })
}

/// Creates a graph with one edge per line and one node per distinct endpoint.
///
/// Lines are snapped to a grid of `precision_scale` cells per unit first.
/// Lines that collapse to zero length are dropped. Node and edge ids follow
/// input order, so identical input yields an identical graph.
pub fn build_graph(lines: &[LineString<f64>], precision_scale: f64) -> NetworkGraph {
    let mut graph = UnGraph::with_capacity(lines.len() * 2, lines.len());
    let mut nodes: HashMap<(u64, u64), NodeIndex> = HashMap::with_capacity(lines.len() * 2);
    let mut dropped = 0usize;

    for line in lines {
        let geometry = snap_line(line, precision_scale);
        let length = line_length(&geometry);

        let (Some(&first), Some(&last)) = (geometry.0.first(), geometry.0.last()) else {
            dropped += 1;
            continue;
        };
        if geometry.0.len() < 2 || length <= 0.0 {
            trace!("Dropping zero-length segment at {first:?}");
            dropped += 1;
            continue;
        }

        let from = node_for(&mut graph, &mut nodes, first);
        let to = node_for(&mut graph, &mut nodes, last);
        graph[from].degree += 1;
        graph[to].degree += 1;

        let id: EdgeId = graph.edge_count();
        graph.add_edge(
            from,
            to,
            NetworkEdge {
                id,
                geometry,
                length,
            },
        );
    }

    debug!(
        "Built network graph with {} nodes and {} edges ({dropped} segments dropped)",
        graph.node_count(),
        graph.edge_count()
    );

    NetworkGraph::new(graph)
}
