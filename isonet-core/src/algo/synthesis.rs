//! Turns traversal registries into the service area polygon and the
//! line and node outputs.

use geo::{Area, Buffer, Coord, MultiPolygon, Point, unary_union};
use log::trace;

use super::hull::{HullShape, concave_hull};
use super::traversal::TraversalResult;
use crate::config::IsochroneOptions;
use crate::model::{CalcStatus, IsochroneEdge, IsochroneLine, IsochroneVertex};
use crate::{Distance, Error, SEED_NODE_ID};

/// Service area of one seed point, in projected coordinates
#[derive(Debug, Clone)]
pub struct SynthesizedArea {
    pub status: CalcStatus,
    pub polygon: MultiPolygon<f64>,
    /// Area of `polygon`
    pub road_area: f64,
    pub lines: Vec<IsochroneLine>,
    pub nodes: Vec<IsochroneVertex>,
    pub leaf_count: usize,
}

impl SynthesizedArea {
    /// Disc around the seed, used when nothing was reached
    fn disc(seed: Point<f64>, buffer_size: f64) -> Self {
        Self {
            status: CalcStatus::Failure,
            polygon: seed.buffer(buffer_size),
            road_area: 0.0,
            lines: Vec::new(),
            nodes: Vec::new(),
            leaf_count: 0,
        }
    }
}

fn to_line(edge: &IsochroneEdge) -> IsochroneLine {
    IsochroneLine {
        geometry: edge.geometry.clone(),
        is_leaf: edge.is_leaf,
        is_chopped: edge.is_chopped,
        length: edge.length,
        traverse_distance: edge.traverse_distance,
    }
}

fn union_of_buffers(lines: &[IsochroneLine], buffer_size: f64) -> MultiPolygon<f64> {
    let buffers: Vec<MultiPolygon<f64>> = lines
        .iter()
        .map(|line| line.geometry.buffer(buffer_size))
        .collect();
    unary_union(&buffers)
}

fn buffer_hull(shape: &HullShape, buffer_size: f64) -> MultiPolygon<f64> {
    match shape {
        HullShape::Point(point) => point.buffer(buffer_size),
        HullShape::Line(line) => line.buffer(buffer_size),
        HullShape::Polygon(polygon) => polygon.buffer(buffer_size),
    }
}

/// Builds the service area from a traversal.
///
/// `seed` is the projected seed point. With no reached edge the result is a
/// disc of `buffer_size` around the seed flagged as a failure. Otherwise the
/// polygon is the union of the buffered edges for [`DetailLevel::High`], or
/// the buffered concave hull of the leaf nodes for the other levels.
///
/// [`DetailLevel::High`]: crate::DetailLevel::High
pub fn synthesize_area(
    traversal: &TraversalResult,
    seed: Point<f64>,
    reach_distance: Distance,
    options: &IsochroneOptions,
) -> Result<SynthesizedArea, Error> {
    let buffer_size = options.buffer_size;
    if traversal.is_empty() {
        return Ok(SynthesizedArea::disc(seed, buffer_size));
    }

    let lines: Vec<IsochroneLine> = traversal
        .whole_edges()
        .into_iter()
        .chain(traversal.chopped_edges())
        .map(to_line)
        .collect();

    let start = traversal.start_node();
    let mut nodes: Vec<IsochroneVertex> = traversal
        .visited_nodes()
        .into_iter()
        .filter(|node| node.node != start)
        .map(|node| IsochroneVertex {
            geometry: Point(node.coord),
            node_id: node.node,
            is_leaf: node.is_leaf,
            traverse_distance: node.traverse_distance,
        })
        .collect();
    nodes.push(IsochroneVertex {
        geometry: seed,
        node_id: SEED_NODE_ID,
        is_leaf: false,
        traverse_distance: 0.0,
    });

    let leaves: Vec<Coord<f64>> = traversal
        .leaf_nodes()
        .into_iter()
        .map(|node| node.coord)
        .collect();

    let polygon = match options.hull_threshold(reach_distance) {
        None => union_of_buffers(&lines, buffer_size),
        Some(threshold) => match concave_hull(&leaves, threshold) {
            Some(shape) => buffer_hull(&shape, buffer_size),
            None => {
                trace!("No leaf nodes to build a hull from, using the buffered network");
                union_of_buffers(&lines, buffer_size)
            }
        },
    };

    if polygon.0.is_empty() {
        return Err(Error::Geometry(
            "Buffering the reached network produced an empty polygon".to_string(),
        ));
    }

    Ok(SynthesizedArea {
        status: CalcStatus::Success,
        road_area: polygon.unsigned_area(),
        polygon,
        lines,
        nodes,
        leaf_count: leaves.len(),
    })
}
