//! Snaps a seed point onto the network and splits the edge it lands on

use geo::{Coord, LineString, Point};
use log::trace;

use super::index::SpatialIndex;
use crate::Error;
use crate::geometry::{line_length, split_at};

/// Network edges ready for graph construction, with the snapped seed
#[derive(Debug, Clone)]
pub struct SnappedNetwork {
    pub edges: Vec<LineString<f64>>,
    /// Closest network location to the seed
    pub snap_point: Coord<f64>,
    /// Distance from the seed to `snap_point`
    pub snap_distance: f64,
    /// Whether the snapped edge was replaced by two halves
    pub split: bool,
}

/// Snaps `seed` onto the closest of `edges` within `max_distance`.
///
/// The closest edge is replaced by its two halves at the snap location. When
/// the snap location is an endpoint of the edge the set is left unchanged.
pub fn snap_to_network(
    mut edges: Vec<LineString<f64>>,
    seed: Point<f64>,
    max_distance: f64,
) -> Result<SnappedNetwork, Error> {
    let nearest = SpatialIndex::new(&edges)
        .nearest_within(&seed, max_distance)
        .ok_or(Error::NoSnap { max_distance })?;

    let (head, tail) = split_at(&edges[nearest.index], nearest.projected.along);
    let split = line_length(&head) > 0.0 && line_length(&tail) > 0.0;

    if split {
        edges.swap_remove(nearest.index);
        edges.push(head);
        edges.push(tail);
    } else {
        trace!("Seed snapped to an edge endpoint, edge {} kept whole", nearest.index);
    }

    Ok(SnappedNetwork {
        edges,
        snap_point: nearest.projected.point,
        snap_distance: nearest.projected.distance,
        split,
    })
}
