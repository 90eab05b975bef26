//! Per-point isochrone pipeline: region query, snapping, graph building,
//! traversal and area synthesis.

use std::time::Instant;

use geo::{Buffer, Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use log::debug;

use super::batch::SeedPoint;
use super::synthesis::synthesize_area;
use super::traversal::traverse;
use crate::Error;
use crate::config::IsochroneOptions;
use crate::geometry::snap_coord;
use crate::loading::{CrsResolver, NetworkSource, Projection, build_graph, snap_to_network};
use crate::model::result::seed_coord;
use crate::model::{
    IsochroneLine, IsochroneResult, IsochroneVertex, PerformanceStats, SectionTimings,
};

fn lap(clock: &mut Instant) -> f64 {
    let elapsed = clock.elapsed().as_secs_f64();
    *clock = Instant::now();
    elapsed
}

fn without_holes(polygon: MultiPolygon<f64>) -> MultiPolygon<f64> {
    polygon
        .into_iter()
        .map(|polygon| Polygon::new(polygon.into_inner().0, vec![]))
        .collect()
}

/// Geographic disc of `buffer_size` around a seed point
pub(crate) fn seed_disc<R>(
    resolver: &R,
    location: Point<f64>,
    buffer_size: f64,
) -> Option<MultiPolygon<f64>>
where
    R: CrsResolver + ?Sized,
{
    let projection = resolver.resolve(location).ok()?;
    let seed = Point(projection.forward(location.0));
    Some(projection.inverse_geometry(&seed.buffer(buffer_size)))
}

/// Computes the isochrone of a single seed point.
///
/// Network edges are fetched around the seed within reach distance plus
/// buffer size, projected with the reference system resolved for the seed,
/// and the resulting geometries are returned in geographic coordinates.
///
/// # Errors
///
/// Returns [`Error::NoNetworkNearby`] when the source has no edge around
/// the seed and [`Error::NoSnap`] when no edge lies within the search
/// radius. Projection and source failures are passed through.
pub fn compute_isochrone<N, R>(
    network: &N,
    resolver: &R,
    seed: &SeedPoint,
    options: &IsochroneOptions,
) -> Result<IsochroneResult, Error>
where
    N: NetworkSource + ?Sized,
    R: CrsResolver + ?Sized,
{
    let started = Instant::now();
    let mut clock = started;
    let mut timings = SectionTimings::default();

    let reach = seed.reach_distance;
    if !reach.is_finite() || reach < 0.0 {
        return Err(Error::InvalidData(format!(
            "Reach distance must be a non-negative number, got {reach}"
        )));
    }
    options.validate()?;

    let projection = resolver.resolve(seed.location)?;
    let seed_prj = Point(projection.forward(seed.location.0));
    let search_radius = reach + options.buffer_size;

    let search = Rect::new(
        Coord {
            x: seed_prj.x() - search_radius,
            y: seed_prj.y() - search_radius,
        },
        Coord {
            x: seed_prj.x() + search_radius,
            y: seed_prj.y() + search_radius,
        },
    );
    let raw = network.edges_in_region(&projection.inverse_envelope(&search))?;
    if raw.is_empty() {
        return Err(Error::NoNetworkNearby);
    }
    let num_raw_links = raw.len();

    let lines: Vec<LineString<f64>> = raw
        .iter()
        .flat_map(|feature| feature.0.iter())
        .map(|line| projection.forward_geometry(line))
        .collect();
    timings.region_query = lap(&mut clock);

    let snapped = snap_to_network(lines, seed_prj, search_radius)?;
    timings.snap = lap(&mut clock);

    let graph = build_graph(&snapped.edges, options.precision_scale);
    let snap_point = Point(snap_coord(snapped.snap_point, options.precision_scale));
    let start = graph.nearest_node(&snap_point).ok_or_else(|| {
        Error::InvalidData("Network region has no segment of non-zero length".to_string())
    })?;
    timings.graph_build = lap(&mut clock);

    let traversal = traverse(&graph, start, reach, options.cover_radius)?;
    timings.traversal = lap(&mut clock);

    let area = synthesize_area(&traversal, seed_prj, reach, options)?;
    timings.synthesis = lap(&mut clock);

    let mut polygon = projection.inverse_geometry(&area.polygon);
    if options.remove_holes {
        polygon = without_holes(polygon);
    }
    let lines: Vec<IsochroneLine> = area
        .lines
        .into_iter()
        .map(|line| IsochroneLine {
            geometry: projection.inverse_geometry(&line.geometry),
            ..line
        })
        .collect();
    let nodes: Vec<IsochroneVertex> = area
        .nodes
        .into_iter()
        .map(|node| IsochroneVertex {
            geometry: projection.inverse_geometry(&node.geometry),
            ..node
        })
        .collect();
    timings.reprojection = lap(&mut clock);
    timings.total = started.elapsed().as_secs_f64();

    debug!(
        "Isochrone {} ({}): region {:.3}s, snap {:.3}s, graph {:.3}s, traversal {:.3}s, \
         synthesis {:.3}s, reprojection {:.3}s, total {:.3}s",
        seed.id,
        area.status,
        timings.region_query,
        timings.snap,
        timings.graph_build,
        timings.traversal,
        timings.synthesis,
        timings.reprojection,
        timings.total
    );

    let stats = PerformanceStats {
        num_raw_links,
        num_iso_links: lines.len(),
        num_iso_nodes: nodes.len(),
        num_iso_leaf_nodes: area.leaf_count,
        radius: reach,
        buffer_size: options.buffer_size,
        seed_coord: seed_coord(&seed.location),
        timings,
    };

    Ok(IsochroneResult {
        id: seed.id.clone(),
        seed: seed.location,
        reach_distance: reach,
        buffer_size: options.buffer_size,
        status: area.status,
        failure: None,
        polygon,
        road_area: area.road_area,
        lines,
        nodes,
        stats: Some(stats),
    })
}

#[cfg(test)]
mod tests {
    use geo::{Area, line_string, polygon};

    use super::*;
    use crate::loading::{InMemoryNetwork, LocalTangentPlaneResolver};
    use crate::model::CalcStatus;

    #[test]
    fn holes_are_dropped_on_request() {
        let with_hole = MultiPolygon::new(vec![polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]],
        )]);
        let filled = without_holes(with_hole);
        assert!(filled.0[0].interiors().is_empty());
        assert!((filled.unsigned_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn pipeline_reports_statistics() {
        // roughly 1.1 km east-west road near the equator
        let network = InMemoryNetwork::from_lines(vec![line_string![
            (x: 0.0, y: 0.0),
            (x: 0.01, y: 0.0)
        ]]);
        let seed = SeedPoint::new("a", Point::new(0.005, 0.0001), 200.0);
        let options = IsochroneOptions::default().with_buffer_size(25.0);

        let result = compute_isochrone(&network, &LocalTangentPlaneResolver, &seed, &options).unwrap();
        assert_eq!(result.status, CalcStatus::Success);
        assert_eq!(result.lines.len(), 2);
        assert!(result.lines.iter().all(|line| line.is_chopped));

        let stats = result.stats.unwrap();
        assert_eq!(stats.num_raw_links, 1);
        assert_eq!(stats.num_iso_links, 2);
        assert_eq!(stats.num_iso_leaf_nodes, 2);
        assert_eq!(stats.seed_coord, "0.0001,0.005");
        assert!(stats.timings.total >= stats.timings.traversal);
    }

    #[test]
    fn negative_reach_is_rejected() {
        let network = InMemoryNetwork::from_lines(vec![]);
        let seed = SeedPoint::new("a", Point::new(0.0, 0.0), -1.0);
        let result = compute_isochrone(
            &network,
            &LocalTangentPlaneResolver,
            &seed,
            &IsochroneOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
