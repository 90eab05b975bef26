use geo::{Area, Coord, LineString, Point, line_string};
use isonet_core::prelude::*;

/// Treats network coordinates as already projected
#[derive(Debug, Clone, Copy)]
struct Planar;

impl Projection for Planar {
    fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        coord
    }

    fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        coord
    }
}

struct PlanarResolver;

impl CrsResolver for PlanarResolver {
    type Projection = Planar;

    fn resolve(&self, _seed: Point<f64>) -> Result<Planar, Error> {
        Ok(Planar)
    }
}

fn straight() -> InMemoryNetwork {
    InMemoryNetwork::from_lines(vec![line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]])
}

fn y_shape() -> Vec<LineString<f64>> {
    vec![
        line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
        line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 100.0)],
        line_string![(x: 100.0, y: 0.0), (x: 200.0, y: -100.0)],
    ]
}

fn high_detail() -> IsochroneOptions {
    IsochroneOptions::default()
        .with_buffer_size(50.0)
        .with_detail_level(DetailLevel::High)
}

#[test]
fn straight_edge_is_chopped_at_the_budget() {
    let graph = build_graph(&[line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]], 100.0);
    let start = graph.nearest_node(&Point::new(0.0, 0.0)).unwrap();
    let traversal = traverse(&graph, start, 400.0, 1.0).unwrap();

    assert!(traversal.whole_edges().is_empty());
    let chopped = traversal.chopped_edges();
    assert_eq!(chopped.len(), 1);
    assert_eq!(chopped[0].traverse_distance, 400.0);

    let seed = SeedPoint::new("straight", Point::new(0.0, 0.0), 400.0);
    let result = compute_isochrone(&straight(), &PlanarResolver, &seed, &high_detail()).unwrap();
    assert_eq!(result.status, CalcStatus::Success);
    assert_eq!(result.lines.len(), 1);
    assert!(result.lines[0].is_chopped && result.lines[0].is_leaf);

    // 400 x 100 corridor with two round caps of radius 50
    let expected = 400.0 * 100.0 + std::f64::consts::PI * 50.0 * 50.0;
    assert!((result.road_area - expected).abs() / expected < 0.02);
    assert!((result.polygon.unsigned_area() - result.road_area).abs() < 1e-6);
}

#[test]
fn point_without_network_gets_a_failure_disc() {
    let seeds = vec![SeedPoint::new("lonely", Point::new(5000.0, 5000.0), 400.0)];
    let batch = compute_isochrone_batch(&straight(), &PlanarResolver, &seeds, &high_detail())
        .unwrap();

    let result = &batch.results[0];
    assert_eq!(result.status, CalcStatus::Failure);
    assert_eq!(
        result.failure.as_ref().map(|f| f.code.as_str()),
        Some("no-network-nearby")
    );
    assert!(result.lines.is_empty() && result.nodes.is_empty());

    let disc = std::f64::consts::PI * 50.0 * 50.0;
    assert!((result.polygon.unsigned_area() - disc).abs() / disc < 0.02);
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let seeds = vec![
        SeedPoint::new("a", Point::new(100.0, 10.0), 300.0),
        SeedPoint::new("b", Point::new(5000.0, -5000.0), 300.0),
        SeedPoint::new("c", Point::new(900.0, -10.0), 300.0),
    ];
    let options = high_detail().with_worker_threads(3);
    let batch = compute_isochrone_batch(&straight(), &PlanarResolver, &seeds, &options).unwrap();

    let ids: Vec<&str> = batch.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(batch.failures().count(), 1);
    assert!(batch.results[1].failure.is_some());
    assert_eq!(batch.success_count(), 2);

    for index in [0, 2] {
        let result = &batch.results[index];
        assert!(result.failure.is_none());
        assert!(!result.lines.is_empty());
        assert!(result.stats.is_some());
    }
}

#[test]
fn y_network_chops_both_branches() {
    let network = InMemoryNetwork::from_lines(y_shape());
    let seed = SeedPoint::new("y", Point::new(0.0, 0.0), 150.0);
    let result = compute_isochrone(&network, &PlanarResolver, &seed, &high_detail()).unwrap();

    let whole: Vec<_> = result.lines.iter().filter(|l| !l.is_chopped).collect();
    let chopped: Vec<_> = result.lines.iter().filter(|l| l.is_chopped).collect();
    assert_eq!(whole.len(), 1);
    assert!((whole[0].length - 100.0).abs() < 1e-9);
    assert_eq!(chopped.len(), 2);
    assert!(chopped.iter().all(|l| l.traverse_distance == 150.0 && l.is_leaf));

    let leaves = result.nodes.iter().filter(|n| n.is_leaf).count();
    assert_eq!(leaves, 2);
    assert_eq!(result.stats.map(|s| s.num_iso_leaf_nodes), Some(2));
}

#[test]
fn polygon_round_trips_through_the_projection() {
    let origin = (144.9631, -37.8136);
    let network = InMemoryNetwork::from_lines(vec![
        line_string![(x: 144.955, y: -37.8136), (x: 144.971, y: -37.8136)],
        line_string![(x: 144.9631, y: -37.820), (x: 144.9631, y: -37.807)],
    ]);
    let seed = SeedPoint::new("cbd", Point::new(origin.0, origin.1), 300.0);
    let options = IsochroneOptions::default().with_buffer_size(30.0);

    let result = compute_isochrone(&network, &LocalTangentPlaneResolver, &seed, &options).unwrap();
    assert_eq!(result.status, CalcStatus::Success);

    let projection = LocalTangentPlaneResolver.resolve(seed.location).unwrap();
    let projected = projection.forward_geometry(&result.polygon);
    let back = projection.inverse_geometry(&projected);

    assert!((projected.unsigned_area() - result.road_area).abs() / result.road_area < 1e-6);
    for (a, b) in result.polygon.0.iter().zip(&back.0) {
        for (p, q) in a.exterior().0.iter().zip(&b.exterior().0) {
            assert!((p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9);
        }
    }
}

#[test]
fn repeated_runs_are_identical() {
    let network = InMemoryNetwork::from_lines(y_shape());
    let seed = SeedPoint::new("y", Point::new(30.0, 5.0), 220.0);

    for level in [DetailLevel::High, DetailLevel::Mid, DetailLevel::Low] {
        let options = high_detail().with_detail_level(level);
        let first = compute_isochrone(&network, &PlanarResolver, &seed, &options).unwrap();
        let second = compute_isochrone(&network, &PlanarResolver, &seed, &options).unwrap();

        assert_eq!(first.lines, second.lines);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.polygon, second.polygon);
    }
}

#[test]
fn batch_renders_three_collections() {
    let network = InMemoryNetwork::from_lines(y_shape());
    let seeds = vec![
        SeedPoint::new("0", Point::new(0.0, 0.0), 150.0),
        SeedPoint::new("1", Point::new(150.0, 50.0), 80.0),
    ];
    let batch = compute_isochrone_batch(&network, &PlanarResolver, &seeds, &high_detail())
        .unwrap();

    let polygons = batch.polygons_geojson().unwrap();
    let lines = batch.lines_geojson().unwrap();
    let nodes = batch.nodes_geojson().unwrap();
    assert_eq!(polygons.features.len(), 2);

    let line_count: usize = batch.results.iter().map(|r| r.lines.len()).sum();
    let node_count: usize = batch.results.iter().map(|r| r.nodes.len()).sum();
    assert_eq!(lines.features.len(), line_count);
    assert_eq!(nodes.features.len(), node_count);
    assert_eq!(batch.stats_json().as_array().map(Vec::len), Some(2));
}
