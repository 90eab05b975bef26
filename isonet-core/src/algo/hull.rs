//! Concave hull of leaf points (chi-shape over a Delaunay triangulation)

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use delaunator::{EMPTY, Point as DPoint, next_halfedge, prev_halfedge, triangulate};
use geo::{Area, ConvexHull, Coord, LineString, MultiPoint, Orient, Point, Polygon};
use geo::orient::Direction;
use hashbrown::{HashMap, HashSet};

use crate::geometry::coord_distance;

/// Boundary half-edge of the triangulation with its length
#[derive(Debug, Clone, Copy)]
struct ScoredEdge {
    index: usize,
    length: f64,
}

impl PartialEq for ScoredEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ScoredEdge {}
impl PartialOrd for ScoredEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
// Max-heap: longest edges first
impl Ord for ScoredEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.length
            .total_cmp(&other.length)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Shape enclosing a set of points, degenerate for fewer than three
/// non-collinear points
#[derive(Debug, Clone, PartialEq)]
pub enum HullShape {
    Point(Point<f64>),
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

fn unique_coords(points: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut unique = points.to_vec();
    unique.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    unique.dedup_by(|a, b| (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
    unique
}

/// Computes the chi-shape of `points`.
///
/// Starting from the convex hull, boundary edges longer than
/// `length_threshold` are eroded while the boundary stays a simple ring.
/// Returns `None` for fewer than three distinct points, collinear input or
/// a broken boundary.
pub fn chi_shape(points: &[Coord<f64>], length_threshold: f64) -> Option<Polygon<f64>> {
    let points = unique_coords(points);
    if points.len() < 3 {
        return None;
    }

    let d_points: Vec<DPoint> = points.iter().map(|p| DPoint { x: p.x, y: p.y }).collect();
    let triangulation = triangulate(&d_points);
    let num_triangles = triangulation.triangles.len() / 3;
    if num_triangles == 0 {
        return None;
    }

    let length = |start: usize, end: usize| coord_distance(points[start], points[end]);

    let mut boundary = HashSet::new();
    let mut boundary_degrees = vec![0usize; points.len()];
    let mut heap = BinaryHeap::new();

    for e in 0..triangulation.halfedges.len() {
        if triangulation.halfedges[e] == EMPTY {
            let start = triangulation.triangles[e];
            let end = triangulation.triangles[next_halfedge(e)];

            boundary.insert(e);
            boundary_degrees[start] += 1;
            boundary_degrees[end] += 1;
            heap.push(ScoredEdge {
                index: e,
                length: length(start, end),
            });
        }
    }

    let mut removed = vec![false; num_triangles];

    while let Some(edge) = heap.pop() {
        if !boundary.contains(&edge.index) {
            continue;
        }
        if edge.length <= length_threshold {
            break;
        }

        let triangle = edge.index / 3;
        if removed[triangle] {
            continue;
        }

        let e_next = next_halfedge(edge.index);
        let e_prev = prev_halfedge(edge.index);

        // Removing a triangle with a second boundary edge would cut the ring
        if boundary.contains(&e_next) || boundary.contains(&e_prev) {
            continue;
        }
        // The opposite vertex must stay off the boundary, or the ring pinches
        let opposite = triangulation.triangles[e_prev];
        if boundary_degrees[opposite] > 0 {
            continue;
        }

        removed[triangle] = true;
        boundary.remove(&edge.index);
        let u = triangulation.triangles[edge.index];
        let v = triangulation.triangles[e_next];
        boundary_degrees[u] -= 1;
        boundary_degrees[v] -= 1;

        for inner in [triangulation.halfedges[e_next], triangulation.halfedges[e_prev]] {
            if inner == EMPTY {
                continue;
            }
            let s = triangulation.triangles[inner];
            let e = triangulation.triangles[next_halfedge(inner)];
            boundary.insert(inner);
            boundary_degrees[s] += 1;
            boundary_degrees[e] += 1;
            heap.push(ScoredEdge {
                index: inner,
                length: length(s, e),
            });
        }
    }

    // Rebuild the ring from the remaining boundary half-edges
    let mut next_vertex = HashMap::with_capacity(boundary.len());
    for &e in &boundary {
        let start = triangulation.triangles[e];
        let end = triangulation.triangles[next_halfedge(e)];
        if next_vertex.insert(start, end).is_some() {
            return None;
        }
    }

    let start = boundary
        .iter()
        .map(|&e| triangulation.triangles[e])
        .min()?;
    let mut current = start;
    let mut ring = Vec::with_capacity(next_vertex.len() + 1);

    loop {
        ring.push(points[current]);
        let &next = next_vertex.get(&current)?;
        if next == start {
            break;
        }
        if ring.len() > points.len() {
            return None;
        }
        current = next;
    }
    ring.push(ring[0]);

    Some(Polygon::new(LineString::new(ring), vec![]).orient(Direction::Default))
}

/// Concave hull of `points` with degenerate fallbacks.
///
/// One point stays a point and two points become a line. When no chi-shape
/// can be built the convex hull is used, or its ring as a line when the
/// points are collinear. Returns `None` for no points.
pub fn concave_hull(points: &[Coord<f64>], length_threshold: f64) -> Option<HullShape> {
    let unique = unique_coords(points);
    match unique.as_slice() {
        [] => None,
        [single] => Some(HullShape::Point(Point(*single))),
        [a, b] => Some(HullShape::Line(LineString::new(vec![*a, *b]))),
        _ => chi_shape(&unique, length_threshold)
            .map(HullShape::Polygon)
            .or_else(|| {
                let convex = MultiPoint::from(unique.clone()).convex_hull();
                if convex.unsigned_area() > 0.0 {
                    Some(HullShape::Polygon(convex))
                } else {
                    Some(HullShape::Line(convex.exterior().clone()))
                }
            }),
    }
}
