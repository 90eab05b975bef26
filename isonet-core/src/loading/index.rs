//! Envelope index over projected network lines

use geo::{BoundingRect, Coord, LineString, Point, Rect};
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};

use super::source::{aabb_of, envelope_of};
use crate::geometry::{ProjectedPoint, project};

type IndexedLine = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Closest line found by [`SpatialIndex::nearest_within`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestLine {
    /// Position of the line in the indexed slice
    pub index: usize,
    pub projected: ProjectedPoint,
}

/// R-tree over the envelopes of a slice of lines.
///
/// Queries answer with positions into the indexed slice.
#[derive(Debug)]
pub struct SpatialIndex<'a> {
    lines: &'a [LineString<f64>],
    rtree: RTree<IndexedLine>,
}

impl<'a> SpatialIndex<'a> {
    pub fn new(lines: &'a [LineString<f64>]) -> Self {
        let envelopes = lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                line.bounding_rect()
                    .map(|rect| IndexedLine::new(envelope_of(&rect), index))
            })
            .collect();

        Self {
            lines,
            rtree: RTree::bulk_load(envelopes),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Positions of the lines whose envelope intersects `envelope`, ascending
    pub fn query_envelope(&self, envelope: &Rect<f64>) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .rtree
            .locate_in_envelope_intersecting(&aabb_of(envelope))
            .map(|indexed| indexed.data)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Finds the line closest to `point` within `max_distance`.
    ///
    /// Candidates come from the envelope query, the true point to line
    /// distance decides. On equal distances the lowest position wins.
    pub fn nearest_within(&self, point: &Point<f64>, max_distance: f64) -> Option<NearestLine> {
        let search = Rect::new(
            Coord {
                x: point.x() - max_distance,
                y: point.y() - max_distance,
            },
            Coord {
                x: point.x() + max_distance,
                y: point.y() + max_distance,
            },
        );

        let mut best: Option<NearestLine> = None;
        for index in self.query_envelope(&search) {
            let Some(projected) = project(&self.lines[index], point.0) else {
                continue;
            };
            if projected.distance > max_distance {
                continue;
            }
            if best.is_none_or(|b| projected.distance < b.projected.distance) {
                best = Some(NearestLine { index, projected });
            }
        }
        best
    }
}
