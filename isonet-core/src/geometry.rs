//! Linear referencing helpers for projected line strings.
//!
//! All measures are Euclidean, coordinates are expected to be in a
//! projected (metric) reference system.

use geo::{
    Closest, ClosestPoint, Coord, Distance, Euclidean, Length, Line, LineLocatePoint, LineString,
    Point,
};

/// Result of projecting a coordinate onto a line string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Closest coordinate on the line
    pub point: Coord<f64>,
    /// Distance between the input coordinate and `point`
    pub distance: f64,
    /// Length along the line from its first coordinate to `point`
    pub along: f64,
}

pub fn coord_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean.distance(Point::from(a), Point::from(b))
}

/// Euclidean length of a line string
pub fn line_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}

fn interpolate(segment: &Line<f64>, fraction: f64) -> Coord<f64> {
    if fraction <= 0.0 {
        segment.start
    } else if fraction >= 1.0 {
        segment.end
    } else {
        Coord {
            x: segment.start.x + segment.dx() * fraction,
            y: segment.start.y + segment.dy() * fraction,
        }
    }
}

fn push_distinct(coords: &mut Vec<Coord<f64>>, coord: Coord<f64>) {
    if coords.last() != Some(&coord) {
        coords.push(coord);
    }
}

/// Projects `coord` onto the closest location of `line`.
///
/// Returns `None` for lines without segments.
pub fn project(line: &LineString<f64>, coord: Coord<f64>) -> Option<ProjectedPoint> {
    let target = Point::from(coord);
    let point = match line.closest_point(&target) {
        Closest::Intersection(point) | Closest::SinglePoint(point) => point,
        Closest::Indeterminate => return None,
    };

    let total = line_length(line);
    let along = if total > 0.0 {
        line.line_locate_point(&target)? * total
    } else {
        0.0
    };

    Some(ProjectedPoint {
        point: point.0,
        distance: Euclidean.distance(point, target),
        along,
    })
}

/// Extracts the part of `line` between two lengths measured from its start.
///
/// When `start > end` the extracted part is reversed, so it always runs from
/// `start` towards `end`. Lengths are clamped to the line.
pub fn extract_line(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    if start > end {
        let mut reversed = extract_line(line, end, start);
        reversed.0.reverse();
        return reversed;
    }

    let total = line_length(line);
    let start = start.clamp(0.0, total);
    let end = end.clamp(0.0, total);

    let mut coords = Vec::new();
    let mut walked = 0.0;

    for segment in line.lines() {
        let length = Euclidean.length(&segment);
        let segment_start = walked;
        let segment_end = walked + length;
        walked = segment_end;

        if length == 0.0 || segment_end < start {
            continue;
        }
        if segment_start > end {
            break;
        }

        let from = (start - segment_start) / length;
        let to = (end - segment_start) / length;
        push_distinct(&mut coords, interpolate(&segment, from));
        push_distinct(&mut coords, interpolate(&segment, to));
    }

    if coords.len() == 1 {
        coords.push(coords[0]);
    }

    LineString::new(coords)
}

/// Splits `line` at a length measured from its start
pub fn split_at(line: &LineString<f64>, along: f64) -> (LineString<f64>, LineString<f64>) {
    let total = line_length(line);
    (extract_line(line, 0.0, along), extract_line(line, along, total))
}

/// Returns `line` oriented so that it starts at the end closest to `from`
pub fn oriented_from(line: &LineString<f64>, from: Coord<f64>) -> LineString<f64> {
    match (line.0.first(), line.0.last()) {
        (Some(&first), Some(&last)) if coord_distance(last, from) < coord_distance(first, from) => {
            let mut reversed = line.clone();
            reversed.0.reverse();
            reversed
        }
        _ => line.clone(),
    }
}

/// Rounds a coordinate onto a grid with `scale` cells per unit
pub fn snap_coord(coord: Coord<f64>, scale: f64) -> Coord<f64> {
    // adding zero turns -0.0 into 0.0 so equal coordinates share bits
    Coord {
        x: (coord.x * scale).round() / scale + 0.0,
        y: (coord.y * scale).round() / scale + 0.0,
    }
}

/// Snaps every coordinate of `line` to the grid and drops repeated ones
pub fn snap_line(line: &LineString<f64>, scale: f64) -> LineString<f64> {
    let mut coords = Vec::with_capacity(line.0.len());
    for coord in &line.0 {
        push_distinct(&mut coords, snap_coord(*coord, scale));
    }
    LineString::new(coords)
}
