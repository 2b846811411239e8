//! Bounded segment queries: distances, on-segment tests and crossing points.

use super::{Bounds, CoordinateSpace, LineSegment, Point};

/// Default distance below which a point counts as lying on a segment.
pub const DEFAULT_THRESHOLD: f64 = 1e-4;

/// Distance from a point to the closest point of a segment.
pub fn distance_to_segment<S: CoordinateSpace>(point: Point<S>, segment: &LineSegment<S>) -> f64 {
    let seg = segment.direction();
    let pv = point.offset_from(segment.start);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        // Segment is a point
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (pv - seg * t).hypot()
}

/// Whether `point` lies within `threshold` of the segment, endpoints included.
pub fn point_on_segment<S: CoordinateSpace>(
    point: Point<S>,
    segment: &LineSegment<S>,
    threshold: f64,
) -> bool {
    let distance = distance_to_segment(point, segment);
    distance == 0.0 || distance < threshold
}

/// Point where two segments cross.
///
/// Returns `None` for parallel segments and for crossings outside the
/// half-open parameter range `[0, 1)` of either segment, so a shared end
/// point is reported by only one of two chained segments.
pub fn segment_intersection_point<S: CoordinateSpace>(
    a: &LineSegment<S>,
    b: &LineSegment<S>,
) -> Option<Point<S>> {
    let r = a.direction();
    let s = b.direction();
    let denominator = r.cross(s);
    if denominator == 0.0 {
        return None;
    }

    let offset = b.start.offset_from(a.start);
    let u = offset.cross(r) / denominator;
    let t = offset.cross(s) / denominator;

    if (0.0..1.0).contains(&t) && (0.0..1.0).contains(&u) {
        Some(a.start.translate(r * t))
    } else {
        None
    }
}

/// Strict interior test: points on the boundary are outside.
pub fn point_inside_bounds<S: CoordinateSpace>(point: Point<S>, bounds: &Bounds<S>) -> bool {
    bounds.contains_strict(point)
}
