//! Segment collision queries used for hit-testing and frame membership.
//!
//! Intersection follows the orientation test: two segments intersect when
//! their boxes overlap and each one touches or straddles the line through the
//! other. Collinearity is decided with a fixed epsilon on the cross product.
//!
//! Zero-length segments are not special-cased. Their direction vector is zero,
//! so every point reads as collinear and no point reads as right of them.

use super::{Bounds, CoordinateSpace, LineSegment, Point};

/// Tolerance on the cross product below which a point counts as collinear.
pub const COLLINEAR_EPSILON: f64 = 1e-6;

/// Axis-aligned bounding box of a segment's endpoints.
pub fn compute_bounds<S: CoordinateSpace>(segment: &LineSegment<S>) -> Bounds<S> {
    Bounds::from_corners(segment.start, segment.end)
}

/// Whether two boxes intersect. Touching edges count as overlap.
pub fn bounds_overlap<S: CoordinateSpace>(a: &Bounds<S>, b: &Bounds<S>) -> bool {
    a.min_x() <= b.max_x()
        && a.max_x() >= b.min_x()
        && a.min_y() <= b.max_y()
        && a.max_y() >= b.min_y()
}

/// Cross product of the segment direction and the offset from its start to `point`.
fn side_cross<S: CoordinateSpace>(segment: &LineSegment<S>, point: Point<S>) -> f64 {
    segment.direction().cross(point.offset_from(segment.start))
}

/// Whether `point` lies on the infinite line through `segment`.
///
/// This is a collinearity test only. Combine it with a bounds check when the
/// point must also lie between the endpoints.
pub fn point_on_line<S: CoordinateSpace>(segment: &LineSegment<S>, point: Point<S>) -> bool {
    side_cross(segment, point).abs() < COLLINEAR_EPSILON
}

/// Whether `point` lies strictly on the negative-cross side of the directed segment.
pub fn point_right_of_line<S: CoordinateSpace>(segment: &LineSegment<S>, point: Point<S>) -> bool {
    side_cross(segment, point) < 0.0
}

/// Whether `b` touches the line through `a` or has endpoints on opposite sides of it.
pub fn segment_touches_or_crosses<S: CoordinateSpace>(
    a: &LineSegment<S>,
    b: &LineSegment<S>,
) -> bool {
    point_on_line(a, b.start)
        || point_on_line(a, b.end)
        || point_right_of_line(a, b.start) != point_right_of_line(a, b.end)
}

/// Whether two segments share at least one point.
///
/// Symmetric in its arguments. Proper crossings, shared endpoints and
/// collinear overlap all report `true`.
pub fn segments_intersect<S: CoordinateSpace>(a: &LineSegment<S>, b: &LineSegment<S>) -> bool {
    bounds_overlap(&compute_bounds(a), &compute_bounds(b))
        && segment_touches_or_crosses(a, b)
        && segment_touches_or_crosses(b, a)
}

/// Edges of a closed polygon. An open ring gets its closing edge appended.
pub fn polygon_segments<S: CoordinateSpace>(points: &[Point<S>]) -> Vec<LineSegment<S>> {
    let mut segments: Vec<LineSegment<S>> = points
        .windows(2)
        .map(|w| LineSegment::new(w[0], w[1]))
        .collect();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if points.len() > 2 && first != last {
            segments.push(LineSegment::new(last, first));
        }
    }
    segments
}

/// Whether any segment of `a` intersects any segment of `b`.
pub fn polylines_intersect<S: CoordinateSpace>(
    a: &[LineSegment<S>],
    b: &[LineSegment<S>],
) -> bool {
    a.iter().any(|sa| b.iter().any(|sb| segments_intersect(sa, sb)))
}
