//! Points, bounding boxes and line segments.
//!
//! Every geometric type is tagged with the coordinate space it lives in.
//! Element-relative coordinates are [`Local`], scene-absolute coordinates are
//! [`Global`]. The two never unify, so moving between them always goes through
//! an explicit conversion with a known origin.

mod collision;
mod distance;

pub use collision::{
    COLLINEAR_EPSILON, bounds_overlap, compute_bounds, point_on_line, point_right_of_line,
    polygon_segments, polylines_intersect, segment_touches_or_crosses, segments_intersect,
};
pub use distance::{
    DEFAULT_THRESHOLD, distance_to_segment, point_inside_bounds, point_on_segment,
    segment_intersection_point,
};

use kurbo::{Line, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Marker trait for coordinate spaces.
pub trait CoordinateSpace:
    Debug + Clone + Copy + Default + PartialEq + Eq + Send + Sync + 'static
{
}

/// Coordinates relative to an element's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Local;

/// Absolute scene coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Global;

impl CoordinateSpace for Local {}
impl CoordinateSpace for Global {}

/// A point in coordinate space `S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Point<S: CoordinateSpace = Global> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

/// Point relative to an element.
pub type LocalPoint = Point<Local>;
/// Point in scene coordinates.
pub type GlobalPoint = Point<Global>;

impl<S: CoordinateSpace> Point<S> {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    /// Wrap a kurbo point, asserting it belongs to this space.
    pub fn from_kurbo(point: kurbo::Point) -> Self {
        Self::new(point.x, point.y)
    }

    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    /// Vector from `origin` to this point.
    pub fn offset_from(self, origin: Self) -> Vec2 {
        Vec2::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn translate(self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    /// Manhattan (taxicab) distance.
    pub fn manhattan_distance(self, other: Self) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn distance(self, other: Self) -> f64 {
        self.offset_from(other).hypot()
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Point<Local> {
    /// Convert to scene coordinates given the element's scene origin.
    pub fn to_global(self, origin: GlobalPoint) -> GlobalPoint {
        GlobalPoint::new(origin.x + self.x, origin.y + self.y)
    }
}

impl Point<Global> {
    /// Convert to coordinates relative to an element's scene origin.
    pub fn to_local(self, origin: GlobalPoint) -> LocalPoint {
        LocalPoint::new(self.x - origin.x, self.y - origin.y)
    }
}

impl<S: CoordinateSpace> From<(f64, f64)> for Point<S> {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl<S: CoordinateSpace> From<Point<S>> for kurbo::Point {
    fn from(point: Point<S>) -> Self {
        point.to_kurbo()
    }
}

/// Axis-aligned bounding box, `min <= max` on both axes.
///
/// Bounds are only ever produced from points or normalized rectangles, so the
/// ordering holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "", from = "RawBounds")]
pub struct Bounds<S: CoordinateSpace = Global> {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

/// Serialized bounds, normalized on the way in.
#[derive(Deserialize)]
struct RawBounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl<S: CoordinateSpace> From<RawBounds> for Bounds<S> {
    fn from(raw: RawBounds) -> Self {
        Self::from_corners(
            Point::new(raw.min_x, raw.min_y),
            Point::new(raw.max_x, raw.max_y),
        )
    }
}

impl<S: CoordinateSpace> Bounds<S> {
    /// Smallest box containing both corners, in any order.
    pub fn from_corners(a: Point<S>, b: Point<S>) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
            space: PhantomData,
        }
    }

    /// Smallest box containing every point. `None` when there are no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point<S>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_corners(first, first), |bounds, p| {
            bounds.union(Self::from_corners(p, p))
        }))
    }

    /// Normalize a kurbo rectangle into bounds.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            min_x: rect.x0,
            min_y: rect.y0,
            max_x: rect.x1,
            max_y: rect.y1,
            space: PhantomData,
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// `(min_x, min_y, max_x, max_y)`.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn min(&self) -> Point<S> {
        Point::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> Point<S> {
        Point::new(self.max_x, self.max_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow the box by `amount` on every side. Negative amounts shrink it,
    /// collapsing to the center rather than inverting.
    pub fn inflate(self, amount: f64) -> Self {
        let cx = (self.min_x + self.max_x) / 2.0;
        let cy = (self.min_y + self.max_y) / 2.0;
        Self {
            min_x: (self.min_x - amount).min(cx),
            min_y: (self.min_y - amount).min(cy),
            max_x: (self.max_x + amount).max(cx),
            max_y: (self.max_y + amount).max(cy),
            space: PhantomData,
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            space: PhantomData,
        }
    }

    /// Inclusive containment: points on the edge are inside.
    pub fn contains(&self, point: Point<S>) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Strict containment: points on the edge are outside.
    pub fn contains_strict(&self, point: Point<S>) -> bool {
        point.x > self.min_x
            && point.x < self.max_x
            && point.y > self.min_y
            && point.y < self.max_y
    }

    /// The four corners, clockwise from the top-left in screen orientation.
    pub fn corners(&self) -> [Point<S>; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// A segment between two points.
///
/// Bounding boxes ignore direction, side tests do not: swapping `start` and
/// `end` flips the side reported by [`point_right_of_line`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LineSegment<S: CoordinateSpace = Global> {
    pub start: Point<S>,
    pub end: Point<S>,
}

impl<S: CoordinateSpace> LineSegment<S> {
    pub fn new(start: Point<S>, end: Point<S>) -> Self {
        Self { start, end }
    }

    pub fn from_kurbo(line: Line) -> Self {
        Self::new(Point::from_kurbo(line.p0), Point::from_kurbo(line.p1))
    }

    pub fn to_kurbo(self) -> Line {
        Line::new(self.start.to_kurbo(), self.end.to_kurbo())
    }

    /// Vector from `start` to `end`.
    pub fn direction(&self) -> Vec2 {
        self.end.offset_from(self.start)
    }

    pub fn reversed(self) -> Self {
        Self::new(self.end, self.start)
    }

    pub fn length(&self) -> f64 {
        self.direction().hypot()
    }

    pub fn midpoint(&self) -> Point<S> {
        self.start.midpoint(self.end)
    }

    pub fn bounds(&self) -> Bounds<S> {
        compute_bounds(self)
    }
}
