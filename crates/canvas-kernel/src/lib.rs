//! Canvas Kernel
//!
//! Algorithmic building blocks for the whiteboard: segment collision queries
//! for hit-testing and binding, a scored min-heap with connector routing on
//! top of it, and a sequential job queue for serialized async work.

pub mod geometry;
pub mod heap;
pub mod queue;
pub mod routing;

pub use geometry::{
    Bounds, CoordinateSpace, Global, GlobalPoint, LineSegment, Local, LocalPoint, Point,
    bounds_overlap, compute_bounds, point_on_line, point_right_of_line, segment_touches_or_crosses,
    segments_intersect,
};
pub use heap::{BinaryHeap, Identity};
pub use queue::{JobError, JobHandle, JobId, JobQueue, JobResult};
pub use routing::{RouteError, RouteOptions, route};
