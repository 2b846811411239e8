//! Orthogonal connector routing.
//!
//! Finds an elbow path between two points over a uniform grid with A*. The
//! open set is a [`BinaryHeap`] ordered by `f = g + h`, with a Manhattan
//! heuristic. Every change of direction costs `bend_penalty` on top of the
//! step length, and a path never doubles back on itself. A step is blocked
//! when its midpoint falls strictly inside an obstacle, so routes may run
//! along obstacle edges.

use crate::geometry::{Bounds, CoordinateSpace, Point, point_inside_bounds};
use crate::heap::BinaryHeap;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

/// Default grid spacing (matches the canvas snapping grid).
pub const DEFAULT_GRID_SPACING: f64 = 20.0;

/// Upper bound on grid nodes considered by a single search.
pub const DEFAULT_MAX_NODES: usize = 250_000;

/// Routing errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("Grid spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),
    #[error("Route endpoint lies outside the routing area")]
    OutsideArea,
    #[error("Routing grid has {0} nodes, exceeding the limit of {1}")]
    GridTooLarge(usize, usize),
    #[error("No route between endpoints")]
    Unreachable,
}

/// Tunables for [`route`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    /// Distance between neighboring grid nodes.
    pub spacing: f64,
    /// Extra cost per direction change. `None` uses the Manhattan distance
    /// between the endpoints, which strongly favors few bends.
    pub bend_penalty: Option<f64>,
    /// Obstacles are grown by this much before routing.
    pub obstacle_padding: f64,
    /// Refuse grids with more nodes than this.
    pub max_nodes: usize,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_GRID_SPACING,
            bend_penalty: None,
            obstacle_padding: 0.0,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    Up,
    Right,
    Down,
    Left,
}

impl Heading {
    const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    fn flip(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Right => Heading::Left,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
        }
    }
}

#[derive(Debug)]
struct Node<S: CoordinateSpace> {
    index: usize,
    col: usize,
    row: usize,
    pos: Point<S>,
    g: Cell<f64>,
    f: Cell<f64>,
    visited: Cell<bool>,
    closed: Cell<bool>,
    parent: Cell<Option<usize>>,
    heading: Cell<Option<Heading>>,
}

struct Grid<S: CoordinateSpace> {
    cols: usize,
    rows: usize,
    origin: Point<S>,
    spacing: f64,
    nodes: Vec<Rc<Node<S>>>,
}

impl<S: CoordinateSpace> Grid<S> {
    fn new(area: &Bounds<S>, spacing: f64, max_nodes: usize) -> Result<Self, RouteError> {
        // Sized in f64 so huge areas are rejected before any integer cast
        let cols = (area.width() / spacing).floor() + 1.0;
        let rows = (area.height() / spacing).floor() + 1.0;
        let count = cols * rows;
        if count.is_nan() || count > max_nodes as f64 {
            // Float-to-int casts saturate
            return Err(RouteError::GridTooLarge(count as usize, max_nodes));
        }
        let (cols, rows) = (cols as usize, rows as usize);
        let count = cols * rows;

        let origin = area.min();
        let nodes = (0..count)
            .map(|index| {
                let (col, row) = (index % cols, index / cols);
                Rc::new(Node {
                    index,
                    col,
                    row,
                    pos: Point::new(
                        origin.x + col as f64 * spacing,
                        origin.y + row as f64 * spacing,
                    ),
                    g: Cell::new(0.0),
                    f: Cell::new(0.0),
                    visited: Cell::new(false),
                    closed: Cell::new(false),
                    parent: Cell::new(None),
                    heading: Cell::new(None),
                })
            })
            .collect();

        Ok(Self {
            cols,
            rows,
            origin,
            spacing,
            nodes,
        })
    }

    /// Node nearest to `point`.
    fn nearest(&self, point: Point<S>) -> &Rc<Node<S>> {
        let snap = |value: f64, origin: f64, max: usize| {
            (((value - origin) / self.spacing).round().max(0.0) as usize).min(max - 1)
        };
        let col = snap(point.x, self.origin.x, self.cols);
        let row = snap(point.y, self.origin.y, self.rows);
        &self.nodes[row * self.cols + col]
    }

    fn neighbor(&self, node: &Node<S>, heading: Heading) -> Option<&Rc<Node<S>>> {
        let (col, row) = match heading {
            Heading::Up => (node.col, node.row.checked_sub(1)?),
            Heading::Right => (node.col + 1, node.row),
            Heading::Down => (node.col, node.row + 1),
            Heading::Left => (node.col.checked_sub(1)?, node.row),
        };
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.nodes.get(row * self.cols + col)
    }
}

/// Find an orthogonal route from `start` to `end` inside `area`.
///
/// Both endpoints snap to the nearest grid node. The result holds the snapped
/// start, every bend, and the snapped end.
pub fn route<S: CoordinateSpace>(
    start: Point<S>,
    end: Point<S>,
    area: &Bounds<S>,
    obstacles: &[Bounds<S>],
    options: &RouteOptions,
) -> Result<Vec<Point<S>>, RouteError> {
    let spacing = options.spacing;
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(RouteError::InvalidSpacing(spacing));
    }
    if !area.contains(start) || !area.contains(end) {
        return Err(RouteError::OutsideArea);
    }

    let grid = Grid::new(area, spacing, options.max_nodes)?;
    let obstacles: Vec<Bounds<S>> = obstacles
        .iter()
        .map(|b| b.inflate(options.obstacle_padding))
        .collect();

    let start = grid.nearest(start).clone();
    let end = grid.nearest(end).clone();
    let bend_penalty = options
        .bend_penalty
        .unwrap_or_else(|| start.pos.manhattan_distance(end.pos));

    let mut open = BinaryHeap::new(|node: &Rc<Node<S>>| node.f.get());
    start.visited.set(true);
    start.f.set(start.pos.manhattan_distance(end.pos));
    open.push(start.clone());

    while let Some(current) = open.pop() {
        if current.closed.get() {
            continue;
        }
        if Rc::ptr_eq(&current, &end) {
            let path = trace(&grid, &current);
            log::debug!("route found with {} corners", path.len());
            return Ok(path);
        }
        current.closed.set(true);

        let previous = current.heading.get();
        for heading in Heading::ALL {
            let Some(neighbor) = grid.neighbor(&current, heading) else {
                continue;
            };
            if neighbor.closed.get() {
                continue;
            }
            if previous.is_some_and(|p| p.flip() == heading) {
                continue;
            }
            let step_midpoint = current.pos.midpoint(neighbor.pos);
            if obstacles.iter().any(|b| point_inside_bounds(step_midpoint, b)) {
                continue;
            }

            let bend = previous.is_some_and(|p| p != heading);
            let g = current.g.get() + spacing + if bend { bend_penalty } else { 0.0 };
            let seen = neighbor.visited.get();
            if !seen || g < neighbor.g.get() {
                neighbor.visited.set(true);
                neighbor.parent.set(Some(current.index));
                neighbor.heading.set(Some(heading));
                neighbor.g.set(g);
                neighbor.f.set(g + neighbor.pos.manhattan_distance(end.pos));
                if seen {
                    // The heuristic is fixed per node, so an improved g only lowers f
                    open.rescore_element(neighbor);
                } else {
                    open.push(neighbor.clone());
                }
            }
        }
    }

    log::debug!("no route found");
    Err(RouteError::Unreachable)
}

/// Walk parents back from `node`, keeping only the endpoints and bends.
fn trace<S: CoordinateSpace>(grid: &Grid<S>, node: &Node<S>) -> Vec<Point<S>> {
    let mut cells = vec![node];
    let mut current = node;
    while let Some(parent) = current.parent.get() {
        current = &*grid.nodes[parent];
        cells.push(current);
    }
    cells.reverse();

    let mut corners = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        let is_end = i == 0 || i + 1 == cells.len();
        if is_end || cell.heading.get() != cells[i + 1].heading.get() {
            corners.push(cell.pos);
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Global, GlobalPoint};

    fn area() -> Bounds<Global> {
        Bounds::from_corners(GlobalPoint::new(0.0, 0.0), GlobalPoint::new(100.0, 100.0))
    }

    fn options() -> RouteOptions {
        RouteOptions {
            spacing: 10.0,
            ..RouteOptions::default()
        }
    }

    fn assert_orthogonal(path: &[GlobalPoint]) {
        for w in path.windows(2) {
            assert!(
                w[0].x == w[1].x || w[0].y == w[1].y,
                "diagonal step {:?} -> {:?}",
                w[0],
                w[1]
            );
        }
    }

    fn assert_avoids(path: &[GlobalPoint], obstacle: &Bounds<Global>) {
        for w in path.windows(2) {
            let steps = (w[0].distance(w[1]) / 5.0).round() as usize;
            for k in 0..=steps {
                let t = if steps == 0 { 0.0 } else { k as f64 / steps as f64 };
                let p = GlobalPoint::new(
                    w[0].x + (w[1].x - w[0].x) * t,
                    w[0].y + (w[1].y - w[0].y) * t,
                );
                assert!(!obstacle.contains_strict(p), "{p:?} inside obstacle");
            }
        }
    }

    #[test]
    fn test_straight_route() {
        let path = route(
            GlobalPoint::new(0.0, 50.0),
            GlobalPoint::new(100.0, 50.0),
            &area(),
            &[],
            &options(),
        )
        .unwrap();
        assert_eq!(
            path,
            vec![GlobalPoint::new(0.0, 50.0), GlobalPoint::new(100.0, 50.0)]
        );
    }

    #[test]
    fn test_single_bend_route() {
        let path = route(
            GlobalPoint::new(0.0, 0.0),
            GlobalPoint::new(50.0, 50.0),
            &area(),
            &[],
            &options(),
        )
        .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], GlobalPoint::new(0.0, 0.0));
        assert_eq!(path[2], GlobalPoint::new(50.0, 50.0));
        assert_orthogonal(&path);
    }

    #[test]
    fn test_route_around_obstacle() {
        let obstacle =
            Bounds::from_corners(GlobalPoint::new(40.0, 20.0), GlobalPoint::new(60.0, 80.0));
        let path = route(
            GlobalPoint::new(0.0, 50.0),
            GlobalPoint::new(100.0, 50.0),
            &area(),
            &[obstacle],
            &options(),
        )
        .unwrap();
        assert_eq!(path.first(), Some(&GlobalPoint::new(0.0, 50.0)));
        assert_eq!(path.last(), Some(&GlobalPoint::new(100.0, 50.0)));
        assert!(path.len() >= 4, "expected a detour, got {path:?}");
        assert_orthogonal(&path);
        assert_avoids(&path, &obstacle);
    }

    #[test]
    fn test_endpoints_snap_to_grid() {
        let path = route(
            GlobalPoint::new(3.0, 48.0),
            GlobalPoint::new(96.0, 52.0),
            &area(),
            &[],
            &options(),
        )
        .unwrap();
        assert_eq!(
            path,
            vec![GlobalPoint::new(0.0, 50.0), GlobalPoint::new(100.0, 50.0)]
        );
    }

    #[test]
    fn test_padding_widens_obstacles() {
        let obstacle =
            Bounds::from_corners(GlobalPoint::new(40.0, 0.0), GlobalPoint::new(60.0, 90.0));
        let start = GlobalPoint::new(0.0, 0.0);
        let end = GlobalPoint::new(100.0, 0.0);
        // Without padding the edge along the obstacle's top is open
        assert!(route(start, end, &area(), &[obstacle], &options()).is_ok());

        let padded = RouteOptions {
            obstacle_padding: 15.0,
            ..options()
        };
        assert_eq!(
            route(start, end, &area(), &[obstacle], &padded),
            Err(RouteError::Unreachable)
        );
    }

    #[test]
    fn test_unreachable_when_walled_off() {
        let wall =
            Bounds::from_corners(GlobalPoint::new(40.0, -10.0), GlobalPoint::new(60.0, 110.0));
        let result = route(
            GlobalPoint::new(0.0, 50.0),
            GlobalPoint::new(100.0, 50.0),
            &area(),
            &[wall],
            &options(),
        );
        assert_eq!(result, Err(RouteError::Unreachable));
    }

    #[test]
    fn test_invalid_spacing() {
        let opts = RouteOptions {
            spacing: 0.0,
            ..RouteOptions::default()
        };
        let result = route(
            GlobalPoint::new(0.0, 0.0),
            GlobalPoint::new(10.0, 0.0),
            &area(),
            &[],
            &opts,
        );
        assert_eq!(result, Err(RouteError::InvalidSpacing(0.0)));
    }

    #[test]
    fn test_outside_area() {
        let result = route(
            GlobalPoint::new(0.0, 0.0),
            GlobalPoint::new(150.0, 0.0),
            &area(),
            &[],
            &options(),
        );
        assert_eq!(result, Err(RouteError::OutsideArea));
    }

    #[test]
    fn test_grid_too_large() {
        let opts = RouteOptions {
            spacing: 1.0,
            max_nodes: 100,
            ..RouteOptions::default()
        };
        let result = route(
            GlobalPoint::new(0.0, 0.0),
            GlobalPoint::new(10.0, 0.0),
            &area(),
            &[],
            &opts,
        );
        assert_eq!(result, Err(RouteError::GridTooLarge(101 * 101, 100)));
    }

    #[test]
    fn test_huge_area_is_rejected() {
        let huge = Bounds::from_corners(GlobalPoint::new(0.0, 0.0), GlobalPoint::new(1e21, 100.0));
        let result = route(
            GlobalPoint::new(0.0, 0.0),
            GlobalPoint::new(100.0, 0.0),
            &huge,
            &[],
            &RouteOptions::default(),
        );
        assert!(matches!(
            result,
            Err(RouteError::GridTooLarge(_, DEFAULT_MAX_NODES))
        ));

        let unbounded = Bounds::from_corners(
            GlobalPoint::new(-f64::MAX, 0.0),
            GlobalPoint::new(f64::MAX, 100.0),
        );
        let result = route(
            GlobalPoint::new(0.0, 0.0),
            GlobalPoint::new(100.0, 0.0),
            &unbounded,
            &[],
            &RouteOptions::default(),
        );
        assert_eq!(
            result,
            Err(RouteError::GridTooLarge(usize::MAX, DEFAULT_MAX_NODES))
        );
    }

    #[test]
    fn test_options_from_json() {
        let opts: RouteOptions =
            serde_json::from_str(r#"{"spacing": 5.0, "bend_penalty": 12.5}"#).unwrap();
        assert_eq!(opts.spacing, 5.0);
        assert_eq!(opts.bend_penalty, Some(12.5));
        assert_eq!(opts.obstacle_padding, 0.0);
        assert_eq!(opts.max_nodes, DEFAULT_MAX_NODES);
    }
}
