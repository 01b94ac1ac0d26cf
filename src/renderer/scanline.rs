//! Convex polygon → per-row horizontal spans.
//!
//! The polygon is treated as a ring: walking "next" from the top vertex gives
//! one edge chain and walking "prev" gives the other. Both chains advance
//! one row at a time with an 18-bit fixed-point slope.

use glam::IVec2;

use super::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::math::{DIV_LUT_PRECISION, DIV_LUT_SIZE, RasterFixed, reciprocal};

/// Inclusive horizontal span on one row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hline {
    pub xl: i32,
    pub xr: i32,
}

impl Hline {
    /// Span between two edge crossings, in either order.
    #[inline]
    pub fn new(a: i32, b: i32) -> Self {
        if a <= b { Self { xl: a, xr: b } } else { Self { xl: b, xr: a } }
    }
}

/// Screen-space bounding box of a polygon plus the index of its top vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolygonBounds {
    pub minimum_x: i32,
    pub maximum_x: i32,
    pub minimum_y: i32,
    pub maximum_y: i32,
    pub top_index: usize,
}

impl PolygonBounds {
    /// The first vertex with the smallest `y` is the top one.
    pub fn of(points: &[IVec2]) -> Self {
        let first = points[0];
        let mut bounds = Self {
            minimum_x: first.x,
            maximum_x: first.x,
            minimum_y: first.y,
            maximum_y: first.y,
            top_index: 0,
        };
        for (index, p) in points.iter().enumerate().skip(1) {
            if p.x < bounds.minimum_x {
                bounds.minimum_x = p.x;
            } else if p.x > bounds.maximum_x {
                bounds.maximum_x = p.x;
            }
            if p.y < bounds.minimum_y {
                bounds.minimum_y = p.y;
                bounds.top_index = index;
            } else if p.y > bounds.maximum_y {
                bounds.maximum_y = p.y;
            }
        }
        bounds
    }

    /// Whether any part of the box lands on the display.
    #[inline]
    pub fn on_screen(&self) -> bool {
        self.minimum_x < DISPLAY_WIDTH
            && self.maximum_x >= 0
            && self.minimum_y < DISPLAY_HEIGHT
            && self.maximum_y >= 0
    }
}

#[inline]
fn next(index: usize, count: usize) -> usize {
    if index + 1 == count { 0 } else { index + 1 }
}

#[inline]
fn prev(index: usize, count: usize) -> usize {
    if index == 0 { count - 1 } else { index - 1 }
}

/// `x` in raster fixed point, widened so far off-screen vertices can't overflow.
#[inline]
fn raster_x(x: i32) -> i64 {
    (x as i64) << RasterFixed::PRECISION
}

/// One edge chain of the walk. `x` and `delta` hold raw `RasterFixed` data.
struct Edge {
    top: usize,
    bottom: usize,
    x: i64,
    delta: i64,
}

impl Edge {
    fn start(points: &[IVec2], top: usize, step: fn(usize, usize) -> usize) -> Self {
        let count = points.len();
        let mut edge = Self {
            top,
            bottom: step(top, count),
            x: 0,
            delta: 0,
        };
        // Flat edges at the top contribute nothing.
        let mut guard = 0;
        while points[edge.top].y == points[edge.bottom].y && guard < count {
            edge.top = edge.bottom;
            edge.bottom = step(edge.bottom, count);
            guard += 1;
        }
        edge.x = raster_x(points[edge.top].x);
        edge.delta = Self::slope(points, edge.top, edge.bottom);
        edge
    }

    #[inline]
    fn slope(points: &[IVec2], top: usize, bottom: usize) -> i64 {
        let dx = points[bottom].x as i64 - points[top].x as i64;
        let dy = (points[bottom].y - points[top].y).max(0);
        if dy < DIV_LUT_SIZE as i32 {
            (dx * reciprocal(dy) as i64) >> (DIV_LUT_PRECISION - RasterFixed::PRECISION)
        } else {
            raster_x(1) * dx / dy as i64
        }
    }

    /// Moves on to the following edge of the chain.
    fn advance(&mut self, points: &[IVec2], step: fn(usize, usize) -> usize) {
        let count = points.len();
        self.top = self.bottom;
        self.bottom = step(self.bottom, count);
        let mut guard = 0;
        while points[self.bottom].y - points[self.top].y <= 0 && guard < count {
            self.top = self.bottom;
            self.bottom = step(self.bottom, count);
            guard += 1;
        }
        self.delta = Self::slope(points, self.top, self.bottom);
        self.x = raster_x(points[self.top].x) + self.delta;
    }

    #[inline]
    fn step_rows(&mut self, rows: i32) {
        self.x += self.delta * rows as i64;
    }

    /// Integer column of the edge, floored like `right_shift_integer`.
    #[inline]
    fn column(&self) -> i32 {
        (self.x >> RasterFixed::PRECISION).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

/// Rasterises the polygon ring `points` (3 or 4 vertices, convex) into
/// `hlines`, indexed by row. Returns the first and last row written, clamped
/// to the display. Spans are not clipped horizontally.
pub fn fill_polygon(
    points: &[IVec2],
    bounds: &PolygonBounds,
    hlines: &mut [Hline],
) -> (usize, usize) {
    debug_assert!(points.len() >= 3 && points.len() <= 4);
    let maximum_y = bounds.maximum_y.min(DISPLAY_HEIGHT - 1);
    let minimum_y = bounds.minimum_y.max(0);

    if bounds.minimum_y == bounds.maximum_y {
        hlines[minimum_y as usize] = Hline::new(bounds.minimum_x, bounds.maximum_x);
        return (minimum_y as usize, minimum_y as usize);
    }

    let mut left = Edge::start(points, bounds.top_index, next);
    let mut right = Edge::start(points, bounds.top_index, prev);
    let mut y = bounds.minimum_y;

    loop {
        let left_bottom_y = points[left.bottom].y;
        let right_bottom_y = points[right.bottom].y;
        let bottom_y = left_bottom_y.min(right_bottom_y).min(maximum_y);

        // Rows above the display still advance both edges.
        if y < 0 {
            let hidden = bottom_y.min(-1) - y + 1;
            left.step_rows(hidden);
            right.step_rows(hidden);
            y += hidden;
        }

        while y <= bottom_y {
            hlines[y as usize] = Hline::new(left.column(), right.column());
            left.step_rows(1);
            right.step_rows(1);
            y += 1;
        }

        if y > maximum_y {
            break;
        }
        if bottom_y == left_bottom_y {
            left.advance(points, next);
        }
        if bottom_y == right_bottom_y {
            right.advance(points, prev);
        }
    }

    (minimum_y as usize, maximum_y as usize)
}
