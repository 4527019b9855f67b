//! Edge handling for moves that leave the canvas
//!
//! In clip mode a move is painted as one segment and the pixel buffer drops
//! whatever falls outside. In wrap mode the canvas is a torus: the move is cut
//! at every edge it crosses and each piece is re-entered from the opposite
//! side.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Segment};

/// Tolerance for deciding that a back-solved crossing lies on an edge
const EDGE_EPSILON: f64 = 1e-9;

/// What happens when an actor crosses the canvas boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// Paint the move unmodified; off-canvas pixels are dropped
    #[default]
    Clip,
    /// Toroidal canvas: split at edges and continue on the opposite side
    Wrap,
}

/// Splits pixel-space moves into paintable segments for a fixed canvas size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeClipper {
    width: f64,
    height: f64,
}

impl EdgeClipper {
    /// `width`/`height` are the logical canvas size, which is also the wrap
    /// period
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f64,
            height: height.max(1) as f64,
        }
    }

    /// Segments to paint for a move from `from` to `to` (both pixel space)
    ///
    /// Clip mode yields exactly one segment. Wrap mode yields one segment per
    /// canvas tile the move passes through, every one of them inside
    /// `[0, width] x [0, height]`. Non-finite input yields nothing.
    pub fn segments(&self, from: Point, to: Point, mode: EdgeMode) -> Vec<Segment> {
        if !from.is_finite() || !to.is_finite() {
            return Vec::new();
        }
        match mode {
            EdgeMode::Clip => vec![Segment::new(from, to)],
            EdgeMode::Wrap => self.wrap_segments(from, to),
        }
    }

    fn wrap_segments(&self, from: Point, to: Point) -> Vec<Segment> {
        let mut start = from;
        let mut end = to;
        self.into_bounds(&mut start, &mut end);

        // Each crossing moves the remaining span one tile closer to `end`
        let max_crossings = ((to.x - from.x).abs() / self.width).ceil()
            + ((to.y - from.y).abs() / self.height).ceil()
            + 4.0;
        let max_crossings = max_crossings as usize;

        let mut segments = Vec::with_capacity(max_crossings.min(16));
        for _ in 0..max_crossings {
            let Some(crossing) = self.first_crossing(start, end) else {
                break;
            };
            segments.push(Segment::new(start, crossing));
            start = crossing;
            self.into_bounds(&mut start, &mut end);
        }
        segments.push(Segment::new(start, end));
        segments
    }

    /// Translate `start` into `[0, width] x [0, height]`, carrying `end` along
    ///
    /// A start exactly on an edge is moved to the opposite edge when the
    /// direction of travel would leave the canvas immediately.
    fn into_bounds(&self, start: &mut Point, end: &mut Point) {
        let shift_x = Self::period_shift(start.x, end.x, self.width);
        start.x += shift_x;
        end.x += shift_x;

        let shift_y = Self::period_shift(start.y, end.y, self.height);
        start.y += shift_y;
        end.y += shift_y;
    }

    fn period_shift(start: f64, end: f64, period: f64) -> f64 {
        if start < 0.0 {
            (-start / period).ceil() * period
        } else if start > period {
            -((start / period).ceil() - 1.0) * period
        } else if start == 0.0 && end < start {
            period
        } else if start == period && end > start {
            -period
        } else {
            0.0
        }
    }

    /// Where the segment `start -> end` first leaves the canvas, if it does
    ///
    /// `start` must already be inside. The left/right edges are tested first
    /// and only accepted when the crossing lies within the vertical extent;
    /// otherwise the move exits through the top or bottom.
    fn first_crossing(&self, start: Point, end: Point) -> Option<Point> {
        let (w, h) = (self.width, self.height);
        let dx = end.x - start.x;
        let dy = end.y - start.y;

        let vertical_edge = if end.x < 0.0 {
            Some(0.0)
        } else if end.x > w {
            Some(w)
        } else {
            None
        };

        if let Some(edge_x) = vertical_edge {
            // dx is non-zero here: end.x lies outside while start.x is inside
            let y = if dy == 0.0 {
                start.y
            } else {
                start.y + (edge_x - start.x) * dy / dx
            };
            if y >= -EDGE_EPSILON && y <= h + EDGE_EPSILON {
                return Some(Point::new(edge_x, y.clamp(0.0, h)));
            }
        }

        let edge_y = if end.y < 0.0 {
            0.0
        } else if end.y > h {
            h
        } else {
            return None;
        };
        let x = if dx == 0.0 {
            start.x
        } else {
            start.x + (edge_y - start.y) * dx / dy
        };
        Some(Point::new(x.clamp(0.0, w), edge_y))
    }

    /// Canonical wrapped projection of a pixel-space point, in
    /// `[0, width) x [0, height)`
    pub fn wrap_point(&self, p: Point) -> Point {
        Point::new(wrap_axis(p.x, self.width), wrap_axis(p.y, self.height))
    }
}

fn wrap_axis(v: f64, period: f64) -> f64 {
    let r = v.rem_euclid(period);
    if r >= period {
        r - period
    } else {
        r
    }
}
