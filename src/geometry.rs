//! Geometry utilities: points, segments, the logical/pixel coordinate map and
//! compass-heading helpers

use std::f64::consts::TAU;
use std::ops::{Add, Mul, Sub};

/// A 2D point, used both for logical (y up) and pixel (y down) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A straight piece of a move, in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    #[inline]
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.from.distance_to(self.to)
    }
}

// ============================================================================
// Coordinate Map
// ============================================================================

/// Fixed affine map between logical coordinates (origin at the center, y up)
/// and pixel coordinates (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMap {
    width: f64,
    height: f64,
}

impl CoordinateMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// `px = width/2 + x`, `py = height/2 - y`
    #[inline]
    pub fn to_pixel(&self, logical: Point) -> Point {
        Point::new(self.width / 2.0 + logical.x, self.height / 2.0 - logical.y)
    }

    #[inline]
    pub fn to_logical(&self, pixel: Point) -> Point {
        Point::new(pixel.x - self.width / 2.0, self.height / 2.0 - pixel.y)
    }

    /// Whether a logical point lies within the canvas (edges included)
    pub fn contains_logical(&self, logical: Point) -> bool {
        let p = self.to_pixel(logical);
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

// ============================================================================
// Headings
// ============================================================================

/// Normalize an angle in radians into `[0, 2π)`
#[inline]
pub fn normalize_radians(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Normalize an angle in degrees into `[0, 360)`
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Compass heading (radians, 0 = north, clockwise) from `from` to `to` in
/// logical coordinates
#[inline]
pub fn heading_towards(from: Point, to: Point) -> f64 {
    normalize_radians((to.x - from.x).atan2(to.y - from.y))
}

/// Logical displacement for moving `distance` along compass `heading`
#[inline]
pub fn displacement(heading: f64, distance: f64) -> Point {
    Point::new(distance * heading.sin(), distance * heading.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pixel_map_round_trip() {
        let map = CoordinateMap::new(400, 300);
        assert_eq!(map.to_pixel(Point::ORIGIN), Point::new(200.0, 150.0));
        assert_eq!(map.to_pixel(Point::new(-200.0, 150.0)), Point::new(0.0, 0.0));
        let p = Point::new(12.5, -40.0);
        assert_eq!(map.to_logical(map.to_pixel(p)), p);
    }

    #[test]
    fn test_contains_logical_includes_edges() {
        let map = CoordinateMap::new(400, 400);
        assert!(map.contains_logical(Point::new(200.0, -200.0)));
        assert!(!map.contains_logical(Point::new(200.1, 0.0)));
    }

    #[test]
    fn test_heading_towards_compass() {
        let o = Point::ORIGIN;
        assert!(close(heading_towards(o, Point::new(0.0, 10.0)), 0.0));
        assert!(close(heading_towards(o, Point::new(10.0, 0.0)), TAU / 4.0));
        assert!(close(heading_towards(o, Point::new(0.0, -10.0)), TAU / 2.0));
        assert!(close(heading_towards(o, Point::new(-10.0, 0.0)), 3.0 * TAU / 4.0));
    }

    #[test]
    fn test_displacement_east() {
        let d = displacement(TAU / 4.0, 10.0);
        assert!(close(d.x, 10.0));
        assert!(close(d.y, 0.0));
    }

    #[test]
    fn test_normalize() {
        assert!(close(normalize_degrees(-90.0), 270.0));
        assert!(close(normalize_degrees(720.0), 0.0));
        assert!(close(normalize_radians(-TAU / 4.0), 3.0 * TAU / 4.0));
        assert!(normalize_radians(-1e-18) < TAU);
    }
}
