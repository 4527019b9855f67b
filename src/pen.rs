use crate::color::Color;
use crate::geometry::Point;

/// Stroke and fill settings carried by every actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub fill_color: Color,
    /// Stroke width in pixels; values below 1 draw hairlines
    pub width: f64,
}

impl Pen {
    pub fn new(color: Color, fill_color: Color) -> Self {
        Self {
            color,
            fill_color,
            width: 1.0,
        }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self::new(Color::BLUE, Color::BLUE)
    }
}

/// Rubber-band fill applied to every painted segment
///
/// Coordinates are logical. `Point` fills the triangle between the anchor and
/// each segment; `Horizontal`/`Vertical` fill the trapezoid between the segment
/// and a fixed line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FillMode {
    #[default]
    Off,
    Point(Point),
    Horizontal(f64),
    Vertical(f64),
}

impl FillMode {
    #[inline]
    pub fn is_off(&self) -> bool {
        matches!(self, FillMode::Off)
    }
}
