//! Glyph rendering for `label`
//!
//! Text metrics live outside the engine: anything implementing
//! [`GlyphSource`] can turn a string into a sprite-like image. [`PixelFont`]
//! is the built-in 3x5 block font, scaled by an integer factor.

use crate::color::Color;
use crate::display::PixelBuffer;

/// Horizontal placement of a label relative to the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Left edge of a text run of `width` pixels anchored at `x`
    pub fn left_edge(self, x: i32, width: u32) -> i32 {
        match self {
            Align::Left => x,
            Align::Center => x.saturating_sub((width / 2) as i32),
            Align::Right => x.saturating_sub(width as i32),
        }
    }
}

pub trait GlyphSource: Send + Sync {
    /// Advance width of `text` in pixels
    fn text_width(&self, text: &str) -> u32;

    /// Render `text` onto a transparent buffer whose bottom row is the baseline
    fn render(&self, text: &str, color: Color) -> PixelBuffer;
}

// ============================================================================
// Pixel Font
// ============================================================================

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;
/// Glyph width plus one column of spacing
const ADVANCE: u32 = GLYPH_W + 1;

/// Rows top to bottom, bit 2 is the leftmost column
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        ' ' => [0, 0, 0, 0, 0],
        '0' => [7, 5, 5, 5, 7],
        '1' => [2, 6, 2, 2, 7],
        '2' => [7, 1, 7, 4, 7],
        '3' => [7, 1, 7, 1, 7],
        '4' => [5, 5, 7, 1, 1],
        '5' => [7, 4, 7, 1, 7],
        '6' => [7, 4, 7, 5, 7],
        '7' => [7, 1, 1, 1, 1],
        '8' => [7, 5, 7, 5, 7],
        '9' => [7, 5, 7, 1, 7],
        'A' => [2, 5, 7, 5, 5],
        'B' => [6, 5, 6, 5, 6],
        'C' => [3, 4, 4, 4, 3],
        'D' => [6, 5, 5, 5, 6],
        'E' => [7, 4, 6, 4, 7],
        'F' => [7, 4, 6, 4, 4],
        'G' => [3, 4, 5, 5, 3],
        'H' => [5, 5, 7, 5, 5],
        'I' => [7, 2, 2, 2, 7],
        'J' => [1, 1, 1, 5, 2],
        'K' => [5, 5, 6, 5, 5],
        'L' => [4, 4, 4, 4, 7],
        'M' => [5, 7, 7, 5, 5],
        'N' => [6, 5, 5, 5, 5],
        'O' => [2, 5, 5, 5, 2],
        'P' => [6, 5, 6, 4, 4],
        'Q' => [2, 5, 5, 6, 3],
        'R' => [6, 5, 6, 5, 5],
        'S' => [3, 4, 2, 1, 6],
        'T' => [7, 2, 2, 2, 2],
        'U' => [5, 5, 5, 5, 7],
        'V' => [5, 5, 5, 5, 2],
        'W' => [5, 5, 7, 7, 5],
        'X' => [5, 5, 2, 5, 5],
        'Y' => [5, 5, 2, 2, 2],
        'Z' => [7, 1, 2, 4, 7],
        '.' => [0, 0, 0, 0, 2],
        ',' => [0, 0, 0, 2, 4],
        '!' => [2, 2, 2, 0, 2],
        '?' => [6, 1, 2, 0, 2],
        '-' => [0, 0, 7, 0, 0],
        '+' => [0, 2, 7, 2, 0],
        '=' => [0, 7, 0, 7, 0],
        ':' => [0, 2, 0, 2, 0],
        '/' => [1, 1, 2, 4, 4],
        '(' => [1, 2, 2, 2, 1],
        ')' => [4, 2, 2, 2, 4],
        _ => [7, 7, 7, 7, 7],
    }
}

/// Built-in 3x5 block font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFont {
    scale: u32,
}

impl PixelFont {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub fn line_height(&self) -> u32 {
        GLYPH_H * self.scale
    }
}

impl Default for PixelFont {
    fn default() -> Self {
        Self::new(2)
    }
}

impl GlyphSource for PixelFont {
    fn text_width(&self, text: &str) -> u32 {
        let count = text.chars().count() as u32;
        if count == 0 {
            0
        } else {
            // No spacing column after the last glyph
            (count * ADVANCE - 1) * self.scale
        }
    }

    fn render(&self, text: &str, color: Color) -> PixelBuffer {
        let mut out = PixelBuffer::new(self.text_width(text), self.line_height());
        let s = self.scale;
        for (i, c) in text.chars().enumerate() {
            let origin_x = i as u32 * ADVANCE * s;
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (0b100 >> col) != 0 {
                        out.fill_rect(
                            (origin_x + col * s) as i32,
                            (row as u32 * s) as i32,
                            s,
                            s,
                            color,
                        );
                    }
                }
            }
        }
        out
    }
}
