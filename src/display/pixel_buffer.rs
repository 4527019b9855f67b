use crate::color::Color;
use crate::error::{Error, Result};

// ============================================================================
// Utility Functions
// ============================================================================

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Write ABGR pixel to slice (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel(dest: &mut [u8], color: Color) {
    dest[0] = color.a; // A
    dest[1] = color.b; // B
    dest[2] = color.g; // G
    dest[3] = color.r; // R
}

#[inline]
fn read_pixel(src: &[u8]) -> Color {
    Color::rgba(src[3], src[2], src[1], src[0])
}

/// Source-over for one pixel slice
#[inline]
fn blend_into(dest: &mut [u8], color: Color) {
    match color.a {
        0 => {},
        255 => write_pixel(dest, color),
        sa => {
            let da = dest[0];
            if da == 255 {
                let alpha = sa as u16;
                dest[1] = blend_channel(color.b, dest[1], alpha);
                dest[2] = blend_channel(color.g, dest[2], alpha);
                dest[3] = blend_channel(color.r, dest[3], alpha);
            } else {
                // Translucent destination (actor layer): full Porter-Duff over
                let sa_f = sa as f32 / 255.0;
                let da_f = da as f32 / 255.0;
                let out_a = sa_f + da_f * (1.0 - sa_f);
                let mix = |s: u8, d: u8| -> u8 {
                    let v = (s as f32 * sa_f + d as f32 * da_f * (1.0 - sa_f)) / out_a;
                    v.round().clamp(0.0, 255.0) as u8
                };
                dest[1] = mix(color.b, dest[1]);
                dest[2] = mix(color.g, dest[2]);
                dest[3] = mix(color.r, dest[3]);
                dest[0] = (out_a * 255.0).round() as u8;
            }
        },
    }
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 pixel buffer for software rendering
///
/// Both canvas layers and every cached sprite are one of these. All writes are
/// bounds checked; out-of-range coordinates are dropped silently.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Create a fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width as usize) * (height as usize) * 4],
            width,
            height,
        }
    }

    /// Create a buffer filled with one color
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.clear(color);
        buffer
    }

    /// Wrap straight RGBA bytes (as produced by image decoders)
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(Error::InvalidImage {
                width,
                height,
                len: rgba.len(),
            });
        }
        let mut pixels = Vec::with_capacity(expected);
        for px in rgba.chunks_exact(4) {
            pixels.extend_from_slice(&[px[3], px[2], px[1], px[0]]);
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as i64) < self.width as i64 && y >= 0 && (y as i64) < self.height as i64
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    /// Clear to a solid color (alpha included)
    pub fn clear(&mut self, color: Color) {
        let pattern = [color.a, color.b, color.g, color.r];
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pattern);
        }
    }

    /// Set a single pixel (bounds checked, no blending)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            write_pixel(&mut self.pixels[idx..idx + 4], color);
        }
    }

    /// Read a pixel from the buffer (bounds checked)
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some(read_pixel(&self.pixels[idx..idx + 4]))
        } else {
            None
        }
    }

    /// Draw a horizontal line
    /// Computes starting index once, then increments by 4
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, color: Color) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let start = x1.max(0);
        let end = x2.min(self.width as i32 - 1);
        if start > end {
            return;
        }

        let mut idx = self.pixel_index(start as u32, y as u32);
        for _ in start..=end {
            write_pixel(&mut self.pixels[idx..idx + 4], color);
            idx += 4;
        }
    }

    /// Draw a vertical line
    pub fn vline(&mut self, x: i32, y1: i32, y2: i32, color: Color) {
        if x < 0 || x >= self.width as i32 {
            return;
        }
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        let start = y1.max(0);
        let end = y2.min(self.height as i32 - 1);
        if start > end {
            return;
        }

        // Stride is width * 4 bytes per row
        let stride = (self.width * 4) as usize;
        let mut idx = self.pixel_index(x as u32, start as u32);
        for _ in start..=end {
            write_pixel(&mut self.pixels[idx..idx + 4], color);
            idx += stride;
        }
    }

    /// Draw a line using Bresenham's algorithm with Cohen-Sutherland clipping
    ///
    /// Clips to buffer bounds first so the walk never leaves the grid.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let Some((cx0, cy0, cx1, cy1)) = self.clip_line(x0, y0, x1, y1) else {
            return;
        };

        let dx = (cx1 - cx0).abs();
        let dy = -((cy1 - cy0).abs());
        let sx = if cx0 < cx1 { 1i32 } else { -1i32 };
        let sy = if cy0 < cy1 { 1i32 } else { -1i32 };
        let mut err = dx + dy;
        let mut x = cx0;
        let mut y = cy0;

        loop {
            self.set_pixel(x, y, color);
            if x == cx1 && y == cy1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Cohen-Sutherland line clipping algorithm
    /// Returns the clipped endpoints, or None when nothing is visible
    fn clip_line(
        &self,
        mut x0: i32,
        mut y0: i32,
        mut x1: i32,
        mut y1: i32,
    ) -> Option<(i32, i32, i32, i32)> {
        const INSIDE: u8 = 0;
        const LEFT: u8 = 1;
        const RIGHT: u8 = 2;
        const BOTTOM: u8 = 4;
        const TOP: u8 = 8;
        // Algorithm converges in at most 4 iterations for valid input
        const MAX_ITERATIONS: u32 = 16;

        let w = self.width as i32;
        let h = self.height as i32;

        let outcode = |x: i32, y: i32| -> u8 {
            let mut code = INSIDE;
            if x < 0 {
                code |= LEFT;
            } else if x >= w {
                code |= RIGHT;
            }
            if y < 0 {
                code |= TOP;
            } else if y >= h {
                code |= BOTTOM;
            }
            code
        };

        let mut code0 = outcode(x0, y0);
        let mut code1 = outcode(x1, y1);

        for _ in 0..MAX_ITERATIONS {
            if (code0 | code1) == 0 {
                return Some((x0, y0, x1, y1));
            }
            if (code0 & code1) != 0 {
                return None;
            }

            let code_out = if code0 != 0 { code0 } else { code1 };
            let (x, y);

            // Widened before subtracting; endpoints may sit anywhere in i32
            let dy = i128::from(y1) - i128::from(y0);
            let dx = i128::from(x1) - i128::from(x0);
            let (fx0, fy0) = (i128::from(x0), i128::from(y0));

            if (code_out & BOTTOM) != 0 {
                if dy == 0 {
                    return None;
                }
                x = (fx0 + dx * (i128::from(h) - 1 - fy0) / dy) as i32;
                y = h - 1;
            } else if (code_out & TOP) != 0 {
                if dy == 0 {
                    return None;
                }
                x = (fx0 + dx * (0 - fy0) / dy) as i32;
                y = 0;
            } else if (code_out & RIGHT) != 0 {
                if dx == 0 {
                    return None;
                }
                y = (fy0 + dy * (i128::from(w) - 1 - fx0) / dx) as i32;
                x = w - 1;
            } else {
                // LEFT
                if dx == 0 {
                    return None;
                }
                y = (fy0 + dy * (0 - fx0) / dx) as i32;
                x = 0;
            }

            if code_out == code0 {
                x0 = x;
                y0 = y;
                code0 = outcode(x0, y0);
            } else {
                x1 = x;
                y1 = y;
                code1 = outcode(x1, y1);
            }
        }

        None
    }

    /// Draw a line with a square-capped stroke of the given width
    ///
    /// Widths of 1 or less fall back to the Bresenham line. Wider strokes are
    /// rasterized as a rectangle around the centerline, extended by half the
    /// width past each endpoint.
    pub fn line_thick(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Color) {
        if width <= 1.0 {
            self.line(
                x0.floor() as i32,
                y0.floor() as i32,
                x1.floor() as i32,
                y1.floor() as i32,
                color,
            );
            return;
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = dx.hypot(dy);
        let half = width / 2.0;

        if len < 1e-9 {
            self.fill_polygon(
                &[
                    (x0 - half, y0 - half),
                    (x0 + half, y0 - half),
                    (x0 + half, y0 + half),
                    (x0 - half, y0 + half),
                ],
                color,
            );
            return;
        }

        // Unit direction and perpendicular, both scaled to half the width
        let ux = dx / len * half;
        let uy = dy / len * half;
        let (px, py) = (-uy, ux);

        self.fill_polygon(
            &[
                (x0 - ux + px, y0 - uy + py),
                (x1 + ux + px, y1 + uy + py),
                (x1 + ux - px, y1 + uy - py),
                (x0 - ux - px, y0 - uy - py),
            ],
            color,
        );
    }

    /// Fill a rectangle
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        if w == 0 {
            return;
        }
        let right = (i64::from(x) + i64::from(w) - 1).min(i64::from(i32::MAX)) as i32;
        let top = i64::from(y).max(0);
        let bottom = (i64::from(y) + i64::from(h)).min(i64::from(self.height));
        for row in top..bottom {
            self.hline(x, right, row as i32, color);
        }
    }

    /// True when the square of half-size `radius` around (cx, cy) misses the
    /// buffer entirely
    fn circle_misses(&self, cx: i32, cy: i32, radius: i32) -> bool {
        let (cx, cy, r) = (i64::from(cx), i64::from(cy), i64::from(radius));
        cx + r < 0 || cy + r < 0 || cx - r >= i64::from(self.width) || cy - r >= i64::from(self.height)
    }

    /// Draw a filled circle using horizontal spans
    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        if radius <= 0 {
            if radius == 0 {
                self.set_pixel(cx, cy, color);
            }
            return;
        }
        if self.circle_misses(cx, cy, radius) {
            return;
        }

        // Midpoint circle algorithm with span filling
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;

        while x >= y {
            let (left, right) = (cx.saturating_sub(x), cx.saturating_add(x));
            self.hline(left, right, cy.saturating_add(y), color);
            if y != 0 {
                self.hline(left, right, cy.saturating_sub(y), color);
            }
            if x != y {
                let (left, right) = (cx.saturating_sub(y), cx.saturating_add(y));
                self.hline(left, right, cy.saturating_add(x), color);
                if y != 0 {
                    self.hline(left, right, cy.saturating_sub(x), color);
                }
            }

            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    /// Draw a circle outline (1px thick)
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        if radius < 0 || self.circle_misses(cx, cy, radius) {
            return;
        }

        // Midpoint circle algorithm
        let mut x = radius;
        let mut y = 0;
        let mut err = 0;

        while x >= y {
            for (ox, oy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
                self.set_pixel(cx.saturating_add(ox), cy.saturating_add(oy), color);
            }

            y += 1;
            err += 1 + 2 * y;
            if 2 * (err - x) + 1 > 0 {
                x -= 1;
                err += 1 - 2 * x;
            }
        }
    }

    /// Fill a polygon using scanline algorithm
    /// Preallocates the intersection buffer outside the loop
    pub fn fill_polygon(&mut self, vertices: &[(f64, f64)], color: Color) {
        if vertices.len() < 3 {
            return;
        }

        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;
        for (_, y) in vertices {
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }

        let min_y = (min_y.floor() as i32).max(0);
        let max_y = (max_y.ceil() as i32).min(self.height as i32 - 1);

        let mut intersections: Vec<i32> = Vec::with_capacity(vertices.len());
        let n = vertices.len();

        for y in min_y..=max_y {
            intersections.clear();
            let yf = y as f64 + 0.5;

            for i in 0..n {
                let (x1, y1) = vertices[i];
                let (x2, y2) = vertices[(i + 1) % n];

                if (y1 <= yf && y2 > yf) || (y2 <= yf && y1 > yf) {
                    let x = x1 + (yf - y1) / (y2 - y1) * (x2 - x1);
                    intersections.push(x.round() as i32);
                }
            }

            intersections.sort_unstable();
            for pair in intersections.chunks_exact(2) {
                // Half-open span [left, right) keeps adjacent polygons from overlapping
                if pair[1] > pair[0] {
                    self.hline(pair[0], pair[1] - 1, y, color);
                }
            }
        }
    }

    /// Outline a closed polygon with 1px lines
    pub fn draw_polygon(&mut self, vertices: &[(f64, f64)], color: Color) {
        let n = vertices.len();
        for i in 0..n {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % n];
            self.line(
                x0.floor() as i32,
                y0.floor() as i32,
                x1.floor() as i32,
                y1.floor() as i32,
                color,
            );
        }
    }

    // ========================================================================
    // Buffer Operations
    // ========================================================================

    /// Composite a source buffer onto this one using per-pixel source alpha
    /// (src-over). Fully transparent source pixels leave the destination alone.
    pub fn composite(&mut self, src: &PixelBuffer, x: i32, y: i32) {
        self.for_each_overlap(src, x, y, |dst, s| blend_into(dst, read_pixel(s)));
    }

    fn for_each_overlap(
        &mut self,
        src: &PixelBuffer,
        dst_x: i32,
        dst_y: i32,
        mut op: impl FnMut(&mut [u8], &[u8]),
    ) {
        let src_w = src.width() as i64;
        let src_h = src.height() as i64;
        let dst_w = self.width as i64;
        let dst_h = self.height as i64;

        let x_start = 0.max(-(dst_x as i64));
        let x_end = src_w.min(dst_w - dst_x as i64);
        if x_start >= x_end {
            return;
        }

        for sy in 0..src_h {
            let dy = dst_y as i64 + sy;
            if dy < 0 || dy >= dst_h {
                continue;
            }
            for sx in x_start..x_end {
                let dx = dst_x as i64 + sx;
                let si = src.pixel_index(sx as u32, sy as u32);
                let di = self.pixel_index(dx as u32, dy as u32);
                op(&mut self.pixels[di..di + 4], &src.pixels[si..si + 4]);
            }
        }
    }

    /// Number of pixels equal to `color`
    pub fn count_color(&self, color: Color) -> usize {
        self.pixels
            .chunks_exact(4)
            .filter(|px| read_pixel(px) == color)
            .count()
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Straight RGBA bytes in row order, for image encoders
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            out.extend_from_slice(&[px[3], px[2], px[1], px[0]]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_pixel() {
        let mut buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.get_pixel(1, 1), Some(Color::TRANSPARENT));
        buf.set_pixel(1, 1, Color::RED);
        assert_eq!(buf.get_pixel(1, 1), Some(Color::RED));
        assert_eq!(buf.get_pixel(4, 0), None);
        assert_eq!(buf.get_pixel(-1, 0), None);
        // Out-of-range writes are dropped
        buf.set_pixel(10, 10, Color::RED);
        assert_eq!(buf.count_color(Color::RED), 1);
    }

    #[test]
    fn test_line_clipped_to_bounds() {
        let mut buf = PixelBuffer::filled(10, 10, Color::WHITE);
        buf.line(-50, 5, 50, 5, Color::BLACK);
        assert_eq!(buf.count_color(Color::BLACK), 10);
        for x in 0..10 {
            assert_eq!(buf.get_pixel(x, 5), Some(Color::BLACK));
        }
    }

    #[test]
    fn test_line_endpoints_inclusive() {
        let mut buf = PixelBuffer::filled(10, 10, Color::WHITE);
        buf.line(2, 1, 2, 7, Color::BLUE);
        assert_eq!(buf.count_color(Color::BLUE), 7);
        assert_eq!(buf.get_pixel(2, 1), Some(Color::BLUE));
        assert_eq!(buf.get_pixel(2, 7), Some(Color::BLUE));
    }

    #[test]
    fn test_line_with_extreme_endpoints() {
        let mut buf = PixelBuffer::filled(10, 10, Color::WHITE);
        buf.line(i32::MIN, 5, i32::MAX, 5, Color::BLACK);
        assert_eq!(buf.count_color(Color::BLACK), 10);

        let mut buf = PixelBuffer::filled(10, 10, Color::WHITE);
        buf.line(i32::MIN, i32::MIN, i32::MAX, i32::MAX, Color::RED);
        assert_eq!(buf.count_color(Color::RED), 10);
        assert_eq!(buf.get_pixel(0, 0), Some(Color::RED));
        assert_eq!(buf.get_pixel(9, 9), Some(Color::RED));
    }

    #[test]
    fn test_far_off_rects_and_circles_are_dropped() {
        let mut buf = PixelBuffer::filled(10, 10, Color::WHITE);
        buf.fill_rect(i32::MAX - 1, 0, 10, 3, Color::RED);
        buf.fill_rect(0, i32::MAX, 3, 10, Color::RED);
        buf.fill_circle(i32::MAX, 0, 5, Color::RED);
        buf.draw_circle(i32::MIN, i32::MIN, 3, Color::RED);
        assert_eq!(buf.count_color(Color::RED), 0);

        buf.fill_rect(-5, -5, 8, 8, Color::BLUE);
        assert_eq!(buf.count_color(Color::BLUE), 9);
    }

    #[test]
    fn test_fill_polygon_rectangle() {
        let mut buf = PixelBuffer::filled(10, 10, Color::WHITE);
        buf.fill_polygon(&[(2.0, 2.0), (6.0, 2.0), (6.0, 5.0), (2.0, 5.0)], Color::GREEN);
        assert_eq!(buf.count_color(Color::GREEN), 12);
        assert_eq!(buf.get_pixel(2, 2), Some(Color::GREEN));
        assert_eq!(buf.get_pixel(5, 4), Some(Color::GREEN));
        assert_eq!(buf.get_pixel(6, 4), Some(Color::WHITE));
    }

    #[test]
    fn test_thick_line_covers_width() {
        let mut buf = PixelBuffer::filled(20, 20, Color::WHITE);
        buf.line_thick(5.5, 10.5, 15.5, 10.5, 3.0, Color::RED);
        for y in 9..=11 {
            assert_eq!(buf.get_pixel(10, y), Some(Color::RED));
        }
        assert_eq!(buf.get_pixel(10, 7), Some(Color::WHITE));
    }

    #[test]
    fn test_composite_skips_transparent() {
        let mut dst = PixelBuffer::filled(4, 4, Color::WHITE);
        let mut sprite = PixelBuffer::new(2, 2);
        sprite.set_pixel(0, 0, Color::RED);
        dst.composite(&sprite, 1, 1);
        assert_eq!(dst.get_pixel(1, 1), Some(Color::RED));
        assert_eq!(dst.get_pixel(2, 2), Some(Color::WHITE));
    }

    #[test]
    fn test_composite_half_alpha_over_opaque() {
        let mut dst = PixelBuffer::filled(1, 1, Color::BLACK);
        let src = PixelBuffer::filled(1, 1, Color::rgba(255, 255, 255, 128));
        dst.composite(&src, 0, 0);
        let px = dst.get_pixel(0, 0).unwrap_or_default();
        assert_eq!(px.a, 255);
        assert!((127..=129).contains(&px.r));
    }

    #[test]
    fn test_composite_partially_offscreen() {
        let mut dst = PixelBuffer::filled(4, 4, Color::WHITE);
        let src = PixelBuffer::filled(3, 3, Color::BLUE);
        dst.composite(&src, -1, 2);
        assert_eq!(dst.count_color(Color::BLUE), 4);
        assert_eq!(dst.get_pixel(0, 3), Some(Color::BLUE));
        assert_eq!(dst.get_pixel(2, 3), Some(Color::WHITE));
    }

    #[test]
    fn test_rgba_bytes_round_trip() {
        let mut buf = PixelBuffer::new(2, 1);
        buf.set_pixel(1, 0, Color::rgba(1, 2, 3, 4));
        let bytes = buf.to_rgba_bytes();
        assert_eq!(&bytes[4..8], &[1, 2, 3, 4]);
        let back = PixelBuffer::from_rgba(2, 1, &bytes).ok();
        assert_eq!(back, Some(buf));
        assert!(PixelBuffer::from_rgba(2, 2, &bytes).is_err());
    }
}
