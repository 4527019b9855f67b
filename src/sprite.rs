//! Actor sprites and the angle-quantized sprite cache
//!
//! Rotating a sprite for every sub-degree heading change is wasteful, so a
//! full turn is split into `resolution` buckets and one image is rendered per
//! bucket up front. Caches are immutable once built and shared through `Arc`.

use std::f64::consts::TAU;

use crate::color::Color;
use crate::display::PixelBuffer;
use crate::error::{Error, Result};
use crate::geometry::normalize_radians;

/// Side length of the default turtle sprite, in pixels
pub const DEFAULT_SPRITE_SIZE: u32 = 29;

/// Absorbs rounding when an angle sits exactly on a bucket boundary
const BUCKET_EPSILON: f64 = 1e-9;

/// Renders one sprite image for a color and compass heading
///
/// `heading` is in radians, 0 = north, clockwise. The returned image is drawn
/// centered on the actor.
pub trait SpriteGenerator: Send + Sync {
    fn render(&self, color: Color, heading: f64) -> Result<PixelBuffer>;

    /// Key under which caches from this generator may be shared between
    /// actors. `None` keeps every cache private to its actor.
    fn shared_key(&self) -> Option<String> {
        None
    }
}

/// Map a sprite pixel center back into the unrotated sprite frame
///
/// Forward is -y in the unrotated frame; a clockwise screen rotation by
/// `heading` is undone here.
#[inline]
fn unrotate(x: f64, y: f64, cos: f64, sin: f64) -> (f64, f64) {
    (cos * x + sin * y, -sin * x + cos * y)
}

// ============================================================================
// Turtle Shape
// ============================================================================

/// The classic procedural turtle: round shell, head, tail and four feet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleShape {
    size: u32,
}

impl TurtleShape {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether a point of the unrotated shape (origin at the center, head
    /// towards -y) is covered
    fn covers(&self, x: f64, y: f64) -> bool {
        let s = self.size as f64;
        let in_circle = |cx: f64, cy: f64, r: f64| {
            let (dx, dy) = (x - cx, y - cy);
            dx * dx + dy * dy <= r * r
        };

        // Shell
        if in_circle(0.0, 0.0, 0.35 * s) {
            return true;
        }
        // Head
        if in_circle(0.0, -0.4 * s, 0.1 * s) {
            return true;
        }
        // Feet on the diagonals
        let foot = 0.2875 * s;
        for (fx, fy) in [(-foot, -foot), (foot, -foot), (foot, foot), (-foot, foot)] {
            if in_circle(fx, fy, 0.0625 * s) {
                return true;
            }
        }
        // Tail
        point_in_triangle(
            (x, y),
            (-0.05 * s, 0.35 * s),
            (0.0, 0.45 * s),
            (0.05 * s, 0.35 * s),
        )
    }
}

impl Default for TurtleShape {
    fn default() -> Self {
        Self::new(DEFAULT_SPRITE_SIZE)
    }
}

impl SpriteGenerator for TurtleShape {
    fn render(&self, color: Color, heading: f64) -> Result<PixelBuffer> {
        let mut image = PixelBuffer::new(self.size, self.size);
        let (sin, cos) = heading.sin_cos();
        let half = self.size as f64 / 2.0;

        for py in 0..self.size as i32 {
            for px in 0..self.size as i32 {
                let (lx, ly) = unrotate(px as f64 + 0.5 - half, py as f64 + 0.5 - half, cos, sin);
                if self.covers(lx, ly) {
                    image.set_pixel(px, py, color);
                }
            }
        }
        Ok(image)
    }

    fn shared_key(&self) -> Option<String> {
        Some(format!("turtle-{}", self.size))
    }
}

fn point_in_triangle(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    let sign = |p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)| {
        (p1.0 - p3.0) * (p2.1 - p3.1) - (p2.0 - p3.0) * (p1.1 - p3.1)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

// ============================================================================
// Bitmap Sprite
// ============================================================================

/// A caller-supplied image, facing north, rotated per bucket
///
/// The output is a square of side `ceil(sqrt(w² + h²))` so no rotation ever
/// crops the image. The cache color is ignored.
#[derive(Debug, Clone)]
pub struct BitmapSprite {
    image: PixelBuffer,
}

impl BitmapSprite {
    pub fn new(image: PixelBuffer) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    pub fn side(&self) -> u32 {
        let w = self.image.width() as f64;
        let h = self.image.height() as f64;
        (w * w + h * h).sqrt().ceil() as u32
    }
}

impl SpriteGenerator for BitmapSprite {
    fn render(&self, _color: Color, heading: f64) -> Result<PixelBuffer> {
        if self.image.is_empty() {
            return Err(Error::EmptySprite {
                width: self.image.width(),
                height: self.image.height(),
            });
        }

        let side = self.side();
        let mut out = PixelBuffer::new(side, side);
        let (sin, cos) = heading.sin_cos();
        let half = side as f64 / 2.0;
        let src_half_w = self.image.width() as f64 / 2.0;
        let src_half_h = self.image.height() as f64 / 2.0;

        // Nearest neighbour: sample the source at each rotated pixel center
        for py in 0..side as i32 {
            for px in 0..side as i32 {
                let (lx, ly) = unrotate(px as f64 + 0.5 - half, py as f64 + 0.5 - half, cos, sin);
                let sx = (lx + src_half_w).floor() as i32;
                let sy = (ly + src_half_h).floor() as i32;
                if let Some(c) = self.image.get_pixel(sx, sy) {
                    out.set_pixel(px, py, c);
                }
            }
        }
        Ok(out)
    }
}

// ============================================================================
// Sprite Cache
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteEntry {
    pub bucket: i32,
    pub image: PixelBuffer,
}

/// One pre-rendered sprite per angle bucket for a single color
#[derive(Debug, Clone)]
pub struct SpriteCache {
    color: Color,
    resolution: u32,
    entries: Vec<SpriteEntry>,
}

impl SpriteCache {
    /// Render `resolution` sprites covering one full turn
    ///
    /// Bucket `k` is rendered at heading `k * 2π / resolution`, so bucket 0
    /// faces north.
    pub fn build(generator: &dyn SpriteGenerator, color: Color, resolution: u32) -> Result<Self> {
        if resolution == 0 {
            return Err(Error::InvalidResolution(resolution));
        }

        let step = TAU / resolution as f64;
        let mut entries = Vec::with_capacity(resolution as usize);
        for bucket in 0..resolution {
            let image = generator.render(color, bucket as f64 * step)?;
            if image.is_empty() {
                return Err(Error::EmptySprite {
                    width: image.width(),
                    height: image.height(),
                });
            }
            entries.push(SpriteEntry {
                bucket: bucket as i32,
                image,
            });
        }

        tracing::debug!(%color, resolution, "built sprite cache");
        Ok(Self {
            color,
            resolution,
            entries,
        })
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn entries(&self) -> &[SpriteEntry] {
        &self.entries
    }

    /// Bucket index for a heading in radians; any real angle is accepted
    pub fn bucket_for(&self, angle: f64) -> i32 {
        let step = TAU / self.resolution as f64;
        let bucket = (normalize_radians(angle) / step + BUCKET_EPSILON).floor();
        (bucket.max(0.0) as i32).min(self.resolution as i32 - 1)
    }

    /// Sprite for a heading in radians
    pub fn for_angle(&self, angle: f64) -> &PixelBuffer {
        let idx = self.bucket_for(angle) as usize;
        &self.entries[idx].image
    }

    /// Whether two headings fall into different buckets
    #[inline]
    pub fn changed_since(&self, last: f64, new: f64) -> bool {
        self.bucket_for(last) != self.bucket_for(new)
    }
}
