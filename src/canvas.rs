//! The dual-layer canvas
//!
//! The trace layer holds permanent ink: lines, fills, stamps, labels. The
//! actor layer is transparent except where sprites are drawn and is rebuilt
//! whenever a sprite moves. [`Canvas::compose`] layers the second over the
//! first. Both layers are one pixel larger than the logical size in each
//! direction so that points on the far edges stay addressable.
//!
//! Public drawing calls take logical coordinates (origin at the center, y up).
//! The `draw_segment`/`area_fill` primitives work in pixel space, as produced
//! by the [`EdgeClipper`].

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::codecs::gif::GifEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::clipper::{EdgeClipper, EdgeMode};
use crate::color::Color;
use crate::config::EngineConfig;
use crate::display::PixelBuffer;
use crate::error::{Error, Result};
use crate::fill::flood_fill;
use crate::geometry::{CoordinateMap, Point, Segment};
use crate::pen::{FillMode, Pen};
use crate::sprite::{SpriteCache, SpriteGenerator};
use crate::text::{Align, GlyphSource};
use crate::util::Rng;

/// Pixel rounding used for every primitive (half-up)
#[inline]
fn round_px(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

// ============================================================================
// Supporting Types
// ============================================================================

/// Handle for a sprite slot on a canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

/// How an arc is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcKind {
    /// Just the curve
    #[default]
    Open,
    /// Curve closed by a straight line between its ends
    Chord,
    /// Curve closed through the center
    Pie,
}

/// Export formats supported by [`Canvas::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Gif,
}

impl ImageFormat {
    /// Format implied by a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct ActorSprite {
    id: ActorId,
    cache: Arc<SpriteCache>,
    /// Logical position, unbounded
    position: Point,
    heading: f64,
    edge_mode: EdgeMode,
    visible: bool,
}

/// Library key: generator key, color, resolution
type CacheKey = (String, Color, u32);

// ============================================================================
// Canvas
// ============================================================================

pub struct Canvas {
    width: u32,
    height: u32,
    map: CoordinateMap,
    clipper: EdgeClipper,
    trace: PixelBuffer,
    actor_layer: PixelBuffer,
    background: Color,
    /// Bottom to top
    sprites: Vec<ActorSprite>,
    /// Rectangles touched on the actor layer by the last refresh
    drawn: Vec<(i32, i32, u32, u32)>,
    library: HashMap<CacheKey, Arc<SpriteCache>>,
    next_id: u64,
    needs_redisplay: bool,
    repaint_enabled: bool,
    rng: Rng,
    config: EngineConfig,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("background", &self.background)
            .field("actors", &self.sprites.len())
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// Create a canvas of logical size `width x height` filled with `background`
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let config = EngineConfig {
            canvas_width: width,
            canvas_height: height,
            background,
            ..EngineConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let (width, height) = (config.canvas_width, config.canvas_height);
        tracing::info!(width, height, background = %config.background, "canvas created");
        Self {
            width,
            height,
            map: CoordinateMap::new(width, height),
            clipper: EdgeClipper::new(width, height),
            trace: PixelBuffer::filled(width + 1, height + 1, config.background),
            actor_layer: PixelBuffer::new(width + 1, height + 1),
            background: config.background,
            sprites: Vec::new(),
            drawn: Vec::new(),
            library: HashMap::new(),
            next_id: 1,
            needs_redisplay: true,
            repaint_enabled: true,
            rng: Rng::default(),
            config: config.clone(),
        }
    }

    /// Wrap into the lockable handle actors share
    pub fn into_shared(self) -> Arc<SharedCanvas> {
        Arc::new(SharedCanvas::new(self))
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
    pub fn background(&self) -> Color {
        self.background
    }

    /// Defaults new actors start from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clipper(&self) -> &EdgeClipper {
        &self.clipper
    }

    pub fn trace_layer(&self) -> &PixelBuffer {
        &self.trace
    }

    pub fn actor_layer(&self) -> &PixelBuffer {
        &self.actor_layer
    }

    #[inline]
    pub fn to_pixel(&self, logical: Point) -> Point {
        self.map.to_pixel(logical)
    }

    #[inline]
    pub fn to_logical(&self, pixel: Point) -> Point {
        self.map.to_logical(pixel)
    }

    /// Whether a logical point lies on the canvas (edges included)
    pub fn contains(&self, logical: Point) -> bool {
        self.map.contains_logical(logical)
    }

    /// Reseed the generator behind `spray`
    pub fn set_spray_seed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    // ========================================================================
    // Redisplay
    // ========================================================================

    #[inline]
    fn mark_dirty(&mut self) {
        if self.repaint_enabled {
            self.needs_redisplay = true;
        }
    }

    pub fn needs_redisplay(&self) -> bool {
        self.needs_redisplay
    }

    /// Read and reset the redisplay flag
    pub fn take_redisplay(&mut self) -> bool {
        std::mem::take(&mut self.needs_redisplay)
    }

    /// While disabled, painting never raises the redisplay flag; enabling
    /// raises it once so pending changes get shown
    pub fn set_repaint_enabled(&mut self, enabled: bool) {
        self.repaint_enabled = enabled;
        if enabled {
            self.needs_redisplay = true;
        }
    }

    pub fn is_repaint_enabled(&self) -> bool {
        self.repaint_enabled
    }

    // ========================================================================
    // Pixel-space Primitives
    // ========================================================================

    /// Plot one segment with the pen's color and stroke width
    pub fn draw_segment(&mut self, seg: &Segment, pen: &Pen) {
        if pen.width <= 1.0 {
            self.trace.line(
                round_px(seg.from.x),
                round_px(seg.from.y),
                round_px(seg.to.x),
                round_px(seg.to.y),
                pen.color,
            );
        } else {
            self.trace.line_thick(
                round_px(seg.from.x) as f64 + 0.5,
                round_px(seg.from.y) as f64 + 0.5,
                round_px(seg.to.x) as f64 + 0.5,
                round_px(seg.to.y) as f64 + 0.5,
                pen.width,
                pen.color,
            );
        }
        self.mark_dirty();
    }

    /// Rubber-band fill for one painted segment
    ///
    /// `Point` fills the triangle anchor-start-end; `Horizontal`/`Vertical`
    /// fill the trapezoid between the segment and the fixed line.
    pub fn area_fill(&mut self, mode: FillMode, start: Point, end: Point, color: Color) {
        let (sx, sy) = (round_px(start.x) as f64, round_px(start.y) as f64);
        let (ex, ey) = (round_px(end.x) as f64, round_px(end.y) as f64);

        let polygon = match mode {
            FillMode::Off => return,
            FillMode::Point(anchor) => {
                let a = self.to_pixel(anchor);
                vec![
                    (round_px(a.x) as f64, round_px(a.y) as f64),
                    (sx, sy),
                    (ex, ey),
                ]
            },
            FillMode::Horizontal(y) => {
                let line = round_px(self.to_pixel(Point::new(0.0, y)).y) as f64;
                vec![(sx, sy), (ex, ey), (ex, line), (sx, line)]
            },
            FillMode::Vertical(x) => {
                let line = round_px(self.to_pixel(Point::new(x, 0.0)).x) as f64;
                vec![(sx, sy), (ex, ey), (line, ey), (line, sy)]
            },
        };
        self.trace.fill_polygon(&polygon, color);
        self.mark_dirty();
    }

    /// Paint a move between two logical positions
    ///
    /// The move is split by the clipper according to `mode`; every segment is
    /// stroked and, unless `fill` is off, rubber-band filled in the pen color.
    /// Returns the painted segments in pixel space.
    pub fn paint_move(
        &mut self,
        from: Point,
        to: Point,
        mode: EdgeMode,
        pen: &Pen,
        fill: FillMode,
    ) -> Vec<Segment> {
        let segments = self
            .clipper
            .segments(self.to_pixel(from), self.to_pixel(to), mode);
        for seg in &segments {
            self.draw_segment(seg, pen);
            if !fill.is_off() {
                self.area_fill(fill, seg.from, seg.to, pen.color);
            }
        }
        segments
    }

    // ========================================================================
    // Logical Drawing
    // ========================================================================

    /// Straight line between two logical points; never wraps
    pub fn draw_line(&mut self, from: Point, to: Point, pen: &Pen) {
        let seg = Segment::new(self.to_pixel(from), self.to_pixel(to));
        self.draw_segment(&seg, pen);
    }

    /// Filled or outlined circle of `diameter` pixels; diameters up to 1 plot
    /// a single pixel
    pub fn dot(&mut self, center: Point, diameter: f64, color: Color, filled: bool) {
        let p = self.to_pixel(center);
        let (cx, cy) = (round_px(p.x), round_px(p.y));
        let d = round_px(diameter);
        if d > 1 {
            if filled {
                self.trace.fill_circle(cx, cy, d / 2, color);
            } else {
                self.trace.draw_circle(cx, cy, d / 2, color);
            }
        } else {
            self.trace.set_pixel(cx, cy, color);
        }
        self.mark_dirty();
    }

    /// Arc around `center` with compass angles in degrees (0 north, clockwise
    /// positive); `extent` may be negative
    pub fn arc(
        &mut self,
        center: Point,
        radius: f64,
        start: f64,
        extent: f64,
        kind: ArcKind,
        filled: bool,
        color: Color,
    ) {
        if radius <= 0.0 || extent == 0.0 || !extent.is_finite() {
            return;
        }
        // Sweeps past a full turn retrace the circle
        let extent = extent.clamp(-360.0, 360.0);
        let c = self.to_pixel(center);
        let (cx, cy) = (round_px(c.x) as f64, round_px(c.y) as f64);
        let r = radius.round();

        // About two degrees per chord
        let steps = ((extent.abs() / 2.0).ceil() as usize).max(2);
        let mut points: Vec<(f64, f64)> = (0..=steps)
            .map(|i| {
                let a = (start + extent * i as f64 / steps as f64).to_radians();
                (cx + r * a.sin(), cy - r * a.cos())
            })
            .collect();

        match kind {
            ArcKind::Open => {
                if filled {
                    self.trace.fill_polygon(&points, color);
                } else {
                    for pair in points.windows(2) {
                        self.trace.line(
                            round_px(pair[0].0),
                            round_px(pair[0].1),
                            round_px(pair[1].0),
                            round_px(pair[1].1),
                            color,
                        );
                    }
                }
            },
            ArcKind::Chord | ArcKind::Pie => {
                if kind == ArcKind::Pie {
                    points.push((cx, cy));
                }
                if filled {
                    self.trace.fill_polygon(&points, color);
                } else {
                    self.trace.draw_polygon(&points, color);
                }
            },
        }
        self.mark_dirty();
    }

    fn pixel_polygon(&self, vertices: &[Point]) -> Vec<(f64, f64)> {
        vertices
            .iter()
            .map(|v| {
                let p = self.to_pixel(*v);
                (round_px(p.x) as f64, round_px(p.y) as f64)
            })
            .collect()
    }

    pub fn fill_polygon(&mut self, vertices: &[Point], color: Color) {
        let polygon = self.pixel_polygon(vertices);
        self.trace.fill_polygon(&polygon, color);
        self.mark_dirty();
    }

    pub fn draw_polygon(&mut self, vertices: &[Point], color: Color) {
        let polygon = self.pixel_polygon(vertices);
        self.trace.draw_polygon(&polygon, color);
        self.mark_dirty();
    }

    /// Close a recorded path: fill it, then redraw the outline over the fill
    pub fn fill_path(&mut self, vertices: &[Point], fill: Color, outline: Color) {
        if vertices.len() < 2 {
            return;
        }
        let polygon = self.pixel_polygon(vertices);
        self.trace.fill_polygon(&polygon, fill);
        self.trace.draw_polygon(&polygon, outline);
        self.mark_dirty();
    }

    /// Scatter `density` dots around `center` with a Gaussian spread
    pub fn spray(&mut self, center: Point, density: u32, spread: f64, size: u32, color: Color) {
        let p = self.to_pixel(center);
        let (cx, cy) = (round_px(p.x), round_px(p.y));
        for _ in 0..density {
            let rx = cx.saturating_add((spread * self.rng.next_gaussian()) as i32);
            let ry = cy.saturating_add((spread * self.rng.next_gaussian()) as i32);
            if size <= 1 {
                self.trace.set_pixel(rx, ry, color);
            } else {
                self.trace.fill_circle(rx, ry, (size / 2) as i32, color);
            }
        }
        self.mark_dirty();
    }

    /// Text whose bottom-left corner (for `Align::Left`) sits at `position`
    pub fn label(
        &mut self,
        position: Point,
        text: &str,
        align: Align,
        color: Color,
        glyphs: &dyn GlyphSource,
    ) {
        if text.is_empty() {
            return;
        }
        let image = glyphs.render(text, color);
        let p = self.to_pixel(position);
        let left = align.left_edge(round_px(p.x), glyphs.text_width(text));
        let top = round_px(p.y).saturating_sub(image.height() as i32);
        self.trace.composite(&image, left, top);
        self.mark_dirty();
    }

    /// Composite an image centered on a logical point into the trace layer
    pub fn draw_image(&mut self, center: Point, image: &PixelBuffer) {
        let p = self.to_pixel(center);
        let x = round_px(p.x).saturating_sub((image.width() / 2) as i32);
        let y = round_px(p.y).saturating_sub((image.height() / 2) as i32);
        self.trace.composite(image, x, y);
        self.mark_dirty();
    }

    /// Flood-fill the trace layer from a logical point
    ///
    /// Returns the number of pixels painted; points off the canvas paint
    /// nothing.
    pub fn flood_fill(&mut self, at: Point, color: Color) -> usize {
        if !self.contains(at) {
            tracing::warn!(x = at.x, y = at.y, "fill ignored outside the canvas");
            return 0;
        }
        let p = self.to_pixel(at);
        let painted = flood_fill(&mut self.trace, round_px(p.x), round_px(p.y), color);
        tracing::debug!(painted, %color, "flood fill");
        if painted > 0 {
            self.mark_dirty();
        }
        painted
    }

    /// Trace-layer color at a pixel
    pub fn pixel_color(&self, x: i32, y: i32) -> Option<Color> {
        self.trace.get_pixel(x, y)
    }

    /// Trace-layer color under a logical point
    pub fn pixel_color_at(&self, at: Point) -> Option<Color> {
        if !self.contains(at) {
            return None;
        }
        let p = self.to_pixel(at);
        self.pixel_color(round_px(p.x), round_px(p.y))
    }

    // ========================================================================
    // Erasing
    // ========================================================================

    /// Erase all traces with the current background; sprites stay as they are
    pub fn clean(&mut self) {
        self.clean_with(self.background);
    }

    /// Erase all traces with a new background color
    pub fn clean_with(&mut self, color: Color) {
        self.background = color;
        self.trace.clear(color);
        tracing::info!(background = %color, "canvas cleaned");
        self.mark_dirty();
    }

    /// Same as [`clean_with`](Self::clean_with); the color also becomes the
    /// background that `pen_erase` paints with
    pub fn set_background(&mut self, color: Color) {
        self.clean_with(color);
    }

    /// Erase all traces and hide every sprite
    pub fn clear(&mut self) {
        self.clear_with(self.background);
    }

    pub fn clear_with(&mut self, color: Color) {
        for sprite in &mut self.sprites {
            sprite.visible = false;
        }
        self.refresh_sprites();
        self.clean_with(color);
    }

    // ========================================================================
    // Sprites
    // ========================================================================

    /// Cache for a generator/color/resolution, shared across actors when the
    /// generator allows it
    pub fn sprite_cache(
        &mut self,
        generator: &dyn SpriteGenerator,
        color: Color,
        resolution: u32,
    ) -> Result<Arc<SpriteCache>> {
        let Some(key) = generator.shared_key() else {
            return Ok(Arc::new(SpriteCache::build(generator, color, resolution)?));
        };
        let key = (key, color, resolution);
        if let Some(cache) = self.library.get(&key) {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(SpriteCache::build(generator, color, resolution)?);
        self.library.insert(key, Arc::clone(&cache));
        Ok(cache)
    }

    /// Add a sprite slot on top of all others
    pub fn attach_sprite(
        &mut self,
        cache: Arc<SpriteCache>,
        position: Point,
        heading: f64,
        edge_mode: EdgeMode,
        visible: bool,
    ) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.sprites.push(ActorSprite {
            id,
            cache,
            position,
            heading,
            edge_mode,
            visible,
        });
        self.refresh_sprites();
        id
    }

    pub fn detach_sprite(&mut self, id: ActorId) {
        let before = self.sprites.len();
        self.sprites.retain(|s| s.id != id);
        if self.sprites.len() != before {
            self.refresh_sprites();
        }
    }

    fn sprite_mut(&mut self, id: ActorId) -> Option<&mut ActorSprite> {
        self.sprites.iter_mut().find(|s| s.id == id)
    }

    /// Move a sprite; the actor layer is rebuilt only if the sprite is shown
    pub fn place_sprite(&mut self, id: ActorId, position: Point, heading: f64, edge_mode: EdgeMode) {
        let Some(sprite) = self.sprite_mut(id) else {
            return;
        };
        sprite.position = position;
        sprite.heading = heading;
        sprite.edge_mode = edge_mode;
        if sprite.visible {
            self.refresh_sprites();
        }
    }

    pub fn set_sprite_cache(&mut self, id: ActorId, cache: Arc<SpriteCache>) {
        if let Some(sprite) = self.sprite_mut(id) {
            sprite.cache = cache;
            self.refresh_sprites();
        }
    }

    pub fn set_sprite_visible(&mut self, id: ActorId, visible: bool) {
        if let Some(sprite) = self.sprite_mut(id) {
            if sprite.visible != visible {
                sprite.visible = visible;
                self.refresh_sprites();
            }
        }
    }

    pub fn is_sprite_visible(&self, id: ActorId) -> bool {
        self.sprites.iter().any(|s| s.id == id && s.visible)
    }

    /// Draw `id` above every other sprite
    pub fn to_top(&mut self, id: ActorId) {
        if let Some(idx) = self.sprites.iter().position(|s| s.id == id) {
            let sprite = self.sprites.remove(idx);
            self.sprites.push(sprite);
            self.refresh_sprites();
        }
    }

    /// Draw `id` below every other sprite
    pub fn to_bottom(&mut self, id: ActorId) {
        if let Some(idx) = self.sprites.iter().position(|s| s.id == id) {
            let sprite = self.sprites.remove(idx);
            self.sprites.insert(0, sprite);
            self.refresh_sprites();
        }
    }

    pub fn actor_count(&self) -> usize {
        self.sprites.len()
    }

    /// Top-left corners at which a sprite of `w x h` is drawn for an actor
    ///
    /// In wrap mode the sprite is centered on the wrapped projection and
    /// repeated across every edge it overlaps.
    fn sprite_origins(&self, position: Point, edge_mode: EdgeMode, w: u32, h: u32) -> Vec<(i32, i32)> {
        let mut center = self.to_pixel(position);
        if edge_mode == EdgeMode::Wrap {
            center = self.clipper.wrap_point(center);
        }
        let left = round_px(center.x).saturating_sub((w / 2) as i32);
        let top = round_px(center.y).saturating_sub((h / 2) as i32);
        if edge_mode == EdgeMode::Clip {
            return vec![(left, top)];
        }

        let (cw, ch) = (self.width as i32, self.height as i32);
        let axis_copies = |start: i32, size: u32, period: i32| {
            let mut offsets = vec![0];
            if start < 0 {
                offsets.push(period);
            }
            if start.saturating_add(size as i32) > period {
                offsets.push(-period);
            }
            offsets
        };
        let xs = axis_copies(left, w, cw);
        let ys = axis_copies(top, h, ch);
        let mut origins = Vec::with_capacity(xs.len() * ys.len());
        for dy in &ys {
            for dx in &xs {
                origins.push((left + dx, top + dy));
            }
        }
        origins
    }

    /// Rebuild the actor layer from the sprite slots
    fn refresh_sprites(&mut self) {
        for (x, y, w, h) in self.drawn.drain(..) {
            self.actor_layer.fill_rect(x, y, w, h, Color::TRANSPARENT);
        }

        let mut drawn = Vec::new();
        for sprite in self.sprites.iter().filter(|s| s.visible) {
            let image = sprite.cache.for_angle(sprite.heading);
            let (w, h) = (image.width(), image.height());
            for (x, y) in self.sprite_origins(sprite.position, sprite.edge_mode, w, h) {
                self.actor_layer.composite(image, x, y);
                drawn.push((x, y, w, h));
            }
        }
        self.drawn = drawn;
        self.mark_dirty();
    }

    /// Bake a sprite's current image into the trace layer
    pub fn stamp(&mut self, id: ActorId) {
        let Some(sprite) = self.sprites.iter().find(|s| s.id == id) else {
            return;
        };
        let image = sprite.cache.for_angle(sprite.heading).clone();
        let (position, edge_mode) = (sprite.position, sprite.edge_mode);
        self.stamp_image(&image, position, edge_mode);
    }

    /// Bake an arbitrary sprite image into the trace layer, placed like an
    /// actor at `position`
    pub fn stamp_image(&mut self, image: &PixelBuffer, position: Point, edge_mode: EdgeMode) {
        for (x, y) in self.sprite_origins(position, edge_mode, image.width(), image.height()) {
            self.trace.composite(image, x, y);
        }
        self.mark_dirty();
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Trace layer with the actor layer composited on top
    pub fn compose(&self) -> PixelBuffer {
        let mut frame = self.trace.clone();
        frame.composite(&self.actor_layer, 0, 0);
        frame
    }

    /// Write the composited canvas to `path`
    pub fn save(&self, path: impl AsRef<Path>, format: ImageFormat) -> Result<()> {
        let path = path.as_ref();
        let frame = self.compose();
        let bytes = frame.to_rgba_bytes();
        let writer = BufWriter::new(File::create(path)?);
        match format {
            ImageFormat::Png => {
                PngEncoder::new(writer).write_image(
                    &bytes,
                    frame.width(),
                    frame.height(),
                    ColorType::Rgba8,
                )?;
            },
            ImageFormat::Gif => {
                let mut encoder = GifEncoder::new(writer);
                encoder.encode(&bytes, frame.width(), frame.height(), ColorType::Rgba8)?;
            },
        }
        tracing::info!(path = %path.display(), ?format, "canvas saved");
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

// ============================================================================
// Shared Canvas
// ============================================================================

/// A canvas behind its single lock, plus the disposed flag animators poll
#[derive(Debug)]
pub struct SharedCanvas {
    inner: Mutex<Canvas>,
    disposed: AtomicBool,
}

impl SharedCanvas {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            inner: Mutex::new(canvas),
            disposed: AtomicBool::new(false),
        }
    }

    /// Lock the canvas; a panic in another holder does not poison it for good
    pub fn lock(&self) -> MutexGuard<'_, Canvas> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop every running animation at its next step
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::TurtleShape;

    fn blank() -> Canvas {
        Canvas::new(400, 400, Color::WHITE)
    }

    #[test]
    fn test_layers_are_one_pixel_larger() {
        let canvas = blank();
        assert_eq!(canvas.trace_layer().width(), 401);
        assert_eq!(canvas.actor_layer().height(), 401);
        assert_eq!(canvas.pixel_color(400, 400), Some(Color::WHITE));
        assert_eq!(canvas.actor_layer().get_pixel(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_paint_move_wraps_through_north_edge() {
        let mut canvas = blank();
        let pen = Pen::new(Color::BLUE, Color::BLUE);
        let segs = canvas.paint_move(
            Point::ORIGIN,
            Point::new(0.0, 250.0),
            EdgeMode::Wrap,
            &pen,
            FillMode::Off,
        );
        assert_eq!(segs.len(), 2);
        assert_eq!(canvas.pixel_color(200, 0), Some(Color::BLUE));
        assert_eq!(canvas.pixel_color(200, 400), Some(Color::BLUE));
        assert_eq!(canvas.pixel_color(200, 350), Some(Color::BLUE));
        assert_eq!(canvas.pixel_color(200, 349), Some(Color::WHITE));
    }

    #[test]
    fn test_area_fill_to_point_triangle() {
        let mut canvas = blank();
        canvas.area_fill(
            FillMode::Point(Point::ORIGIN),
            Point::new(200.0, 100.0),
            Point::new(300.0, 100.0),
            Color::RED,
        );
        assert_eq!(canvas.pixel_color(240, 130), Some(Color::RED));
        assert_eq!(canvas.pixel_color(250, 190), Some(Color::WHITE));
    }

    #[test]
    fn test_area_fill_to_horizontal_line() {
        let mut canvas = blank();
        // Segment along y = 100 px, filled down to logical y = 0 (200 px)
        canvas.area_fill(
            FillMode::Horizontal(0.0),
            Point::new(100.0, 100.0),
            Point::new(150.0, 100.0),
            Color::GREEN,
        );
        assert_eq!(canvas.pixel_color(120, 150), Some(Color::GREEN));
        assert_eq!(canvas.pixel_color(120, 250), Some(Color::WHITE));
    }

    #[test]
    fn test_paint_move_fills_only_when_fill_is_on() {
        let pen = Pen::new(Color::BLUE, Color::BLUE);
        let from = Point::new(-50.0, 50.0);
        let to = Point::new(50.0, 50.0);

        let mut canvas = blank();
        canvas.paint_move(from, to, EdgeMode::Clip, &pen, FillMode::Off);
        assert_eq!(canvas.trace_layer().count_color(Color::BLUE), 101);

        let mut canvas = blank();
        canvas.paint_move(from, to, EdgeMode::Clip, &pen, FillMode::Horizontal(0.0));
        assert_eq!(canvas.pixel_color(200, 170), Some(Color::BLUE));
        assert_eq!(canvas.pixel_color(200, 210), Some(Color::WHITE));
    }

    #[test]
    fn test_area_fill_to_vertical_line() {
        let mut canvas = blank();
        // Segment along x = 100 px, filled right to logical x = 0 (200 px)
        canvas.area_fill(
            FillMode::Vertical(0.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 150.0),
            Color::GREEN,
        );
        assert_eq!(canvas.pixel_color(150, 120), Some(Color::GREEN));
        assert_eq!(canvas.pixel_color(199, 149), Some(Color::GREEN));
        assert_eq!(canvas.pixel_color(250, 120), Some(Color::WHITE));
        assert_eq!(canvas.pixel_color(150, 160), Some(Color::WHITE));
    }

    #[test]
    fn test_far_off_move_is_clipped_to_canvas() {
        let mut canvas = blank();
        let pen = Pen::new(Color::BLUE, Color::BLUE);
        canvas.paint_move(
            Point::new(-3.0e9, 0.0),
            Point::new(3.0e9, 0.0),
            EdgeMode::Clip,
            &pen,
            FillMode::Off,
        );
        assert_eq!(canvas.trace_layer().count_color(Color::BLUE), 401);
        assert_eq!(canvas.pixel_color(0, 200), Some(Color::BLUE));
        assert_eq!(canvas.pixel_color(400, 200), Some(Color::BLUE));
    }

    #[test]
    fn test_arc_runs_clockwise_from_north() {
        let mut canvas = blank();
        canvas.arc(Point::ORIGIN, 50.0, 0.0, 90.0, ArcKind::Open, false, Color::RED);
        assert_eq!(canvas.pixel_color(200, 150), Some(Color::RED));
        assert_eq!(canvas.pixel_color(250, 200), Some(Color::RED));
        assert_eq!(canvas.pixel_color(150, 200), Some(Color::WHITE));
        assert_eq!(canvas.pixel_color(200, 250), Some(Color::WHITE));

        // Negative extent sweeps counterclockwise
        let mut canvas = blank();
        canvas.arc(Point::ORIGIN, 50.0, 0.0, -90.0, ArcKind::Open, false, Color::RED);
        assert_eq!(canvas.pixel_color(150, 200), Some(Color::RED));
        assert_eq!(canvas.pixel_color(250, 200), Some(Color::WHITE));
    }

    #[test]
    fn test_arc_chord_and_pie_closure() {
        // (235, 170) lies between the chord and the arc, (220, 190) between
        // the chord and the center
        let mut chord = blank();
        chord.arc(Point::ORIGIN, 50.0, 0.0, 90.0, ArcKind::Chord, true, Color::RED);
        assert_eq!(chord.pixel_color(235, 170), Some(Color::RED));
        assert_eq!(chord.pixel_color(220, 190), Some(Color::WHITE));

        let mut pie = blank();
        pie.arc(Point::ORIGIN, 50.0, 0.0, 90.0, ArcKind::Pie, true, Color::RED);
        assert_eq!(pie.pixel_color(235, 170), Some(Color::RED));
        assert_eq!(pie.pixel_color(220, 190), Some(Color::RED));
        assert_eq!(pie.pixel_color(180, 190), Some(Color::WHITE));

        // Outlined pie closes through the center along the north radius
        let mut outline = blank();
        outline.arc(Point::ORIGIN, 50.0, 0.0, 90.0, ArcKind::Pie, false, Color::RED);
        assert_eq!(outline.pixel_color(200, 175), Some(Color::RED));
        let mut outline = blank();
        outline.arc(Point::ORIGIN, 50.0, 0.0, 90.0, ArcKind::Chord, false, Color::RED);
        assert_eq!(outline.pixel_color(200, 175), Some(Color::WHITE));
    }

    #[test]
    fn test_arc_sweep_is_capped_at_full_turn() {
        let mut canvas = blank();
        canvas.arc(Point::ORIGIN, 50.0, 0.0, 1.0e300, ArcKind::Open, false, Color::RED);
        assert_eq!(canvas.pixel_color(200, 150), Some(Color::RED));
        assert_eq!(canvas.pixel_color(200, 250), Some(Color::RED));
        canvas.arc(Point::ORIGIN, 50.0, 0.0, f64::NAN, ArcKind::Open, false, Color::BLUE);
        assert_eq!(canvas.trace_layer().count_color(Color::BLUE), 0);
    }

    #[test]
    fn test_draw_image_is_centered() {
        let mut canvas = blank();
        let image = PixelBuffer::filled(5, 3, Color::RED);
        // Logical (10, 10) is pixel (210, 190)
        canvas.draw_image(Point::new(10.0, 10.0), &image);
        assert_eq!(canvas.trace_layer().count_color(Color::RED), 15);
        assert_eq!(canvas.pixel_color(208, 189), Some(Color::RED));
        assert_eq!(canvas.pixel_color(212, 191), Some(Color::RED));
        assert_eq!(canvas.pixel_color(207, 190), Some(Color::WHITE));
        assert_eq!(canvas.pixel_color(210, 192), Some(Color::WHITE));
    }

    #[test]
    fn test_dot_and_pixel_color_at() {
        let mut canvas = blank();
        canvas.dot(Point::new(10.0, 10.0), 9.0, Color::RED, true);
        assert_eq!(canvas.pixel_color_at(Point::new(10.0, 10.0)), Some(Color::RED));
        assert_eq!(canvas.pixel_color_at(Point::new(10.0, 20.0)), Some(Color::WHITE));
        assert_eq!(canvas.pixel_color_at(Point::new(500.0, 0.0)), None);
    }

    #[test]
    fn test_spray_is_reproducible_per_seed() {
        let spray = |seed| {
            let mut canvas = blank();
            canvas.set_spray_seed(seed);
            canvas.spray(Point::ORIGIN, 50, 10.0, 1, Color::RED);
            canvas.compose()
        };
        let a = spray(7);
        assert_eq!(a, spray(7));
        let dots = a.count_color(Color::RED);
        assert!(dots > 0 && dots <= 50);
    }

    #[test]
    fn test_flood_fill_outside_canvas_is_ignored() {
        let mut canvas = blank();
        assert_eq!(canvas.flood_fill(Point::new(0.0, 300.0), Color::RED), 0);
        assert_eq!(canvas.trace_layer().count_color(Color::RED), 0);
    }

    #[test]
    fn test_compose_overlays_sprites() {
        let mut canvas = blank();
        let cache = canvas
            .sprite_cache(&TurtleShape::default(), Color::CYAN, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        canvas.attach_sprite(cache, Point::ORIGIN, 0.0, EdgeMode::Clip, true);
        let frame = canvas.compose();
        assert_eq!(frame.get_pixel(200, 200), Some(Color::CYAN));
        // Trace layer itself is untouched
        assert_eq!(canvas.pixel_color(200, 200), Some(Color::WHITE));
    }

    #[test]
    fn test_sprite_moves_leave_no_residue() {
        let mut canvas = blank();
        let cache = canvas
            .sprite_cache(&TurtleShape::default(), Color::CYAN, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        let id = canvas.attach_sprite(cache, Point::ORIGIN, 0.0, EdgeMode::Clip, true);
        canvas.place_sprite(id, Point::new(100.0, 100.0), 0.0, EdgeMode::Clip);
        assert_eq!(canvas.actor_layer().get_pixel(200, 200), Some(Color::TRANSPARENT));
        assert_eq!(canvas.actor_layer().get_pixel(300, 100), Some(Color::CYAN));
    }

    #[test]
    fn test_far_off_sprite_is_not_drawn() {
        let mut canvas = blank();
        let cache = canvas
            .sprite_cache(&TurtleShape::default(), Color::CYAN, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        let far = Point::new(-3.0e9, 0.0);
        let id = canvas.attach_sprite(cache, far, 0.0, EdgeMode::Clip, true);
        canvas.stamp(id);
        canvas.dot(far, 9.0, Color::CYAN, true);
        assert_eq!(canvas.actor_layer().count_color(Color::CYAN), 0);
        assert_eq!(canvas.trace_layer().count_color(Color::CYAN), 0);

        canvas.place_sprite(id, Point::ORIGIN, 0.0, EdgeMode::Clip);
        assert_eq!(canvas.actor_layer().get_pixel(200, 200), Some(Color::CYAN));
    }

    #[test]
    fn test_wrapped_sprite_is_repeated_across_edge() {
        let mut canvas = blank();
        let cache = canvas
            .sprite_cache(&TurtleShape::default(), Color::CYAN, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        // Projection wraps to (200, 5); the shell also shows at the bottom
        canvas.attach_sprite(cache, Point::new(0.0, 595.0), 0.0, EdgeMode::Wrap, true);
        assert_eq!(canvas.actor_layer().get_pixel(200, 5), Some(Color::CYAN));
        assert_eq!(canvas.actor_layer().get_pixel(200, 398), Some(Color::CYAN));
    }

    #[test]
    fn test_clear_hides_sprites_and_clean_does_not() {
        let mut canvas = blank();
        let cache = canvas
            .sprite_cache(&TurtleShape::default(), Color::CYAN, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        let id = canvas.attach_sprite(cache, Point::ORIGIN, 0.0, EdgeMode::Clip, true);
        canvas.clean_with(Color::BLACK);
        assert!(canvas.is_sprite_visible(id));
        assert_eq!(canvas.pixel_color(0, 0), Some(Color::BLACK));
        canvas.clear();
        assert!(!canvas.is_sprite_visible(id));
        assert_eq!(canvas.actor_layer().count_color(Color::CYAN), 0);
        assert_eq!(canvas.background(), Color::BLACK);
    }

    #[test]
    fn test_sprite_caches_are_shared() {
        let mut canvas = blank();
        let a = canvas.sprite_cache(&TurtleShape::default(), Color::RED, 8);
        let b = canvas.sprite_cache(&TurtleShape::default(), Color::RED, 8);
        match (a, b) {
            (Ok(a), Ok(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("cache build failed"),
        }
    }

    #[test]
    fn test_z_order() {
        let mut canvas = blank();
        let red = canvas
            .sprite_cache(&TurtleShape::default(), Color::RED, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        let green = canvas
            .sprite_cache(&TurtleShape::default(), Color::GREEN, 4)
            .unwrap_or_else(|e| panic!("{e}"));
        let a = canvas.attach_sprite(red, Point::ORIGIN, 0.0, EdgeMode::Clip, true);
        canvas.attach_sprite(green, Point::ORIGIN, 0.0, EdgeMode::Clip, true);
        assert_eq!(canvas.compose().get_pixel(200, 200), Some(Color::GREEN));
        canvas.to_top(a);
        assert_eq!(canvas.compose().get_pixel(200, 200), Some(Color::RED));
        canvas.to_bottom(a);
        assert_eq!(canvas.compose().get_pixel(200, 200), Some(Color::GREEN));
        assert_eq!(canvas.actor_count(), 2);
    }

    #[test]
    fn test_repaint_flag() {
        let mut canvas = blank();
        assert!(canvas.take_redisplay());
        assert!(!canvas.needs_redisplay());
        canvas.set_repaint_enabled(false);
        canvas.take_redisplay();
        canvas.dot(Point::ORIGIN, 1.0, Color::RED, true);
        assert!(!canvas.needs_redisplay());
        canvas.set_repaint_enabled(true);
        assert!(canvas.needs_redisplay());
    }

    #[test]
    fn test_label_alignment() {
        let mut canvas = blank();
        let font = crate::text::PixelFont::new(1);
        canvas.label(Point::ORIGIN, "1", Align::Right, Color::BLACK, &font);
        // Right-aligned: glyph occupies x in [197, 200), bottom row just above y = 200
        assert_eq!(canvas.pixel_color(197, 199), Some(Color::BLACK));
        assert_eq!(canvas.pixel_color(200, 199), Some(Color::WHITE));
    }

    #[test]
    fn test_save_png_and_reject_other_formats() {
        use image::GenericImageView;

        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let canvas = Canvas::new(40, 30, Color::RED);
        let path = dir.path().join("out.png");
        canvas
            .save(&path, ImageFormat::Png)
            .unwrap_or_else(|e| panic!("save: {e}"));
        let img = image::open(&path).unwrap_or_else(|e| panic!("reopen: {e}"));
        assert_eq!((img.width(), img.height()), (41, 31));

        assert!(matches!(
            ImageFormat::from_path("out.bmp"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert_eq!(ImageFormat::from_path("x.GIF").ok(), Some(ImageFormat::Gif));
    }
}
