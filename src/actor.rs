//! The actor (turtle)
//!
//! An actor owns its state and a sprite slot on a shared canvas. Every command
//! takes the canvas lock only for as long as one update needs it; animated
//! commands go through the [`StepAnimator`], which releases the lock between
//! frames so actors on the same canvas interleave.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::animator::{plan_move, plan_turn, step_value, Clock, Plan, StepAnimator, SystemClock, MIN_SPEED};
use crate::canvas::{ActorId, Canvas, ImageFormat, SharedCanvas};
use crate::clipper::EdgeMode;
use crate::color::Color;
use crate::config::angle_speed_for;
use crate::display::PixelBuffer;
use crate::error::Result;
use crate::geometry::{displacement, heading_towards, normalize_degrees, Point, Segment};
use crate::pen::{FillMode, Pen};
use crate::sprite::{BitmapSprite, SpriteCache, SpriteGenerator, TurtleShape};
use crate::text::{Align, GlyphSource, PixelFont};

/// Chords per full turn when moving along an arc
const ARC_CHORDS_PER_TURN: f64 = 100.0;

/// Everything that describes an actor apart from its sprite
#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    /// Logical position; never clamped or wrapped
    pub position: Point,
    /// Radians, 0 = north, clockwise; unbounded
    pub heading: f64,
    pub color: Color,
    pub pen_down: bool,
    pub pen: Pen,
    pub fill_mode: FillMode,
    pub edge_mode: EdgeMode,
    /// Units per second; negative draws instantly, near zero freezes moves
    pub speed: f64,
    /// Radians per second
    pub angle_speed: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedState {
    position: Point,
    color: Color,
    heading: f64,
}

pub struct Actor {
    id: ActorId,
    canvas: Arc<SharedCanvas>,
    state: ActorState,
    generator: Arc<dyn SpriteGenerator>,
    cache: Arc<SpriteCache>,
    animator: StepAnimator,
    glyphs: Arc<dyn GlyphSource>,
    /// Positions visited since `start_path`
    path: Option<Vec<Point>>,
    saved: Vec<SavedState>,
    /// Pixel-space segments painted by the most recent motion command
    last_trace: Vec<Segment>,
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Actor {
    // ========================================================================
    // Construction
    // ========================================================================

    /// New turtle-shaped actor at the origin, heading north, with the
    /// canvas's configured defaults
    pub fn new(canvas: &Arc<SharedCanvas>) -> Result<Self> {
        Self::with_generator(canvas, Arc::new(TurtleShape::default()))
    }

    /// New actor drawn with a caller-supplied image facing north
    pub fn with_image(canvas: &Arc<SharedCanvas>, image: PixelBuffer) -> Result<Self> {
        Self::with_generator(canvas, Arc::new(BitmapSprite::new(image)))
    }

    pub fn with_generator(canvas: &Arc<SharedCanvas>, generator: Arc<dyn SpriteGenerator>) -> Result<Self> {
        let mut guard = canvas.lock();
        let config = guard.config().clone();
        let cache = guard.sprite_cache(generator.as_ref(), config.actor_color, config.angle_resolution)?;
        let id = guard.attach_sprite(Arc::clone(&cache), Point::ORIGIN, 0.0, config.edge_mode, true);
        drop(guard);

        tracing::debug!(?id, color = %config.actor_color, "actor attached");
        Ok(Self {
            id,
            canvas: Arc::clone(canvas),
            state: ActorState {
                position: Point::ORIGIN,
                heading: 0.0,
                color: config.actor_color,
                pen_down: true,
                pen: Pen::new(config.pen_color, config.fill_color),
                fill_mode: FillMode::Off,
                edge_mode: config.edge_mode,
                speed: config.speed,
                angle_speed: config.angle_speed(),
                visible: true,
            },
            generator,
            cache,
            animator: StepAnimator::new(config.frames_per_second, Arc::new(SystemClock::new())),
            glyphs: Arc::new(PixelFont::default()),
            path: None,
            saved: Vec::new(),
            last_trace: Vec::new(),
        })
    }

    /// Replace the pacing clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.animator.set_clock(clock);
        self
    }

    /// Replace the glyph source used by `label`
    pub fn with_glyphs(mut self, glyphs: Arc<dyn GlyphSource>) -> Self {
        self.glyphs = glyphs;
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn canvas(&self) -> &Arc<SharedCanvas> {
        &self.canvas
    }

    pub fn state(&self) -> &ActorState {
        &self.state
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.state.position
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.state.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.state.position.y
    }

    /// Heading in degrees, clockwise from north; not normalized
    #[inline]
    pub fn heading(&self) -> f64 {
        self.state.heading.to_degrees()
    }

    pub fn pen(&self) -> &Pen {
        &self.state.pen
    }

    pub fn is_pen_down(&self) -> bool {
        self.state.pen_down
    }

    pub fn is_hidden(&self) -> bool {
        !self.state.visible
    }

    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    pub fn frames_per_second(&self) -> u32 {
        self.animator.frames_per_second()
    }

    pub fn sprite_cache(&self) -> &Arc<SpriteCache> {
        &self.cache
    }

    /// Segments painted by the last motion command, in pixel space
    pub fn last_trace(&self) -> &[Segment] {
        &self.last_trace
    }

    /// Compass bearing in degrees `[0, 360)` from the actor to a point
    pub fn towards(&self, x: f64, y: f64) -> f64 {
        normalize_degrees(heading_towards(self.state.position, Point::new(x, y)).to_degrees())
    }

    /// Degrees the actor must turn right to face a point
    pub fn direction(&self, x: f64, y: f64) -> f64 {
        self.towards(x, y) - self.heading()
    }

    pub fn distance(&self, x: f64, y: f64) -> f64 {
        self.state.position.distance_to(Point::new(x, y))
    }

    /// Whether the position lies on the canvas, edges included
    pub fn is_in_canvas(&self) -> bool {
        self.canvas.lock().contains(self.state.position)
    }

    /// Trace-layer color under the actor; `None` off the canvas
    pub fn pixel_color(&self) -> Option<Color> {
        self.canvas.lock().pixel_color_at(self.state.position)
    }

    /// Logical position of the rendered projection; differs from `position`
    /// only in wrap mode
    pub fn wrapped_position(&self) -> Point {
        let canvas = self.canvas.lock();
        match self.state.edge_mode {
            EdgeMode::Clip => self.state.position,
            EdgeMode::Wrap => {
                let px = canvas.clipper().wrap_point(canvas.to_pixel(self.state.position));
                canvas.to_logical(px)
            },
        }
    }

    // ========================================================================
    // Motion
    // ========================================================================

    /// Move one step and paint it; runs under the canvas lock
    fn step_to(&mut self, canvas: &mut Canvas, to: Point) {
        let from = self.state.position;
        self.state.position = to;
        if self.state.pen_down {
            let painted = canvas.paint_move(from, to, self.state.edge_mode, &self.state.pen, self.state.fill_mode);
            self.last_trace.extend(painted);
        }
        canvas.place_sprite(self.id, to, self.state.heading, self.state.edge_mode);
    }

    fn record_path(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.push(self.state.position);
        }
    }

    pub fn forward(&mut self, distance: f64) -> &mut Self {
        self.last_trace.clear();
        let plan = plan_move(distance, self.state.speed, self.animator.frames_per_second());
        tracing::debug!(distance, ?plan, "move");

        let start = self.state.position;
        let target = start + displacement(self.state.heading, distance);
        match plan {
            Plan::Skip => return self,
            Plan::Instant => {
                let canvas = Arc::clone(&self.canvas);
                let mut guard = canvas.lock();
                self.step_to(&mut guard, target);
            },
            Plan::Steps(steps) => {
                let animator = self.animator.clone();
                let canvas = Arc::clone(&self.canvas);
                animator.run(&canvas, steps, |guard, index, _| {
                    let next = Point::new(
                        step_value(start.x, target.x, index, steps),
                        step_value(start.y, target.y, index, steps),
                    );
                    self.step_to(guard, next);
                });
            },
        }
        self.record_path();
        self
    }

    pub fn back(&mut self, distance: f64) -> &mut Self {
        self.forward(-distance)
    }

    /// Turn by `delta` radians, clockwise positive
    fn rotate(&mut self, delta: f64) {
        let plan = if self.state.visible {
            plan_turn(delta, self.state.angle_speed, self.animator.frames_per_second())
        } else if delta == 0.0 {
            Plan::Skip
        } else {
            Plan::Instant
        };
        tracing::debug!(delta, ?plan, "turn");

        let start = self.state.heading;
        let target = start + delta;
        match plan {
            Plan::Skip => {},
            Plan::Instant => {
                self.state.heading = target;
                self.canvas
                    .lock()
                    .place_sprite(self.id, self.state.position, target, self.state.edge_mode);
            },
            Plan::Steps(steps) => {
                let animator = self.animator.clone();
                let canvas = Arc::clone(&self.canvas);
                animator.run(&canvas, steps, |guard, index, last| {
                    let previous = self.state.heading;
                    self.state.heading = step_value(start, target, index, steps);
                    if last || self.cache.changed_since(previous, self.state.heading) {
                        guard.place_sprite(self.id, self.state.position, self.state.heading, self.state.edge_mode);
                    }
                });
            },
        }
    }

    pub fn left(&mut self, degrees: f64) -> &mut Self {
        self.rotate(-degrees.to_radians());
        self
    }

    pub fn right(&mut self, degrees: f64) -> &mut Self {
        self.rotate(degrees.to_radians());
        self
    }

    /// Absolute heading in degrees; never animated
    pub fn set_heading(&mut self, degrees: f64) -> &mut Self {
        self.state.heading = degrees.to_radians();
        self.canvas
            .lock()
            .place_sprite(self.id, self.state.position, self.state.heading, self.state.edge_mode);
        self
    }

    /// Jump without drawing
    pub fn set_pos(&mut self, x: f64, y: f64) -> &mut Self {
        self.place(Point::new(x, y));
        self.record_path();
        self
    }

    pub fn set_x(&mut self, x: f64) -> &mut Self {
        self.set_pos(x, self.state.position.y)
    }

    pub fn set_y(&mut self, y: f64) -> &mut Self {
        self.set_pos(self.state.position.x, y)
    }

    fn place(&mut self, position: Point) {
        self.state.position = position;
        self.canvas
            .lock()
            .place_sprite(self.id, position, self.state.heading, self.state.edge_mode);
    }

    /// Face a point, move there, and land exactly on it
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        let heading = self.towards(x, y);
        let distance = self.distance(x, y);
        self.set_heading(heading);
        self.forward(distance);
        self.place(Point::new(x, y));
        self
    }

    /// Back to the origin, heading north
    pub fn home(&mut self) -> &mut Self {
        self.state.position = Point::ORIGIN;
        self.set_heading(0.0)
    }

    /// Point in the frame whose y axis runs along the heading and whose x axis
    /// points to the actor's right
    fn viewing_point(&self, x: f64, y: f64) -> Point {
        let (sin, cos) = self.state.heading.sin_cos();
        Point::new(
            cos * x + sin * y + self.state.position.x,
            -sin * x + cos * y + self.state.position.y,
        )
    }

    pub fn viewing_set_pos(&mut self, x: f64, y: f64) -> &mut Self {
        let target = self.viewing_point(x, y);
        self.set_pos(target.x, target.y)
    }

    pub fn viewing_move_to(&mut self, x: f64, y: f64) -> &mut Self {
        let target = self.viewing_point(x, y);
        self.move_to(target.x, target.y)
    }

    /// Move along an arc whose center lies to the right of the heading
    pub fn right_arc(&mut self, radius: f64, degrees: f64) -> &mut Self {
        if degrees < 0.0 {
            self.arc_motion(radius, -degrees, true);
        } else {
            self.arc_motion(radius, degrees, false);
        }
        self
    }

    pub fn left_arc(&mut self, radius: f64, degrees: f64) -> &mut Self {
        if degrees < 0.0 {
            self.arc_motion(radius, -degrees, false);
        } else {
            self.arc_motion(radius, degrees, true);
        }
        self
    }

    /// Full circle; the actor ends where it started, facing the same way
    pub fn right_circle(&mut self, radius: f64) -> &mut Self {
        self.circle(radius, false)
    }

    pub fn left_circle(&mut self, radius: f64) -> &mut Self {
        self.circle(radius, true)
    }

    fn circle(&mut self, radius: f64, left: bool) -> &mut Self {
        if self.state.speed.abs() < MIN_SPEED {
            return self;
        }
        let (position, heading) = (self.state.position, self.heading());
        self.arc_motion(radius, 360.0, left);
        self.set_pos(position.x, position.y);
        self.set_heading(heading)
    }

    /// Chord-by-chord arc; each chord is one paced step
    fn arc_motion(&mut self, radius: f64, degrees: f64, left: bool) {
        if self.state.speed.abs() < MIN_SPEED || radius <= 0.0 || degrees == 0.0 {
            return;
        }
        self.last_trace.clear();

        let h = self.state.heading;
        let (sin_h, cos_h) = h.sin_cos();
        let Point { x, y } = self.state.position;
        let center = if left {
            Point::new(x - radius * cos_h, y + radius * sin_h)
        } else {
            Point::new(x + radius * cos_h, y - radius * sin_h)
        };

        let chords = ((degrees * ARC_CHORDS_PER_TURN / 360.0) as usize).max(1);
        let step = (degrees / chords as f64).to_radians();
        let turn = if left { -step } else { step };
        let signed = if left { -degrees } else { degrees };
        let final_heading = h + signed.to_radians();

        let interval = if self.state.speed > 0.0 {
            Duration::from_secs_f64(radius * step / self.state.speed)
        } else {
            Duration::ZERO
        };
        tracing::debug!(radius, degrees, chords, left, "arc");

        let animator = self.animator.clone();
        let canvas = Arc::clone(&self.canvas);
        animator.run_paced(&canvas, chords, interval, |guard, index, last| {
            let a = (index + 1) as f64 * step;
            let next = if left {
                Point::new(center.x + radius * (a - h).cos(), center.y + radius * (a - h).sin())
            } else {
                Point::new(center.x - radius * (a + h).cos(), center.y + radius * (a + h).sin())
            };
            self.state.heading = if last { final_heading } else { self.state.heading + turn };
            self.step_to(guard, next);
        });
        self.record_path();
    }

    // ========================================================================
    // Pen & Appearance
    // ========================================================================

    pub fn pen_up(&mut self) -> &mut Self {
        self.state.pen_down = false;
        self
    }

    pub fn pen_down(&mut self) -> &mut Self {
        self.state.pen_down = true;
        self
    }

    /// Draw with the canvas background so traces get erased
    pub fn pen_erase(&mut self) -> &mut Self {
        self.state.pen.color = self.canvas.lock().background();
        self
    }

    pub fn set_pen_color(&mut self, color: Color) -> &mut Self {
        self.state.pen.color = color;
        self
    }

    pub fn set_pen_width(&mut self, width: f64) -> &mut Self {
        self.state.pen.width = width;
        self
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.state.pen.fill_color = color;
        self
    }

    /// Recolor the sprite; rebuilds the angle cache
    pub fn set_color(&mut self, color: Color) -> Result<&mut Self> {
        let resolution = self.cache.resolution();
        self.rebuild_sprites(color, resolution)?;
        self.state.color = color;
        Ok(self)
    }

    pub fn set_angle_resolution(&mut self, resolution: u32) -> Result<&mut Self> {
        self.rebuild_sprites(self.state.color, resolution)?;
        Ok(self)
    }

    fn rebuild_sprites(&mut self, color: Color, resolution: u32) -> Result<()> {
        let mut canvas = self.canvas.lock();
        let cache = canvas.sprite_cache(self.generator.as_ref(), color, resolution)?;
        canvas.set_sprite_cache(self.id, Arc::clone(&cache));
        drop(canvas);
        self.cache = cache;
        Ok(())
    }

    pub fn clip(&mut self) -> &mut Self {
        self.set_edge_mode(EdgeMode::Clip)
    }

    pub fn wrap(&mut self) -> &mut Self {
        self.set_edge_mode(EdgeMode::Wrap)
    }

    fn set_edge_mode(&mut self, mode: EdgeMode) -> &mut Self {
        self.state.edge_mode = mode;
        self.canvas
            .lock()
            .place_sprite(self.id, self.state.position, self.state.heading, mode);
        self
    }

    /// Units per second; negative draws instantly, `|speed| < 0.1` freezes
    /// moves
    pub fn set_speed(&mut self, speed: f64) -> &mut Self {
        self.state.speed = speed;
        self
    }

    /// Radians per second; negative turns instantly
    pub fn set_angle_speed(&mut self, angle_speed: f64) -> &mut Self {
        self.state.angle_speed = angle_speed;
        self
    }

    /// Turning speed matching a movement speed
    pub fn set_angle_speed_for(&mut self, speed: f64) -> &mut Self {
        self.set_angle_speed(angle_speed_for(speed))
    }

    pub fn set_frames_per_second(&mut self, fps: u32) -> &mut Self {
        self.animator.set_frames_per_second(fps);
        self
    }

    /// Hide the sprite; a hidden actor also draws instantly
    pub fn hide(&mut self) -> &mut Self {
        self.state.visible = false;
        self.state.speed = -1.0;
        self.canvas.lock().set_sprite_visible(self.id, false);
        self
    }

    pub fn show(&mut self) -> &mut Self {
        self.state.visible = true;
        self.canvas.lock().set_sprite_visible(self.id, true);
        self
    }

    pub fn to_top(&mut self) -> &mut Self {
        self.canvas.lock().to_top(self.id);
        self
    }

    pub fn to_bottom(&mut self) -> &mut Self {
        self.canvas.lock().to_bottom(self.id);
        self
    }

    // ========================================================================
    // Filling
    // ========================================================================

    /// Flood-fill the region under the actor with the fill color
    pub fn fill(&mut self) -> &mut Self {
        let at = self.state.position;
        self.fill_at(at.x, at.y)
    }

    pub fn fill_at(&mut self, x: f64, y: f64) -> &mut Self {
        self.canvas
            .lock()
            .flood_fill(Point::new(x, y), self.state.pen.fill_color);
        self
    }

    /// Fill the triangle between every further segment and a fixed point
    pub fn fill_to_point(&mut self, x: f64, y: f64) -> &mut Self {
        self.state.fill_mode = FillMode::Point(Point::new(x, y));
        self
    }

    pub fn fill_to_horizontal(&mut self, y: f64) -> &mut Self {
        self.state.fill_mode = FillMode::Horizontal(y);
        self
    }

    pub fn fill_to_vertical(&mut self, x: f64) -> &mut Self {
        self.state.fill_mode = FillMode::Vertical(x);
        self
    }

    pub fn fill_off(&mut self) -> &mut Self {
        self.state.fill_mode = FillMode::Off;
        self
    }

    /// Start recording positions for `fill_path`
    pub fn start_path(&mut self) -> &mut Self {
        self.path = Some(vec![self.state.position]);
        self
    }

    /// Fill the recorded polygon with the fill color and outline it with the
    /// pen color; recording stops
    pub fn fill_path(&mut self) -> &mut Self {
        if let Some(path) = self.path.take() {
            self.canvas
                .lock()
                .fill_path(&path, self.state.pen.fill_color, self.state.pen.color);
        }
        self
    }

    // ========================================================================
    // Marks
    // ========================================================================

    pub fn dot(&mut self, diameter: f64) -> &mut Self {
        self.canvas
            .lock()
            .dot(self.state.position, diameter, self.state.pen.color, true);
        self
    }

    pub fn open_dot(&mut self, diameter: f64) -> &mut Self {
        self.canvas
            .lock()
            .dot(self.state.position, diameter, self.state.pen.color, false);
        self
    }

    pub fn spray(&mut self, density: u32, spread: f64, size: u32) -> &mut Self {
        self.canvas
            .lock()
            .spray(self.state.position, density, spread, size, self.state.pen.color);
        self
    }

    pub fn label(&mut self, text: &str, align: Align) -> &mut Self {
        self.canvas.lock().label(
            self.state.position,
            text,
            align,
            self.state.pen.color,
            self.glyphs.as_ref(),
        );
        self
    }

    /// Bake the current sprite into the trace layer
    pub fn stamp(&mut self) -> &mut Self {
        self.canvas.lock().stamp(self.id);
        self
    }

    /// Bake a sprite of another color; bitmap sprites ignore the color
    pub fn stamp_with(&mut self, color: Color) -> Result<&mut Self> {
        let bucket = self.cache.bucket_for(self.state.heading);
        let heading = bucket as f64 * std::f64::consts::TAU / self.cache.resolution() as f64;
        let image = self.generator.render(color, heading)?;
        self.canvas
            .lock()
            .stamp_image(&image, self.state.position, self.state.edge_mode);
        Ok(self)
    }

    /// Composite an image centered on the actor into the trace layer
    pub fn draw_image(&mut self, image: &PixelBuffer) -> &mut Self {
        self.canvas.lock().draw_image(self.state.position, image);
        self
    }

    // ========================================================================
    // State Stack
    // ========================================================================

    /// Remember position, color and heading
    pub fn push_state(&mut self) -> &mut Self {
        self.saved.push(SavedState {
            position: self.state.position,
            color: self.state.color,
            heading: self.heading(),
        });
        self
    }

    /// Restore the most recent saved state; does nothing when none is saved
    pub fn pop_state(&mut self) -> Result<&mut Self> {
        let Some(saved) = self.saved.pop() else {
            return Ok(self);
        };
        self.set_pos(saved.position.x, saved.position.y);
        if saved.color != self.state.color {
            self.set_color(saved.color)?;
        }
        Ok(self.set_heading(saved.heading))
    }

    pub fn clear_states(&mut self) -> &mut Self {
        self.saved.clear();
        self
    }

    // ========================================================================
    // Canvas Shortcuts
    // ========================================================================

    /// Erase all traces and hide every actor on the canvas
    pub fn clear(&mut self) -> &mut Self {
        self.canvas.lock().clear();
        self.state.visible = false;
        self
    }

    pub fn clear_with(&mut self, color: Color) -> &mut Self {
        self.canvas.lock().clear_with(color);
        self.state.visible = false;
        self
    }

    /// Erase all traces; actors stay
    pub fn clean(&mut self) -> &mut Self {
        self.canvas.lock().clean();
        self
    }

    pub fn clean_with(&mut self, color: Color) -> &mut Self {
        self.canvas.lock().clean_with(color);
        self
    }

    pub fn set_background(&mut self, color: Color) -> &mut Self {
        self.canvas.lock().set_background(color);
        self
    }

    /// Export the composited canvas; the format follows the extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let format = ImageFormat::from_path(&path)?;
        self.canvas.lock().save(path, format)
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        self.canvas.lock().detach_sprite(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::ManualClock;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn setup() -> (Arc<SharedCanvas>, Arc<ManualClock>) {
        (Canvas::new(400, 400, Color::WHITE).into_shared(), Arc::new(ManualClock::new()))
    }

    fn actor(canvas: &Arc<SharedCanvas>, clock: &Arc<ManualClock>) -> Actor {
        Actor::new(canvas)
            .unwrap_or_else(|e| panic!("actor: {e}"))
            .with_clock(clock.clone())
    }

    #[test]
    fn test_defaults() {
        let (canvas, clock) = setup();
        let t = actor(&canvas, &clock);
        assert_eq!(t.position(), Point::ORIGIN);
        assert_eq!(t.heading(), 0.0);
        assert_eq!(t.pen().color, Color::BLUE);
        assert_eq!(t.state().color, Color::CYAN);
        assert_eq!(t.speed(), 200.0);
        assert_eq!(t.frames_per_second(), 10);
        assert_eq!(t.sprite_cache().resolution(), 72);
        assert!(t.is_pen_down());
    }

    #[test]
    fn test_forward_is_paced_and_exact() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.forward(100.0);
        // 100 units at 200 u/s and 10 fps
        assert_eq!(clock.sleeps().len(), 5);
        assert_eq!(t.position(), Point::new(0.0, 100.0));
        assert_eq!(canvas.lock().pixel_color(200, 150), Some(Color::BLUE));
    }

    #[test]
    fn test_hidden_actor_draws_instantly() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.hide().forward(50.0).right(90.0).forward(50.0);
        assert!(clock.sleeps().is_empty());
        assert!(close(t.x(), 50.0) && close(t.y(), 50.0));
        assert_eq!(t.speed(), -1.0);
    }

    #[test]
    fn test_zero_speed_freezes_moves() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(0.05).forward(100.0);
        assert_eq!(t.position(), Point::ORIGIN);
        assert!(t.last_trace().is_empty());
    }

    #[test]
    fn test_pen_up_leaves_no_trace() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).pen_up().forward(100.0);
        assert_eq!(canvas.lock().trace_layer().count_color(Color::BLUE), 0);
    }

    #[test]
    fn test_turns_and_bearing() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).set_angle_speed(-1.0);
        t.right(90.0);
        assert!(close(t.heading(), 90.0));
        t.left(450.0);
        assert!(close(t.heading(), -360.0));
        assert!(close(t.towards(10.0, 0.0), 90.0));
        assert!(close(t.towards(-10.0, 0.0), 270.0));
        assert!(close(t.distance(3.0, 4.0), 5.0));
        t.set_heading(45.0);
        assert!(close(t.direction(0.0, -10.0), 135.0));
    }

    #[test]
    fn test_move_to_lands_exactly() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).move_to(30.0, -40.0);
        assert_eq!(t.position(), Point::new(30.0, -40.0));
        assert!(close(t.heading(), normalize_degrees((3.0f64).atan2(-4.0).to_degrees())));
        t.home();
        assert_eq!(t.position(), Point::ORIGIN);
        assert_eq!(t.heading(), 0.0);
    }

    #[test]
    fn test_viewing_set_pos() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_heading(90.0).viewing_set_pos(0.0, 10.0);
        assert!(close(t.x(), 10.0) && close(t.y(), 0.0));
        t.viewing_set_pos(5.0, 0.0);
        assert!(close(t.x(), 10.0) && close(t.y(), -5.0));
    }

    #[test]
    fn test_viewing_move_to_draws_in_actor_frame() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).set_heading(90.0).viewing_move_to(0.0, 10.0);
        assert!(close(t.x(), 10.0) && close(t.y(), 0.0));
        assert!(close(t.heading(), 90.0));
        assert_eq!(canvas.lock().pixel_color(205, 200), Some(Color::BLUE));
    }

    #[test]
    fn test_far_off_positions_are_unclamped() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.pen_up().set_pos(-3.0e9, 0.0);
        assert_eq!(t.position(), Point::new(-3.0e9, 0.0));
        assert_eq!(canvas.lock().actor_layer().count_color(Color::CYAN), 0);

        t.hide().right(90.0).pen_down().forward(6.0e9);
        assert!(close(t.x(), 3.0e9));
        let c = canvas.lock();
        assert_eq!(c.pixel_color(0, 200), Some(Color::BLUE));
        assert_eq!(c.pixel_color(400, 200), Some(Color::BLUE));
        assert_eq!(c.pixel_color(200, 199), Some(Color::WHITE));
    }

    #[test]
    fn test_circle_returns_to_start() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).set_heading(30.0).right_circle(50.0);
        assert!(close(t.x(), 0.0) && close(t.y(), 0.0));
        assert!(close(t.heading(), 30.0));
        // Circle center lies to the right of the heading
        assert!(t.last_trace().len() >= 100);
    }

    #[test]
    fn test_right_arc_quarter_turn() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).right_arc(100.0, 90.0);
        assert!(close(t.x(), 100.0) && close(t.y(), 100.0));
        assert!(close(t.heading(), 90.0));
        t.left_arc(100.0, 90.0);
        assert!(close(t.x(), 200.0) && close(t.y(), 200.0));
        assert!(close(t.heading(), 0.0));
    }

    #[test]
    fn test_push_pop_state() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).push_state();
        t.forward(20.0).right(45.0);
        t.set_color(Color::RED).unwrap_or_else(|e| panic!("{e}"));
        t.pop_state().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(t.position(), Point::ORIGIN);
        assert_eq!(t.heading(), 0.0);
        assert_eq!(t.state().color, Color::CYAN);
        // Empty stack is a no-op
        t.pop_state().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(t.position(), Point::ORIGIN);
    }

    #[test]
    fn test_fill_closed_square() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).set_fill_color(Color::RED);
        for _ in 0..4 {
            t.forward(40.0).right(90.0);
        }
        t.pen_up().set_pos(20.0, 20.0).fill();
        let c = canvas.lock();
        assert_eq!(c.pixel_color_at(Point::new(20.0, 20.0)), Some(Color::RED));
        assert_eq!(c.pixel_color_at(Point::new(60.0, 20.0)), Some(Color::WHITE));
    }

    #[test]
    fn test_fill_path() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).set_fill_color(Color::GREEN).pen_up().start_path();
        t.forward(50.0).right(90.0).forward(50.0).right(90.0).forward(50.0);
        t.fill_path();
        let c = canvas.lock();
        assert_eq!(c.pixel_color_at(Point::new(25.0, 25.0)), Some(Color::GREEN));
        assert_eq!(c.pixel_color_at(Point::new(0.0, 25.0)), Some(Color::BLUE));
    }

    #[test]
    fn test_area_fill_to_horizontal() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).pen_up().set_pos(-50.0, 50.0).pen_down();
        t.fill_to_horizontal(0.0).right(90.0).forward(100.0).fill_off();
        let c = canvas.lock();
        assert_eq!(c.pixel_color_at(Point::new(0.0, 25.0)), Some(Color::BLUE));
        assert_eq!(c.pixel_color_at(Point::new(0.0, -25.0)), Some(Color::WHITE));
    }

    #[test]
    fn test_drop_detaches_sprite() {
        let (canvas, clock) = setup();
        let a = actor(&canvas, &clock);
        let b = actor(&canvas, &clock);
        assert_eq!(canvas.lock().actor_count(), 2);
        drop(a);
        assert_eq!(canvas.lock().actor_count(), 1);
        drop(b);
        assert_eq!(canvas.lock().actor_count(), 0);
    }

    #[test]
    fn test_set_color_recolors_sprite() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_color(Color::RED).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(canvas.lock().compose().get_pixel(200, 200), Some(Color::RED));
        assert!(t.set_angle_resolution(0).is_err());
    }

    #[test]
    fn test_pen_erase_uses_background() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_background(Color::YELLOW).pen_erase();
        assert_eq!(t.pen().color, Color::YELLOW);
    }

    #[test]
    fn test_open_dot_draws_only_the_rim() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.open_dot(21.0);
        assert_eq!(t.pixel_color(), Some(Color::WHITE));
        let c = canvas.lock();
        assert_eq!(c.pixel_color(200, 190), Some(Color::BLUE));
        assert_eq!(c.pixel_color(210, 200), Some(Color::BLUE));
        assert_eq!(c.pixel_color(205, 200), Some(Color::WHITE));
    }

    #[test]
    fn test_stamp_with_renders_the_current_bucket() {
        let stamped = |degrees: f64| {
            let (canvas, clock) = setup();
            let mut t = actor(&canvas, &clock);
            t.set_heading(degrees);
            t.stamp_with(Color::RED).unwrap_or_else(|e| panic!("{e}"));
            let trace = canvas.lock().trace_layer().clone();
            trace
        };
        // 72 buckets of 5 degrees: 92 falls in the bucket starting at 90
        let a = stamped(92.0);
        assert_eq!(a, stamped(90.0));
        assert_eq!(a.count_color(Color::CYAN), 0);

        let expected = TurtleShape::default()
            .render(Color::RED, 18.0 * std::f64::consts::TAU / 72.0)
            .unwrap_or_else(|e| panic!("{e}"));
        let red = expected.count_color(Color::RED);
        assert!(red > 0);
        assert_eq!(a.count_color(Color::RED), red);
    }

    #[test]
    fn test_pixel_color_and_bounds() {
        let (canvas, clock) = setup();
        let mut t = actor(&canvas, &clock);
        t.set_speed(-1.0).dot(5.0);
        assert_eq!(t.pixel_color(), Some(Color::BLUE));
        t.pen_up().set_pos(0.0, 250.0);
        assert!(!t.is_in_canvas());
        assert_eq!(t.pixel_color(), None);
    }
}
