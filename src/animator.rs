//! Frame-paced step animation
//!
//! A move or turn is planned into a number of steps; each step runs under the
//! canvas lock and is followed by a sleep, outside the lock, for whatever is
//! left of the frame interval. The clock is injectable so tests never sleep.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::canvas::{Canvas, SharedCanvas};

/// Below this absolute speed a move does nothing
pub const MIN_SPEED: f64 = 0.1;

// ============================================================================
// Clocks
// ============================================================================

/// Monotonic time source used for pacing
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to; sleeping advances it and is recorded
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
    /// Time every `now` call adds, to simulate work inside a step
    tick: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock whose every `now` reading advances it by `tick`
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += self.tick;
        *now
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}

// ============================================================================
// Planning
// ============================================================================

/// How a motion command is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Nothing to do
    Skip,
    /// One update, no pacing
    Instant,
    /// Paced animation over this many frames (always at least 1)
    Steps(usize),
}

/// Plan a move of `distance` units at `speed` units per second
pub fn plan_move(distance: f64, speed: f64, frames_per_second: u32) -> Plan {
    if speed.abs() < MIN_SPEED || distance == 0.0 || !distance.is_finite() {
        Plan::Skip
    } else if speed < 0.0 {
        Plan::Instant
    } else {
        Plan::Steps(frames_for(distance, speed, frames_per_second))
    }
}

/// Plan a turn of `delta` radians at `angle_speed` radians per second
///
/// A zero angle speed turns at one radian per second.
pub fn plan_turn(delta: f64, angle_speed: f64, frames_per_second: u32) -> Plan {
    if delta == 0.0 || !delta.is_finite() {
        Plan::Skip
    } else if angle_speed < 0.0 {
        Plan::Instant
    } else {
        let angle_speed = if angle_speed == 0.0 { 1.0 } else { angle_speed };
        Plan::Steps(frames_for(delta, angle_speed, frames_per_second))
    }
}

fn frames_for(amount: f64, rate: f64, frames_per_second: u32) -> usize {
    let frames = (amount.abs() / rate * frames_per_second.max(1) as f64).ceil();
    (frames as usize).max(1)
}

// ============================================================================
// Step Animator
// ============================================================================

/// Runs planned steps against a shared canvas at a fixed frame rate
#[derive(Clone)]
pub struct StepAnimator {
    frames_per_second: u32,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StepAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepAnimator")
            .field("frames_per_second", &self.frames_per_second)
            .finish_non_exhaustive()
    }
}

impl StepAnimator {
    pub fn new(frames_per_second: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            frames_per_second: frames_per_second.max(1),
            clock,
        }
    }

    #[inline]
    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn set_frames_per_second(&mut self, fps: u32) {
        self.frames_per_second = fps.max(1);
    }

    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    /// Whole milliseconds per frame
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.frames_per_second))
    }

    /// Run `steps` frames paced at the frame rate
    ///
    /// `step` receives the locked canvas, the step index and whether it is the
    /// last step. Returns the number of steps executed, which is smaller than
    /// `steps` only when the canvas was disposed.
    pub fn run<F>(&self, canvas: &SharedCanvas, steps: usize, step: F) -> usize
    where
        F: FnMut(&mut Canvas, usize, bool),
    {
        self.run_paced(canvas, steps, self.frame_interval(), step)
    }

    /// Like [`run`](Self::run) with an explicit per-step interval
    pub fn run_paced<F>(&self, canvas: &SharedCanvas, steps: usize, interval: Duration, mut step: F) -> usize
    where
        F: FnMut(&mut Canvas, usize, bool),
    {
        for index in 0..steps {
            if canvas.is_disposed() {
                tracing::debug!(index, steps, "animation stopped, canvas disposed");
                return index;
            }
            let started = self.clock.now();
            {
                let mut guard = canvas.lock();
                step(&mut guard, index, index + 1 == steps);
            }
            tracing::trace!(index, steps, "animation step");

            let elapsed = self.clock.now().saturating_sub(started);
            if let Some(remaining) = interval.checked_sub(elapsed) {
                if !remaining.is_zero() {
                    self.clock.sleep(remaining);
                }
            }
        }
        steps
    }
}

/// Linear interpolation used by every step; the last step lands exactly on
/// `to`
#[inline]
pub fn step_value(from: f64, to: f64, index: usize, steps: usize) -> f64 {
    if index + 1 >= steps {
        to
    } else {
        from + (to - from) * (index + 1) as f64 / steps as f64
    }
}
