//! Incremental turtle-graphics raster engine
//!
//! A [`Canvas`] holds two [`PixelBuffer`] layers: permanent ink below and
//! transient sprites above. [`Actor`]s draw on a shared canvas through
//! frame-paced animation, crossing its edges either clipped or wrapped.

pub mod actor;
pub mod animator;
pub mod canvas;
pub mod clipper;
pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod logging;
pub mod pen;
pub mod sprite;
pub mod text;
pub mod util;

pub use actor::{Actor, ActorState};
pub use animator::{Clock, ManualClock, Plan, StepAnimator, SystemClock};
pub use canvas::{ActorId, ArcKind, Canvas, ImageFormat, SharedCanvas};
pub use clipper::{EdgeClipper, EdgeMode};
pub use color::Color;
pub use config::EngineConfig;
pub use display::PixelBuffer;
pub use error::{Error, Result};
pub use fill::flood_fill;
pub use geometry::{CoordinateMap, Point, Segment};
pub use pen::{FillMode, Pen};
pub use sprite::{BitmapSprite, SpriteCache, SpriteGenerator, TurtleShape};
pub use text::{Align, GlyphSource, PixelFont};
