use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::clipper::EdgeMode;
use crate::color::Color;
use crate::error::Result;

pub const DEFAULT_CANVAS_SIZE: u32 = 400;
pub const DEFAULT_SPEED: f64 = 200.0;
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 10;
pub const DEFAULT_ANGLE_RESOLUTION: u32 = 72;

/// Engine defaults applied to new canvases and actors
///
/// Every field is optional in the JSON file; missing ones keep the built-in
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Color,
    pub actor_color: Color,
    pub pen_color: Color,
    pub fill_color: Color,
    /// Logical units per second; negative draws instantly
    pub speed: f64,
    pub frames_per_second: u32,
    pub angle_resolution: u32,
    pub edge_mode: EdgeMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
            background: Color::WHITE,
            actor_color: Color::CYAN,
            pen_color: Color::BLUE,
            fill_color: Color::BLUE,
            speed: DEFAULT_SPEED,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            angle_resolution: DEFAULT_ANGLE_RESOLUTION,
            edge_mode: EdgeMode::Clip,
        }
    }
}

impl EngineConfig {
    /// Turning speed that matches `speed` (radians per second)
    pub fn angle_speed(&self) -> f64 {
        angle_speed_for(self.speed)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// A full turn takes as long as moving 200 units
#[inline]
pub fn angle_speed_for(speed: f64) -> f64 {
    speed * std::f64::consts::TAU / 200.0
}
