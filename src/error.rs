//! Error type shared by the whole engine
//!
//! Geometry and fill operations never fail; they resolve degenerate input
//! locally. Only resource-level problems surface here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sprite generator produced an empty image ({width}x{height})")]
    EmptySprite { width: u32, height: u32 },

    #[error("angle resolution must be at least 1, got {0}")]
    InvalidResolution(u32),

    #[error("pixel data length {len} does not match {width}x{height}")]
    InvalidImage { width: u32, height: u32, len: usize },

    #[error("unknown color '{0}'")]
    UnknownColor(String),

    #[error("unsupported image format '{0}' (expected png or gif)")]
    UnsupportedFormat(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
