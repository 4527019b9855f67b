mod pixel_buffer;
#[cfg(feature = "viewer")]
mod window;

pub use pixel_buffer::PixelBuffer;
#[cfg(feature = "viewer")]
pub use window::{Display, InputEvent, RenderTarget};
