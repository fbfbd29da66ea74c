//! Time-based animation of moving features.
//!
//! - [`easing`]: cubic easing curves
//! - [`flash`]: the per-update flash effect
//! - [`canvas`]: the drawing surface and a recording implementation
//! - [`animator`]: the set of running flashes, drawn each frame

pub mod animator;
pub mod canvas;
pub mod easing;
pub mod flash;

// Re-export commonly used types
pub use animator::Animator;
pub use canvas::{Canvas, FrameRecorder, Shape};
pub use easing::{ease_in, ease_out};
pub use flash::{Flash, FlashFrame, DEFAULT_FLASH_DURATION};
