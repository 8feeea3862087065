//! Visual source modules for asciimaker (still image, animated GIF, video, in-memory).

pub mod image;
pub mod memory;
pub mod resize;

#[cfg(feature = "video")]
pub mod video;

pub use crate::image::{GifSource, ImageSource, load_image};
pub use memory::MemorySource;
pub use resize::{Resizer, resize_to_width, scaled_height};
