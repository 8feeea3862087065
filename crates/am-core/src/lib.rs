//! Configuration, types, and shared structures for asciimaker.
//!
//! This crate contains the shared types, traits, and configuration logic
//! used across the asciimaker workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::CharRamp;
pub use color::Rgb;
pub use config::{AnimationConfig, RenderConfig};
pub use error::ConvertError;
pub use frame::{AnimatedDocument, Document, Fragment, FrameBuffer, SourceImage};
