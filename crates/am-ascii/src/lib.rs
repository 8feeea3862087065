//! Tile renderer for asciimaker.
//!
//! Converts pixel frames into documents of styled characters, one per tile.

pub mod renderer;
pub mod tile;

pub use renderer::{ImageInput, TileRenderer};
