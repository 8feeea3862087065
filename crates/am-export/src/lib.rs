//! Sérialisation HTML des documents ASCII et écriture sur disque.

pub mod html;
pub mod writer;

pub use html::{PageStyle, render_animated, render_document};
pub use writer::{validate_output_target, write_markup};
