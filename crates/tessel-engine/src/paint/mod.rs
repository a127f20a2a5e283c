//! Color model shared by every primitive kind.

mod color;

pub use color::Color;
