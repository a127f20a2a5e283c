//! Coordinate types shared by the engine and its callers.
//!
//! World space is whatever the bound projection says it is. The default
//! projection maps logical pixels with the origin at the bottom-left and +Y
//! up, which is also the orientation font metrics use.

mod uv_rect;
mod viewport;

pub use uv_rect::UvRect;
pub use viewport::Viewport;
