//! Tessel engine crate.
//!
//! A batched immediate-mode 2D renderer: callers issue draw commands every
//! frame, the engine accumulates them into per-kind batches and submits each
//! batch as one indexed draw. Windowing and GPU device plumbing live next to
//! it so a binary can drive the whole thing from one `App`.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
pub mod text;
