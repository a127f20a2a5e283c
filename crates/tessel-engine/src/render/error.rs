use std::fmt;

use super::ShaderKind;

/// Errors surfaced by the render engine.
///
/// Only engine construction can fail. Per-frame drawing and flushing have no
/// error path: capacity limits and atlas switches are resolved by flushing.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A shader failed to compile or link. Carries the backend diagnostic.
    ShaderCompilation { kind: ShaderKind, message: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ShaderCompilation { kind, message } => {
                write!(f, "failed to build {kind:?} shader: {message}")
            }
        }
    }
}

impl std::error::Error for RenderError {}
