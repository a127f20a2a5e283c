//! Batched immediate-mode draw submission.
//!
//! Drawing calls append vertices to one of three per-kind batches (shapes,
//! circles, glyphs). Nothing reaches the GPU until a flush: explicitly through
//! [`RenderContext::render`], or implicitly when the texture slot table
//! overflows, the glyph atlas changes, or the render target changes.
//!
//! Convention:
//! - Geometry is in world units of the bound projection (pixels, +Y up by default).
//! - Flush order is fixed: shapes, then circles, then glyphs.

mod backend;
mod batch;
mod camera;
mod context;
mod error;
pub mod geometry;
mod handle;
mod recording;
mod slots;
mod stats;
mod texture;
mod vertex;
mod wgpu_backend;

pub use backend::{
    BufferUpload, ElementKind, GpuBackend, MAX_TEXTURE_SLOTS, ShaderKind, ShaderParam,
    TextureDesc, VertexElement,
};
pub use batch::Batch;
pub use camera::{Camera, CameraState, OrthographicCamera};
pub use context::{CircleStyle, RenderContext, RendererConfig};
pub use error::RenderError;
pub use handle::{RenderTargetId, ShaderId, TextureId};
pub use recording::{BackendCall, DrawRecord, RecordingBackend};
pub use slots::SlotTable;
pub use stats::RenderStats;
pub use texture::SubTexture;
pub use vertex::{CircleVertex, GlyphVertex, ShapeVertex, Vertex};
pub use wgpu_backend::WgpuBackend;
