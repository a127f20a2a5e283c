//! The seam between the batching engine and a GPU API.
//!
//! The engine drives a backend like a small state machine: upload a buffer
//! pair, declare its layout, bind a shader, textures and uniforms, then issue
//! one indexed draw. Backends are synchronous from the engine's point of view.

use glam::Mat4;

use crate::paint::Color;

use super::{RenderError, RenderTargetId, ShaderId, TextureId};

/// Number of texture units a shape draw may sample from.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// The three primitive kinds, each with its own shader and vertex layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Shape,
    Circle,
    Glyph,
}

/// Scalar type of a vertex attribute component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Float32,
}

impl ElementKind {
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            ElementKind::Float32 => 4,
        }
    }
}

/// One vertex attribute: shader location, component count and placement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub location: u32,
    pub components: u32,
    pub kind: ElementKind,
    pub stride: u32,
    pub offset: u32,
}

impl VertexElement {
    #[inline]
    pub const fn float(location: u32, components: u32, stride: usize, offset: usize) -> Self {
        Self {
            location,
            components,
            kind: ElementKind::Float32,
            stride: stride as u32,
            offset: offset as u32,
        }
    }

    #[inline]
    pub const fn size(&self) -> u32 {
        self.components * self.kind.size()
    }
}

/// A vertex/index buffer pair handed to [`GpuBackend::submit_buffer`].
#[derive(Debug, Copy, Clone)]
pub struct BufferUpload<'a> {
    pub vertices: &'a [u8],
    pub vertex_size: u32,
    pub vertex_count: u32,
    pub indices: &'a [u8],
    pub index_size: u32,
    pub index_count: u32,
}

/// Shader parameters the engine uploads before each draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShaderParam {
    /// The camera's projection * view matrix.
    ViewProjection(Mat4),
    /// Texture unit for every slot index a vertex may carry.
    TextureUnits([i32; MAX_TEXTURE_SLOTS]),
}

/// Description of an RGBA8 texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub label: String,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, label: impl Into<String>) -> Self {
        Self {
            width,
            height,
            label: label.into(),
        }
    }

    /// Expected length of the pixel slice (4 bytes per texel).
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Operations a GPU API must provide to host the engine.
pub trait GpuBackend {
    /// Compiles and links the program for `kind`.
    fn create_shader(&mut self, kind: ShaderKind) -> Result<ShaderId, RenderError>;

    /// Creates an RGBA8 texture from tightly packed rows.
    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> TextureId;

    /// Creates an off-screen color target of the given size.
    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetId;

    /// Texture that samples what was rendered into `target`.
    fn render_target_texture(&self, target: RenderTargetId) -> Option<TextureId>;

    fn submit_buffer(&mut self, upload: BufferUpload<'_>);
    fn set_vertex_layout(&mut self, layout: &[VertexElement]);
    fn bind_shader(&mut self, shader: ShaderId);
    fn bind_texture(&mut self, texture: TextureId, unit: u32);
    fn unbind_texture(&mut self, unit: u32);
    fn set_uniform(&mut self, param: ShaderParam);
    fn bind_render_target(&mut self, target: RenderTargetId);
    fn unbind_render_target(&mut self);

    /// Clears the currently bound target.
    fn clear(&mut self, color: Color);

    /// Draws `index_count` indices of the last submitted buffer pair.
    fn draw_indexed(&mut self, index_count: u32);
}

impl<B: GpuBackend + ?Sized> GpuBackend for &mut B {
    fn create_shader(&mut self, kind: ShaderKind) -> Result<ShaderId, RenderError> {
        (**self).create_shader(kind)
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> TextureId {
        (**self).create_texture(desc, pixels)
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetId {
        (**self).create_render_target(width, height)
    }

    fn render_target_texture(&self, target: RenderTargetId) -> Option<TextureId> {
        (**self).render_target_texture(target)
    }

    fn submit_buffer(&mut self, upload: BufferUpload<'_>) {
        (**self).submit_buffer(upload)
    }

    fn set_vertex_layout(&mut self, layout: &[VertexElement]) {
        (**self).set_vertex_layout(layout)
    }

    fn bind_shader(&mut self, shader: ShaderId) {
        (**self).bind_shader(shader)
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        (**self).bind_texture(texture, unit)
    }

    fn unbind_texture(&mut self, unit: u32) {
        (**self).unbind_texture(unit)
    }

    fn set_uniform(&mut self, param: ShaderParam) {
        (**self).set_uniform(param)
    }

    fn bind_render_target(&mut self, target: RenderTargetId) {
        (**self).bind_render_target(target)
    }

    fn unbind_render_target(&mut self) {
        (**self).unbind_render_target()
    }

    fn clear(&mut self, color: Color) {
        (**self).clear(color)
    }

    fn draw_indexed(&mut self, index_count: u32) {
        (**self).draw_indexed(index_count)
    }
}
