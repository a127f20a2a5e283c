//! Headless backend that records what the engine asks of it.

use glam::Mat4;

use crate::paint::Color;

use super::backend::{
    BufferUpload, GpuBackend, MAX_TEXTURE_SLOTS, ShaderKind, ShaderParam, TextureDesc,
    VertexElement,
};
use super::error::RenderError;
use super::handle::{RenderTargetId, ShaderId, TextureId};
use super::vertex::Vertex;

/// One backend call, in the order it was made.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateShader(ShaderKind),
    CreateTexture(TextureId),
    CreateRenderTarget(RenderTargetId),
    SubmitBuffer { vertex_count: u32, index_count: u32 },
    SetVertexLayout(usize),
    BindShader(ShaderId),
    BindTexture { texture: TextureId, unit: u32 },
    UnbindTexture(u32),
    SetUniform(ShaderParam),
    BindRenderTarget(RenderTargetId),
    UnbindRenderTarget,
    Clear(Color),
    DrawIndexed(u32),
}

/// Snapshot of backend state at the moment of a draw.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub shader: ShaderId,
    pub shader_kind: ShaderKind,
    pub layout: Vec<VertexElement>,
    pub vertex_size: u32,
    pub vertex_count: u32,
    pub index_count: u32,
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
    /// Texture bound to each unit, by unit index.
    pub textures: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    pub view_projection: Option<Mat4>,
    pub texture_units: Option<[i32; MAX_TEXTURE_SLOTS]>,
    pub render_target: Option<RenderTargetId>,
}

impl DrawRecord {
    /// Decodes the submitted vertex bytes as `V`.
    pub fn vertices_as<V: Vertex>(&self) -> Vec<V> {
        self.vertices
            .chunks_exact(std::mem::size_of::<V>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    /// Textures bound to units `0..n`, stopping at the first empty unit.
    pub fn bound_textures(&self) -> Vec<TextureId> {
        self.textures.iter().map_while(|t| *t).collect()
    }
}

#[derive(Debug, Clone)]
struct RecordedTexture {
    desc: TextureDesc,
    pixels: Vec<u8>,
}

/// [`GpuBackend`] that keeps a call log and per-draw snapshots.
///
/// Handles are sequential from 0. Each render target owns a texture.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    draws: Vec<DrawRecord>,
    shaders: Vec<ShaderKind>,
    textures: Vec<RecordedTexture>,
    targets: Vec<TextureId>,
    failing_shader: Option<ShaderKind>,

    pending_vertices: Vec<u8>,
    pending_vertex_size: u32,
    pending_vertex_count: u32,
    pending_indices: Vec<u32>,
    layout: Vec<VertexElement>,
    shader: Option<ShaderId>,
    units: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    view_projection: Option<Mat4>,
    texture_units: Option<[i32; MAX_TEXTURE_SLOTS]>,
    render_target: Option<RenderTargetId>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose `create_shader` fails for `kind`.
    pub fn failing_shader(kind: ShaderKind) -> Self {
        Self {
            failing_shader: Some(kind),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Descriptors of every created texture, by handle.
    pub fn textures(&self) -> Vec<&TextureDesc> {
        self.textures.iter().map(|t| &t.desc).collect()
    }

    pub fn texture_pixels(&self, texture: TextureId) -> Option<&[u8]> {
        self.textures.get(texture.index()).map(|t| t.pixels.as_slice())
    }

    /// Forgets the call log and draws; resources stay.
    pub fn clear_log(&mut self) {
        self.calls.clear();
        self.draws.clear();
    }
}

impl GpuBackend for RecordingBackend {
    fn create_shader(&mut self, kind: ShaderKind) -> Result<ShaderId, RenderError> {
        self.calls.push(BackendCall::CreateShader(kind));
        if self.failing_shader == Some(kind) {
            return Err(RenderError::ShaderCompilation {
                kind,
                message: "recording backend: simulated link failure".to_owned(),
            });
        }
        let id = ShaderId(self.shaders.len() as u32);
        self.shaders.push(kind);
        Ok(id)
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(RecordedTexture {
            desc: desc.clone(),
            pixels: pixels.to_vec(),
        });
        self.calls.push(BackendCall::CreateTexture(id));
        id
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetId {
        let id = RenderTargetId(self.targets.len() as u32);
        let desc = TextureDesc::new(width, height, format!("render target {}", id.0));
        let texture = TextureId(self.textures.len() as u32);
        self.textures.push(RecordedTexture {
            pixels: vec![0; desc.byte_len()],
            desc,
        });
        self.targets.push(texture);
        self.calls.push(BackendCall::CreateRenderTarget(id));
        id
    }

    fn render_target_texture(&self, target: RenderTargetId) -> Option<TextureId> {
        self.targets.get(target.index()).copied()
    }

    fn submit_buffer(&mut self, upload: BufferUpload<'_>) {
        self.pending_vertices = upload.vertices.to_vec();
        self.pending_vertex_size = upload.vertex_size;
        self.pending_vertex_count = upload.vertex_count;
        self.pending_indices = upload
            .indices
            .chunks_exact(upload.index_size.max(1) as usize)
            .map(|c| match c.len() {
                2 => u16::from_ne_bytes([c[0], c[1]]) as u32,
                _ => bytemuck::pod_read_unaligned::<u32>(&c[..4]),
            })
            .collect();
        self.calls.push(BackendCall::SubmitBuffer {
            vertex_count: upload.vertex_count,
            index_count: upload.index_count,
        });
    }

    fn set_vertex_layout(&mut self, layout: &[VertexElement]) {
        self.layout = layout.to_vec();
        self.calls.push(BackendCall::SetVertexLayout(layout.len()));
    }

    fn bind_shader(&mut self, shader: ShaderId) {
        self.shader = Some(shader);
        self.calls.push(BackendCall::BindShader(shader));
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        if let Some(slot) = self.units.get_mut(unit as usize) {
            *slot = Some(texture);
        }
        self.calls.push(BackendCall::BindTexture { texture, unit });
    }

    fn unbind_texture(&mut self, unit: u32) {
        if let Some(slot) = self.units.get_mut(unit as usize) {
            *slot = None;
        }
        self.calls.push(BackendCall::UnbindTexture(unit));
    }

    fn set_uniform(&mut self, param: ShaderParam) {
        match param {
            ShaderParam::ViewProjection(m) => self.view_projection = Some(m),
            ShaderParam::TextureUnits(units) => self.texture_units = Some(units),
        }
        self.calls.push(BackendCall::SetUniform(param));
    }

    fn bind_render_target(&mut self, target: RenderTargetId) {
        self.render_target = Some(target);
        self.calls.push(BackendCall::BindRenderTarget(target));
    }

    fn unbind_render_target(&mut self) {
        self.render_target = None;
        self.calls.push(BackendCall::UnbindRenderTarget);
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(BackendCall::Clear(color));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(BackendCall::DrawIndexed(index_count));
        let Some(shader) = self.shader else {
            log::warn!("RecordingBackend: draw without a bound shader");
            return;
        };
        let shader_kind = self.shaders[shader.index()];
        self.draws.push(DrawRecord {
            shader,
            shader_kind,
            layout: self.layout.clone(),
            vertex_size: self.pending_vertex_size,
            vertex_count: self.pending_vertex_count,
            index_count,
            vertices: self.pending_vertices.clone(),
            indices: self.pending_indices.clone(),
            textures: self.units,
            view_projection: self.view_projection,
            texture_units: self.texture_units,
            render_target: self.render_target,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_sequential() {
        let mut b = RecordingBackend::new();
        let a = b.create_texture(&TextureDesc::new(1, 1, "a"), &[0; 4]);
        let t = b.create_render_target(8, 8);
        let c = b.create_texture(&TextureDesc::new(1, 1, "c"), &[0; 4]);
        assert_eq!(a, TextureId(0));
        assert_eq!(b.render_target_texture(t), Some(TextureId(1)));
        assert_eq!(c, TextureId(2));
        assert_eq!(b.textures()[1].width, 8);
    }

    #[test]
    fn failing_shader_reports_kind() {
        let mut b = RecordingBackend::failing_shader(ShaderKind::Circle);
        assert!(b.create_shader(ShaderKind::Shape).is_ok());
        let err = b.create_shader(ShaderKind::Circle).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompilation { kind: ShaderKind::Circle, .. }));
    }

    #[test]
    fn draw_snapshots_bound_state() {
        let mut b = RecordingBackend::new();
        let s = b.create_shader(ShaderKind::Glyph).unwrap();
        let indices: [u32; 3] = [0, 1, 2];
        b.submit_buffer(BufferUpload {
            vertices: &[0; 12],
            vertex_size: 4,
            vertex_count: 3,
            indices: bytemuck::cast_slice(&indices),
            index_size: 4,
            index_count: 3,
        });
        b.bind_shader(s);
        b.bind_texture(TextureId(5), 0);
        b.draw_indexed(3);
        b.unbind_texture(0);

        let d = &b.draws()[0];
        assert_eq!(d.shader_kind, ShaderKind::Glyph);
        assert_eq!(d.indices, vec![0, 1, 2]);
        assert_eq!(d.bound_textures(), vec![TextureId(5)]);
        assert_eq!(d.view_projection, None);
    }
}
