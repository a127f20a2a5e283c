//! [`GpuBackend`] on top of `wgpu`.
//!
//! Every draw records its own command buffer: the pending vertex/index bytes
//! become fresh buffers, one render pass loads the current target, draws and
//! is submitted right away. All three shaders share one bind group layout:
//! globals, a sampler and sixteen texture units.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::paint::Color;

use super::backend::{
    BufferUpload, GpuBackend, MAX_TEXTURE_SLOTS, ShaderKind, ShaderParam, TextureDesc,
    VertexElement,
};
use super::error::RenderError;
use super::handle::{RenderTargetId, ShaderId, TextureId};

/// Format of sampled textures and off-screen targets.
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// First texture binding; unit `n` is binding `TEXTURE_BINDING_BASE + n`.
const TEXTURE_BINDING_BASE: u32 = 2;

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_projection: [[f32; 4]; 4],
    texture_units: [[i32; 4]; 4],
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            view_projection: glam::Mat4::IDENTITY.to_cols_array_2d(),
            texture_units: [[0, 1, 2, 3], [4, 5, 6, 7], [8, 9, 10, 11], [12, 13, 14, 15]],
        }
    }
}

// ── resources ─────────────────────────────────────────────────────────────

struct GpuTexture {
    // kept alive for the view
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuShader {
    kind: ShaderKind,
    module: wgpu::ShaderModule,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: ShaderId,
    layout: Vec<VertexElement>,
    format: wgpu::TextureFormat,
}

/// The `wgpu` implementation of the engine's backend seam.
///
/// Drawing to the screen needs a frame view, set once per frame with
/// [`WgpuBackend::set_frame_view`]. Unknown handles are logged and skipped.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    shaders: Vec<GpuShader>,
    textures: Vec<GpuTexture>,
    targets: Vec<TextureId>,
    fallback: TextureId,

    // state set by the engine between draws
    vertex_bytes: Vec<u8>,
    index_bytes: Vec<u8>,
    index_format: wgpu::IndexFormat,
    layout: Vec<VertexElement>,
    shader: Option<ShaderId>,
    units: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    globals: Globals,
    target: Option<RenderTargetId>,
    frame_view: Option<wgpu::TextureView>,
}

impl WgpuBackend {
    /// `surface_format` is the format of views passed to
    /// [`set_frame_view`](Self::set_frame_view).
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Globals>() as u64),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        entries.extend((0..MAX_TEXTURE_SLOTS as u32).map(|unit| wgpu::BindGroupLayoutEntry {
            binding: TEXTURE_BINDING_BASE + unit,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel bgl"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // Repeat so tiled sprites wrap.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessel sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut backend = Self {
            device,
            queue,
            surface_format,
            bind_group_layout,
            pipeline_layout,
            sampler,
            pipelines: HashMap::new(),
            shaders: Vec::new(),
            textures: Vec::new(),
            targets: Vec::new(),
            fallback: TextureId(0),
            vertex_bytes: Vec::new(),
            index_bytes: Vec::new(),
            index_format: wgpu::IndexFormat::Uint32,
            layout: Vec::new(),
            shader: None,
            units: [None; MAX_TEXTURE_SLOTS],
            globals: Globals::default(),
            target: None,
            frame_view: None,
        };
        backend.fallback =
            backend.create_texture(&TextureDesc::new(1, 1, "tessel unit fallback"), &[255; 4]);
        backend
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// View that draws land in while no render target is bound.
    pub fn set_frame_view(&mut self, view: Option<wgpu::TextureView>) {
        self.frame_view = view;
    }

    fn texture_view(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.textures.get(id.index()).map(|t| &t.view)
    }

    /// Color view and format of the current target.
    fn current_target(&self) -> Option<(&wgpu::TextureView, wgpu::TextureFormat)> {
        match self.target {
            Some(target) => {
                let texture = self.targets.get(target.index())?;
                self.texture_view(*texture).map(|v| (v, TEXTURE_FORMAT))
            }
            None => self.frame_view.as_ref().map(|v| (v, self.surface_format)),
        }
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) -> bool {
        if self.pipelines.contains_key(key) {
            return true;
        }
        let Some(shader) = self.shaders.get(key.shader.index()) else {
            log::warn!("WgpuBackend: unknown shader {:?}", key.shader);
            return false;
        };

        let stride = key.layout.first().map_or(0, |e| e.stride) as u64;
        let attributes: Vec<wgpu::VertexAttribute> = key
            .layout
            .iter()
            .map(|e| wgpu::VertexAttribute {
                format: vertex_format(e),
                offset: e.offset as u64,
                shader_location: e.location,
            })
            .collect();

        let label = format!("tessel {:?} pipeline", shader.kind);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("WgpuBackend: built {label} for {:?}", key.format);
        self.pipelines.insert(key.clone(), pipeline);
        true
    }

    fn bind_group(&self) -> Option<wgpu::BindGroup> {
        let globals = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel globals"),
            contents: bytemuck::bytes_of(&self.globals),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let fallback = self.texture_view(self.fallback)?;
        let views: Vec<&wgpu::TextureView> = self
            .units
            .iter()
            .map(|unit| match unit {
                Some(id) => self.texture_view(*id).unwrap_or_else(|| {
                    log::warn!("WgpuBackend: unknown texture {id:?}");
                    fallback
                }),
                None => fallback,
            })
            .collect();

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        entries.extend(views.iter().enumerate().map(|(unit, view)| wgpu::BindGroupEntry {
            binding: TEXTURE_BINDING_BASE + unit as u32,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel bind group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        }))
    }
}

fn vertex_format(e: &VertexElement) -> wgpu::VertexFormat {
    match e.components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn shader_source(kind: ShaderKind) -> &'static str {
    match kind {
        ShaderKind::Shape => include_str!("shaders/shape.wgsl"),
        ShaderKind::Circle => include_str!("shaders/circle.wgsl"),
        ShaderKind::Glyph => include_str!("shaders/glyph.wgsl"),
    }
}

impl GpuBackend for WgpuBackend {
    fn create_shader(&mut self, kind: ShaderKind) -> Result<ShaderId, RenderError> {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("tessel {kind:?} shader")),
            source: wgpu::ShaderSource::Wgsl(shader_source(kind).into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            return Err(RenderError::ShaderCompilation {
                kind,
                message: errors.join("\n"),
            });
        }

        let id = ShaderId(self.shaders.len() as u32);
        self.shaders.push(GpuShader { kind, module });
        Ok(id)
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> TextureId {
        let size = wgpu::Extent3d {
            width: desc.width.max(1),
            height: desc.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if pixels.len() == desc.byte_len() && !pixels.is_empty() {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size.width),
                    rows_per_image: Some(size.height),
                },
                size,
            );
        } else {
            log::warn!(
                "WgpuBackend: texture '{}' expects {} bytes, got {}; left uninitialized",
                desc.label,
                desc.byte_len(),
                pixels.len()
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            _texture: texture,
            view,
        });
        id
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetId {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessel render target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let texture_id = TextureId(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            _texture: texture,
            view,
        });
        let id = RenderTargetId(self.targets.len() as u32);
        self.targets.push(texture_id);
        id
    }

    fn render_target_texture(&self, target: RenderTargetId) -> Option<TextureId> {
        self.targets.get(target.index()).copied()
    }

    fn submit_buffer(&mut self, upload: BufferUpload<'_>) {
        self.vertex_bytes.clear();
        self.vertex_bytes.extend_from_slice(upload.vertices);
        self.index_bytes.clear();
        self.index_bytes.extend_from_slice(upload.indices);
        self.index_format = if upload.index_size == 2 {
            wgpu::IndexFormat::Uint16
        } else {
            wgpu::IndexFormat::Uint32
        };
    }

    fn set_vertex_layout(&mut self, layout: &[VertexElement]) {
        self.layout.clear();
        self.layout.extend_from_slice(layout);
    }

    fn bind_shader(&mut self, shader: ShaderId) {
        self.shader = Some(shader);
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = Some(texture),
            None => log::warn!("WgpuBackend: texture unit {unit} out of range"),
        }
    }

    fn unbind_texture(&mut self, unit: u32) {
        if let Some(slot) = self.units.get_mut(unit as usize) {
            *slot = None;
        }
    }

    fn set_uniform(&mut self, param: ShaderParam) {
        match param {
            ShaderParam::ViewProjection(m) => self.globals.view_projection = m.to_cols_array_2d(),
            ShaderParam::TextureUnits(units) => {
                for (i, unit) in units.iter().enumerate() {
                    self.globals.texture_units[i / 4][i % 4] = *unit;
                }
            }
        }
    }

    fn bind_render_target(&mut self, target: RenderTargetId) {
        if self.targets.get(target.index()).is_none() {
            log::warn!("WgpuBackend: unknown render target {target:?}");
            return;
        }
        self.target = Some(target);
    }

    fn unbind_render_target(&mut self) {
        self.target = None;
    }

    fn clear(&mut self, color: Color) {
        let Some((view, _)) = self.current_target() else {
            log::warn!("WgpuBackend: clear without a target view");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessel clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessel clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let Some(shader) = self.shader else {
            log::warn!("WgpuBackend: draw without a bound shader");
            return;
        };
        let Some((_, format)) = self.current_target() else {
            log::warn!("WgpuBackend: draw without a target view; skipped");
            return;
        };
        if index_count == 0 || self.vertex_bytes.is_empty() {
            return;
        }

        let key = PipelineKey {
            shader,
            layout: self.layout.clone(),
            format,
        };
        if !self.ensure_pipeline(&key) {
            return;
        }

        let Some(bind_group) = self.bind_group() else { return };
        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel vertices"),
            contents: &self.vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel indices"),
            contents: &self.index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });

        // Immutable borrows from here on.
        let Some(pipeline) = self.pipelines.get(&key) else { return };
        let Some((view, _)) = self.current_target() else { return };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessel draw encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessel draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.set_index_buffer(ibo.slice(..), self.index_format);
            rpass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CircleVertex, GlyphVertex, ShapeVertex, Vertex};

    #[test]
    fn globals_match_wgsl_size() {
        // mat4x4<f32> + array<vec4<i32>, 4>
        assert_eq!(std::mem::size_of::<Globals>(), 128);
    }

    #[test]
    fn vertex_formats_follow_component_count() {
        let formats: Vec<wgpu::VertexFormat> = ShapeVertex::LAYOUT.iter().map(vertex_format).collect();
        assert_eq!(
            formats,
            vec![
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x4,
                wgpu::VertexFormat::Float32x2,
                wgpu::VertexFormat::Float32,
                wgpu::VertexFormat::Float32,
            ]
        );
    }

    #[test]
    fn shaders_declare_every_location() {
        let cases: [(ShaderKind, &[VertexElement]); 3] = [
            (ShaderKind::Shape, ShapeVertex::LAYOUT),
            (ShaderKind::Circle, CircleVertex::LAYOUT),
            (ShaderKind::Glyph, GlyphVertex::LAYOUT),
        ];
        for (kind, layout) in cases {
            let src = shader_source(kind);
            for e in layout {
                assert!(src.contains(&format!("@location({})", e.location)), "{kind:?}");
            }
            let last = format!("@binding({})", TEXTURE_BINDING_BASE + MAX_TEXTURE_SLOTS as u32 - 1);
            assert!(src.contains(&last), "{kind:?} must declare all units");
        }
    }
}
