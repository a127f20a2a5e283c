use glam::{Mat4, Vec2, Vec3};

use crate::coords::{UvRect, Viewport};
use crate::paint::Color;
use crate::text::{AtlasRef, GlyphProvider, PlacedGlyph, TextParams, layout_text};

use super::backend::{GpuBackend, MAX_TEXTURE_SLOTS, ShaderKind, ShaderParam, TextureDesc};
use super::batch::Batch;
use super::camera::{Camera, CameraState};
use super::error::RenderError;
use super::geometry;
use super::handle::{RenderTargetId, ShaderId, TextureId};
use super::slots::SlotTable;
use super::stats::RenderStats;
use super::texture::SubTexture;
use super::vertex::{CircleVertex, GlyphVertex, ShapeVertex, Vertex};

/// Slot index `i` samples texture unit `i`.
const TEXTURE_UNITS: [i32; MAX_TEXTURE_SLOTS] = {
    let mut units = [0; MAX_TEXTURE_SLOTS];
    let mut i = 0;
    while i < MAX_TEXTURE_SLOTS {
        units[i] = i as i32;
        i += 1;
    }
    units
};

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Sizes the default pixel projection.
    pub viewport: Viewport,
    /// Quads (or triangles) the shape batch holds before its first reallocation.
    pub initial_quad_capacity: usize,
    pub initial_circle_capacity: usize,
    pub initial_glyph_capacity: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1280.0, 720.0),
            initial_quad_capacity: 10_000,
            initial_circle_capacity: 1_000,
            initial_glyph_capacity: 4_000,
        }
    }
}

/// Outline parameters for circles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CircleStyle {
    /// 1.0 fills the disc; smaller values leave a ring of that relative width.
    pub thickness: f32,
    /// Width of the anti-aliased edge, relative to the radius.
    pub fade: f32,
}

impl CircleStyle {
    pub const FILLED: CircleStyle = CircleStyle {
        thickness: 1.0,
        fade: 0.005,
    };

    pub const fn ring(thickness: f32) -> Self {
        Self {
            thickness,
            fade: 0.005,
        }
    }
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self::FILLED
    }
}

#[derive(Debug, Copy, Clone)]
struct Shaders {
    shape: ShaderId,
    circle: ShaderId,
    glyph: ShaderId,
}

/// Immediate-mode 2D renderer over a [`GpuBackend`].
///
/// Drawing calls only append to CPU-side batches. GPU work happens when the
/// batches are flushed, one indexed draw per non-empty kind, in the fixed
/// order shapes, circles, glyphs.
///
/// The projection is read when a batch is flushed, not when geometry is
/// appended: changing it affects everything still pending.
pub struct RenderContext<B: GpuBackend> {
    backend: B,
    shaders: Shaders,

    shapes: Batch<ShapeVertex>,
    circles: Batch<CircleVertex>,
    glyphs: Batch<GlyphVertex>,

    slots: SlotTable,
    atlas: Option<AtlasRef>,
    // texture units bound by the last shape flush
    units_bound: usize,

    camera: CameraState,
    viewport: Viewport,
    target: Option<RenderTargetId>,

    stats: RenderStats,
}

impl<B: GpuBackend> RenderContext<B> {
    /// Builds the three shaders and the white texture.
    ///
    /// Fails only when the backend cannot build a shader.
    pub fn new(mut backend: B, config: &RendererConfig) -> Result<Self, RenderError> {
        let mut build = |kind| {
            backend.create_shader(kind).inspect_err(|e| {
                log::error!("RenderContext: {e}");
            })
        };
        let shaders = Shaders {
            shape: build(ShaderKind::Shape)?,
            circle: build(ShaderKind::Circle)?,
            glyph: build(ShaderKind::Glyph)?,
        };

        let white = backend.create_texture(&TextureDesc::new(1, 1, "white"), &[255; 4]);

        log::debug!(
            "RenderContext: ready (viewport {}x{}, capacity {} quads / {} circles / {} glyphs)",
            config.viewport.width,
            config.viewport.height,
            config.initial_quad_capacity,
            config.initial_circle_capacity,
            config.initial_glyph_capacity,
        );

        Ok(Self {
            backend,
            shaders,
            shapes: Batch::with_quad_capacity(config.initial_quad_capacity),
            circles: Batch::with_quad_capacity(config.initial_circle_capacity),
            glyphs: Batch::with_quad_capacity(config.initial_glyph_capacity),
            slots: SlotTable::new(white),
            atlas: None,
            units_bound: 0,
            camera: CameraState::new(config.viewport.pixel_projection()),
            viewport: config.viewport,
            target: None,
            stats: RenderStats::default(),
        })
    }

    // ── accessors ──────────────────────────────────────────────────────────

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access for resource creation (fonts, textures).
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn white_texture(&self) -> TextureId {
        self.slots.white()
    }

    #[inline]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn slot_table(&self) -> &SlotTable {
        &self.slots
    }

    #[inline]
    pub fn bound_atlas(&self) -> Option<AtlasRef> {
        self.atlas
    }

    #[inline]
    pub fn render_target(&self) -> Option<RenderTargetId> {
        self.target
    }

    #[inline]
    pub fn shape_batch(&self) -> &Batch<ShapeVertex> {
        &self.shapes
    }

    #[inline]
    pub fn circle_batch(&self) -> &Batch<CircleVertex> {
        &self.circles
    }

    #[inline]
    pub fn glyph_batch(&self) -> &Batch<GlyphVertex> {
        &self.glyphs
    }

    /// True when nothing is waiting to be flushed.
    pub fn is_idle(&self) -> bool {
        self.shapes.is_empty() && self.circles.is_empty() && self.glyphs.is_empty()
    }

    pub fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> TextureId {
        self.backend.create_texture(desc, pixels)
    }

    pub fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetId {
        self.backend.create_render_target(width, height)
    }

    // ── frame lifecycle ────────────────────────────────────────────────────

    /// Starts a frame: resets the statistics.
    pub fn begin_frame(&mut self) {
        self.stats.reset();
    }

    /// Ends a frame: flushes everything pending.
    pub fn end_frame(&mut self) {
        self.flush_all();
    }

    /// Updates the default projection. A custom projection stays in effect.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        if self.camera.is_custom() {
            log::trace!("RenderContext: resized under a custom projection, keeping it");
        }
        self.viewport = viewport;
        self.camera.set_default(viewport.pixel_projection());
    }

    /// Flushes pending geometry, then clears the current target.
    pub fn clear(&mut self, color: Color) {
        self.flush_all();
        self.backend.clear(color);
    }

    /// Redirects drawing to `target` (`None` for the default target).
    ///
    /// Geometry already pending is flushed to the previous target first.
    pub fn set_render_target(&mut self, target: Option<RenderTargetId>) {
        if self.target == target {
            return;
        }
        self.flush_all();
        match target {
            Some(id) => self.backend.bind_render_target(id),
            None => self.backend.unbind_render_target(),
        }
        self.target = target;
    }

    // ── camera ─────────────────────────────────────────────────────────────

    /// Captures `camera`'s matrix as the live projection.
    ///
    /// Pending batches are not touched: they will be drawn with this matrix.
    pub fn set_projection(&mut self, camera: &impl Camera) {
        self.camera.set(camera);
    }

    /// Restores the default pixel projection.
    pub fn reset_projection(&mut self) {
        self.camera.reset();
    }

    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.camera.view_projection()
    }

    // ── texture slots ──────────────────────────────────────────────────────

    /// Slot `texture` occupies in the current shape batch, binding it if
    /// needed. A full table flushes the shape batch first.
    pub fn texture_slot(&mut self, texture: TextureId) -> u32 {
        if let Some(slot) = self.slots.find(texture) {
            return slot;
        }
        if self.slots.is_full() {
            log::trace!("RenderContext: texture slots exhausted, flushing shapes");
            self.flush_shapes();
        }
        // The table has free slots after a flush.
        self.slots.insert(texture).unwrap_or(0)
    }

    // ── quads ──────────────────────────────────────────────────────────────

    /// Flat quad centered on `position`.
    pub fn draw_quad(&mut self, position: Vec3, size: Vec2, color: Color) {
        self.draw_quad_transform(&geometry::transform(position, size, 0.0), color);
    }

    pub fn draw_rotated_quad(&mut self, position: Vec3, size: Vec2, rotation: f32, color: Color) {
        self.draw_quad_transform(&geometry::transform(position, size, rotation), color);
    }

    /// Flat quad: the unit quad (corners at ±0.5) mapped by `transform`.
    pub fn draw_quad_transform(&mut self, transform: &Mat4, color: Color) {
        self.push_shape_quad(transform, color, UvRect::FULL, 0, 1.0);
    }

    // ── sprites ────────────────────────────────────────────────────────────

    pub fn draw_sprite(
        &mut self,
        position: Vec3,
        size: Vec2,
        sprite: impl Into<SubTexture>,
        tint: Color,
        tiling: f32,
    ) {
        let transform = geometry::transform(position, size, 0.0);
        self.draw_sprite_transform(&transform, sprite, tint, tiling);
    }

    pub fn draw_rotated_sprite(
        &mut self,
        position: Vec3,
        size: Vec2,
        rotation: f32,
        sprite: impl Into<SubTexture>,
        tint: Color,
        tiling: f32,
    ) {
        let transform = geometry::transform(position, size, rotation);
        self.draw_sprite_transform(&transform, sprite, tint, tiling);
    }

    /// Textured quad sampling `sprite`'s region, multiplied by `tint`.
    pub fn draw_sprite_transform(
        &mut self,
        transform: &Mat4,
        sprite: impl Into<SubTexture>,
        tint: Color,
        tiling: f32,
    ) {
        let sprite = sprite.into();
        let slot = self.texture_slot(sprite.texture);
        self.push_shape_quad(transform, tint, sprite.region, slot, tiling);
    }

    // ── triangles ──────────────────────────────────────────────────────────

    pub fn draw_triangle(&mut self, position: Vec3, size: Vec2, color: Color) {
        self.draw_triangle_transform(&geometry::transform(position, size, 0.0), color);
    }

    pub fn draw_rotated_triangle(
        &mut self,
        position: Vec3,
        size: Vec2,
        rotation: f32,
        color: Color,
    ) {
        let transform = geometry::transform(position, size, rotation);
        self.draw_triangle_transform(&transform, color);
    }

    pub fn draw_triangle_transform(&mut self, transform: &Mat4, color: Color) {
        self.shapes.push_triangle(geometry::shape_triangle(
            transform,
            color,
            UvRect::FULL,
            0,
            1.0,
        ));
    }

    pub fn draw_textured_triangle(
        &mut self,
        position: Vec3,
        size: Vec2,
        sprite: impl Into<SubTexture>,
        tint: Color,
    ) {
        let transform = geometry::transform(position, size, 0.0);
        self.draw_textured_triangle_transform(&transform, sprite, tint);
    }

    /// Triangle sampling `sprite`'s region; takes a texture slot like a sprite.
    pub fn draw_textured_triangle_transform(
        &mut self,
        transform: &Mat4,
        sprite: impl Into<SubTexture>,
        tint: Color,
    ) {
        let sprite = sprite.into();
        let slot = self.texture_slot(sprite.texture);
        self.shapes.push_triangle(geometry::shape_triangle(
            transform,
            tint,
            sprite.region,
            slot,
            1.0,
        ));
    }

    // ── circles ────────────────────────────────────────────────────────────

    /// Circle inscribed in the quad of `size` centered on `position`.
    pub fn draw_circle(&mut self, position: Vec3, size: Vec2, color: Color, style: CircleStyle) {
        self.draw_circle_transform(&geometry::transform(position, size, 0.0), color, style);
    }

    pub fn draw_rotated_circle(
        &mut self,
        position: Vec3,
        size: Vec2,
        rotation: f32,
        color: Color,
        style: CircleStyle,
    ) {
        let transform = geometry::transform(position, size, rotation);
        self.draw_circle_transform(&transform, color, style);
    }

    pub fn draw_circle_transform(&mut self, transform: &Mat4, color: Color, style: CircleStyle) {
        self.circles.push_quad(geometry::circle_quad(
            transform,
            color,
            style.thickness,
            style.fade,
        ));
        self.stats.quads += 1;
    }

    // ── text ───────────────────────────────────────────────────────────────

    /// Lays out `text` in text-local space (one line box is 1.0 tall, first
    /// baseline at y = 0) and places it with `transform`.
    ///
    /// Returns the text-local extent. A glyph whose atlas differs from the
    /// bound one flushes every batch first.
    pub fn draw_text(
        &mut self,
        transform: &Mat4,
        text: &str,
        font: &dyn GlyphProvider,
        params: &TextParams,
        color: Color,
    ) -> Vec2 {
        layout_text(text, font, params, |glyph| {
            self.push_glyph(transform, &glyph, color)
        })
    }

    /// Text whose first baseline starts at `position`, with line boxes
    /// `size` units tall.
    pub fn draw_string(
        &mut self,
        position: Vec3,
        size: f32,
        text: &str,
        font: &dyn GlyphProvider,
        params: &TextParams,
        color: Color,
    ) -> Vec2 {
        let transform =
            Mat4::from_translation(position) * Mat4::from_scale(Vec3::new(size, size, 1.0));
        self.draw_text(&transform, text, font, params, color) * size
    }

    fn push_glyph(&mut self, transform: &Mat4, glyph: &PlacedGlyph, color: Color) {
        if let Some(bound) = self.atlas
            && bound.texture != glyph.atlas.texture
        {
            log::trace!(
                "RenderContext: glyph atlas {:?} -> {:?}, flushing",
                bound.texture,
                glyph.atlas.texture
            );
            self.flush_all();
        }
        self.atlas = Some(glyph.atlas);
        self.glyphs.push_quad(geometry::glyph_quad(
            transform, glyph.min, glyph.max, glyph.uv, color,
        ));
        self.stats.quads += 1;
    }

    fn push_shape_quad(
        &mut self,
        transform: &Mat4,
        color: Color,
        uv: UvRect,
        slot: u32,
        tiling: f32,
    ) {
        self.shapes
            .push_quad(geometry::shape_quad(transform, color, uv, slot, tiling));
        self.stats.quads += 1;
    }

    // ── flushing ───────────────────────────────────────────────────────────

    /// Submits every non-empty batch: shapes, then circles, then glyphs.
    pub fn flush_all(&mut self) {
        let shapes = self.flush_shape_batch();
        let circles = self.flush_circle_batch();
        let glyphs = self.flush_glyph_batch();
        if shapes || circles || glyphs {
            self.stats.flushes += 1;
        }
    }

    /// Same as [`flush_all`](Self::flush_all).
    #[inline]
    pub fn render(&mut self) {
        self.flush_all();
    }

    pub fn flush_shapes(&mut self) {
        if self.flush_shape_batch() {
            self.stats.flushes += 1;
        }
    }

    pub fn flush_circles(&mut self) {
        if self.flush_circle_batch() {
            self.stats.flushes += 1;
        }
    }

    pub fn flush_glyphs(&mut self) {
        if self.flush_glyph_batch() {
            self.stats.flushes += 1;
        }
    }

    fn flush_shape_batch(&mut self) -> bool {
        if self.shapes.is_empty() {
            self.slots.reset();
            return false;
        }

        self.backend.submit_buffer(self.shapes.upload());
        self.backend.set_vertex_layout(ShapeVertex::LAYOUT);
        self.backend.bind_shader(self.shaders.shape);

        let bound = self.slots.bound();
        for (unit, texture) in bound.iter().enumerate() {
            self.backend.bind_texture(*texture, unit as u32);
        }
        for unit in bound.len()..self.units_bound {
            self.backend.unbind_texture(unit as u32);
        }
        self.units_bound = bound.len();
        self.stats.active_texture_slots = self.stats.active_texture_slots.max(bound.len() as u32);

        self.backend.set_uniform(ShaderParam::TextureUnits(TEXTURE_UNITS));
        self.backend
            .set_uniform(ShaderParam::ViewProjection(self.camera.view_projection()));
        self.backend.draw_indexed(self.shapes.index_count());

        self.record_draw(self.shapes.vertex_count(), self.shapes.index_count());
        self.shapes.clear();
        self.slots.reset();
        true
    }

    fn flush_circle_batch(&mut self) -> bool {
        if self.circles.is_empty() {
            return false;
        }

        self.backend.submit_buffer(self.circles.upload());
        self.backend.set_vertex_layout(CircleVertex::LAYOUT);
        self.backend.bind_shader(self.shaders.circle);
        self.backend
            .set_uniform(ShaderParam::ViewProjection(self.camera.view_projection()));
        self.backend.draw_indexed(self.circles.index_count());

        self.record_draw(self.circles.vertex_count(), self.circles.index_count());
        self.circles.clear();
        true
    }

    fn flush_glyph_batch(&mut self) -> bool {
        let atlas = self.atlas.take();
        if self.glyphs.is_empty() {
            return false;
        }

        self.backend.submit_buffer(self.glyphs.upload());
        self.backend.set_vertex_layout(GlyphVertex::LAYOUT);
        self.backend.bind_shader(self.shaders.glyph);
        if let Some(atlas) = atlas {
            self.backend.bind_texture(atlas.texture, 0);
        }
        self.backend
            .set_uniform(ShaderParam::ViewProjection(self.camera.view_projection()));
        self.backend.draw_indexed(self.glyphs.index_count());

        self.record_draw(self.glyphs.vertex_count(), self.glyphs.index_count());
        self.glyphs.clear();
        true
    }

    fn record_draw(&mut self, vertices: u32, indices: u32) {
        self.stats.draw_calls += 1;
        self.stats.vertices += vertices;
        self.stats.indices += indices;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BackendCall, RecordingBackend};
    use crate::text::fake::FakeFont;

    fn engine() -> RenderContext<RecordingBackend> {
        let config = RendererConfig {
            viewport: Viewport::new(800.0, 600.0),
            ..RendererConfig::default()
        };
        RenderContext::new(RecordingBackend::new(), &config).unwrap()
    }

    fn texture(ctx: &mut RenderContext<RecordingBackend>) -> TextureId {
        ctx.create_texture(&TextureDesc::new(2, 2, "t"), &[0; 16])
    }

    fn draw_kinds(ctx: &RenderContext<RecordingBackend>) -> Vec<ShaderKind> {
        ctx.backend().draws().iter().map(|d| d.shader_kind).collect()
    }

    // ── construction ───────────────────────────────────────────────────────

    #[test]
    fn new_builds_shaders_and_white() {
        let ctx = engine();
        let b = ctx.backend();
        assert_eq!(
            &b.calls()[..3],
            &[
                BackendCall::CreateShader(ShaderKind::Shape),
                BackendCall::CreateShader(ShaderKind::Circle),
                BackendCall::CreateShader(ShaderKind::Glyph),
            ]
        );
        assert_eq!(b.texture_pixels(ctx.white_texture()), Some(&[255u8; 4][..]));
    }

    #[test]
    fn shader_failure_is_fatal() {
        let result = RenderContext::new(
            RecordingBackend::failing_shader(ShaderKind::Glyph),
            &RendererConfig::default(),
        );
        let Err(err) = result else { panic!("expected failure") };
        assert!(matches!(err, RenderError::ShaderCompilation { kind: ShaderKind::Glyph, .. }));
    }

    // ── texture slots ──────────────────────────────────────────────────────

    #[test]
    fn white_always_resolves_to_slot_zero() {
        let mut ctx = engine();
        let white = ctx.white_texture();
        assert_eq!(ctx.texture_slot(white), 0);
        let t = texture(&mut ctx);
        ctx.texture_slot(t);
        assert_eq!(ctx.texture_slot(white), 0);
        ctx.render();
        assert_eq!(ctx.texture_slot(white), 0);
    }

    #[test]
    fn same_texture_shares_a_slot() {
        let mut ctx = engine();
        let t = texture(&mut ctx);
        let a = ctx.texture_slot(t);
        let b = ctx.texture_slot(t);
        assert_eq!(a, 1);
        assert_eq!(a, b);
        assert_eq!(ctx.slot_table().len(), 2);
    }

    #[test]
    fn seventeenth_texture_flushes_once() {
        let mut ctx = engine();
        let textures: Vec<TextureId> = (0..16).map(|_| texture(&mut ctx)).collect();
        for t in &textures[..15] {
            ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, *t, Color::WHITE, 1.0);
        }
        assert!(ctx.backend().draws().is_empty());

        ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, textures[15], Color::WHITE, 1.0);

        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].bound_textures().len(), 16);
        assert_eq!(draws[0].vertex_count, 60);
        assert_eq!(ctx.slot_table().bound(), &[ctx.white_texture(), textures[15]]);
        assert_eq!(ctx.shape_batch().vertex_count(), 4);

        let v = ctx.shape_batch().vertices()[0];
        assert_eq!(v.tex_slot, 1.0);

        ctx.render();
        assert_eq!(ctx.backend().draws().len(), 2);
    }

    #[test]
    fn shape_flush_unbinds_stale_units() {
        let mut ctx = engine();
        let a = texture(&mut ctx);
        let b = texture(&mut ctx);
        ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, a, Color::WHITE, 1.0);
        ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, b, Color::WHITE, 1.0);
        ctx.render();
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.render();

        let draws = ctx.backend().draws();
        assert_eq!(draws[1].bound_textures(), vec![ctx.white_texture()]);
        assert!(ctx.backend().calls().contains(&BackendCall::UnbindTexture(2)));
    }

    #[test]
    fn shape_flush_uploads_unit_table() {
        let mut ctx = engine();
        let t = texture(&mut ctx);
        ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, t, Color::WHITE, 1.0);
        ctx.render();

        let expected: [i32; MAX_TEXTURE_SLOTS] = std::array::from_fn(|i| i as i32);
        let draws = ctx.backend().draws();
        assert_eq!(draws[0].shader_kind, ShaderKind::Shape);
        assert_eq!(draws[0].texture_units, Some(expected));
    }

    #[test]
    fn textured_triangle_takes_a_slot() {
        let mut ctx = engine();
        let t = texture(&mut ctx);
        ctx.draw_triangle(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.draw_textured_triangle(Vec3::ZERO, Vec2::ONE, t, Color::WHITE);

        let vertices = ctx.shape_batch().vertices();
        assert_eq!(vertices.len(), 6);
        assert!(vertices[..3].iter().all(|v| v.tex_slot == 0.0));
        assert!(vertices[3..].iter().all(|v| v.tex_slot == 1.0));
        assert_eq!(ctx.slot_table().bound(), &[ctx.white_texture(), t]);
        assert_eq!(ctx.shape_batch().index_count(), 6);
    }

    #[test]
    fn textured_triangle_counts_toward_overflow() {
        let mut ctx = engine();
        let textures: Vec<TextureId> = (0..16).map(|_| texture(&mut ctx)).collect();
        for t in &textures[..15] {
            ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, *t, Color::WHITE, 1.0);
        }
        ctx.draw_textured_triangle(Vec3::ZERO, Vec2::ONE, textures[15], Color::WHITE);

        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertex_count, 60);
        assert_eq!(ctx.shape_batch().vertex_count(), 3);
        assert_eq!(ctx.shape_batch().vertices()[0].tex_slot, 1.0);
        assert_eq!(ctx.slot_table().bound(), &[ctx.white_texture(), textures[15]]);
    }

    // ── batching ───────────────────────────────────────────────────────────

    #[test]
    fn render_on_empty_engine_is_noop() {
        let mut ctx = engine();
        ctx.backend_mut().clear_log();
        ctx.render();
        assert!(ctx.backend().calls().is_empty());
        assert_eq!(ctx.stats().draw_calls, 0);
        assert_eq!(ctx.stats().flushes, 0);
    }

    #[test]
    fn quad_and_triangle_counts() {
        let mut ctx = engine();
        for _ in 0..5 {
            ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        }
        for _ in 0..3 {
            ctx.draw_triangle(Vec3::ZERO, Vec2::ONE, Color::GREEN);
        }
        assert_eq!(ctx.shape_batch().vertex_count(), 4 * 5 + 3 * 3);
        assert_eq!(ctx.shape_batch().index_count(), 6 * 5 + 3 * 3);

        ctx.render();
        let d = &ctx.backend().draws()[0];
        assert_eq!((d.vertex_count, d.index_count), (29, 39));
        assert_eq!(&d.indices[30..], &[20, 21, 22, 23, 24, 25, 26, 27, 28]);
        assert!(ctx.is_idle());
    }

    #[test]
    fn flush_order_is_fixed_by_kind() {
        let mut ctx = engine();
        let font = FakeFont::single(texture(&mut ctx));
        ctx.draw_text(&Mat4::IDENTITY, "a", &font, &TextParams::default(), Color::WHITE);
        ctx.draw_circle(Vec3::ZERO, Vec2::ONE, Color::BLUE, CircleStyle::FILLED);
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.render();
        assert_eq!(draw_kinds(&ctx), vec![ShaderKind::Shape, ShaderKind::Circle, ShaderKind::Glyph]);
    }

    #[test]
    fn circles_bind_no_texture() {
        let mut ctx = engine();
        ctx.backend_mut().clear_log();
        ctx.draw_circle(Vec3::ZERO, Vec2::ONE, Color::BLUE, CircleStyle::ring(0.2));
        ctx.flush_circles();
        assert!(
            !ctx.backend()
                .calls()
                .iter()
                .any(|c| matches!(c, BackendCall::BindTexture { .. }))
        );
        let circles = ctx.backend().draws()[0].vertices_as::<CircleVertex>();
        assert_eq!(circles[0].thickness, 0.2);
    }

    #[test]
    fn flush_call_sequence() {
        let mut ctx = engine();
        ctx.backend_mut().clear_log();
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.render();
        let calls = ctx.backend().calls();
        assert!(matches!(calls[0], BackendCall::SubmitBuffer { vertex_count: 4, index_count: 6 }));
        assert_eq!(calls[1], BackendCall::SetVertexLayout(ShapeVertex::LAYOUT.len()));
        assert!(matches!(calls[2], BackendCall::BindShader(_)));
        assert!(matches!(calls.last(), Some(BackendCall::DrawIndexed(6))));
    }

    // ── camera ─────────────────────────────────────────────────────────────

    #[test]
    fn projection_is_read_at_flush() {
        let mut ctx = engine();
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        let x = Mat4::from_scale(Vec3::splat(0.5));
        ctx.set_projection(&x);
        ctx.draw_quad(Vec3::ONE, Vec2::ONE, Color::RED);
        ctx.render();

        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertex_count, 8);
        assert_eq!(draws[0].view_projection, Some(x));
    }

    #[test]
    fn default_projection_is_pixel_space() {
        let mut ctx = engine();
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.render();
        let expected = Viewport::new(800.0, 600.0).pixel_projection();
        assert_eq!(ctx.backend().draws()[0].view_projection, Some(expected));
    }

    #[test]
    fn reset_and_resize_projection() {
        let mut ctx = engine();
        let custom = Mat4::from_scale(Vec3::splat(2.0));
        ctx.set_projection(&custom);
        ctx.resize(Viewport::new(100.0, 100.0));
        assert_eq!(ctx.view_projection(), custom);
        ctx.reset_projection();
        assert_eq!(ctx.view_projection(), Viewport::new(100.0, 100.0).pixel_projection());
    }

    // ── text ───────────────────────────────────────────────────────────────

    #[test]
    fn atlas_switch_flushes_everything() {
        let mut ctx = engine();
        let a = texture(&mut ctx);
        let b = texture(&mut ctx);
        let font = FakeFont::split(a, b);

        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.draw_circle(Vec3::ZERO, Vec2::ONE, Color::BLUE, CircleStyle::FILLED);
        ctx.draw_text(&Mat4::IDENTITY, "abCD", &font, &TextParams::default(), Color::WHITE);

        // Switch at 'C' flushed shapes, circles and "ab".
        assert_eq!(draw_kinds(&ctx), vec![ShaderKind::Shape, ShaderKind::Circle, ShaderKind::Glyph]);
        assert_eq!(ctx.glyph_batch().vertex_count(), 8);
        assert_eq!(ctx.bound_atlas().map(|x| x.texture), Some(b));

        ctx.render();
        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[2].textures[0], Some(a));
        assert_eq!(draws[3].textures[0], Some(b));
        assert_eq!(ctx.stats().flushes, 2);
    }

    #[test]
    fn first_glyph_binds_without_flush() {
        let mut ctx = engine();
        let font = FakeFont::single(texture(&mut ctx));
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.draw_text(&Mat4::IDENTITY, "abc", &font, &TextParams::default(), Color::WHITE);
        assert!(ctx.backend().draws().is_empty());
        ctx.render();
        assert_eq!(ctx.bound_atlas(), None);
    }

    #[test]
    fn draw_string_scales_extent() {
        let mut ctx = engine();
        let font = FakeFont::single(texture(&mut ctx));
        let extent = ctx.draw_string(
            Vec3::new(10.0, 20.0, 0.0),
            32.0,
            "ab",
            &font,
            &TextParams::default(),
            Color::WHITE,
        );
        assert!((extent.x - 32.0).abs() < 1e-4);
        let first = ctx.glyph_batch().vertices()[0];
        // plane left 1 unit * 0.05 * 32 + 10
        assert!((first.position[0] - 11.6).abs() < 1e-4);
    }

    #[test]
    fn end_to_end_frame() {
        let mut ctx = engine();
        let t1 = texture(&mut ctx);
        let font = FakeFont::single(texture(&mut ctx));

        ctx.begin_frame();
        ctx.draw_quad(Vec3::new(50.0, 50.0, 0.0), Vec2::splat(20.0), Color::RED);
        ctx.draw_sprite(Vec3::new(100.0, 50.0, 0.0), Vec2::splat(20.0), t1, Color::WHITE, 1.0);
        ctx.draw_circle(Vec3::new(200.0, 50.0, 0.0), Vec2::splat(30.0), Color::GREEN, CircleStyle::FILLED);
        ctx.draw_string(Vec3::new(10.0, 300.0, 0.0), 24.0, "Hi", &font, &TextParams::default(), Color::WHITE);
        ctx.end_frame();

        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 3);
        assert_eq!(draw_kinds(&ctx), vec![ShaderKind::Shape, ShaderKind::Circle, ShaderKind::Glyph]);
        assert_eq!(draws[0].bound_textures(), vec![ctx.white_texture(), t1]);
        let slots: Vec<f32> = draws[0].vertices_as::<ShapeVertex>().iter().map(|v| v.tex_slot).collect();
        assert_eq!(slots, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(draws[2].vertex_count, 8);
        assert!(ctx.is_idle());
        assert_eq!(ctx.slot_table().len(), 1);

        let stats = ctx.stats();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.quads, 5);
        assert_eq!(stats.vertices, 8 + 4 + 8);
        assert_eq!(stats.active_texture_slots, 2);
        assert_eq!(stats.flushes, 1);
    }

    // ── frame lifecycle ────────────────────────────────────────────────────

    #[test]
    fn begin_frame_resets_stats() {
        let mut ctx = engine();
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.end_frame();
        assert_eq!(ctx.stats().draw_calls, 1);
        ctx.begin_frame();
        assert_eq!(ctx.stats(), RenderStats::default());
        assert_eq!(ctx.stats().reserved_texture_slots, 1);
    }

    #[test]
    fn render_target_switch_flushes_first() {
        let mut ctx = engine();
        let target = ctx.create_render_target(64, 64);
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.set_render_target(Some(target));
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::BLUE);
        ctx.set_render_target(None);

        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].render_target, None);
        assert_eq!(draws[1].render_target, Some(target));
        assert_eq!(ctx.render_target(), None);
    }

    #[test]
    fn render_target_texture_can_be_sampled() {
        let mut ctx = engine();
        let target = ctx.create_render_target(32, 32);
        let Some(tex) = ctx.backend().render_target_texture(target) else {
            panic!("target has no texture");
        };
        ctx.draw_sprite(Vec3::ZERO, Vec2::ONE, tex, Color::WHITE, 1.0);
        assert_eq!(ctx.slot_table().find(tex), Some(1));
    }

    #[test]
    fn clear_flushes_pending_geometry() {
        let mut ctx = engine();
        ctx.draw_quad(Vec3::ZERO, Vec2::ONE, Color::RED);
        ctx.clear(Color::BLACK);
        let calls = ctx.backend().calls();
        assert_eq!(calls.last(), Some(&BackendCall::Clear(Color::BLACK)));
        assert_eq!(ctx.backend().draws().len(), 1);
    }
}
