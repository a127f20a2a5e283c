//! CPU-side vertex records, one type per primitive kind.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use super::backend::VertexElement;

/// A vertex record with a fixed attribute layout.
pub trait Vertex: Pod {
    const LAYOUT: &'static [VertexElement];
}

// ── shape ─────────────────────────────────────────────────────────────────

/// Vertex for flat and textured quads/triangles.
///
/// `tex_slot` is an integer stored as `f32`; the shader truncates it to pick
/// one of the bound texture units. `tiling` scales `tex_coord`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    pub tex_slot: f32,
    pub tiling: f32,
}

impl Vertex for ShapeVertex {
    const LAYOUT: &'static [VertexElement] = &[
        VertexElement::float(0, 3, size_of::<ShapeVertex>(), offset_of!(ShapeVertex, position)),
        VertexElement::float(1, 4, size_of::<ShapeVertex>(), offset_of!(ShapeVertex, color)),
        VertexElement::float(2, 2, size_of::<ShapeVertex>(), offset_of!(ShapeVertex, tex_coord)),
        VertexElement::float(3, 1, size_of::<ShapeVertex>(), offset_of!(ShapeVertex, tex_slot)),
        VertexElement::float(4, 1, size_of::<ShapeVertex>(), offset_of!(ShapeVertex, tiling)),
    ];
}

// ── circle ────────────────────────────────────────────────────────────────

/// Vertex for circles. `tex_coord` spans the unit square of the bounding quad
/// and drives the radial mask; circles never sample a texture.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CircleVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    pub thickness: f32,
    pub fade: f32,
}

impl Vertex for CircleVertex {
    const LAYOUT: &'static [VertexElement] = &[
        VertexElement::float(0, 3, size_of::<CircleVertex>(), offset_of!(CircleVertex, position)),
        VertexElement::float(1, 4, size_of::<CircleVertex>(), offset_of!(CircleVertex, color)),
        VertexElement::float(2, 2, size_of::<CircleVertex>(), offset_of!(CircleVertex, tex_coord)),
        VertexElement::float(3, 1, size_of::<CircleVertex>(), offset_of!(CircleVertex, thickness)),
        VertexElement::float(4, 1, size_of::<CircleVertex>(), offset_of!(CircleVertex, fade)),
    ];
}

// ── glyph ─────────────────────────────────────────────────────────────────

/// Vertex for text quads sampled from the bound font atlas.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

impl Vertex for GlyphVertex {
    const LAYOUT: &'static [VertexElement] = &[
        VertexElement::float(0, 3, size_of::<GlyphVertex>(), offset_of!(GlyphVertex, position)),
        VertexElement::float(1, 4, size_of::<GlyphVertex>(), offset_of!(GlyphVertex, color)),
        VertexElement::float(2, 2, size_of::<GlyphVertex>(), offset_of!(GlyphVertex, tex_coord)),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered_bytes(layout: &[VertexElement]) -> u32 {
        layout.iter().map(|e| e.size()).sum()
    }

    #[test]
    fn layouts_cover_whole_record() {
        assert_eq!(covered_bytes(ShapeVertex::LAYOUT), size_of::<ShapeVertex>() as u32);
        assert_eq!(covered_bytes(CircleVertex::LAYOUT), size_of::<CircleVertex>() as u32);
        assert_eq!(covered_bytes(GlyphVertex::LAYOUT), size_of::<GlyphVertex>() as u32);
    }

    #[test]
    fn shape_slot_follows_tex_coord() {
        let layout = ShapeVertex::LAYOUT;
        assert_eq!(layout[3].offset, layout[2].offset + 8);
        assert!(layout.iter().all(|e| e.stride == 44));
    }

    #[test]
    fn locations_are_sequential() {
        for layout in [ShapeVertex::LAYOUT, CircleVertex::LAYOUT, GlyphVertex::LAYOUT] {
            for (i, e) in layout.iter().enumerate() {
                assert_eq!(e.location, i as u32);
            }
        }
    }
}
