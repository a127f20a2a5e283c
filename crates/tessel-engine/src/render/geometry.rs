//! Vertex record builders.
//!
//! Pure functions from a drawing request to a fixed set of vertices. Index
//! patterns are relative to the first vertex of the primitive; [`Batch`]
//! rebases them when appending.
//!
//! [`Batch`]: super::Batch

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::coords::UvRect;
use crate::paint::Color;

use super::vertex::{CircleVertex, GlyphVertex, ShapeVertex};

// ── index patterns ────────────────────────────────────────────────────────

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];
pub const TRIANGLE_INDICES: [u32; 3] = [0, 1, 2];

// ── unit primitives ───────────────────────────────────────────────────────

/// Unit quad centered on the origin: bottom-left, bottom-right, top-right, top-left.
pub const UNIT_QUAD: [Vec3; 4] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

/// Unit triangle centered on the origin, apex up.
pub const UNIT_TRIANGLE: [Vec3; 3] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.0, 0.5, 0.0),
];

const TRIANGLE_UV: [[f32; 2]; 3] = [[0.0, 1.0], [1.0, 1.0], [0.5, 0.0]];

/// Model matrix placing a unit primitive: translate, then rotate about Z
/// (radians, counter-clockwise), then scale.
pub fn transform(position: Vec3, size: Vec2, rotation: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        size.extend(1.0),
        Quat::from_rotation_z(rotation),
        position,
    )
}

#[inline]
fn corner(transform: &Mat4, p: Vec3) -> [f32; 3] {
    transform.transform_point3(p).to_array()
}

// ── shapes ────────────────────────────────────────────────────────────────

/// Four shape vertices for a quad. `slot` is the texture slot index (0 is
/// white, i.e. a flat color).
pub fn shape_quad(
    transform: &Mat4,
    color: Color,
    uv: UvRect,
    slot: u32,
    tiling: f32,
) -> [ShapeVertex; 4] {
    let color = color.to_array();
    let uv = uv.quad_corners();
    std::array::from_fn(|i| ShapeVertex {
        position: corner(transform, UNIT_QUAD[i]),
        color,
        tex_coord: uv[i],
        tex_slot: slot as f32,
        tiling,
    })
}

/// Three shape vertices for a triangle. The apex samples the middle of the
/// region's top edge.
pub fn shape_triangle(
    transform: &Mat4,
    color: Color,
    uv: UvRect,
    slot: u32,
    tiling: f32,
) -> [ShapeVertex; 3] {
    let color = color.to_array();
    std::array::from_fn(|i| ShapeVertex {
        position: corner(transform, UNIT_TRIANGLE[i]),
        color,
        tex_coord: uv.map(TRIANGLE_UV[i]),
        tex_slot: slot as f32,
        tiling,
    })
}

// ── circles ───────────────────────────────────────────────────────────────

/// Four circle vertices for the bounding quad of a circle.
///
/// The fragment stage derives the radial mask from `tex_coord`, which spans
/// the unit square.
pub fn circle_quad(transform: &Mat4, color: Color, thickness: f32, fade: f32) -> [CircleVertex; 4] {
    let color = color.to_array();
    let uv = UvRect::FULL.quad_corners();
    std::array::from_fn(|i| CircleVertex {
        position: corner(transform, UNIT_QUAD[i]),
        color,
        tex_coord: uv[i],
        thickness,
        fade,
    })
}

// ── glyphs ────────────────────────────────────────────────────────────────

/// Four glyph vertices for a text-local rectangle `[min, max]`.
///
/// `uv` is ordered like the quad corners: bottom-left, bottom-right,
/// top-right, top-left.
pub fn glyph_quad(
    transform: &Mat4,
    min: Vec2,
    max: Vec2,
    uv: [[f32; 2]; 4],
    color: Color,
) -> [GlyphVertex; 4] {
    let color = color.to_array();
    let corners = [
        Vec3::new(min.x, min.y, 0.0),
        Vec3::new(max.x, min.y, 0.0),
        Vec3::new(max.x, max.y, 0.0),
        Vec3::new(min.x, max.y, 0.0),
    ];
    std::array::from_fn(|i| GlyphVertex {
        position: corner(transform, corners[i]),
        color,
        tex_coord: uv[i],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn position_is_quad_center() {
        let m = transform(Vec3::new(100.0, 50.0, 0.0), Vec2::new(20.0, 10.0), 0.0);
        let q = shape_quad(&m, Color::RED, UvRect::FULL, 0, 1.0);
        assert!(approx(q[0].position, [90.0, 45.0, 0.0]));
        assert!(approx(q[2].position, [110.0, 55.0, 0.0]));
        assert_eq!(q[1].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rotation_is_counter_clockwise() {
        let m = transform(Vec3::ZERO, Vec2::splat(2.0), std::f32::consts::FRAC_PI_2);
        let q = shape_quad(&m, Color::WHITE, UvRect::FULL, 0, 1.0);
        // Bottom-right corner (1, -1) rotates to (1, 1).
        assert!(approx(q[1].position, [1.0, 1.0, 0.0]));
    }

    #[test]
    fn slot_and_tiling_are_written() {
        let q = shape_quad(&Mat4::IDENTITY, Color::WHITE, UvRect::FULL, 7, 3.0);
        assert!(q.iter().all(|v| v.tex_slot == 7.0 && v.tiling == 3.0));
        let t = shape_triangle(&Mat4::IDENTITY, Color::WHITE, UvRect::FULL, 0, 1.0);
        assert!(t.iter().all(|v| v.tex_slot == 0.0));
        assert!(approx(t[2].position, [0.0, 0.5, 0.0]));
    }

    #[test]
    fn triangle_uv_follows_region() {
        let region = UvRect::new(Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.5));
        let t = shape_triangle(&Mat4::IDENTITY, Color::WHITE, region, 3, 2.0);
        assert_eq!(t[0].tex_coord, [0.5, 0.5]);
        assert_eq!(t[1].tex_coord, [1.0, 0.5]);
        assert_eq!(t[2].tex_coord, [0.75, 0.0]);
        assert!(t.iter().all(|v| v.tex_slot == 3.0 && v.tiling == 2.0));
    }

    #[test]
    fn circle_uv_spans_unit_square() {
        let c = circle_quad(&Mat4::IDENTITY, Color::BLUE, 1.0, 0.005);
        assert_eq!(c[0].tex_coord, [0.0, 1.0]);
        assert_eq!(c[2].tex_coord, [1.0, 0.0]);
        assert!(c.iter().all(|v| v.thickness == 1.0 && v.fade == 0.005));
    }

    #[test]
    fn glyph_quad_keeps_corner_order() {
        let uv = [[0.0, 0.5], [0.5, 0.5], [0.5, 0.0], [0.0, 0.0]];
        let g = glyph_quad(&Mat4::IDENTITY, Vec2::new(0.0, -0.2), Vec2::new(0.5, 0.7), uv, Color::WHITE);
        assert!(approx(g[0].position, [0.0, -0.2, 0.0]));
        assert!(approx(g[2].position, [0.5, 0.7, 0.0]));
        assert_eq!(g[3].tex_coord, [0.0, 0.0]);
    }
}
