use super::backend::BufferUpload;
use super::geometry::{QUAD_INDICES, TRIANGLE_INDICES};
use super::vertex::Vertex;

/// Append-only vertex/index accumulator for one primitive kind.
///
/// Indices are absolute into the vertex list. Clearing keeps the allocation,
/// so a batch sized once at startup stops allocating after the first frames.
#[derive(Debug, Clone)]
pub struct Batch<V> {
    vertices: Vec<V>,
    indices: Vec<u32>,
}

impl<V: Vertex> Batch<V> {
    /// Batch with room for `quads` quads before growing.
    pub fn with_quad_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
        }
    }

    pub fn push_quad(&mut self, quad: [V; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&quad);
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    pub fn push_triangle(&mut self, tri: [V; 3]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&tri);
        self.indices.extend(TRIANGLE_INDICES.iter().map(|i| base + i));
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw view of both arrays for [`GpuBackend::submit_buffer`](super::GpuBackend::submit_buffer).
    pub fn upload(&self) -> BufferUpload<'_> {
        BufferUpload {
            vertices: bytemuck::cast_slice(&self.vertices),
            vertex_size: std::mem::size_of::<V>() as u32,
            vertex_count: self.vertex_count(),
            indices: bytemuck::cast_slice(&self.indices),
            index_size: std::mem::size_of::<u32>() as u32,
            index_count: self.index_count(),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GlyphVertex;

    fn v(x: f32) -> GlyphVertex {
        GlyphVertex {
            position: [x, 0.0, 0.0],
            color: [1.0; 4],
            tex_coord: [0.0; 2],
        }
    }

    #[test]
    fn quads_offset_indices_by_base() {
        let mut b = Batch::<GlyphVertex>::with_quad_capacity(2);
        b.push_quad([v(0.0), v(1.0), v(2.0), v(3.0)]);
        b.push_quad([v(4.0), v(5.0), v(6.0), v(7.0)]);
        assert_eq!(b.vertex_count(), 8);
        assert_eq!(b.indices(), &[0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn triangle_after_quad() {
        let mut b = Batch::<GlyphVertex>::with_quad_capacity(0);
        b.push_quad([v(0.0); 4]);
        b.push_triangle([v(0.0); 3]);
        assert_eq!((b.vertex_count(), b.index_count()), (7, 9));
        assert_eq!(&b.indices()[6..], &[4, 5, 6]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut b = Batch::<GlyphVertex>::with_quad_capacity(8);
        b.push_quad([v(0.0); 4]);
        let cap = b.vertices.capacity();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.vertex_count(), 0);
        assert_eq!(b.vertices.capacity(), cap);
    }

    #[test]
    fn upload_describes_bytes() {
        let mut b = Batch::<GlyphVertex>::with_quad_capacity(1);
        b.push_quad([v(0.0); 4]);
        let up = b.upload();
        assert_eq!(up.vertex_size, 36);
        assert_eq!(up.vertices.len(), 4 * 36);
        assert_eq!(up.indices.len(), 6 * 4);
        assert_eq!((up.vertex_count, up.index_count), (4, 6));
    }
}
