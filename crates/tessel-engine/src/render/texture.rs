use glam::Vec2;

use crate::coords::UvRect;

use super::handle::TextureId;

/// A texture plus the region of it a sprite samples.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SubTexture {
    pub texture: TextureId,
    pub region: UvRect,
}

impl SubTexture {
    /// The whole texture.
    #[inline]
    pub const fn full(texture: TextureId) -> Self {
        Self {
            texture,
            region: UvRect::FULL,
        }
    }

    /// A cell of a sprite sheet laid out on a regular grid.
    ///
    /// `coords` counts cells from the top-left of the sheet, `cell_size` is
    /// in pixels and `sprite_cells` is the sprite's size in cells (1x1 for a
    /// single tile).
    pub fn from_cell(
        texture: TextureId,
        sheet_size: (u32, u32),
        coords: Vec2,
        cell_size: Vec2,
        sprite_cells: Vec2,
    ) -> Self {
        let origin = coords * cell_size;
        let size = sprite_cells * cell_size;
        Self {
            texture,
            region: UvRect::from_pixels(
                origin.x,
                origin.y,
                size.x,
                size.y,
                sheet_size.0,
                sheet_size.1,
            ),
        }
    }
}

impl From<TextureId> for SubTexture {
    fn from(texture: TextureId) -> Self {
        Self::full(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_maps_to_region() {
        let s = SubTexture::from_cell(
            TextureId(2),
            (256, 128),
            Vec2::new(1.0, 0.0),
            Vec2::new(64.0, 64.0),
            Vec2::new(1.0, 2.0),
        );
        assert_eq!(s.region.min, Vec2::new(0.25, 0.0));
        assert_eq!(s.region.max, Vec2::new(0.5, 1.0));
    }
}
