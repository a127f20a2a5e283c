use glam::Vec2;

/// Normalized texture region (`min` is the top-left texel corner).
///
/// Texture space follows the GPU convention: `(0, 0)` is the first row of
/// pixel data, V grows downwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Region covering a pixel rectangle of a `width` x `height` texture.
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, width: u32, height: u32) -> Self {
        let inv = Vec2::new(1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32);
        Self {
            min: Vec2::new(x, y) * inv,
            max: Vec2::new(x + w, y + h) * inv,
        }
    }

    /// Maps a coordinate of the unit square into this region.
    #[inline]
    pub fn map(self, t: [f32; 2]) -> [f32; 2] {
        (self.min + Vec2::from(t) * (self.max - self.min)).to_array()
    }

    /// Texture coordinates for the four corners of a quad, in the order
    /// bottom-left, bottom-right, top-right, top-left (world space, +Y up).
    #[inline]
    pub fn quad_corners(self) -> [[f32; 2]; 4] {
        [
            [self.min.x, self.max.y],
            [self.max.x, self.max.y],
            [self.max.x, self.min.y],
            [self.min.x, self.min.y],
        ]
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}
