use crate::render::TextureId;

/// Identity and size of the texture backing a set of glyphs.
///
/// Two refs name the same atlas when their textures are equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AtlasRef {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Axis-aligned box given by its four edges.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Bounds {
    #[inline]
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self { left, bottom, right, top }
    }

    /// True when the box encloses no area (whitespace glyphs).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right == self.left || self.top == self.bottom
    }
}

/// Vertical font metrics, in font units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontMetrics {
    pub ascender: f32,
    /// Usually negative.
    pub descender: f32,
    pub line_height: f32,
}

impl FontMetrics {
    /// Factor normalizing font units so that ascender to descender spans 1.0.
    pub fn font_scale(&self) -> f32 {
        let span = self.ascender - self.descender;
        if span > 0.0 { 1.0 / span } else { 1.0 }
    }
}

/// Everything the shaper needs to place one glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphRecord {
    pub atlas: AtlasRef,
    /// Pixel rectangle in the atlas, top-left origin (`bottom > top`).
    pub atlas_bounds: Bounds,
    /// Quad relative to the pen position on the baseline, +Y up, font units.
    pub plane_bounds: Bounds,
    pub advance: f32,
}

impl GlyphRecord {
    /// Atlas UVs for the quad corners bottom-left, bottom-right, top-right,
    /// top-left.
    pub fn uv_corners(&self) -> [[f32; 2]; 4] {
        let w = self.atlas.width.max(1) as f32;
        let h = self.atlas.height.max(1) as f32;
        let a = &self.atlas_bounds;
        let (l, r, b, t) = (a.left / w, a.right / w, a.bottom / h, a.top / h);
        [[l, b], [r, b], [r, t], [l, t]]
    }
}

/// Source of glyph records and metrics for one font.
pub trait GlyphProvider {
    fn metrics(&self) -> FontMetrics;

    /// Record for `ch`, or `None` when the font does not cover it.
    fn glyph(&self, ch: char) -> Option<GlyphRecord>;

    /// Extra advance between `left` and `right`, in font units.
    fn kerning(&self, _left: char, _right: char) -> f32 {
        0.0
    }
}

impl<P: GlyphProvider + ?Sized> GlyphProvider for &P {
    fn metrics(&self) -> FontMetrics {
        (**self).metrics()
    }

    fn glyph(&self, ch: char) -> Option<GlyphRecord> {
        (**self).glyph(ch)
    }

    fn kerning(&self, left: char, right: char) -> f32 {
        (**self).kerning(left, right)
    }
}
