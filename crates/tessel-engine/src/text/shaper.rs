use glam::Vec2;

use super::font::{AtlasRef, GlyphProvider};

/// Layout knobs applied on top of the font's own metrics.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextParams {
    /// Extra advance after every glyph, in font units.
    pub kerning: f32,
    /// Extra gap between lines, in normalized (line box = 1.0) units.
    pub line_spacing: f32,
}

/// One glyph quad produced by [`layout_text`], in text-local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub atlas: AtlasRef,
    pub min: Vec2,
    pub max: Vec2,
    /// Bottom-left, bottom-right, top-right, top-left.
    pub uv: [[f32; 2]; 4],
}

const TAB_WIDTH: f32 = 4.0;
const FALLBACK: char = '?';

/// Walks `text` with a pen cursor and calls `emit` for every visible glyph.
///
/// The first baseline is at y = 0 and lines stack downwards. Returns the
/// extent: the widest line's final pen x, and the height of all line boxes.
pub fn layout_text(
    text: &str,
    font: &dyn GlyphProvider,
    params: &TextParams,
    mut emit: impl FnMut(PlacedGlyph),
) -> Vec2 {
    let metrics = font.metrics();
    let font_scale = metrics.font_scale();
    let line_advance = font_scale * metrics.line_height + params.line_spacing;

    let mut pen = Vec2::ZERO;
    let mut width = 0.0_f32;
    let mut lines = 1u32;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\n' => {
                width = width.max(pen.x);
                pen.x = 0.0;
                pen.y -= line_advance;
                lines += 1;
                continue;
            }
            '\r' => continue,
            '\t' => {
                let space = font.glyph(' ').map_or(0.0, |g| g.advance);
                pen.x += TAB_WIDTH * font_scale * (space + params.kerning);
                continue;
            }
            _ => {}
        }

        let Some(glyph) = font.glyph(ch).or_else(|| font.glyph(FALLBACK)) else {
            continue;
        };

        let plane = glyph.plane_bounds;
        if !plane.is_empty() {
            emit(PlacedGlyph {
                atlas: glyph.atlas,
                min: pen + Vec2::new(plane.left, plane.bottom) * font_scale,
                max: pen + Vec2::new(plane.right, plane.top) * font_scale,
                uv: glyph.uv_corners(),
            });
        }

        let pair = chars.peek().map_or(0.0, |&next| font.kerning(ch, next));
        pen.x += font_scale * (glyph.advance + params.kerning + pair);
    }

    width = width.max(pen.x);
    Vec2::new(width, 1.0 + (lines - 1) as f32 * line_advance)
}

/// Extent `layout_text` would report, without producing any glyphs.
pub fn measure_text(text: &str, font: &dyn GlyphProvider, params: &TextParams) -> Vec2 {
    layout_text(text, font, params, |_| {})
}


#[cfg(test)]
mod tests {
    use super::fake::FakeFont;
    use super::*;
    use crate::render::TextureId;

    fn font() -> FakeFont {
        FakeFont::single(TextureId(9))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── cursor ─────────────────────────────────────────────────────────────

    #[test]
    fn advances_in_normalized_units() {
        let mut placed = Vec::new();
        let extent = layout_text("ab", &font(), &TextParams::default(), |g| placed.push(g));
        assert_eq!(placed.len(), 2);
        // 10 units * 0.05
        assert!(approx(placed[1].min.x - placed[0].min.x, 0.5));
        assert!(approx(extent.x, 1.0));
        assert!(approx(extent.y, 1.0));
    }

    #[test]
    fn quad_comes_from_plane_bounds() {
        let mut placed = Vec::new();
        layout_text("x", &font(), &TextParams::default(), |g| placed.push(g));
        let g = placed[0];
        assert!(approx(g.min.x, 0.05) && approx(g.min.y, -0.1));
        assert!(approx(g.max.x, 0.45) && approx(g.max.y, 0.6));
        assert_eq!(g.uv[0], [0.0, 0.25]);
        assert_eq!(g.uv[2], [0.125, 0.0]);
    }

    #[test]
    fn newline_resets_x_and_moves_down() {
        let params = TextParams { kerning: 0.0, line_spacing: 0.25 };
        let mut placed = Vec::new();
        let extent = layout_text("ab\nc", &font(), &params, |g| placed.push(g));
        let line_advance = 0.05 * 30.0 + 0.25;
        assert!(approx(placed[2].min.x, placed[0].min.x));
        assert!(approx(placed[0].min.y - placed[2].min.y, line_advance));
        assert!(approx(extent.x, 1.0));
        assert!(approx(extent.y, 1.0 + line_advance));
    }

    #[test]
    fn kerning_param_and_pairs_add_to_advance() {
        let mut f = font();
        f.pair_kerning = -4.0;
        let params = TextParams { kerning: 2.0, line_spacing: 0.0 };
        let extent = measure_text("AV", &f, &params);
        // (10 + 2 - 4) * 0.05 + (10 + 2) * 0.05
        assert!(approx(extent.x, 0.4 + 0.6));
    }

    // ── special characters ─────────────────────────────────────────────────

    #[test]
    fn space_advances_without_quad() {
        let mut placed = Vec::new();
        let extent = layout_text("a b", &font(), &TextParams::default(), |g| placed.push(g));
        assert_eq!(placed.len(), 2);
        assert!(approx(extent.x, 1.5));
    }

    #[test]
    fn tab_is_four_spaces_and_cr_is_ignored() {
        let params = TextParams::default();
        assert!(approx(measure_text("\t", &font(), &params).x, 2.0));
        assert_eq!(measure_text("a\r\nb", &font(), &params), measure_text("a\nb", &font(), &params));
    }

    #[test]
    fn missing_glyph_falls_back_to_question_mark() {
        let mut placed = 0;
        let extent = layout_text("é", &font(), &TextParams::default(), |_| placed += 1);
        assert_eq!(placed, 1);
        assert!(approx(extent.x, 0.5));
    }

    // ── measure ────────────────────────────────────────────────────────────

    #[test]
    fn measure_matches_layout() {
        let params = TextParams { kerning: 1.0, line_spacing: 0.1 };
        let text = "hello\nlonger line\nx";
        let laid = layout_text(text, &font(), &params, |_| {});
        assert_eq!(measure_text(text, &font(), &params), laid);
    }

    #[test]
    fn empty_string_is_one_empty_line() {
        assert_eq!(measure_text("", &font(), &TextParams::default()), Vec2::new(0.0, 1.0));
    }
}
