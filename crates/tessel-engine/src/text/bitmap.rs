//! Glyph atlases rasterized with `fontdue`.

use std::collections::HashMap;
use std::fmt;

use crate::render::{GpuBackend, TextureDesc};

use super::font::{AtlasRef, Bounds, FontMetrics, GlyphProvider, GlyphRecord};

// ── errors ────────────────────────────────────────────────────────────────

/// Error returned by [`BitmapFont::from_bytes`].
#[derive(Debug, Clone, PartialEq)]
pub enum FontLoadError {
    /// The bytes are not a font `fontdue` can parse.
    Parse(String),
    /// The font has no horizontal line metrics.
    MissingMetrics,
    /// A glyph does not fit on an empty page.
    GlyphTooLarge { ch: char, width: u32, height: u32, page_size: u32 },
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadError::Parse(msg) => write!(f, "font load error: {msg}"),
            FontLoadError::MissingMetrics => {
                write!(f, "font load error: no horizontal line metrics")
            }
            FontLoadError::GlyphTooLarge { ch, width, height, page_size } => write!(
                f,
                "font load error: glyph {ch:?} ({width}x{height}) \
                 does not fit a {page_size}px atlas page"
            ),
        }
    }
}

impl std::error::Error for FontLoadError {}

// ── config ────────────────────────────────────────────────────────────────

/// How a font is rasterized into atlas pages.
#[derive(Debug, Clone)]
pub struct FontAtlasConfig {
    /// Rasterization size in pixels.
    pub pixel_size: f32,
    /// Width and height of every atlas page.
    pub page_size: u32,
    /// Empty pixels around each glyph.
    pub padding: u32,
    /// Characters to rasterize up front.
    pub charset: String,
}

impl Default for FontAtlasConfig {
    fn default() -> Self {
        Self {
            pixel_size: 48.0,
            page_size: 512,
            padding: 1,
            charset: (' '..='~').collect(),
        }
    }
}

// ── shelf packing ─────────────────────────────────────────────────────────

/// Size of one glyph bitmap to place.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlyphSize {
    pub ch: char,
    pub width: u32,
    pub height: u32,
}

/// Where a glyph bitmap landed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Placement {
    pub page: usize,
    pub x: u32,
    pub y: u32,
}

/// Row ("shelf") packing across fixed-size pages, in input order.
///
/// Zero-area glyphs get `(page 0, 0, 0)` and take no space. Returns the
/// placements and the number of pages used (at least one).
pub fn pack(
    glyphs: &[GlyphSize],
    page_size: u32,
    padding: u32,
) -> Result<(Vec<Placement>, usize), FontLoadError> {
    let mut out = Vec::with_capacity(glyphs.len());
    let mut page = 0usize;
    let mut x = padding;
    let mut y = padding;
    let mut row_height = 0u32;

    for g in glyphs {
        if g.width == 0 || g.height == 0 {
            out.push(Placement { page: 0, x: 0, y: 0 });
            continue;
        }
        if g.width + 2 * padding > page_size || g.height + 2 * padding > page_size {
            return Err(FontLoadError::GlyphTooLarge {
                ch: g.ch,
                width: g.width,
                height: g.height,
                page_size,
            });
        }

        if x + g.width + padding > page_size {
            x = padding;
            y += row_height + padding;
            row_height = 0;
        }
        if y + g.height + padding > page_size {
            page += 1;
            x = padding;
            y = padding;
            row_height = 0;
        }

        out.push(Placement { page, x, y });
        x += g.width + padding;
        row_height = row_height.max(g.height);
    }

    Ok((out, page + 1))
}

// ── font ──────────────────────────────────────────────────────────────────

/// A TrueType/OpenType font pre-rasterized into one or more atlas pages.
///
/// Metrics, plane bounds and advances are in pixels at `pixel_size`; the
/// shaper normalizes them, so the same font renders at any size.
pub struct BitmapFont {
    font: fontdue::Font,
    pixel_size: f32,
    metrics: FontMetrics,
    glyphs: HashMap<char, GlyphRecord>,
    pages: Vec<AtlasRef>,
}

impl BitmapFont {
    /// Parses `bytes`, rasterizes `config.charset` and uploads the pages
    /// through `backend`.
    pub fn from_bytes<B: GpuBackend + ?Sized>(
        backend: &mut B,
        bytes: &[u8],
        config: &FontAtlasConfig,
    ) -> Result<Self, FontLoadError> {
        let settings = fontdue::FontSettings {
            scale: config.pixel_size,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(bytes, settings)
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;

        let line = font
            .horizontal_line_metrics(config.pixel_size)
            .ok_or(FontLoadError::MissingMetrics)?;
        let metrics = FontMetrics {
            ascender: line.ascent,
            descender: line.descent,
            line_height: line.new_line_size,
        };

        let mut seen = std::collections::HashSet::new();
        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = config
            .charset
            .chars()
            .filter(|&c| seen.insert(c))
            .filter(|&c| c == ' ' || font.lookup_glyph_index(c) != 0)
            .map(|c| {
                let (m, bitmap) = font.rasterize(c, config.pixel_size);
                (c, m, bitmap)
            })
            .collect();

        let sizes: Vec<GlyphSize> = rasterized
            .iter()
            .map(|(ch, m, _)| GlyphSize {
                ch: *ch,
                width: m.width as u32,
                height: m.height as u32,
            })
            .collect();
        let (placements, page_count) = pack(&sizes, config.page_size, config.padding)?;

        // White RGB, coverage in alpha.
        let side = config.page_size as usize;
        let mut page_pixels: Vec<Vec<u8>> = (0..page_count)
            .map(|_| [255u8, 255, 255, 0].repeat(side * side))
            .collect();

        for ((_, m, bitmap), p) in rasterized.iter().zip(&placements) {
            let Some(pixels) = page_pixels.get_mut(p.page) else { continue };
            for gy in 0..m.height {
                for gx in 0..m.width {
                    let dst = ((p.y as usize + gy) * side + p.x as usize + gx) * 4 + 3;
                    pixels[dst] = bitmap[gy * m.width + gx];
                }
            }
        }

        let pages: Vec<AtlasRef> = page_pixels
            .iter()
            .enumerate()
            .map(|(i, pixels)| {
                let label = format!("font atlas page {i}");
                let desc = TextureDesc::new(config.page_size, config.page_size, label);
                let texture = backend.create_texture(&desc, pixels);
                log::debug!(
                    "BitmapFont: uploaded atlas page {i} ({0}x{0}) as {texture:?}",
                    config.page_size
                );
                AtlasRef {
                    texture,
                    width: config.page_size,
                    height: config.page_size,
                }
            })
            .collect();

        let glyphs = rasterized
            .iter()
            .zip(&placements)
            .map(|((ch, m, _), p)| {
                let (w, h) = (m.width as f32, m.height as f32);
                let (x, y) = (p.x as f32, p.y as f32);
                let record = GlyphRecord {
                    atlas: pages[p.page],
                    atlas_bounds: Bounds::new(x, y + h, x + w, y),
                    plane_bounds: Bounds::new(
                        m.xmin as f32,
                        m.ymin as f32,
                        m.xmin as f32 + w,
                        m.ymin as f32 + h,
                    ),
                    advance: m.advance_width,
                };
                (*ch, record)
            })
            .collect();

        log::debug!(
            "BitmapFont: {} glyphs at {}px on {} page(s)",
            rasterized.len(),
            config.pixel_size,
            page_count
        );

        Ok(Self {
            font,
            pixel_size: config.pixel_size,
            metrics,
            glyphs,
            pages,
        })
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Atlas pages in creation order.
    #[inline]
    pub fn pages(&self) -> &[AtlasRef] {
        &self.pages
    }
}

impl GlyphProvider for BitmapFont {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph(&self, ch: char) -> Option<GlyphRecord> {
        self.glyphs.get(&ch).copied()
    }

    fn kerning(&self, left: char, right: char) -> f32 {
        self.font
            .horizontal_kern(left, right, self.pixel_size)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sz(ch: char, width: u32, height: u32) -> GlyphSize {
        GlyphSize { ch, width, height }
    }

    #[test]
    fn packs_along_rows() {
        let (p, pages) = pack(&[sz('a', 10, 10), sz('b', 10, 12)], 64, 1).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(p[0], Placement { page: 0, x: 1, y: 1 });
        assert_eq!(p[1], Placement { page: 0, x: 12, y: 1 });
    }

    #[test]
    fn wraps_to_next_row() {
        let (p, _) = pack(&[sz('a', 20, 10), sz('b', 20, 14), sz('c', 20, 5)], 50, 1).unwrap();
        assert_eq!(p[2], Placement { page: 0, x: 1, y: 16 });
    }

    #[test]
    fn full_page_opens_another() {
        let glyphs: Vec<GlyphSize> = (0..5).map(|_| sz('x', 14, 14)).collect();
        // Two glyphs per row, two rows per page.
        let (p, pages) = pack(&glyphs, 32, 1).unwrap();
        assert_eq!(pages, 2);
        assert_eq!(p[3].page, 0);
        assert_eq!(p[4], Placement { page: 1, x: 1, y: 1 });
    }

    #[test]
    fn empty_glyphs_take_no_space() {
        let (p, pages) = pack(&[sz(' ', 0, 0), sz('a', 4, 4)], 16, 1).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(p[1], Placement { page: 0, x: 1, y: 1 });
    }

    #[test]
    fn oversized_glyph_is_an_error() {
        let err = pack(&[sz('W', 40, 8)], 32, 1).unwrap_err();
        assert!(matches!(err, FontLoadError::GlyphTooLarge { ch: 'W', .. }));
        assert!(err.to_string().contains("'W'"));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let mut backend = crate::render::RecordingBackend::new();
        let result = BitmapFont::from_bytes(&mut backend, b"not a font", &FontAtlasConfig::default());
        assert!(matches!(result, Err(FontLoadError::Parse(_))));
        assert!(backend.textures().is_empty());
    }
}
