//! Text: glyph providers and the cursor-based shaper.
//!
//! Font units are whatever the provider reports; the shaper normalizes them
//! so one line box (ascender to descender) is 1.0 tall in text-local space.
//! A transform then places and sizes the block.

mod bitmap;
mod font;
mod shaper;

pub use bitmap::{BitmapFont, FontAtlasConfig, FontLoadError};
pub use font::{AtlasRef, Bounds, FontMetrics, GlyphProvider, GlyphRecord};
pub use shaper::{PlacedGlyph, TextParams, layout_text, measure_text};

#[cfg(test)]
pub(crate) use shaper::fake;
