use tessel_engine::paint::Color;
use tessel_engine::render::{GpuBackend, RenderContext, TextureDesc, TextureId};
use tessel_engine::text::{BitmapFont, FontAtlasConfig};

/// Font used when `TESSEL_FONT` is unset.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// More distinct textures than a shape batch has slots.
pub const SWATCH_COUNT: usize = 24;

pub const SHEET_CELL: u32 = 16;
pub const SHEET_CELLS: u32 = 4;

/// Textures and the font the demo scene draws with.
pub struct Assets {
    pub checker: TextureId,
    pub sheet: TextureId,
    pub swatches: Vec<TextureId>,
    pub font: Option<BitmapFont>,
}

impl Assets {
    pub fn load<B: GpuBackend>(renderer: &mut RenderContext<B>) -> Self {
        let checker =
            renderer.create_texture(&TextureDesc::new(8, 8, "checker"), &checker_pixels(8));

        let side = SHEET_CELL * SHEET_CELLS;
        let sheet =
            renderer.create_texture(&TextureDesc::new(side, side, "sheet"), &sheet_pixels());

        let swatches = (0..SWATCH_COUNT)
            .map(|i| {
                let c = hue(i as f32 / SWATCH_COUNT as f32);
                renderer.create_texture(
                    &TextureDesc::new(1, 1, format!("swatch {i}")),
                    &rgba8(c),
                )
            })
            .collect();

        let font = load_font().and_then(|bytes| {
            BitmapFont::from_bytes(renderer.backend_mut(), &bytes, &FontAtlasConfig::default())
                .inspect_err(|e| log::warn!("studio: font rejected: {e}"))
                .ok()
        });

        Self {
            checker,
            sheet,
            swatches,
            font,
        }
    }
}

fn load_font() -> Option<Vec<u8>> {
    if let Ok(path) = std::env::var("TESSEL_FONT") {
        match std::fs::read(&path) {
            Ok(bytes) => return Some(bytes),
            Err(e) => log::warn!("studio: cannot read TESSEL_FONT={path}: {e}"),
        }
    }
    let found = FONT_CANDIDATES.iter().find_map(|p| std::fs::read(p).ok());
    if found.is_none() {
        log::warn!("studio: no font found, text is disabled (set TESSEL_FONT)");
    }
    found
}

fn checker_pixels(side: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let v = if (x + y) % 2 == 0 { 230 } else { 60 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    pixels
}

// One hue per cell, row-major from the top-left.
fn sheet_pixels() -> Vec<u8> {
    let side = SHEET_CELL * SHEET_CELLS;
    let mut pixels = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let cell = (y / SHEET_CELL) * SHEET_CELLS + x / SHEET_CELL;
            let edge = x % SHEET_CELL == 0 || y % SHEET_CELL == 0;
            let c = if edge {
                Color::BLACK
            } else {
                hue(cell as f32 / (SHEET_CELLS * SHEET_CELLS) as f32)
            };
            pixels.extend_from_slice(&rgba8(c));
        }
    }
    pixels
}

/// Fully saturated color at hue `t` in `[0, 1)`.
pub fn hue(t: f32) -> Color {
    let h = t.rem_euclid(1.0) * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    Color::rgb(r, g, b)
}

fn rgba8(c: Color) -> [u8; 4] {
    [c.r, c.g, c.b, c.a].map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}
