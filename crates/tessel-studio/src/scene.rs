use glam::{Vec2, Vec3};
use tessel_engine::coords::Viewport;
use tessel_engine::paint::Color;
use tessel_engine::render::{
    CircleStyle, GpuBackend, OrthographicCamera, RenderContext, RenderStats, SubTexture,
};
use tessel_engine::text::TextParams;
use tessel_engine::time::FrameTime;

use crate::assets::{self, Assets, SHEET_CELL, SHEET_CELLS};

const MARGIN: f32 = 24.0;
const TEXT_SIZE: f32 = 22.0;

/// Draws one demo frame. `t` is seconds since start; geometry uses the
/// default pixel projection.
pub fn draw<B: GpuBackend>(
    r: &mut RenderContext<B>,
    assets: &Assets,
    viewport: Viewport,
    time: &FrameTime,
    t: f32,
    last_stats: &RenderStats,
) {
    let top = viewport.height - MARGIN;

    // A drifting layer drawn under its own camera. The camera is read at
    // flush time, so the layer is flushed before the default comes back.
    let mut camera = OrthographicCamera::for_viewport(viewport);
    camera.set_position(Vec3::new((t * 0.5).sin() * 40.0, 0.0, 0.0));
    for i in 0..5 {
        let x = viewport.width - 320.0 + i as f32 * 60.0;
        r.draw_rotated_quad(
            Vec3::new(x, 90.0, 0.0),
            Vec2::splat(80.0),
            t * 0.3 + i as f32,
            assets::hue(0.6 + i as f32 * 0.05).with_alpha(0.35),
        );
    }
    r.set_projection(&camera);
    r.flush_all();
    r.reset_projection();

    // Flat quads and triangles.
    for i in 0..6 {
        let x = MARGIN + 40.0 + i as f32 * 90.0;
        let color = assets::hue(i as f32 / 6.0);
        r.draw_quad(Vec3::new(x, top - 60.0, 0.0), Vec2::splat(70.0), color);
        r.draw_rotated_triangle(
            Vec3::new(x, top - 150.0, 0.0),
            Vec2::splat(70.0),
            t + i as f32,
            color,
        );
    }

    // Tiled checkerboard and sprite-sheet cells.
    r.draw_rotated_sprite(
        Vec3::new(MARGIN + 640.0, top - 100.0, 0.0),
        Vec2::splat(150.0),
        t * 0.5,
        assets.checker,
        Color::WHITE,
        4.0,
    );
    let side = SHEET_CELL * SHEET_CELLS;
    for cell in 0..SHEET_CELLS * SHEET_CELLS {
        let coords = Vec2::new((cell % SHEET_CELLS) as f32, (cell / SHEET_CELLS) as f32);
        let sprite = SubTexture::from_cell(
            assets.sheet,
            (side, side),
            coords,
            Vec2::splat(SHEET_CELL as f32),
            Vec2::ONE,
        );
        let x = MARGIN + 20.0 + cell as f32 * 44.0;
        r.draw_sprite(Vec3::new(x, top - 240.0, 0.0), Vec2::splat(40.0), sprite, Color::WHITE, 1.0);
    }

    // Textured triangles share slots with the sprites.
    for i in 0..4 {
        let x = MARGIN + 740.0 + i as f32 * 70.0;
        r.draw_textured_triangle(
            Vec3::new(x, top - 240.0, 0.0),
            Vec2::splat(60.0),
            assets.checker,
            assets::hue(i as f32 / 4.0),
        );
    }

    // One sprite per swatch: more textures than slots forces a mid-batch flush.
    for (i, &swatch) in assets.swatches.iter().enumerate() {
        let x = MARGIN + 14.0 + i as f32 * 30.0;
        let y = top - 300.0 + (t * 2.0 + i as f32 * 0.4).sin() * 10.0;
        r.draw_sprite(Vec3::new(x, y, 0.0), Vec2::splat(24.0), swatch, Color::WHITE, 1.0);
    }

    // Filled discs and rings.
    for i in 0..8 {
        let x = MARGIN + 40.0 + i as f32 * 80.0;
        let pulse = 0.5 + 0.5 * (t * 3.0 + i as f32).sin();
        let style = if i % 2 == 0 {
            CircleStyle::FILLED
        } else {
            CircleStyle::ring(0.1 + 0.3 * pulse)
        };
        r.draw_circle(
            Vec3::new(x, top - 380.0, 0.0),
            Vec2::splat(60.0),
            assets::hue(i as f32 / 8.0 + t * 0.05),
            style,
        );
    }

    let Some(font) = assets.font.as_ref() else {
        return;
    };
    let params = TextParams::default();

    r.draw_string(
        Vec3::new(MARGIN, top - 460.0, 0.0),
        TEXT_SIZE * 1.5,
        "tessel: batched immediate-mode 2D",
        font,
        &params,
        Color::WHITE,
    );

    let overlay = format!(
        "fps {:.0}\ndraw calls {}\nflushes {}\nquads {}\n\
         vertices {} / indices {}\ntexture slots {} of {}",
        time.fps,
        last_stats.draw_calls,
        last_stats.flushes,
        last_stats.quads,
        last_stats.vertices,
        last_stats.indices,
        last_stats.active_texture_slots,
        RenderStats::max_texture_slots(),
    );
    let backdrop = Vec2::new(360.0, 7.0 * TEXT_SIZE);
    r.draw_quad(
        Vec3::new(MARGIN + backdrop.x * 0.5 - 8.0, MARGIN + backdrop.y * 0.5 - 4.0, 0.0),
        backdrop,
        Color::BLACK.with_alpha(0.55),
    );
    r.draw_string(
        Vec3::new(MARGIN, MARGIN + 6.0 * TEXT_SIZE, 0.0),
        TEXT_SIZE,
        &overlay,
        font,
        &params,
        Color::rgb(0.9, 0.9, 0.6),
    );
}
