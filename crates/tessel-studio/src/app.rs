use anyhow::{Context, Result};
use tessel_engine::core::{App, AppControl, FrameCtx};
use tessel_engine::device::Gpu;
use tessel_engine::paint::Color;
use tessel_engine::render::{RenderContext, RenderStats, RendererConfig, WgpuBackend};

use crate::assets::Assets;
use crate::scene;

const BACKGROUND: Color = Color::rgb(0.08, 0.09, 0.12);

/// Renderer state, built on the first frame once a device exists.
struct Studio {
    renderer: RenderContext<WgpuBackend>,
    assets: Assets,
    last_stats: RenderStats,
    elapsed: f32,
}

impl Studio {
    fn new(gpu: &Gpu<'_>) -> Result<Self> {
        let backend = WgpuBackend::new(
            gpu.device().clone(),
            gpu.queue().clone(),
            gpu.surface_format(),
        );
        let mut renderer = RenderContext::new(backend, &RendererConfig::default())
            .context("failed to build the renderer")?;
        let assets = Assets::load(&mut renderer);
        match &assets.font {
            Some(font) => log::info!(
                "studio: {} swatches, font at {}px on {} atlas page(s)",
                assets.swatches.len(),
                font.pixel_size(),
                font.pages().len()
            ),
            None => log::info!("studio: {} swatches, no font", assets.swatches.len()),
        }
        Ok(Self {
            renderer,
            assets,
            last_stats: RenderStats::default(),
            elapsed: 0.0,
        })
    }
}

#[derive(Default)]
pub struct StudioApp {
    studio: Option<Studio>,
}

impl App for StudioApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.studio.is_none() {
            match Studio::new(ctx.gpu) {
                Ok(studio) => self.studio = Some(studio),
                Err(e) => {
                    log::error!("studio: {e:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(studio) = self.studio.as_mut() else {
            return AppControl::Exit;
        };

        let time = ctx.time;
        studio.elapsed += time.dt;
        if time.frame_index % 120 == 0 {
            ctx.window.set_title(&format!("tessel studio ({:.0} fps)", time.fps));
        }

        ctx.render(|view, viewport| {
            let r = &mut studio.renderer;
            r.backend_mut().set_frame_view(Some(view.clone()));
            r.resize(viewport);

            r.begin_frame();
            r.clear(BACKGROUND);
            scene::draw(r, &studio.assets, viewport, &time, studio.elapsed, &studio.last_stats);
            r.end_frame();

            studio.last_stats = r.stats();
            r.backend_mut().set_frame_view(None);
        })
    }
}
