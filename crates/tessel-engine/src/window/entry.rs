use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

use super::runtime::RuntimeCtx;

/// A window, the GPU context bound to its surface, and its frame clock.
#[self_referencing]
pub(crate) struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowEntry {
    /// Binds a GPU context to `window`. Blocks on adapter and device requests.
    pub(crate) fn open(window: Window, gpu_init: GpuInit) -> Result<Self> {
        WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")
    }

    pub(crate) fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }

    /// Reconfigures the surface. `None` re-reads the window's current size.
    pub(crate) fn resize(&mut self, size: Option<PhysicalSize<u32>>) {
        let size = size.unwrap_or_else(|| self.with_window(|w| w.inner_size()));
        self.with_gpu_mut(|gpu| gpu.resize(size));
        self.request_redraw();
    }

    /// Drops the time spent suspended from the next frame's delta.
    pub(crate) fn reset_clock(&mut self) {
        self.with_clock_mut(|clock| clock.reset());
    }

    /// Ticks the clock and runs one `on_frame` callback.
    pub(crate) fn frame<A: App>(
        &mut self,
        id: WindowId,
        app: &mut A,
        runtime: &mut RuntimeCtx,
    ) -> AppControl {
        self.with_mut(|fields| {
            let time = fields.clock.tick();
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id,
                    window: fields.window,
                },
                gpu: fields.gpu,
                time,
                runtime,
            };
            app.on_frame(&mut ctx)
        })
    }
}
