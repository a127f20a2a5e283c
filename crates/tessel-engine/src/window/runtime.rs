use std::collections::HashMap;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl};
use crate::device::GpuInit;

use super::entry::WindowEntry;

/// Title and size of a window opened by the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessel".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Requests an app can make from inside a frame.
///
/// They are queued and applied once `on_frame` returns, so the window map is
/// never mutated while a window is borrowed.
#[derive(Default)]
pub struct RuntimeCtx {
    pending: Vec<Request>,
}

impl RuntimeCtx {
    pub fn create_window(&mut self, config: RuntimeConfig) {
        self.pending.push(Request::Open(config));
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.pending.push(Request::Close(id));
    }

    pub fn exit(&mut self) {
        self.pending.push(Request::Exit);
    }
}

enum Request {
    Open(RuntimeConfig),
    Close(WindowId),
    Exit,
}

/// Drives an [`App`] from the winit event loop.
///
/// Redraws are continuous: every window asks for a new frame as soon as the
/// loop goes idle, which suits an immediate-mode renderer.
pub struct Runtime;

impl Runtime {
    /// Opens the first window and runs until the last one closes or the app
    /// asks to exit.
    pub fn run<A>(initial: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut host = Host {
            initial,
            gpu_init,
            app,
            windows: HashMap::new(),
            exiting: false,
        };
        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")
    }
}

struct Host<A: App> {
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    windows: HashMap<WindowId, WindowEntry>,
    exiting: bool,
}

impl<A: App> Host<A> {
    fn open(&mut self, event_loop: &ActiveEventLoop, config: RuntimeConfig) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let entry = WindowEntry::open(window, self.gpu_init.clone())?;
        entry.request_redraw();
        self.windows.insert(id, entry);
        log::debug!("Runtime: opened window {id:?} ({} open)", self.windows.len());
        Ok(id)
    }

    fn close(&mut self, id: WindowId) {
        if self.windows.remove(&id).is_some() {
            log::debug!("Runtime: closed window {id:?} ({} open)", self.windows.len());
        }
        if self.windows.is_empty() {
            self.exiting = true;
        }
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, runtime: RuntimeCtx) {
        for request in runtime.pending {
            match request {
                Request::Open(config) => {
                    if let Err(e) = self.open(event_loop, config) {
                        log::error!("Runtime: {e:#}");
                    }
                }
                Request::Close(id) => self.close(id),
                Request::Exit => self.exiting = true,
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, id: WindowId) {
        let Some(entry) = self.windows.get_mut(&id) else {
            return;
        };
        let mut runtime = RuntimeCtx::default();
        if entry.frame(id, &mut self.app, &mut runtime) == AppControl::Exit {
            runtime.exit();
        }
        self.apply(event_loop, runtime);
    }
}

impl<A: App> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            for entry in self.windows.values_mut() {
                entry.reset_clock();
            }
            return;
        }
        if let Err(e) = self.open(event_loop, self.initial.clone()) {
            log::error!("Runtime: cannot open the initial window: {e:#}");
            self.exiting = true;
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exiting {
            event_loop.exit();
            return;
        }
        for entry in self.windows.values() {
            entry.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if !self.windows.contains_key(&id) {
            return;
        }
        if self.app.on_window_event(id, &event) == AppControl::Exit {
            self.exiting = true;
        }

        match event {
            WindowEvent::CloseRequested => self.close(id),
            WindowEvent::Resized(size) => {
                if let Some(entry) = self.windows.get_mut(&id) {
                    entry.resize(Some(size));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.windows.get_mut(&id) {
                    entry.resize(None);
                }
            }
            WindowEvent::RedrawRequested if !self.exiting => self.redraw(event_loop, id),
            _ => {}
        }

        if self.exiting {
            event_loop.exit();
        }
    }
}
