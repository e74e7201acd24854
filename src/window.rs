//! Windowed application: winit event loop driving a [`Renderer`] over the
//! wgpu backend.
//!
//! Space pauses the simulation, Escape quits.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::backend::Viewport;
use crate::config::AppConfig;
use crate::error::{AppError, FrameError, RenderError};
use crate::gpu::{GpuBackend, GpuContext};
use crate::renderer::Renderer;
use crate::textures::TextureLoader;
use crate::time::FrameClock;

/// Open a window and render `config` until it is closed.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Random source for a run: seeded when configured, from entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

struct App {
    config: AppConfig,
    clock: FrameClock,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<GpuBackend, SmallRng>>,
    error: Option<AppError>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let clock = match config.fixed_fps {
            Some(fps) => FrameClock::fixed(fps),
            None => FrameClock::measured(),
        };
        Self {
            config,
            clock,
            window: None,
            renderer: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title("pointfx")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let context = pollster::block_on(GpuContext::new(window.clone()))?;
        let backend = GpuBackend::new(context, TextureLoader::new(&self.config.asset_root))?;
        let renderer = Renderer::new(
            backend,
            self.config.scene.clone(),
            make_rng(self.config.seed),
        )?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        tracing::error!(%error, "shutting down");
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let dt = self.clock.tick();
        match renderer.render_frame(dt) {
            Ok(stats) => {
                if self.clock.frame() % 300 == 0 {
                    tracing::debug!(
                        fps = self.clock.fps(),
                        live = stats.live,
                        draws = stats.draws,
                        "frame stats"
                    );
                }
            }
            Err(RenderError::Frame(FrameError::SurfaceLost | FrameError::SurfaceOutdated)) => {
                renderer.backend_mut().reconfigure();
            }
            Err(RenderError::Frame(FrameError::Timeout)) => {
                tracing::warn!("surface timeout; frame dropped");
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(renderer) = &mut self.renderer {
                    let viewport = Viewport::new(size.width as f32, size.height as f32);
                    if let Err(e) = renderer.resize(viewport) {
                        self.fail(event_loop, e.into());
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                Key::Named(NamedKey::Space) => {
                    let paused = !self.clock.is_paused();
                    self.clock.set_paused(paused);
                    tracing::info!(paused, "simulation paused state changed");
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
