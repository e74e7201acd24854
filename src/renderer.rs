//! Frame orchestration.
//!
//! [`Renderer`] owns the backend and one [`Emitter`] per configured emitter.
//! Each call to [`Renderer::render_frame`]:
//!
//! 1. runs every emitter's birth policy, in scene order, with one shared RNG
//! 2. queues one integration per non-empty pool
//! 3. queues one instanced draw per non-empty pool that has a sprite
//!
//! and hands both lists to the backend as a single [`Frame`].

use rand::rngs::SmallRng;
use rand::Rng;

use crate::backend::{Backend, Frame, Viewport};
use crate::config::{EmitterConfig, SceneConfig};
use crate::emitter::Emitter;
use crate::error::RenderError;
use crate::integrator::sanitize_delta;

/// Counters for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Emitters in the scene.
    pub emitters: usize,
    /// Particles born during this frame.
    pub born: u32,
    /// Live particles integrated this frame, across all emitters.
    pub live: u32,
    /// Instanced draw batches submitted.
    pub draws: usize,
}

/// An emitter plus what the renderer needs to draw it.
pub struct EmitterInstance<B: Backend> {
    config: EmitterConfig,
    emitter: Emitter<B::Buffer>,
    texture: Option<B::Texture>,
}

impl<B: Backend> EmitterInstance<B> {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn emitter(&self) -> &Emitter<B::Buffer> {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter<B::Buffer> {
        &mut self.emitter
    }

    /// Whether the emitter has a sprite and will be drawn.
    pub fn is_drawn(&self) -> bool {
        self.texture.is_some()
    }
}

/// Drives emission, integration and drawing for a scene.
pub struct Renderer<B: Backend, R: Rng = SmallRng> {
    backend: B,
    scene: SceneConfig,
    emitters: Vec<EmitterInstance<B>>,
    rng: R,
    frame_count: u64,
}

impl<B: Backend, R: Rng> Renderer<B, R> {
    /// Build every emitter of `scene` against the backend's current viewport.
    pub fn new(backend: B, scene: SceneConfig, rng: R) -> Result<Self, RenderError> {
        let mut renderer = Self {
            backend,
            scene,
            emitters: Vec::new(),
            rng,
            frame_count: 0,
        };
        renderer.rebuild()?;
        Ok(renderer)
    }

    /// Adopt a new drawable size.
    ///
    /// Every emitter is discarded and rebuilt from its configuration against
    /// the new viewport; all live particles are lost.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.backend.resize(viewport);
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<(), RenderError> {
        let viewport = self.backend.viewport();
        let mut emitters = Vec::with_capacity(self.scene.emitters.len());
        for config in &self.scene.emitters {
            emitters.push(build_emitter(&self.backend, config, viewport)?);
        }
        self.emitters = emitters;

        tracing::info!(
            emitters = self.emitters.len(),
            width = viewport.width,
            height = viewport.height,
            "scene built"
        );
        Ok(())
    }

    /// Advance the scene by `delta_time` seconds and submit one frame.
    ///
    /// A negative or non-finite `delta_time` advances nothing.
    pub fn render_frame(&mut self, delta_time: f32) -> Result<FrameStats, RenderError> {
        let delta_time = sanitize_delta(delta_time);
        let mut stats = FrameStats {
            emitters: self.emitters.len(),
            ..Default::default()
        };

        for instance in &mut self.emitters {
            let born = instance.emitter.emit(delta_time, &mut self.rng);
            stats.born += born.end - born.start;
        }

        let mut frame = Frame::new();
        for instance in &self.emitters {
            frame.integrate(instance.emitter.pool(), instance.emitter.uniforms(delta_time));
        }
        for instance in &self.emitters {
            if let Some(texture) = &instance.texture {
                frame.draw(
                    instance.emitter.pool(),
                    texture,
                    instance.emitter.position(),
                    instance.emitter.current_particles(),
                );
            }
        }
        stats.live = frame.integrations().iter().map(|i| i.count).sum();
        stats.draws = frame.draws().len();

        self.backend.submit_frame(frame)?;
        self.frame_count += 1;
        Ok(stats)
    }

    pub fn emitters(&self) -> &[EmitterInstance<B>] {
        &self.emitters
    }

    pub fn emitters_mut(&mut self) -> &mut [EmitterInstance<B>] {
        &mut self.emitters
    }

    /// Emitter by configured name.
    pub fn emitter(&self, name: &str) -> Option<&EmitterInstance<B>> {
        self.emitters.iter().find(|e| e.name() == name)
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Frames submitted since construction.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

fn build_emitter<B: Backend>(
    backend: &B,
    config: &EmitterConfig,
    viewport: Viewport,
) -> Result<EmitterInstance<B>, RenderError> {
    let config_error = |source| RenderError::Config {
        emitter: config.name.clone(),
        source,
    };

    let (settings, descriptor) = config.resolve(viewport).map_err(config_error)?;
    let pool = backend.create_particle_buffer(config.particle_count)?;
    let mut emitter = Emitter::new(pool, descriptor, settings).map_err(config_error)?;
    if config.primed {
        emitter.prime();
    }

    let texture = match &config.texture {
        Some(name) => match backend.load_texture(name) {
            Ok(texture) => Some(texture),
            Err(e) => {
                tracing::warn!(
                    emitter = %config.name,
                    texture = %name,
                    error = %e,
                    "sprite unavailable; emitter will not be drawn"
                );
                None
            }
        },
        None => None,
    };

    Ok(EmitterInstance {
        config: config.clone(),
        emitter,
        texture,
    })
}
