//! Interfaces the orchestrator needs from a rendering backend.
//!
//! A backend provides four things:
//!
//! | Concern | Entry point |
//! |---------|-------------|
//! | Particle pools | [`Backend::create_particle_buffer`], [`ParticleBuffer::write`] |
//! | Sprite textures | [`Backend::load_texture`] |
//! | Parallel integration | [`Frame::integrations`] executed by [`Backend::submit_frame`] |
//! | Instanced sprite draws | [`Frame::draws`] executed by [`Backend::submit_frame`] |
//!
//! Two backends ship with the crate: [`GpuBackend`](crate::gpu::GpuBackend)
//! (wgpu compute + render passes) and [`CpuBackend`](crate::cpu::CpuBackend)
//! (host memory, rayon).

use glam::Vec3;

use crate::error::{FrameError, GpuError, TextureError};
use crate::particle::{EmitterUniforms, Particle};

/// Viewport size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center of the viewport.
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.width * 0.5, self.height * 0.5, 0.0)
    }
}

/// Fixed-capacity storage for particle records.
///
/// Freshly created buffers are zero-filled. Slots that were never written are
/// never read by the integrator or the draw call.
pub trait ParticleBuffer {
    /// Number of records the buffer can hold.
    fn capacity(&self) -> u32;

    /// Store `records` at slots `[first, first + records.len())`.
    ///
    /// Callers guarantee the range fits inside [`capacity`](Self::capacity).
    fn write(&mut self, first: u32, records: &[Particle]);
}

/// One integration dispatch: advance `count` records of `buffer`.
pub struct Integration<'a, P> {
    pub buffer: &'a P,
    pub uniforms: EmitterUniforms,
    pub count: u32,
}

/// One instanced sprite draw over the first `instances` records of `buffer`.
pub struct DrawBatch<'a, P, T> {
    pub buffer: &'a P,
    pub texture: &'a T,
    /// Added to every particle position.
    pub offset: Vec3,
    pub instances: u32,
}

/// Everything a backend executes for one frame.
///
/// Backends must complete every integration before any draw reads a buffer.
pub struct Frame<'a, P, T> {
    integrations: Vec<Integration<'a, P>>,
    draws: Vec<DrawBatch<'a, P, T>>,
}

impl<'a, P, T> Frame<'a, P, T> {
    pub fn new() -> Self {
        Self {
            integrations: Vec::new(),
            draws: Vec::new(),
        }
    }

    /// Queue an integration; empty ranges are dropped.
    pub fn integrate(&mut self, buffer: &'a P, uniforms: EmitterUniforms) {
        let count = uniforms.particle_count;
        if count > 0 {
            self.integrations.push(Integration {
                buffer,
                uniforms,
                count,
            });
        }
    }

    /// Queue a draw; empty batches are dropped.
    pub fn draw(&mut self, buffer: &'a P, texture: &'a T, offset: Vec3, instances: u32) {
        if instances > 0 {
            self.draws.push(DrawBatch {
                buffer,
                texture,
                offset,
                instances,
            });
        }
    }

    pub fn integrations(&self) -> &[Integration<'a, P>] {
        &self.integrations
    }

    pub fn draws(&self) -> &[DrawBatch<'a, P, T>] {
        &self.draws
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty() && self.draws.is_empty()
    }
}

impl<P, T> Default for Frame<'_, P, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A rendering backend.
pub trait Backend {
    /// Particle pool type.
    type Buffer: ParticleBuffer;
    /// Sprite texture handle.
    type Texture;

    /// Allocate a zero-filled pool of `capacity` records.
    fn create_particle_buffer(&self, capacity: u32) -> Result<Self::Buffer, GpuError>;

    /// Resolve a logical image name to a texture.
    fn load_texture(&self, name: &str) -> Result<Self::Texture, TextureError>;

    /// Current drawable size.
    fn viewport(&self) -> Viewport;

    /// React to a new drawable size.
    fn resize(&mut self, viewport: Viewport);

    /// Execute all integrations, then all draws, as one ordered submission.
    fn submit_frame(&mut self, frame: Frame<'_, Self::Buffer, Self::Texture>) -> Result<(), FrameError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    #[test]
    fn test_frame_drops_empty_work() {
        let buffer = Dummy;
        let texture = ();
        let mut frame: Frame<'_, Dummy, ()> = Frame::new();
        frame.integrate(&buffer, EmitterUniforms::new(Vec3::ZERO, 0.0, 0.016, 0));
        frame.draw(&buffer, &texture, Vec3::ZERO, 0);
        assert!(frame.is_empty());

        frame.integrate(&buffer, EmitterUniforms::new(Vec3::ZERO, 0.0, 0.016, 5));
        frame.draw(&buffer, &texture, Vec3::X, 5);
        assert_eq!(frame.integrations().len(), 1);
        assert_eq!(frame.integrations()[0].count, 5);
        assert_eq!(frame.draws()[0].offset, Vec3::X);
    }

    #[test]
    fn test_viewport_center() {
        assert_eq!(Viewport::new(800.0, 600.0).center(), Vec3::new(400.0, 300.0, 0.0));
    }
}
