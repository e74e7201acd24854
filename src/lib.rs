//! # pointfx
//!
//! Point-sprite particle emitters with a data-parallel integrator.
//!
//! A scene is a list of emitters. Each emitter owns a fixed-capacity pool of
//! [`Particle`] records, births batches of randomized particles from its
//! [`SpawnDescriptor`], and is advanced every frame by a parallel integrator
//! before being drawn as additive, textured sprites.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pointfx::prelude::*;
//!
//! let backend = CpuBackend::new(Viewport::new(1280.0, 720.0), TextureLoader::default());
//! let scene = SceneConfig::default(); // snow, fire, experiment
//! let mut renderer = Renderer::new(backend, scene, SmallRng::seed_from_u64(7))?;
//!
//! for _ in 0..600 {
//!     renderer.render_frame(1.0 / 60.0)?;
//! }
//! ```
//!
//! ## Frame Sequence
//!
//! [`Renderer::render_frame`] runs three phases, always in this order:
//!
//! 1. every emitter runs its birth policy ([`Emitter::emit`])
//! 2. every non-empty pool is integrated over its live range
//! 3. every non-empty pool with a sprite is drawn as one instanced batch
//!
//! Phases 2 and 3 go to the backend as a single [`Frame`], so integration
//! always finishes before any draw reads a pool.
//!
//! ## Backends
//!
//! | Backend | Integration | Drawing |
//! |---------|-------------|---------|
//! | [`gpu::GpuBackend`] | WGSL compute pass, 64-lane workgroups | instanced quads, additive blend |
//! | [`cpu::CpuBackend`] | rayon over the live slice | recorded, not rasterized |
//!
//! ## Units
//!
//! Time is in seconds. Positions and sizes are pixels, origin at the
//! bottom-left corner of the viewport.

extern crate self as pointfx;

pub mod backend;
pub mod config;
pub mod cpu;
pub mod descriptor;
pub mod emitter;
pub mod error;
pub mod gpu;
pub mod integrator;
pub mod particle;
pub mod range;
pub mod renderer;
pub mod shader;
pub mod textures;
pub mod time;
pub mod window;

pub use bytemuck;
pub use glam::{Vec2, Vec3, Vec4};
pub use pointfx_derive::GpuRecord;

pub use backend::{Backend, Frame, ParticleBuffer, Viewport};
pub use config::{AppConfig, EmitterConfig, SceneConfig};
pub use descriptor::SpawnDescriptor;
pub use emitter::{Emitter, EmitterSettings};
pub use error::{AppError, ConfigError, FrameError, GpuError, RenderError, TextureError};
pub use particle::{EmitterUniforms, Particle, ParticleGpu};
pub use range::SpawnRange;
pub use renderer::{FrameStats, Renderer};
pub use textures::{SpriteImage, TextureLoader};

/// Record with a layout shared between Rust and WGSL.
///
/// Implemented by `#[derive(GpuRecord)]`; the derive computes WGSL padding
/// and offsets, so this should not be implemented by hand.
pub trait GpuRecord: Copy {
    /// `#[repr(C)]` twin of the record with explicit padding fields.
    type Gpu: bytemuck::Pod + bytemuck::Zeroable + Copy + Send + Sync;

    /// WGSL declaration of the record, padding included.
    const WGSL_STRUCT: &'static str;

    /// Size of one record in a storage or vertex buffer.
    const STRIDE: u32;

    /// `(field, byte offset)` for every declared field, in declaration order.
    const FIELD_OFFSETS: &'static [(&'static str, u32)];

    fn to_gpu(&self) -> Self::Gpu;

    fn from_gpu(gpu: &Self::Gpu) -> Self;

    /// Byte offset of a declared field.
    fn offset_of(field: &str) -> Option<u32> {
        Self::FIELD_OFFSETS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, offset)| *offset)
    }
}

/// Common imports.
pub mod prelude {
    pub use crate::backend::{Backend, Viewport};
    pub use crate::config::{AppConfig, EmitterConfig, SceneConfig};
    pub use crate::cpu::CpuBackend;
    pub use crate::descriptor::SpawnDescriptor;
    pub use crate::emitter::{Emitter, EmitterSettings};
    pub use crate::particle::Particle;
    pub use crate::range::SpawnRange;
    pub use crate::renderer::{FrameStats, Renderer};
    pub use crate::textures::TextureLoader;
    pub use crate::GpuRecord;
    pub use glam::{Vec3, Vec4};
    pub use rand::rngs::SmallRng;
    pub use rand::SeedableRng;
}
