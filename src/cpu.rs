//! Host-memory backend.
//!
//! Pools are `Vec`s of [`ParticleGpu`] records, byte-for-byte what the GPU
//! backend uploads, and integration runs [`integrator::step`] across the live
//! slice with rayon. Draws are not rasterized; each submitted batch is kept as
//! a [`DrawRecord`] so callers can inspect what would have been drawn.
//!
//! Used for headless runs, tests and benchmarks.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use glam::Vec3;
use rayon::prelude::*;

use crate::backend::{Backend, Frame, ParticleBuffer, Viewport};
use crate::error::{FrameError, GpuError, TextureError};
use crate::integrator;
use crate::particle::{EmitterUniforms, Particle, ParticleGpu};
use crate::textures::{SpriteImage, TextureLoader};
use crate::GpuRecord;

/// Live slices smaller than this are integrated on the calling thread.
const PARALLEL_THRESHOLD: usize = 1024;

/// A particle pool in host memory.
#[derive(Debug)]
pub struct HostBuffer {
    records: RwLock<Vec<ParticleGpu>>,
}

impl HostBuffer {
    /// A zero-filled pool of `capacity` records.
    pub fn new(capacity: u32) -> Self {
        Self {
            records: RwLock::new(vec![bytemuck::Zeroable::zeroed(); capacity as usize]),
        }
    }

    /// Raw records, including never-born slots.
    pub fn records(&self) -> RwLockReadGuard<'_, Vec<ParticleGpu>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Decoded copy of the first `count` records.
    pub fn particles(&self, count: u32) -> Vec<Particle> {
        self.records()
            .iter()
            .take(count as usize)
            .map(Particle::from_gpu)
            .collect()
    }

    /// Pool contents as raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(self.records().as_slice()).to_vec()
    }

    /// Advance the first `uniforms.particle_count` records.
    pub fn integrate(&self, uniforms: &EmitterUniforms) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let count = (uniforms.particle_count as usize).min(records.len());
        let live = &mut records[..count];

        let advance = |record: &mut ParticleGpu| {
            let mut p = Particle::from_gpu(record);
            integrator::step(&mut p, uniforms);
            *record = p.to_gpu();
        };

        if live.len() >= PARALLEL_THRESHOLD {
            live.par_iter_mut().for_each(advance);
        } else {
            live.iter_mut().for_each(advance);
        }
    }
}

impl ParticleBuffer for HostBuffer {
    fn capacity(&self) -> u32 {
        self.records().len() as u32
    }

    fn write(&mut self, first: u32, records: &[Particle]) {
        let slots = self.records.get_mut().unwrap_or_else(|e| e.into_inner());
        let first = first as usize;
        for (slot, particle) in slots[first..first + records.len()].iter_mut().zip(records) {
            *slot = particle.to_gpu();
        }
    }
}

/// A decoded sprite kept in host memory.
#[derive(Debug, Clone)]
pub struct HostTexture {
    pub name: String,
    pub image: Arc<SpriteImage>,
}

/// One draw batch as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub texture: String,
    pub offset: Vec3,
    pub instances: u32,
    /// Instances that are not stale and would cover pixels.
    pub visible: u32,
}

/// Headless backend.
#[derive(Debug)]
pub struct CpuBackend {
    viewport: Viewport,
    loader: TextureLoader,
    frames_submitted: u64,
    last_draws: Vec<DrawRecord>,
    last_integrated: u32,
}

impl CpuBackend {
    pub fn new(viewport: Viewport, loader: TextureLoader) -> Self {
        Self {
            viewport,
            loader,
            frames_submitted: 0,
            last_draws: Vec::new(),
            last_integrated: 0,
        }
    }

    /// Draws from the most recent frame, in submission order.
    pub fn last_draws(&self) -> &[DrawRecord] {
        &self.last_draws
    }

    /// Particles advanced by the most recent frame.
    pub fn last_integrated(&self) -> u32 {
        self.last_integrated
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

impl Backend for CpuBackend {
    type Buffer = HostBuffer;
    type Texture = HostTexture;

    fn create_particle_buffer(&self, capacity: u32) -> Result<HostBuffer, GpuError> {
        Ok(HostBuffer::new(capacity))
    }

    fn load_texture(&self, name: &str) -> Result<HostTexture, TextureError> {
        let image = self.loader.load(name)?;
        Ok(HostTexture {
            name: name.to_string(),
            image: Arc::new(image),
        })
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn submit_frame(&mut self, frame: Frame<'_, HostBuffer, HostTexture>) -> Result<(), FrameError> {
        self.last_integrated = 0;
        for integration in frame.integrations() {
            integration.buffer.integrate(&integration.uniforms);
            self.last_integrated += integration.count;
        }

        self.last_draws.clear();
        for draw in frame.draws() {
            let visible = draw
                .buffer
                .records()
                .iter()
                .take(draw.instances as usize)
                .filter(|r| r.age < r.life && r.size * r.scale > 0.0)
                .count() as u32;
            self.last_draws.push(DrawRecord {
                texture: draw.texture.name.clone(),
                offset: draw.offset,
                instances: draw.instances,
                visible,
            });
        }

        self.frames_submitted += 1;
        Ok(())
    }
}
