//! The particle record and the per-emitter uniforms.
//!
//! [`Particle`] is written by [`Emitter::emit`](crate::Emitter::emit) on the
//! CPU and read/written in place by the integrator kernel. Its layout is
//! generated once by `#[derive(GpuRecord)]`, so the Rust writer, the compute
//! shader and the vertex attributes of the render pipeline all use the same
//! offsets.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::GpuRecord;

/// One particle's complete state.
///
/// Field order is part of the GPU contract: reordering or adding fields
/// changes [`ParticleGpu`] and the WGSL struct together.
#[derive(GpuRecord, Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Position at birth.
    pub start_position: Vec3,
    /// Velocity at birth.
    pub start_velocity: Vec3,
    /// Current position, advanced every step.
    pub position: Vec3,
    /// Current velocity, advanced every step.
    pub velocity: Vec3,
    /// Constant RGBA tint.
    pub color: Vec4,
    /// Simulated time since birth.
    pub age: f32,
    /// Total lifetime. `age >= life` means the particle is stale.
    pub life: f32,
    /// Sprite size in pixels.
    pub size: f32,
    /// Current visual scale.
    pub scale: f32,
    /// Scale at `age == 0`.
    pub start_scale: f32,
    /// Scale once `age >= life`.
    pub end_scale: f32,
}

impl Particle {
    /// Fraction of the lifetime elapsed, clamped to `[0, 1]`.
    ///
    /// A particle born with `life <= 0` is already at the end of its life.
    #[inline]
    pub fn life_fraction(&self) -> f32 {
        if self.life > 0.0 {
            (self.age / self.life).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Whether the particle has outlived its lifetime.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.age >= self.life
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            start_position: Vec3::ZERO,
            start_velocity: Vec3::ZERO,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            color: Vec4::ZERO,
            age: 0.0,
            life: 0.0,
            size: 0.0,
            scale: 1.0,
            start_scale: 1.0,
            end_scale: 1.0,
        }
    }
}

/// Uniforms broadcast to every lane of one emitter's integration dispatch.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct EmitterUniforms {
    /// Constant acceleration.
    pub gravity: [f32; 3],
    /// Linear damping coefficient, `>= 0`.
    pub air_resistance: f32,
    /// Step length.
    pub delta_time: f32,
    /// Number of live slots; lanes at or beyond it do nothing.
    pub particle_count: u32,
    pub _padding: [u32; 2],
}

impl EmitterUniforms {
    /// WGSL declaration matching this struct.
    pub const WGSL_STRUCT: &'static str = "struct EmitterUniforms {
    gravity: vec3<f32>,
    air_resistance: f32,
    delta_time: f32,
    particle_count: u32,
    _padding: vec2<u32>,
}";

    pub fn new(gravity: Vec3, air_resistance: f32, delta_time: f32, particle_count: u32) -> Self {
        Self {
            gravity: gravity.to_array(),
            air_resistance,
            delta_time,
            particle_count,
            _padding: [0; 2],
        }
    }

    #[inline]
    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        assert_eq!(Particle::STRIDE, 112);
        assert_eq!(std::mem::size_of::<ParticleGpu>(), 112);
        assert_eq!(ParticleGpu::START_POSITION_OFFSET, 0);
        assert_eq!(ParticleGpu::START_VELOCITY_OFFSET, 16);
        assert_eq!(ParticleGpu::POSITION_OFFSET, 32);
        assert_eq!(ParticleGpu::VELOCITY_OFFSET, 48);
        assert_eq!(ParticleGpu::COLOR_OFFSET, 64);
        assert_eq!(ParticleGpu::AGE_OFFSET, 80);
        assert_eq!(ParticleGpu::LIFE_OFFSET, 84);
        assert_eq!(ParticleGpu::SIZE_OFFSET, 88);
        assert_eq!(ParticleGpu::SCALE_OFFSET, 92);
        assert_eq!(ParticleGpu::START_SCALE_OFFSET, 96);
        assert_eq!(ParticleGpu::END_SCALE_OFFSET, 100);
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<EmitterUniforms>(), 32);
    }

    #[test]
    fn test_gpu_roundtrip_preserves_fields() {
        let p = Particle {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec4::new(1.0, 0.392, 0.1, 0.5),
            age: 0.25,
            life: 3.0,
            size: 80.0,
            ..Default::default()
        };
        let gpu = p.to_gpu();
        assert_eq!(gpu.position, [1.0, 2.0, 3.0]);
        assert_eq!(Particle::from_gpu(&gpu), p);

        let bytes = bytemuck::bytes_of(&gpu);
        let age = f32::from_le_bytes(bytes[80..84].try_into().unwrap());
        assert_eq!(age, 0.25);
    }

    #[test]
    fn test_life_fraction() {
        let mut p = Particle {
            life: 2.0,
            ..Default::default()
        };
        assert_eq!(p.life_fraction(), 0.0);
        p.age = 1.0;
        assert_eq!(p.life_fraction(), 0.5);
        p.age = 5.0;
        assert_eq!(p.life_fraction(), 1.0);
        assert!(p.is_stale());

        let born_dead = Particle {
            life: -1.0,
            ..Default::default()
        };
        assert_eq!(born_dead.life_fraction(), 1.0);
        assert!(born_dead.is_stale());
    }
}
