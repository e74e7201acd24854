//! Particle emitters: fixed birth budgets and the birth policy.
//!
//! An [`Emitter`] owns one particle pool and fills it front to back. Every
//! call to [`Emitter::emit`] advances a birth timer; once the timer reaches
//! the birth delay, `birth_rate` particles are rolled from the emitter's
//! [`SpawnDescriptor`] and written to the next free slots.
//!
//! Slots are never recycled. Once `current_particles` reaches the pool
//! capacity the emitter stays idle for the rest of its life; stale particles
//! keep their slots.
//!
//! # Example
//!
//! ```ignore
//! let pool = backend.create_particle_buffer(1200)?;
//! let mut emitter = Emitter::new(pool, descriptor, EmitterSettings {
//!     birth_rate: 5,
//!     gravity: Vec3::new(0.0, -60.0, 0.0),
//!     air_resistance: 1.8,
//!     ..Default::default()
//! })?;
//!
//! // Once per frame:
//! let born = emitter.emit(1.0 / 60.0, &mut rng);
//! ```

use std::ops::Range;

use glam::Vec3;
use rand::Rng;

use crate::backend::ParticleBuffer;
use crate::descriptor::SpawnDescriptor;
use crate::error::ConfigError;
use crate::integrator::sanitize_delta;
use crate::particle::{EmitterUniforms, Particle};

/// Birth policy and global forces of an emitter.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterSettings {
    /// Particles born per emission tick.
    pub birth_rate: u32,
    /// Time between emission ticks. `0` emits on every call.
    pub birth_delay: f32,
    /// Constant acceleration applied by the integrator.
    pub gravity: Vec3,
    /// Linear damping coefficient.
    pub air_resistance: f32,
    /// Offset added to every particle when drawing.
    pub position: Vec3,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            birth_rate: 0,
            birth_delay: 0.0,
            gravity: Vec3::ZERO,
            air_resistance: 0.0,
            position: Vec3::ZERO,
        }
    }
}

impl EmitterSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("birth_delay", self.birth_delay)?;
        check_non_negative("air_resistance", self.air_resistance)?;
        check_finite_vec("gravity", self.gravity)?;
        check_finite_vec("position", self.position)?;
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn check_finite_vec(field: &'static str, v: Vec3) -> Result<(), ConfigError> {
    match v.to_array().into_iter().find(|c| !c.is_finite()) {
        Some(value) => Err(ConfigError::NonFinite { field, value }),
        None => Ok(()),
    }
}

/// A fixed-capacity particle pool plus its birth policy.
pub struct Emitter<P> {
    pool: P,
    descriptor: SpawnDescriptor,
    settings: EmitterSettings,
    current_particles: u32,
    birth_timer: f32,
    /// Reused staging for one tick's births.
    births: Vec<Particle>,
}

impl<P: ParticleBuffer> Emitter<P> {
    /// Create an emitter over `pool`, whose capacity becomes the birth budget.
    pub fn new(
        pool: P,
        descriptor: SpawnDescriptor,
        settings: EmitterSettings,
    ) -> Result<Self, ConfigError> {
        descriptor.validate()?;
        settings.validate()?;
        Ok(Self {
            pool,
            descriptor,
            settings,
            current_particles: 0,
            birth_timer: 0.0,
            births: Vec::new(),
        })
    }

    /// Pool capacity: the total number of particles this emitter can ever birth.
    #[inline]
    pub fn particle_count(&self) -> u32 {
        self.pool.capacity()
    }

    /// Number of slots born so far. Only these are integrated and drawn.
    #[inline]
    pub fn current_particles(&self) -> u32 {
        self.current_particles
    }

    /// Slots still available for births.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.particle_count().saturating_sub(self.current_particles)
    }

    /// Whether the birth budget is spent.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.current_particles >= self.particle_count()
    }

    #[inline]
    pub fn birth_timer(&self) -> f32 {
        self.birth_timer
    }

    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    pub fn descriptor(&self) -> &SpawnDescriptor {
        &self.descriptor
    }

    /// Render-time offset.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.settings.position
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.settings.position = position;
    }

    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<(), ConfigError> {
        check_finite_vec("gravity", gravity)?;
        self.settings.gravity = gravity;
        Ok(())
    }

    pub fn set_air_resistance(&mut self, air_resistance: f32) -> Result<(), ConfigError> {
        check_non_negative("air_resistance", air_resistance)?;
        self.settings.air_resistance = air_resistance;
        Ok(())
    }

    /// Make the next [`emit`](Self::emit) call fire regardless of elapsed time.
    pub fn prime(&mut self) {
        self.birth_timer = self.settings.birth_delay;
    }

    /// Swap in a new pool. All previously born particles are discarded.
    pub fn reallocate(&mut self, pool: P) {
        self.pool = pool;
        self.current_particles = 0;
        self.birth_timer = 0.0;
    }

    /// Advance the birth timer and birth a batch if it has elapsed.
    ///
    /// Returns the slots written by this call; the range is empty when the
    /// emitter is exhausted or still waiting. A negative or non-finite
    /// `delta_time` counts as zero.
    pub fn emit<R: Rng + ?Sized>(&mut self, delta_time: f32, rng: &mut R) -> Range<u32> {
        let first = self.current_particles;
        if self.is_exhausted() {
            return first..first;
        }

        self.birth_timer += sanitize_delta(delta_time);
        if self.birth_timer < self.settings.birth_delay {
            return first..first;
        }
        self.birth_timer = 0.0;

        let count = self.settings.birth_rate.min(self.remaining());
        if count == 0 {
            return first..first;
        }

        self.births.clear();
        for _ in 0..count {
            self.births.push(self.descriptor.spawn(rng));
        }
        self.pool.write(first, &self.births);
        self.current_particles += count;

        if self.is_exhausted() {
            tracing::debug!(
                capacity = self.particle_count(),
                "emitter birth budget exhausted"
            );
        }

        first..self.current_particles
    }

    /// Uniforms for integrating this emitter's live range over `delta_time`.
    ///
    /// The step is sanitized the same way [`Emitter::emit`] does it.
    pub fn uniforms(&self, delta_time: f32) -> EmitterUniforms {
        EmitterUniforms::new(
            self.settings.gravity,
            self.settings.air_resistance,
            sanitize_delta(delta_time),
            self.current_particles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::SpawnRange;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Records every write for inspection.
    struct VecPool {
        slots: Vec<Option<Particle>>,
        writes: Vec<Range<u32>>,
    }

    impl VecPool {
        fn new(capacity: u32) -> Self {
            Self {
                slots: vec![None; capacity as usize],
                writes: Vec::new(),
            }
        }
    }

    impl ParticleBuffer for VecPool {
        fn capacity(&self) -> u32 {
            self.slots.len() as u32
        }

        fn write(&mut self, first: u32, records: &[Particle]) {
            let end = first as usize + records.len();
            assert!(end <= self.slots.len(), "write past capacity");
            for (slot, p) in self.slots[first as usize..end].iter_mut().zip(records) {
                *slot = Some(*p);
            }
            self.writes.push(first..end as u32);
        }
    }

    fn emitter(capacity: u32, birth_rate: u32, birth_delay: f32) -> Emitter<VecPool> {
        Emitter::new(
            VecPool::new(capacity),
            SpawnDescriptor::default(),
            EmitterSettings {
                birth_rate,
                birth_delay,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_clamps_to_capacity() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(10, 3, 0.0);

        assert_eq!(e.emit(0.016, &mut rng), 0..3);
        assert_eq!(e.current_particles(), 3);
        e.emit(0.016, &mut rng);
        e.emit(0.016, &mut rng);
        assert_eq!(e.emit(0.016, &mut rng), 9..10);
        assert_eq!(e.current_particles(), 10);
        assert!(e.is_exhausted());

        assert_eq!(e.emit(0.016, &mut rng), 10..10);
        assert_eq!(e.pool().writes, vec![0..3, 3..6, 6..9, 9..10]);
        assert!(e.pool().slots.iter().all(Option::is_some));
    }

    #[test]
    fn test_zero_delay_fires_on_zero_delta() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(10, 3, 0.0);
        e.emit(0.0, &mut rng);
        assert_eq!(e.current_particles(), 3);
    }

    #[test]
    fn test_delay_gates_emission() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(100, 2, 0.5);

        assert!(e.emit(0.25, &mut rng).is_empty());
        assert_eq!(e.birth_timer(), 0.25);
        assert_eq!(e.emit(0.25, &mut rng), 0..2);
        assert_eq!(e.birth_timer(), 0.0);
        assert!(e.emit(0.25, &mut rng).is_empty());
    }

    #[test]
    fn test_tick_count_is_exact() {
        let mut rng = SmallRng::seed_from_u64(0);
        let delay = 0.5;
        let step = 0.125;
        let mut e = emitter(10_000, 1, delay);

        let mut ticks = 0;
        for _ in 0..80 {
            if !e.emit(step, &mut rng).is_empty() {
                ticks += 1;
            }
        }
        // 80 steps of 0.125 = 10.0 time units.
        assert_eq!(ticks, (10.0_f32 / delay).floor() as u32);
        assert_eq!(e.current_particles(), 20);
    }

    #[test]
    fn test_zero_delta_is_idempotent() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(50, 4, 1.0);
        e.emit(0.3, &mut rng);
        let timer = e.birth_timer();
        for _ in 0..100 {
            assert!(e.emit(0.0, &mut rng).is_empty());
        }
        assert_eq!(e.birth_timer(), timer);
        assert_eq!(e.current_particles(), 0);
    }

    #[test]
    fn test_negative_delta_counts_as_zero() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(50, 4, 1.0);
        e.emit(0.5, &mut rng);
        e.emit(-10.0, &mut rng);
        e.emit(f32::NAN, &mut rng);
        assert_eq!(e.birth_timer(), 0.5);
    }

    #[test]
    fn test_prime_fires_next_call() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(50, 3, 20.0);
        e.prime();
        assert_eq!(e.emit(0.0, &mut rng), 0..3);
        assert!(e.emit(1.0, &mut rng).is_empty());
    }

    #[test]
    fn test_reallocate_resets_budget() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(4, 4, 0.0);
        e.emit(0.1, &mut rng);
        assert!(e.is_exhausted());

        e.reallocate(VecPool::new(8));
        assert_eq!(e.particle_count(), 8);
        assert_eq!(e.current_particles(), 0);
        assert_eq!(e.emit(0.1, &mut rng), 0..4);
    }

    #[test]
    fn test_zero_birth_rate_never_births() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(4, 0, 0.0);
        for _ in 0..10 {
            e.emit(0.1, &mut rng);
        }
        assert_eq!(e.current_particles(), 0);
        assert!(e.pool().writes.is_empty());
    }

    #[test]
    fn test_same_seed_same_births() {
        let descriptor = SpawnDescriptor::new()
            .with_position_x_range(SpawnRange::new(0.0, 180.0).unwrap())
            .with_life(3.0, SpawnRange::new(-1.0, 1.0).unwrap());
        let settings = EmitterSettings {
            birth_rate: 5,
            ..Default::default()
        };

        let run = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut e = Emitter::new(VecPool::new(20), descriptor.clone(), settings.clone()).unwrap();
            for dt in [0.016, 0.0, 0.033, 0.016] {
                e.emit(dt, &mut rng);
            }
            e.pool().slots.clone()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let bad = [
            EmitterSettings {
                birth_delay: -1.0,
                ..Default::default()
            },
            EmitterSettings {
                air_resistance: f32::NAN,
                ..Default::default()
            },
            EmitterSettings {
                gravity: Vec3::new(0.0, f32::INFINITY, 0.0),
                ..Default::default()
            },
        ];
        for settings in bad {
            assert!(Emitter::new(VecPool::new(1), SpawnDescriptor::default(), settings).is_err());
        }
    }

    #[test]
    fn test_uniforms_cover_live_range() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut e = emitter(10, 3, 0.0);
        e.set_gravity(Vec3::new(0.0, -9.8, 0.0)).unwrap();
        e.set_air_resistance(1.8).unwrap();
        e.emit(0.016, &mut rng);

        let u = e.uniforms(0.016);
        assert_eq!(u.particle_count, 3);
        assert_eq!(u.gravity(), Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(u.air_resistance, 1.8);
        assert!(e.set_air_resistance(-0.1).is_err());
    }
}
