//! Spawn descriptors: randomized initial state for newborn particles.
//!
//! A [`SpawnDescriptor`] pairs a base value with an inclusive [`SpawnRange`]
//! for every randomized attribute. [`SpawnDescriptor::spawn`] rolls one
//! [`Particle`] from it using an injected random source, so a seeded
//! generator reproduces the exact same records.
//!
//! # Example
//!
//! ```ignore
//! let descriptor = SpawnDescriptor::new()
//!     .with_position(Vec3::new(550.0, 0.0, 0.0))
//!     .with_position_x_range(SpawnRange::new(0.0, 180.0)?)
//!     .with_direction(FRAC_PI_2, SpawnRange::new(-0.3, 0.3)?)
//!     .with_speed(180.0, SpawnRange::ZERO)
//!     .with_life(3.0, SpawnRange::new(-0.8, 1.2)?);
//!
//! let particle = descriptor.spawn(&mut rng);
//! ```

use glam::{Vec3, Vec4};
use rand::Rng;

use crate::error::ConfigError;
use crate::particle::Particle;
use crate::range::SpawnRange;

/// Base values and random ranges used to initialize a new particle.
///
/// Every range is an offset added to its base value.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnDescriptor {
    /// Base spawn position.
    pub position: Vec3,
    /// Offset range along x.
    pub position_x_range: SpawnRange,
    /// Offset range along y.
    pub position_y_range: SpawnRange,
    /// Offset range along z.
    pub position_z_range: SpawnRange,
    /// Base emission angle in the xy plane, radians.
    pub direction: f32,
    pub direction_range: SpawnRange,
    /// Base speed along the emission angle.
    pub speed: f32,
    pub speed_range: SpawnRange,
    /// Base sprite size in pixels.
    pub point_size: f32,
    pub point_size_range: SpawnRange,
    pub start_scale: f32,
    pub start_scale_range: SpawnRange,
    pub end_scale: f32,
    /// `None` keeps each particle's scale constant at its rolled start scale.
    pub end_scale_range: Option<SpawnRange>,
    /// Base lifetime.
    pub life: f32,
    pub life_range: SpawnRange,
    /// Tint shared by every particle.
    pub color: Vec4,
}

impl Default for SpawnDescriptor {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            position_x_range: SpawnRange::ZERO,
            position_y_range: SpawnRange::ZERO,
            position_z_range: SpawnRange::ZERO,
            direction: 0.0,
            direction_range: SpawnRange::ZERO,
            speed: 0.0,
            speed_range: SpawnRange::ZERO,
            point_size: 80.0,
            point_size_range: SpawnRange::ZERO,
            start_scale: 0.0,
            start_scale_range: SpawnRange::UNIT,
            end_scale: 0.0,
            end_scale_range: None,
            life: 0.0,
            life_range: SpawnRange::UNIT,
            color: Vec4::ZERO,
        }
    }
}

impl SpawnDescriptor {
    /// Descriptor with default values: 80 px sprites, scale 1, life 1.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_position_x_range(mut self, range: SpawnRange) -> Self {
        self.position_x_range = range;
        self
    }

    pub fn with_position_y_range(mut self, range: SpawnRange) -> Self {
        self.position_y_range = range;
        self
    }

    pub fn with_position_z_range(mut self, range: SpawnRange) -> Self {
        self.position_z_range = range;
        self
    }

    /// Set the emission angle (radians, counter-clockwise from +x).
    pub fn with_direction(mut self, direction: f32, range: SpawnRange) -> Self {
        self.direction = direction;
        self.direction_range = range;
        self
    }

    pub fn with_speed(mut self, speed: f32, range: SpawnRange) -> Self {
        self.speed = speed;
        self.speed_range = range;
        self
    }

    pub fn with_point_size(mut self, size: f32, range: SpawnRange) -> Self {
        self.point_size = size;
        self.point_size_range = range;
        self
    }

    pub fn with_start_scale(mut self, scale: f32, range: SpawnRange) -> Self {
        self.start_scale = scale;
        self.start_scale_range = range;
        self
    }

    /// Interpolate towards `scale + range` over each particle's life.
    pub fn with_end_scale(mut self, scale: f32, range: SpawnRange) -> Self {
        self.end_scale = scale;
        self.end_scale_range = Some(range);
        self
    }

    pub fn with_life(mut self, life: f32, range: SpawnRange) -> Self {
        self.life = life;
        self.life_range = range;
        self
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Reject NaN or infinite base values.
    ///
    /// Ranges are validated when they are built, so only the bases remain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("position.x", self.position.x),
            ("position.y", self.position.y),
            ("position.z", self.position.z),
            ("direction", self.direction),
            ("speed", self.speed),
            ("point_size", self.point_size),
            ("start_scale", self.start_scale),
            ("end_scale", self.end_scale),
            ("life", self.life),
            ("color.r", self.color.x),
            ("color.g", self.color.y),
            ("color.b", self.color.z),
            ("color.a", self.color.w),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        Ok(())
    }

    /// Roll one newborn particle.
    ///
    /// Draw order is fixed: x, y, z, size, direction, speed, start scale,
    /// end scale (only if a range is set), life.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        let position = Vec3::new(
            self.position.x + self.position_x_range.sample(rng),
            self.position.y + self.position_y_range.sample(rng),
            self.position.z + self.position_z_range.sample(rng),
        );

        let size = self.point_size + self.point_size_range.sample(rng);

        let direction = self.direction + self.direction_range.sample(rng);
        let speed = self.speed + self.speed_range.sample(rng);
        let velocity = Vec3::new(direction.cos(), direction.sin(), 0.0) * speed;

        let start_scale = self.start_scale + self.start_scale_range.sample(rng);
        let end_scale = match self.end_scale_range {
            Some(range) => self.end_scale + range.sample(rng),
            None => start_scale,
        };

        let life = self.life + self.life_range.sample(rng);

        Particle {
            start_position: position,
            start_velocity: velocity,
            position,
            velocity,
            color: self.color,
            age: 0.0,
            life,
            size,
            scale: start_scale,
            start_scale,
            end_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::f32::consts::FRAC_PI_2;

    fn range(min: f32, max: f32) -> SpawnRange {
        SpawnRange::new(min, max).unwrap()
    }

    #[test]
    fn test_defaults_match_reference_values() {
        let d = SpawnDescriptor::default();
        assert_eq!(d.point_size, 80.0);
        assert_eq!(d.start_scale_range, range(1.0, 1.0));
        assert_eq!(d.life_range, range(1.0, 1.0));
        assert!(d.end_scale_range.is_none());

        let mut rng = SmallRng::seed_from_u64(1);
        let p = d.spawn(&mut rng);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.end_scale, 1.0);
        assert_eq!(p.life, 1.0);
        assert_eq!(p.age, 0.0);
    }

    #[test]
    fn test_attributes_within_ranges() {
        let d = SpawnDescriptor::new()
            .with_position(Vec3::new(100.0, -5.0, 0.0))
            .with_position_x_range(range(0.0, 180.0))
            .with_position_y_range(range(-1.0, 1.0))
            .with_direction(1.0, range(-0.5, 0.5))
            .with_speed(50.0, range(-10.0, 10.0))
            .with_point_size(40.0, range(0.0, 40.0))
            .with_start_scale(0.0, range(0.5, 1.0))
            .with_end_scale(0.0, range(0.0, 0.25))
            .with_life(10.0, range(-2.0, 2.0));

        for seed in 0..16 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..200 {
                let p = d.spawn(&mut rng);
                assert!((100.0..=280.0).contains(&p.position.x));
                assert!((-6.0..=-4.0).contains(&p.position.y));
                assert_eq!(p.position.z, 0.0);
                assert!((40.0..=80.0).contains(&p.size));
                assert!((0.5..=1.0).contains(&p.start_scale));
                assert!((0.0..=0.25).contains(&p.end_scale));
                assert!((8.0..=12.0).contains(&p.life));

                let speed = p.velocity.length();
                assert!((40.0 - 1e-3..=60.0 + 1e-3).contains(&speed), "speed {speed}");
                let direction = p.velocity.y.atan2(p.velocity.x);
                assert!((0.5 - 1e-4..=1.5 + 1e-4).contains(&direction), "direction {direction}");
            }
        }
    }

    #[test]
    fn test_velocity_follows_direction() {
        let d = SpawnDescriptor::new()
            .with_direction(FRAC_PI_2, SpawnRange::ZERO)
            .with_speed(3.0, SpawnRange::ZERO);
        let mut rng = SmallRng::seed_from_u64(3);
        let p = d.spawn(&mut rng);
        assert!(p.velocity.x.abs() < 1e-5);
        assert!((p.velocity.y - 3.0).abs() < 1e-5);
        assert_eq!(p.velocity.z, 0.0);
    }

    #[test]
    fn test_start_snapshots() {
        let d = SpawnDescriptor::new()
            .with_position_x_range(range(0.0, 50.0))
            .with_speed(2.0, range(0.0, 1.0));
        let mut rng = SmallRng::seed_from_u64(11);
        let p = d.spawn(&mut rng);
        assert_eq!(p.start_position, p.position);
        assert_eq!(p.start_velocity, p.velocity);
        assert_eq!(p.scale, p.start_scale);
    }

    #[test]
    fn test_validate_rejects_nan_base() {
        let d = SpawnDescriptor::new().with_life(f32::NAN, SpawnRange::ZERO);
        assert!(matches!(
            d.validate(),
            Err(ConfigError::NonFinite { field: "life", .. })
        ));
        assert!(SpawnDescriptor::default().validate().is_ok());
    }

    #[test]
    fn test_constant_color() {
        let color = Vec4::new(0.1, 0.4, 0.8, 0.5);
        let d = SpawnDescriptor::new().with_color(color);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..10 {
            assert_eq!(d.spawn(&mut rng).color, color);
        }
    }

    #[test]
    fn test_same_seed_same_particle() {
        let d = SpawnDescriptor::new()
            .with_position_x_range(range(0.0, 10.0))
            .with_direction(0.0, range(0.0, 6.28))
            .with_life(1.0, range(-0.5, 0.5));
        let a = d.spawn(&mut SmallRng::seed_from_u64(99));
        let b = d.spawn(&mut SmallRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
