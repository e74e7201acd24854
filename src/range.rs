//! Inclusive random ranges used by spawn descriptors.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An inclusive `min..=max` interval of offsets.
///
/// Every sampled value lies in `[min, max]`. A zero-width range `a..=a`
/// always yields `a` and does not consume randomness.
///
/// Serialized as a two-element array, `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 2]", into = "[f32; 2]")]
pub struct SpawnRange {
    min: f32,
    max: f32,
}

impl SpawnRange {
    /// The `0..=0` range.
    pub const ZERO: SpawnRange = SpawnRange { min: 0.0, max: 0.0 };
    /// The `1..=1` range.
    pub const UNIT: SpawnRange = SpawnRange { min: 1.0, max: 1.0 };

    /// Create a range, rejecting inverted or non-finite bounds and widths.
    pub fn new(min: f32, max: f32) -> Result<Self, ConfigError> {
        Self::checked("range", min, max)
    }

    /// Zero-width range at `value`.
    pub fn constant(value: f32) -> Result<Self, ConfigError> {
        Self::new(value, value)
    }

    /// Range from literal bounds. Callers pass ordered, finite values.
    pub(crate) const fn literal(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Like [`SpawnRange::new`] but names the attribute in the error.
    pub(crate) fn checked(field: &'static str, min: f32, max: f32) -> Result<Self, ConfigError> {
        if !min.is_finite() {
            return Err(ConfigError::NonFinite { field, value: min });
        }
        if !max.is_finite() {
            return Err(ConfigError::NonFinite { field, value: max });
        }
        if min > max {
            return Err(ConfigError::InvertedRange { field, min, max });
        }
        if !(max - min).is_finite() {
            return Err(ConfigError::RangeTooWide { field, min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// `max - min`.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    /// Whether `value` lies inside the range, bounds included.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Draw a uniform value from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min == self.max {
            return self.min;
        }
        // Float rounding in the sampler may land one ulp outside.
        rng.gen_range(self.min..=self.max).clamp(self.min, self.max)
    }
}

impl Default for SpawnRange {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<[f32; 2]> for SpawnRange {
    type Error = ConfigError;

    fn try_from([min, max]: [f32; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<SpawnRange> for [f32; 2] {
    fn from(range: SpawnRange) -> Self {
        [range.min, range.max]
    }
}
