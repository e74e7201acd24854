//! Scene configuration.
//!
//! Scenes are JSON documents deserialized with serde:
//!
//! ```json
//! {
//!   "seed": 7,
//!   "asset_root": "assets",
//!   "scene": {
//!     "emitters": [
//!       {
//!         "name": "sparks",
//!         "particle_count": 500,
//!         "birth_rate": 4,
//!         "position": [{ "width": 0.5 }, 0, 0],
//!         "texture": "builtin/spark",
//!         "spawn": { "speed": 120, "direction_range": [0, 6.283], "life": 1.5 }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Quantities that depend on the drawable size are [`ScreenValue`]s, so the
//! same file works at any resolution. Emitters are rebuilt from their config
//! whenever the viewport changes.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::backend::Viewport;
use crate::descriptor::SpawnDescriptor;
use crate::emitter::EmitterSettings;
use crate::error::ConfigError;
use crate::range::SpawnRange;

/// Frame rate used for fixed-step runs when none is configured.
pub const DEFAULT_FPS: f32 = 60.0;

/// A length in pixels, optionally relative to the viewport.
///
/// Either a plain number of pixels, or `{ "width": w, "height": h, "pixels": p }`
/// resolving to `w * viewport.width + h * viewport.height + p`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenValue {
    Pixels(f32),
    Relative {
        #[serde(default)]
        width: f32,
        #[serde(default)]
        height: f32,
        #[serde(default)]
        pixels: f32,
    },
}

impl ScreenValue {
    /// Fraction of the viewport width, plus `pixels`.
    pub const fn of_width(fraction: f32, pixels: f32) -> Self {
        Self::Relative {
            width: fraction,
            height: 0.0,
            pixels,
        }
    }

    /// Fraction of the viewport height, plus `pixels`.
    pub const fn of_height(fraction: f32, pixels: f32) -> Self {
        Self::Relative {
            width: 0.0,
            height: fraction,
            pixels,
        }
    }

    pub fn resolve(&self, viewport: Viewport) -> f32 {
        match *self {
            Self::Pixels(p) => p,
            Self::Relative {
                width,
                height,
                pixels,
            } => width * viewport.width + height * viewport.height + pixels,
        }
    }
}

impl Default for ScreenValue {
    fn default() -> Self {
        Self::Pixels(0.0)
    }
}

impl From<f32> for ScreenValue {
    fn from(pixels: f32) -> Self {
        Self::Pixels(pixels)
    }
}

/// A point whose components may be viewport-relative.
pub type ScreenPoint = [ScreenValue; 3];

/// A `[min, max]` range whose bounds may be viewport-relative.
pub type ScreenRange = [ScreenValue; 2];

fn resolve_point(point: &ScreenPoint, viewport: Viewport) -> Vec3 {
    Vec3::new(
        point[0].resolve(viewport),
        point[1].resolve(viewport),
        point[2].resolve(viewport),
    )
}

fn resolve_range(
    field: &'static str,
    range: &ScreenRange,
    viewport: Viewport,
) -> Result<SpawnRange, ConfigError> {
    SpawnRange::checked(field, range[0].resolve(viewport), range[1].resolve(viewport))
}

const fn px(pixels: f32) -> ScreenValue {
    ScreenValue::Pixels(pixels)
}

/// Spawn descriptor as written in a scene file.
///
/// Missing fields take the same defaults as [`SpawnDescriptor::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnConfig {
    pub position: ScreenPoint,
    pub position_x_range: ScreenRange,
    pub position_y_range: ScreenRange,
    pub position_z_range: ScreenRange,
    /// Radians, counter-clockwise from +x.
    pub direction: f32,
    pub direction_range: SpawnRange,
    pub speed: f32,
    pub speed_range: SpawnRange,
    pub point_size: f32,
    pub point_size_range: SpawnRange,
    pub start_scale: f32,
    pub start_scale_range: SpawnRange,
    pub end_scale: f32,
    pub end_scale_range: Option<SpawnRange>,
    pub life: f32,
    pub life_range: SpawnRange,
    /// RGBA.
    pub color: Vec4,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        let d = SpawnDescriptor::default();
        Self {
            position: ScreenPoint::default(),
            position_x_range: ScreenRange::default(),
            position_y_range: ScreenRange::default(),
            position_z_range: ScreenRange::default(),
            direction: d.direction,
            direction_range: d.direction_range,
            speed: d.speed,
            speed_range: d.speed_range,
            point_size: d.point_size,
            point_size_range: d.point_size_range,
            start_scale: d.start_scale,
            start_scale_range: d.start_scale_range,
            end_scale: d.end_scale,
            end_scale_range: d.end_scale_range,
            life: d.life,
            life_range: d.life_range,
            color: d.color,
        }
    }
}

impl SpawnConfig {
    /// Resolve viewport-relative values into a validated descriptor.
    pub fn resolve(&self, viewport: Viewport) -> Result<SpawnDescriptor, ConfigError> {
        let descriptor = SpawnDescriptor {
            position: resolve_point(&self.position, viewport),
            position_x_range: resolve_range("position_x_range", &self.position_x_range, viewport)?,
            position_y_range: resolve_range("position_y_range", &self.position_y_range, viewport)?,
            position_z_range: resolve_range("position_z_range", &self.position_z_range, viewport)?,
            direction: self.direction,
            direction_range: self.direction_range,
            speed: self.speed,
            speed_range: self.speed_range,
            point_size: self.point_size,
            point_size_range: self.point_size_range,
            start_scale: self.start_scale,
            start_scale_range: self.start_scale_range,
            end_scale: self.end_scale,
            end_scale_range: self.end_scale_range,
            life: self.life,
            life_range: self.life_range,
            color: self.color,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

/// One emitter as written in a scene file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterConfig {
    /// Used in logs and error messages.
    pub name: String,
    /// Pool capacity and total birth budget.
    pub particle_count: u32,
    pub birth_rate: u32,
    /// Seconds between emission ticks.
    pub birth_delay: f32,
    /// Fire the first batch on the first frame instead of after one delay.
    pub primed: bool,
    /// Pixels per second squared.
    pub gravity: Vec3,
    pub air_resistance: f32,
    /// Offset added to every particle when drawing.
    pub position: ScreenPoint,
    /// Logical sprite name; `None` simulates without drawing.
    pub texture: Option<String>,
    pub spawn: SpawnConfig,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            name: "emitter".to_string(),
            particle_count: 0,
            birth_rate: 0,
            birth_delay: 0.0,
            primed: false,
            gravity: Vec3::ZERO,
            air_resistance: 0.0,
            position: ScreenPoint::default(),
            texture: None,
            spawn: SpawnConfig::default(),
        }
    }
}

impl EmitterConfig {
    /// Resolve against the current viewport.
    pub fn resolve(
        &self,
        viewport: Viewport,
    ) -> Result<(EmitterSettings, SpawnDescriptor), ConfigError> {
        let settings = EmitterSettings {
            birth_rate: self.birth_rate,
            birth_delay: self.birth_delay,
            gravity: self.gravity,
            air_resistance: self.air_resistance,
            position: resolve_point(&self.position, viewport),
        };
        settings.validate()?;
        Ok((settings, self.spawn.resolve(viewport)?))
    }

    /// Rising flame: a 180 px wide base at the bottom center, shrinking and
    /// drifting upwards against gravity.
    pub fn fire() -> Self {
        Self {
            name: "fire".to_string(),
            particle_count: 1200,
            birth_rate: 5,
            gravity: Vec3::new(0.0, -60.0, 0.0),
            air_resistance: 1.8,
            position: [px(0.0), px(-10.0), px(0.0)],
            texture: Some("builtin/soft".to_string()),
            spawn: SpawnConfig {
                position: [ScreenValue::of_width(0.5, -90.0), px(0.0), px(0.0)],
                position_x_range: [px(0.0), px(180.0)],
                direction: FRAC_PI_2,
                direction_range: SpawnRange::literal(-0.3, 0.3),
                speed: 180.0,
                speed_range: SpawnRange::ZERO,
                point_size: 80.0,
                start_scale: 0.0,
                start_scale_range: SpawnRange::literal(0.5, 1.0),
                end_scale: 0.0,
                end_scale_range: Some(SpawnRange::ZERO),
                life: 3.0,
                life_range: SpawnRange::literal(-0.8, 1.2),
                color: Vec4::new(1.0, 0.392, 0.1, 0.5),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Flakes drifting down from the top edge across the full width.
    pub fn snow() -> Self {
        Self {
            name: "snow".to_string(),
            particle_count: 1000,
            birth_rate: 3,
            birth_delay: 1.0 / 3.0,
            primed: true,
            position: [px(0.0), ScreenValue::of_height(1.0, 0.0), px(0.0)],
            texture: Some("builtin/snowflake".to_string()),
            spawn: SpawnConfig {
                position_x_range: [px(0.0), ScreenValue::of_width(1.0, 0.0)],
                direction: -FRAC_PI_2,
                speed: 0.0,
                speed_range: SpawnRange::literal(120.0, 360.0),
                point_size: 0.0,
                point_size_range: SpawnRange::literal(40.0, 80.0),
                start_scale: 0.0,
                start_scale_range: SpawnRange::literal(0.01, 0.3),
                life: 500.0 / 60.0,
                life_range: SpawnRange::ZERO,
                color: Vec4::ONE,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Blue burst in every direction from a 180 px square at the center.
    pub fn experiment() -> Self {
        Self {
            name: "experiment".to_string(),
            particle_count: 1200,
            birth_rate: 5,
            position: [
                ScreenValue::of_width(0.5, 0.0),
                ScreenValue::of_height(0.5, 0.0),
                px(0.0),
            ],
            texture: Some("builtin/soft".to_string()),
            spawn: SpawnConfig {
                position_x_range: [px(0.0), px(180.0)],
                position_y_range: [px(0.0), px(180.0)],
                direction: 0.0,
                direction_range: SpawnRange::literal(0.0, TAU),
                speed: 60.0,
                speed_range: SpawnRange::ZERO,
                point_size: 30.0,
                start_scale: 0.0,
                start_scale_range: SpawnRange::literal(0.5, 1.0),
                end_scale: 0.0,
                end_scale_range: Some(SpawnRange::ZERO),
                life: 2.0,
                life_range: SpawnRange::literal(-0.8, 1.2),
                color: Vec4::new(0.1, 0.4, 0.8, 0.5),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "fire" => Some(Self::fire()),
            "snow" => Some(Self::snow()),
            "experiment" => Some(Self::experiment()),
            _ => None,
        }
    }
}

/// The emitters of a scene, in draw order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    pub emitters: Vec<EmitterConfig>,
}

impl Default for SceneConfig {
    /// Snow behind fire behind the experiment burst.
    fn default() -> Self {
        Self {
            emitters: vec![
                EmitterConfig::snow(),
                EmitterConfig::fire(),
                EmitterConfig::experiment(),
            ],
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Seed for the spawn RNG; random when absent.
    pub seed: Option<u64>,
    /// Step at a fixed rate instead of measuring wall-clock time.
    pub fixed_fps: Option<f32>,
    /// Directory that non-builtin texture names resolve against.
    pub asset_root: PathBuf,
    pub scene: SceneConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed: None,
            fixed_fps: None,
            asset_root: PathBuf::from("assets"),
            scene: SceneConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject a non-positive or non-finite fixed rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(fps) = self.fixed_fps {
            if !fps.is_finite() {
                return Err(ConfigError::NonFinite {
                    field: "fixed_fps",
                    value: fps,
                });
            }
            if fps <= 0.0 {
                return Err(ConfigError::NotPositive {
                    field: "fixed_fps",
                    value: fps,
                });
            }
        }
        Ok(())
    }

    /// Seconds per fixed step.
    pub fn fixed_delta(&self) -> f32 {
        1.0 / self.fixed_fps.unwrap_or(DEFAULT_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    #[test]
    fn test_screen_value_forms() {
        let plain: ScreenValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(plain.resolve(HD), 12.5);

        let rel: ScreenValue = serde_json::from_str(r#"{"width": 0.5, "pixels": -90}"#).unwrap();
        assert_eq!(rel.resolve(HD), 550.0);

        let h: ScreenValue = serde_json::from_str(r#"{"height": 1}"#).unwrap();
        assert_eq!(h.resolve(HD), 720.0);
    }

    #[test]
    fn test_fire_preset_resolves() {
        let (settings, descriptor) = EmitterConfig::fire().resolve(HD).unwrap();
        assert_eq!(settings.birth_rate, 5);
        assert_eq!(settings.position, Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(descriptor.position.x, 550.0);
        assert_eq!(descriptor.position_x_range, SpawnRange::new(0.0, 180.0).unwrap());
        assert_eq!(descriptor.end_scale_range, Some(SpawnRange::ZERO));
        assert!((descriptor.direction_range.min() + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_snow_spans_viewport() {
        let (settings, descriptor) = EmitterConfig::snow().resolve(HD).unwrap();
        assert_eq!(settings.position.y, 720.0);
        assert_eq!(descriptor.position_x_range.max(), 1280.0);
        assert_eq!(descriptor.end_scale_range, None);
        assert!(EmitterConfig::snow().primed);
    }

    #[test]
    fn test_experiment_centered() {
        let (settings, _) = EmitterConfig::experiment().resolve(HD).unwrap();
        assert_eq!(settings.position, Vec3::new(640.0, 360.0, 0.0));
    }

    #[test]
    fn test_default_scene_order() {
        let names: Vec<_> = SceneConfig::default()
            .emitters
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["snow", "fire", "experiment"]);
    }

    #[test]
    fn test_partial_emitter_uses_defaults() {
        let json = r#"{
            "scene": { "emitters": [
                { "name": "dots", "particle_count": 10, "birth_rate": 3,
                  "spawn": { "life": 10, "life_range": [-2, 2] } }
            ] }
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        let emitter = &config.scene.emitters[0];
        assert_eq!(emitter.texture, None);
        assert_eq!(emitter.spawn.point_size, 80.0);
        assert_eq!(emitter.spawn.life_range, SpawnRange::new(-2.0, 2.0).unwrap());
        assert_eq!(config.asset_root, PathBuf::from("assets"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let inverted = r#"{ "scene": { "emitters": [ { "spawn": { "life_range": [2, -2] } } ] } }"#;
        assert!(matches!(AppConfig::from_json(inverted), Err(ConfigError::Parse(_))));

        let negative_count = r#"{ "scene": { "emitters": [ { "particle_count": -5 } ] } }"#;
        assert!(matches!(AppConfig::from_json(negative_count), Err(ConfigError::Parse(_))));

        let unknown = r#"{ "scene": { "emitters": [ { "birth_rat": 5 } ] } }"#;
        assert!(AppConfig::from_json(unknown).is_err());

        assert!(AppConfig::from_json(r#"{ "fixed_fps": 0 }"#).is_err());

        let delay = EmitterConfig {
            birth_delay: -1.0,
            ..Default::default()
        };
        assert!(matches!(delay.resolve(HD), Err(ConfigError::Negative { .. })));

        let inverted_screen = EmitterConfig {
            spawn: SpawnConfig {
                position_x_range: [ScreenValue::of_width(1.0, 0.0), px(0.0)],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            inverted_screen.resolve(HD),
            Err(ConfigError::InvertedRange { field: "position_x_range", .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let config = AppConfig {
            seed: Some(9),
            fixed_fps: Some(30.0),
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!((loaded.fixed_delta() - 1.0 / 30.0).abs() < 1e-7);

        let missing = AppConfig::load(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
