//! Loading scene files from disk and running them.

use std::fs;

use pointfx::config::ScreenValue;
use pointfx::cpu::CpuBackend;
use pointfx::prelude::*;
use pointfx::ConfigError;

const SCENE: &str = r#"{
    "seed": 21,
    "fixed_fps": 30,
    "scene": {
        "emitters": [
            {
                "name": "fountain",
                "particle_count": 64,
                "birth_rate": 8,
                "birth_delay": 0.09,
                "gravity": [0, -200, 0],
                "air_resistance": 0.5,
                "position": [{ "width": 0.5 }, 20, 0],
                "texture": "builtin/spark",
                "spawn": {
                    "direction": 1.5708,
                    "direction_range": [-0.2, 0.2],
                    "speed": 300,
                    "speed_range": [-50, 50],
                    "point_size": 12,
                    "start_scale": 1,
                    "start_scale_range": [0, 0],
                    "end_scale_range": [0, 0],
                    "life": 1.5,
                    "life_range": [0, 0.5],
                    "color": [0.4, 0.7, 1.0, 0.8]
                }
            }
        ]
    }
}"#;

#[test]
fn test_scene_file_runs_headless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fountain.json");
    fs::write(&path, SCENE).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.seed, Some(21));
    assert_eq!(config.fixed_delta(), 1.0 / 30.0);

    let fountain = &config.scene.emitters[0];
    assert_eq!(fountain.position[0], ScreenValue::of_width(0.5, 0.0));
    assert_eq!(fountain.gravity, Vec3::new(0.0, -200.0, 0.0));

    let backend = CpuBackend::new(Viewport::new(640.0, 480.0), TextureLoader::new(&config.asset_root));
    let seed = config.seed.unwrap();
    let mut renderer = Renderer::new(backend, config.scene.clone(), SmallRng::seed_from_u64(seed)).unwrap();

    // 0.09s delay at 30 fps: a batch every third frame.
    let born: Vec<u32> = (0..6)
        .map(|_| renderer.render_frame(config.fixed_delta()).unwrap().born)
        .collect();
    assert_eq!(born.iter().sum::<u32>(), 16);

    let emitter = renderer.emitter("fountain").unwrap().emitter();
    assert_eq!(emitter.position(), Vec3::new(320.0, 20.0, 0.0));
    for p in emitter.pool().particles(emitter.current_particles()) {
        assert!(p.velocity.y > 0.0, "fountain particles start upwards");
        assert!((1.5..=2.0).contains(&p.life));
        assert_eq!(p.size, 12.0);
    }
}

#[test]
fn test_presets_round_trip_through_json() {
    let json = serde_json::to_string(&SceneConfig::default()).unwrap();
    let parsed: SceneConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, SceneConfig::default());
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{ "scene": { "emitters": [ { "particle_count": "many" } ] } }"#).unwrap();

    assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
}
