use std::path::PathBuf;
use std::process::ExitCode;

use pointfx::backend::Viewport;
use pointfx::cpu::CpuBackend;
use pointfx::window::{self, make_rng};
use pointfx::{AppConfig, AppError, Renderer, TextureLoader};

const USAGE: &str = "usage: pointfx [SCENE.json] [--headless FRAMES] [--seed N]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    scene: Option<PathBuf>,
    headless: Option<u64>,
    seed: Option<u64>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => parsed.headless = Some(number(&arg, args.next())?),
            "--seed" => parsed.seed = Some(number(&arg, args.next())?),
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown option `{flag}`")),
            path if parsed.scene.is_none() => parsed.scene = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument `{extra}`")),
        }
    }
    Ok(parsed)
}

fn number(flag: &str, value: Option<String>) -> Result<u64, String> {
    let value = value.ok_or_else(|| format!("`{flag}` needs a value"))?;
    value
        .parse()
        .map_err(|_| format!("`{flag}` expects a non-negative integer, got `{value}`"))
}

/// Step the scene on the CPU backend and log where every emitter ends up.
fn run_headless(config: AppConfig, frames: u64) -> Result<(), AppError> {
    let backend = CpuBackend::new(
        Viewport::new(1280.0, 720.0),
        TextureLoader::new(&config.asset_root),
    );
    let mut renderer = Renderer::new(backend, config.scene.clone(), make_rng(config.seed))?;
    let dt = config.fixed_delta();

    for _ in 0..frames {
        renderer.render_frame(dt)?;
    }

    for instance in renderer.emitters() {
        let emitter = instance.emitter();
        tracing::info!(
            emitter = instance.name(),
            live = emitter.current_particles(),
            capacity = emitter.particle_count(),
            drawn = instance.is_drawn(),
            "headless run finished"
        );
    }
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = match &args.scene {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    match args.headless {
        Some(frames) => run_headless(config, frames),
        None => window::run(config),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pointfx=info")),
        )
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "pointfx failed");
            ExitCode::FAILURE
        }
    }
}
