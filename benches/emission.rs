//! Benchmarks for the CPU side of emission: descriptor sampling and the
//! birth policy.
//!
//! Run with: `cargo bench --bench emission`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use pointfx::backend::Viewport;
use pointfx::cpu::HostBuffer;
use pointfx::{Emitter, EmitterConfig};

const HD: Viewport = Viewport {
    width: 1280.0,
    height: 720.0,
};

fn bench_spawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    for preset in ["fire", "snow", "experiment"] {
        let (_, descriptor) = EmitterConfig::preset(preset)
            .and_then(|config| config.resolve(HD).ok())
            .expect("preset resolves");
        group.bench_function(preset, |b| {
            let mut rng = SmallRng::seed_from_u64(1);
            b.iter(|| black_box(descriptor.spawn(&mut rng)))
        });
    }

    group.finish();
}

fn bench_fill_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_pool");

    for birth_rate in [5u32, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("birth_rate", birth_rate),
            &birth_rate,
            |b, &birth_rate| {
                let mut config = EmitterConfig::experiment();
                config.particle_count = 10_000;
                config.birth_rate = birth_rate;
                let (settings, descriptor) = config.resolve(HD).expect("preset resolves");

                b.iter(|| {
                    let mut rng = SmallRng::seed_from_u64(2);
                    let pool = HostBuffer::new(config.particle_count);
                    let mut emitter =
                        Emitter::new(pool, descriptor.clone(), settings.clone()).expect("valid");
                    while !emitter.is_exhausted() {
                        black_box(emitter.emit(1.0 / 60.0, &mut rng));
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_spawn, bench_fill_pool);
criterion_main!(benches);
