//! Tick throughput of a full generation job.
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mazeglow_common::Palette;
use mazeglow_kernel::{GenerationConfig, GenerationSession};

fn bench_full_job(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_job");
    group.sample_size(10);
    for cells in [16u32, 32, 48] {
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &cells| {
            b.iter(|| {
                let config = GenerationConfig {
                    rng_seed: Some(7),
                    ..Default::default()
                };
                let mut session = GenerationSession::new(config, Palette::dark(), cells);
                black_box(session.run_to_completion(1_000_000))
            });
        });
    }
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let config = GenerationConfig {
        rng_seed: Some(3),
        ..Default::default()
    };
    let mut session = GenerationSession::new(config, Palette::dark(), 32);
    session.seed();
    c.bench_function("tick_32", |b| {
        b.iter(|| {
            if session.is_complete() {
                session.seed();
            }
            black_box(session.tick())
        });
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut session = GenerationSession::new(GenerationConfig::default(), Palette::light(), 32);
    session.seed();
    c.bench_function("snapshot_32", |b| b.iter(|| black_box(session.snapshot()).close()));
}

criterion_group!(benches, bench_full_job, bench_tick, bench_snapshot);
criterion_main!(benches);
