//! Benchmark for full-field population generation.
//!
//! Generation is one-shot, not per-frame, but regeneration on parameter
//! change must stay interactive.
//!
//! Run with: cargo bench --package sward_procedural --bench generation_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sward_procedural::{FieldGenerator, FlatHeightField, GrowthParams};

fn benchmark_field_generation(c: &mut Criterion) {
    let params = GrowthParams::meadow().with_count(65_536);
    let generator = FieldGenerator::new(params);
    let ground = FlatHeightField(0.0);

    let mut group = c.benchmark_group("field_generation");
    group.throughput(Throughput::Elements(u64::from(params.capacity())));
    group.sample_size(10);

    group.bench_function("64k_blades", |b| {
        b.iter(|| black_box(generator.generate(&ground, None)));
    });

    group.finish();
}

fn benchmark_noise_sample(c: &mut Criterion) {
    let noise = sward_procedural::SimplexNoise::new(sward_shared::FieldSeed::new(42));

    c.bench_function("single_noise_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

criterion_group!(benches, benchmark_field_generation, benchmark_noise_sample);
criterion_main!(benches);
