//! Benchmark for chunk generation and map streaming.
//!
//! TARGET: a validated chunk well under one 60 Hz frame
//!
//! Run with: cargo bench --package lanehop_procedural --bench chunk_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lanehop_procedural::{
    ChunkFactory, GameMap, PathValidator, StreamingConfig, TerrainType, WorldSeed,
};

fn benchmark_single_chunk(c: &mut Criterion) {
    let factory = ChunkFactory::new(&StreamingConfig::default());
    let mut rng = WorldSeed::new(42).rng();

    c.bench_function("random_chunk_generation", |b| {
        let mut position = 0i32;
        b.iter(|| {
            position = position.wrapping_add(120);
            black_box(factory.create_random_chunk(&mut rng, position, 800))
        });
    });
}

fn benchmark_per_terrain(c: &mut Criterion) {
    let factory = ChunkFactory::new(&StreamingConfig::default());
    let mut group = c.benchmark_group("terrain_generation");

    for terrain in TerrainType::ALL {
        let mut rng = WorldSeed::new(7).rng();
        group.bench_function(format!("{terrain:?}"), |b| {
            b.iter(|| black_box(factory.create_chunk(&mut rng, terrain, 0, 800)));
        });
    }

    group.finish();
}

fn benchmark_validation(c: &mut Criterion) {
    let factory = ChunkFactory::new(&StreamingConfig::default());
    let validator = PathValidator::default();
    let mut rng = WorldSeed::new(99).rng();
    let chunks: Vec<_> = (0..64)
        .map(|i| factory.create_random_chunk(&mut rng, i * 120, 800))
        .collect();

    let mut group = c.benchmark_group("path_validation");
    group.throughput(Throughput::Elements(chunks.len() as u64));
    group.bench_function("has_route_64_chunks", |b| {
        b.iter(|| {
            for chunk in &chunks {
                black_box(validator.has_route(chunk));
            }
        });
    });

    group.finish();
}

fn benchmark_map_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_streaming");
    group.sample_size(10);
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("1000_ticks", |b| {
        b.iter(|| {
            let Ok(mut map) = GameMap::new(StreamingConfig::default(), WorldSeed::new(42)) else {
                return;
            };
            for _ in 0..1_000 {
                black_box(map.update());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_chunk,
    benchmark_per_terrain,
    benchmark_validation,
    benchmark_map_update
);
criterion_main!(benches);
