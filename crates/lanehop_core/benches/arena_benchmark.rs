//! Benchmark for hazard arena churn.
//!
//! A long run inserts and evicts hazards every few hundred ticks while
//! advancing all of them every tick. Both paths must stay flat.
//!
//! Run with: cargo bench --package lanehop_core --bench arena_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lanehop_core::{Entity, EntityArena};

fn benchmark_advance_all(c: &mut Criterion) {
    let mut arena = EntityArena::with_capacity(1_000);
    for i in 0..1_000 {
        let speed = if i % 2 == 0 { 2 } else { -3 };
        arena.insert(Entity::car((i * 7) % 800, (i / 10) * 40, speed));
    }

    let mut group = c.benchmark_group("arena");
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("advance_1000_cars", |b| {
        b.iter(|| {
            for (_, car) in arena.iter_mut() {
                car.advance(black_box(800));
            }
        });
    });
    group.finish();
}

fn benchmark_insert_retain(c: &mut Criterion) {
    c.bench_function("insert_then_retain_half", |b| {
        let mut arena = EntityArena::with_capacity(512);
        b.iter(|| {
            for i in 0..512 {
                arena.insert(Entity::train(0, i * 40, 3));
            }
            black_box(arena.retain(|_, t| t.y() % 80 == 0));
            arena.clear();
        });
    });
}

criterion_group!(benches, benchmark_advance_all, benchmark_insert_retain);
criterion_main!(benches);
