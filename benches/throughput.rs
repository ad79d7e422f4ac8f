//! Submit/join throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use triage::{Config, Executor, Priority};

fn submit_join_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_join_all");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("normal", size), size, |b, &size| {
            let pool = Executor::new(Config::builder().max_workers(4).build().unwrap()).unwrap();
            b.iter(|| {
                for i in 0..size {
                    pool.spawn(move || black_box(i * 2)).unwrap();
                }
                pool.join_all()
            });
            pool.shutdown();
        });
    }

    group.finish();
}

fn submit_mixed_priorities(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_priorities");

    group.bench_function("three_way_mix", |b| {
        let pool = Executor::new(Config::builder().max_workers(4).build().unwrap()).unwrap();
        b.iter(|| {
            for i in 0..1_000u64 {
                let priority = match i % 3 {
                    0 => Priority::High,
                    1 => Priority::Normal,
                    _ => Priority::Low,
                };
                pool.submit(move || black_box(i).wrapping_mul(31), priority, 0)
                    .unwrap();
            }
            pool.join_all()
        });
        pool.shutdown();
    });

    group.finish();
}

criterion_group!(benches, submit_join_all, submit_mixed_priorities);
criterion_main!(benches);
