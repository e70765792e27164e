//! Benchmarks for the submission path.
//!
//! `submit` is the pool's only hot public call and is contractually
//! non-blocking, so the interesting number is its latency with workers
//! both draining and saturated.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use portpool::{Pool, PoolConfig};

fn bench_submit_draining(c: &mut Criterion) {
    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(2)
            .with_min_threads(2)
            .with_max_threads(2),
        |_: Option<u64>| {},
    )
    .expect("pool construction");

    let mut group = c.benchmark_group("submit");
    group.throughput(Throughput::Elements(1));
    group.bench_function("draining_workers", |b| {
        b.iter(|| pool.submit(black_box(42)));
    });
    group.finish();

    pool.shutdown();
}

fn bench_submit_saturated(c: &mut Criterion) {
    let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();

    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(1)
            .with_min_threads(1)
            .with_max_threads(1),
        move |_: Option<u64>| {
            let _ = release_rx.recv_timeout(Duration::from_secs(60));
        },
    )
    .expect("pool construction");

    let mut group = c.benchmark_group("submit");
    group.throughput(Throughput::Elements(1));
    group.bench_function("saturated_worker", |b| {
        b.iter(|| pool.submit(black_box(42)));
    });
    group.finish();

    drop(release_tx);
    pool.shutdown();
}

criterion_group!(benches, bench_submit_draining, bench_submit_saturated);
criterion_main!(benches);
