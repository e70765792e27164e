//! Integration tests for the elastic pool.
//!
//! These cover the end-to-end behaviors that matter in production:
//! - Every accepted item runs exactly once (no loss, no duplication)
//! - Scale-up under saturation and scale-down when idle
//! - Bounded, idempotent shutdown under load
//! - Fault containment for panicking callbacks
//! - Non-blocking submission independent of worker saturation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use portpool::{Pool, PoolConfig};

/// Poll `probe` until it returns true or `deadline_ms` elapses.
fn wait_until(deadline_ms: u64, mut probe: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(deadline_ms);
    while Instant::now() < deadline {
        if probe() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    probe()
}

/// Every submitted payload is executed exactly once and the worker
/// population stays inside its bounds.
#[test]
fn baseline_runs_every_item_once() {
    portpool::util::init_tracing();

    let recorded = Arc::new(Mutex::new(Vec::new()));
    let recorded_in_pool = Arc::clone(&recorded);

    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(4)
            .with_min_threads(2)
            .with_max_threads(8),
        move |payload: Option<u64>| {
            if let Some(value) = payload {
                recorded_in_pool.lock().push(value);
            }
        },
    )
    .expect("pool construction");

    for i in 0..100u64 {
        pool.submit(i);
    }

    assert!(
        wait_until(10_000, || pool.stats().completed == 100),
        "items did not drain in time: {:?}",
        pool.stats()
    );

    let current = pool.current_threads();
    assert!(
        (2..=8).contains(&current),
        "worker population {current} escaped [2, 8]"
    );

    pool.shutdown();
    assert_eq!(pool.current_threads(), 0);
    assert_eq!(pool.active_threads(), 0);

    let mut values = recorded.lock().clone();
    values.sort_unstable();
    let expected: Vec<u64> = (0..100).collect();
    assert_eq!(values, expected, "lost or duplicated payloads");
}

/// A burst of slow items grows the pool; a quiet period shrinks it back
/// toward the floor.
#[test]
fn pool_grows_under_load_and_shrinks_when_idle() {
    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(8)
            .with_min_threads(1)
            .with_max_threads(8)
            .with_max_idle_threads(0),
        |payload: Option<u64>| {
            if payload.is_some() {
                thread::sleep(Duration::from_millis(500));
            }
        },
    )
    .expect("pool construction");

    for i in 0..8u64 {
        pool.submit(i);
    }

    assert!(
        wait_until(2_000, || pool.current_threads() >= 4),
        "pool did not scale up: current={} active={}",
        pool.current_threads(),
        pool.active_threads()
    );

    assert!(
        wait_until(10_000, || pool.stats().completed == 8),
        "burst did not complete: {:?}",
        pool.stats()
    );

    // No further submissions: idle workers are shed down to the floor.
    assert!(
        wait_until(10_000, || pool.current_threads() == 1),
        "pool did not shrink: current={}",
        pool.current_threads()
    );

    pool.shutdown();
    assert_eq!(pool.current_threads(), 0);
}

/// Shutdown under load returns in bounded time; items already handed to
/// workers complete, queued ones may be discarded.
#[test]
fn shutdown_under_load_is_bounded() {
    portpool::util::init_tracing();

    let started = Arc::new(AtomicU64::new(0));
    let finished = Arc::new(AtomicU64::new(0));
    let started_in_pool = Arc::clone(&started);
    let finished_in_pool = Arc::clone(&finished);

    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(4)
            .with_min_threads(2)
            .with_max_threads(8),
        move |payload: Option<u64>| {
            if payload.is_some() {
                started_in_pool.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(200));
                finished_in_pool.fetch_add(1, Ordering::SeqCst);
            }
        },
    )
    .expect("pool construction");

    for i in 0..50u64 {
        pool.submit(i);
    }

    let begun = Instant::now();
    pool.shutdown();
    let elapsed = begun.elapsed();

    assert!(
        elapsed < Duration::from_secs(30),
        "shutdown took {elapsed:?}"
    );
    assert_eq!(pool.current_threads(), 0);
    assert_eq!(pool.active_threads(), 0);

    // Whatever was started was allowed to finish.
    assert_eq!(
        started.load(Ordering::SeqCst),
        finished.load(Ordering::SeqCst),
        "a worker was killed mid-callback"
    );
    assert!(finished.load(Ordering::SeqCst) <= 50);
}

/// A panicking callback is contained: its worker survives and the pool
/// keeps executing the remaining items.
#[test]
fn panicking_callbacks_are_contained() {
    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(2)
            .with_min_threads(1)
            .with_max_threads(4),
        |payload: Option<u64>| {
            if let Some(value) = payload {
                assert!(value % 2 == 0, "odd payload {value}");
            }
        },
    )
    .expect("pool construction");

    for i in 0..20u64 {
        pool.submit(i);
    }

    assert!(
        wait_until(10_000, || {
            let stats = pool.stats();
            stats.completed + stats.faulted == 20
        }),
        "items did not drain: {:?}",
        pool.stats()
    );

    let stats = pool.stats();
    assert_eq!(stats.completed, 10);
    assert_eq!(stats.faulted, 10);
    assert!(pool.current_threads() >= 1, "pool lost its workers");
    assert!(pool.is_healthy());

    pool.shutdown();
    assert_eq!(pool.current_threads(), 0);
}

/// Submission latency is independent of worker saturation: with a single
/// fully blocked worker, a thousand submits all return promptly.
#[test]
fn submit_never_blocks_on_saturation() {
    let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();

    let pool = Pool::new(
        PoolConfig::new()
            .with_max_concurrency(1)
            .with_min_threads(1)
            .with_max_threads(1),
        move |_payload: Option<u64>| {
            // Occupies the only worker until the test releases it.
            let _ = release_rx.recv();
        },
    )
    .expect("pool construction");

    let mut slowest = Duration::ZERO;
    let all_begun = Instant::now();
    for i in 0..1_000u64 {
        let begun = Instant::now();
        pool.submit(i);
        slowest = slowest.max(begun.elapsed());
    }
    let total = all_begun.elapsed();

    assert!(
        slowest < Duration::from_millis(100),
        "a submit stalled for {slowest:?}"
    );
    assert!(total < Duration::from_secs(2), "1000 submits took {total:?}");
    assert_eq!(pool.stats().submitted, 1_000);

    // Unblock the worker so shutdown can drain it.
    drop(release_tx);
    pool.shutdown();
    assert_eq!(pool.current_threads(), 0);
}

/// Shutdown called concurrently from many threads quiesces exactly once
/// and every caller returns to a stopped pool.
#[test]
fn concurrent_shutdown_quiesces_once() {
    let pool = Arc::new(
        Pool::new(
            PoolConfig::new()
                .with_max_concurrency(2)
                .with_min_threads(2)
                .with_max_threads(4),
            |payload: Option<u64>| {
                if payload.is_some() {
                    thread::sleep(Duration::from_millis(50));
                }
            },
        )
        .expect("pool construction"),
    );

    for i in 0..10u64 {
        pool.submit(i);
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = Arc::clone(&pool);
        handles.push(thread::spawn(move || {
            pool.shutdown();
            // Post-state must already hold when any caller returns.
            assert_eq!(pool.current_threads(), 0);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Further submissions are silently dropped.
    pool.submit(99);
    assert!(pool.stats().rejected >= 1);
}
