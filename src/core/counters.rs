//! Atomic accounting for the worker population and lifetime statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live thread accounting.
///
/// `current` counts spawned-and-not-yet-exited workers; `active` counts
/// workers currently inside a callback. Increments and decrements are
/// acquire/release read-modify-writes; reads feeding elasticity heuristics
/// are relaxed and tolerant of staleness.
#[derive(Debug, Default)]
pub(crate) struct ThreadCounters {
    current: AtomicUsize,
    active: AtomicUsize,
}

impl ThreadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn worker_started(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub fn worker_exited(&self) {
        self.current.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn task_started(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    pub fn task_finished(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Lifetime counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct LifetimeCounters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub faulted: AtomicU64,
    pub rejected: AtomicU64,
}

impl LifetimeCounters {
    /// Snapshot the lifetime counters together with the live thread counts.
    pub fn snapshot(&self, threads: &ThreadCounters, dispatch_backlog: usize) -> PoolStats {
        PoolStats {
            current_threads: threads.current(),
            active_threads: threads.active(),
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dispatch_backlog,
        }
    }
}

/// A point-in-time view of pool utilization.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Live worker threads.
    pub current_threads: usize,

    /// Workers currently executing a callback.
    pub active_threads: usize,

    /// Work items accepted by `submit`/`submit_empty`.
    pub submitted: u64,

    /// Callbacks that returned normally.
    pub completed: u64,

    /// Callbacks that panicked and were contained.
    pub faulted: u64,

    /// Submissions refused because the pool was already shut down.
    pub rejected: u64,

    /// Items accepted but not yet forwarded to a worker.
    pub dispatch_backlog: usize,
}
