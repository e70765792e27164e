//! Scale-up and scale-down decisions.
//!
//! Both run on the dispatcher thread. Scale-up is one worker at a time and
//! only when every existing worker is busy, so bursts cannot
//! over-provision. Scale-down sheds half the idle surplus plus one per
//! tick, which damps oscillation into geometric shrinkage instead of
//! cliffs. Counter reads are relaxed; both decisions tolerate staleness.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::handler::WorkHandler;
use crate::core::pool::Inner;
use crate::core::queue::CompletionKey;
use crate::core::worker;

/// Spawn one worker if the pool is saturated: below `max_threads` with
/// every existing worker inside a callback. Called from the dispatcher's
/// pickup-timeout path.
pub(crate) fn grow_if_starved<P, H>(inner: &Arc<Inner<P, H>>)
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    let current = inner.threads.current();
    if current >= inner.config.max_threads {
        return;
    }
    if inner.threads.active() < current {
        // Someone is idle; the in-flight item will be picked up without
        // growing the pool.
        return;
    }
    match worker::spawn(inner) {
        Ok(()) => debug!(current = current + 1, "scaled up: all workers busy"),
        Err(e) => warn!(error = %e, "could not spawn worker during scale-up"),
    }
}

/// Shed idle workers once the surplus exceeds `max_idle_threads`, never
/// dropping the live population below `min_threads`. The shed workers are
/// whichever idle ones dequeue the sentinels first; each exiting worker
/// updates `current` itself.
pub(crate) fn shed_idle_workers<P, H>(inner: &Arc<Inner<P, H>>)
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    let current = inner.threads.current();
    let active = inner.threads.active();
    let min = inner.config.min_threads;
    if current <= min {
        return;
    }
    let idle = current.saturating_sub(active);
    if idle <= inner.config.max_idle_threads {
        return;
    }
    let surplus = idle - inner.config.max_idle_threads;
    let shed = (surplus / 2 + 1).min(current - min);
    for _ in 0..shed {
        if inner
            .worker_queue
            .post(CompletionKey::Shutdown, None)
            .is_err()
        {
            return;
        }
    }
    debug!(shed, current, active, "scaled down idle workers");
}
