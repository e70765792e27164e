//! Pool lifecycle: construction, submission, shutdown, observation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::config::PoolConfig;
use crate::core::counters::{LifetimeCounters, PoolStats, ThreadCounters};
use crate::core::dispatcher;
use crate::core::error::PoolError;
use crate::core::event::PoolEvents;
use crate::core::handler::WorkHandler;
use crate::core::queue::{CompletionKey, CompletionQueue};
use crate::core::worker;

/// Poll interval while waiting for the worker population to drain.
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// State shared by the public handle, the dispatcher, and every worker.
pub(crate) struct Inner<P, H> {
    pub config: PoolConfig,
    pub handler: H,
    /// Submission-side queue; the dispatcher is its only consumer.
    pub dispatch_queue: CompletionQueue<P>,
    /// Execution-side queue, gated at `max_concurrency`.
    pub worker_queue: CompletionQueue<P>,
    pub events: PoolEvents,
    pub threads: ThreadCounters,
    pub lifetime: LifetimeCounters,
    pub disposed: AtomicBool,
    pub healthy: AtomicBool,
    pub next_worker_id: AtomicUsize,
}

/// An elastic thread pool scheduled through two completion queues.
///
/// Work items flow `submit -> dispatch queue -> dispatcher -> worker queue
/// -> worker -> handler`. The dispatcher forwards one item at a time and
/// waits for a worker to pick it up, which makes a stalled pickup an
/// unambiguous saturation signal driving scale-up; a periodic maintenance
/// tick sheds idle workers. See [`PoolConfig`] for the knobs.
///
/// Submissions are delivered to workers in submit order, but with
/// `max_concurrency > 1` callback completion order is not defined.
///
/// Dropping the pool without calling [`shutdown`](Pool::shutdown) signals
/// the threads to exit but does not wait for them.
pub struct Pool<P, H>
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    inner: Arc<Inner<P, H>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<P, H> Pool<P, H>
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    /// Construct and start a pool: `min_threads` workers plus the
    /// dispatcher thread.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] when the configuration fails
    /// validation and [`PoolError::ThreadSpawn`] when the OS refuses a
    /// thread; in the latter case any threads already started are drained
    /// before returning.
    pub fn new(config: PoolConfig, handler: H) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let inner = Arc::new(Inner {
            dispatch_queue: CompletionQueue::new(1),
            worker_queue: CompletionQueue::new(config.max_concurrency),
            events: PoolEvents::new(),
            threads: ThreadCounters::new(),
            lifetime: LifetimeCounters::default(),
            disposed: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
            next_worker_id: AtomicUsize::new(0),
            handler,
            config,
        });

        for _ in 0..inner.config.min_threads {
            if let Err(e) = worker::spawn(&inner) {
                abort_startup(&inner);
                return Err(PoolError::ThreadSpawn(e));
            }
        }

        let dispatcher = match dispatcher::spawn(&inner) {
            Ok(handle) => handle,
            Err(e) => {
                abort_startup(&inner);
                return Err(PoolError::ThreadSpawn(e));
            }
        };

        info!(
            max_concurrency = inner.config.max_concurrency,
            min_threads = inner.config.min_threads,
            max_threads = inner.config.max_threads,
            "pool started"
        );

        Ok(Self {
            inner,
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    /// Hand a work item to the pool.
    ///
    /// Never blocks on worker availability: the item lands in the dispatch
    /// queue and the call returns. After [`shutdown`](Pool::shutdown) the
    /// item is silently dropped (shutdown races are common and callers
    /// cannot meaningfully handle them).
    pub fn submit(&self, payload: P) {
        self.post_work(Some(payload));
    }

    /// Like [`submit`](Pool::submit) with no payload; the handler receives
    /// `None`.
    pub fn submit_empty(&self) {
        self.post_work(None);
    }

    fn post_work(&self, payload: Option<P>) {
        if self.inner.disposed.load(Ordering::Acquire) {
            self.inner.lifetime.rejected.fetch_add(1, Ordering::Relaxed);
            trace!("submission dropped: pool is shut down");
            return;
        }
        match self.inner.dispatch_queue.post(CompletionKey::Task, payload) {
            Ok(()) => {
                self.inner.lifetime.submitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.inner.lifetime.rejected.fetch_add(1, Ordering::Relaxed);
                trace!("submission dropped: dispatch queue closed");
            }
        }
    }

    /// Live worker threads.
    #[must_use]
    pub fn current_threads(&self) -> usize {
        self.inner.threads.current()
    }

    /// Workers currently executing a callback.
    #[must_use]
    pub fn active_threads(&self) -> usize {
        self.inner.threads.active()
    }

    /// `false` once the dispatcher has died on a queue fault. Items
    /// submitted afterwards reach the dispatch queue but are never
    /// forwarded; only shutdown reclaims the pool's threads.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.inner.healthy.load(Ordering::Acquire)
    }

    /// Snapshot of pool utilization and lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner
            .lifetime
            .snapshot(&self.inner.threads, self.inner.dispatch_queue.backlog())
    }

    /// Stop the pool and block until it has quiesced.
    ///
    /// Idempotent and callable from any thread; every caller returns only
    /// once all workers have exited. Exactly one caller performs the
    /// teardown: it latches `disposed`, signals the shutdown event, joins
    /// the dispatcher, posts one shutdown sentinel per live worker, waits
    /// for the population to reach zero, and closes both queues.
    ///
    /// Items still in the dispatch queue are discarded; items already
    /// handed to workers complete.
    pub fn shutdown(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            // Lost the race: wait for the winner's teardown to finish so
            // every caller observes a quiesced pool.
            while self.inner.threads.current() > 0 {
                thread::sleep(SHUTDOWN_POLL);
            }
            return;
        }

        info!("pool shutting down");
        self.inner.events.signal_shutdown();

        // Join the dispatcher first: once it is gone, no scale-up can race
        // with the sentinel count below.
        if let Some(handle) = self.dispatcher.lock().take() {
            let _ = handle.join();
        }

        let discarded = self.inner.dispatch_queue.backlog();
        drain_workers(&self.inner);

        self.inner.dispatch_queue.close();
        self.inner.worker_queue.close();

        info!(discarded, "pool shut down");
    }
}

impl<P, H> Drop for Pool<P, H>
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    fn drop(&mut self) {
        // Signal but do not block: an explicit shutdown() is required for a
        // synchronous quiesce. Closing the queues wakes every blocked
        // thread; workers finish their in-flight callback and exit on
        // their own.
        if !self.inner.disposed.swap(true, Ordering::AcqRel) {
            self.inner.events.signal_shutdown();
            self.inner.dispatch_queue.close();
            self.inner.worker_queue.close();
            debug!("pool dropped without explicit shutdown; workers drain in the background");
        }
    }
}

/// Post one sentinel per live worker and poll until all have exited.
fn drain_workers<P, H>(inner: &Arc<Inner<P, H>>)
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    let live = inner.threads.current();
    for _ in 0..live {
        if inner.worker_queue.post(CompletionKey::Shutdown, None).is_err() {
            break;
        }
    }
    while inner.threads.current() > 0 {
        thread::sleep(SHUTDOWN_POLL);
    }
}

/// Tear down a partially constructed pool after a spawn failure.
fn abort_startup<P, H>(inner: &Arc<Inner<P, H>>)
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    inner.disposed.store(true, Ordering::Release);
    inner.events.signal_shutdown();
    drain_workers(inner);
    inner.dispatch_queue.close();
    inner.worker_queue.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn small_config() -> PoolConfig {
        PoolConfig::new()
            .with_max_concurrency(2)
            .with_min_threads(1)
            .with_max_threads(2)
    }

    #[test]
    fn submit_after_shutdown_is_dropped() {
        let pool = Pool::new(small_config(), |_: Option<u32>| {}).unwrap();
        pool.shutdown();
        pool.submit(1);
        let stats = pool.stats();
        assert_eq!(stats.submitted, 0);
        assert_eq!(stats.rejected, 1);
        assert_eq!(pool.current_threads(), 0);
    }

    #[test]
    fn submit_empty_passes_none() {
        let empties = Arc::new(AtomicU64::new(0));
        let empties_in_pool = Arc::clone(&empties);
        let pool = Pool::new(small_config(), move |payload: Option<u32>| {
            if payload.is_none() {
                empties_in_pool.fetch_add(1, Ordering::Relaxed);
            }
        })
        .unwrap();

        pool.submit_empty();
        while pool.stats().completed < 1 {
            thread::sleep(Duration::from_millis(5));
        }
        pool.shutdown();
        assert_eq!(empties.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn shutdown_is_idempotent_across_threads() {
        let pool = Arc::new(Pool::new(small_config(), |_: Option<u32>| {}).unwrap());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || pool.shutdown()));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        pool.shutdown();
        assert_eq!(pool.current_threads(), 0);
        assert_eq!(pool.active_threads(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = PoolConfig::new().with_min_threads(4).with_max_threads(2);
        assert!(matches!(
            Pool::new(cfg, |_: Option<u32>| {}),
            Err(PoolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn drop_without_shutdown_does_not_hang() {
        let pool = Pool::new(small_config(), |_: Option<u32>| {}).unwrap();
        pool.submit(1);
        drop(pool);
    }
}
