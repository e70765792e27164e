//! Worker threads: consumers of the gated worker queue.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use tracing::{trace, warn};

use crate::core::handler::WorkHandler;
use crate::core::pool::Inner;
use crate::core::queue::CompletionKey;

/// Spawn one worker thread and account for it.
///
/// `current` is incremented before the spawn so elasticity and shutdown
/// never undercount a worker that is about to start; the worker itself
/// decrements on exit. Worker threads are not joined -- their lifecycle is
/// tracked entirely through the counters.
pub(crate) fn spawn<P, H>(inner: &Arc<Inner<P, H>>) -> io::Result<()>
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    let id = inner.next_worker_id.fetch_add(1, Ordering::Relaxed);
    let name = format!("{}worker-{id}", inner.config.thread_name_prefix);
    inner.threads.worker_started();
    let worker = Arc::clone(inner);
    let spawned = thread::Builder::new()
        .name(name)
        .stack_size(inner.config.thread_stack_size)
        .spawn(move || run(&worker));
    match spawned {
        Ok(_handle) => Ok(()),
        Err(e) => {
            inner.threads.worker_exited();
            Err(e)
        }
    }
}

/// The worker loop: wait without timeout, exit on a shutdown sentinel or a
/// closed queue, otherwise run the callback.
///
/// The dequeued packet is held across the callback, so the worker occupies
/// one of the queue's `max_concurrency` slots for the callback's whole
/// duration. A panicking callback is caught and counted; the worker
/// continues.
fn run<P, H>(inner: &Arc<Inner<P, H>>)
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    trace!("worker started");
    loop {
        let mut packet = match inner.worker_queue.wait(None) {
            Ok(packet) => packet,
            Err(_) => break,
        };
        match packet.key {
            CompletionKey::Shutdown => break,
            CompletionKey::Task => {
                inner.threads.task_started();
                inner.events.signal_pickup();

                let payload = packet.payload.take();
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| inner.handler.handle(payload)));
                match outcome {
                    Ok(()) => {
                        inner.lifetime.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(_) => {
                        inner.lifetime.faulted.fetch_add(1, Ordering::Relaxed);
                        warn!("work callback panicked; worker continues");
                    }
                }

                inner.threads.task_finished();
            }
        }
        // The packet (and its concurrency slot) is released here.
    }
    inner.threads.worker_exited();
    trace!("worker exiting");
}
