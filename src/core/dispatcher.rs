//! The dispatcher: sole consumer of the dispatch queue.
//!
//! A single long-running thread pulls submissions in FIFO order, forwards
//! each to the worker queue, and blocks until a worker picks it up. Staying
//! blocked on the in-flight item is deliberate: it provides backpressure,
//! and a pickup timeout is an unambiguous signal that every worker is busy,
//! which is what drives scale-up. Idle timeouts double as the maintenance
//! cadence for shedding surplus workers.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error};

use crate::core::elasticity;
use crate::core::event::PickupWait;
use crate::core::handler::WorkHandler;
use crate::core::pool::Inner;
use crate::core::queue::{CompletionKey, WaitError};

/// Start the dispatcher thread.
pub(crate) fn spawn<P, H>(inner: &Arc<Inner<P, H>>) -> io::Result<JoinHandle<()>>
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    let name = format!("{}dispatch", inner.config.thread_name_prefix);
    let inner = Arc::clone(inner);
    thread::Builder::new()
        .name(name)
        .stack_size(inner.config.thread_stack_size)
        .spawn(move || run(&inner))
}

fn run<P, H>(inner: &Arc<Inner<P, H>>)
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    debug!("dispatcher started");
    let maint_period = inner.config.maint_period();
    let mut last_maint = Instant::now();

    loop {
        if inner.events.is_shutdown() {
            break;
        }
        match inner
            .dispatch_queue
            .wait(Some(inner.config.dispatch_timeout()))
        {
            Ok(mut packet) => {
                if inner.events.is_shutdown() {
                    break;
                }
                if !forward(inner, packet.payload.take()) {
                    break;
                }
                if last_maint.elapsed() >= maint_period {
                    elasticity::shed_idle_workers(inner);
                    last_maint = Instant::now();
                }
            }
            Err(WaitError::TimedOut) => {
                elasticity::shed_idle_workers(inner);
                last_maint = Instant::now();
            }
            Err(WaitError::Closed) => {
                if !inner.events.is_shutdown() {
                    inner.healthy.store(false, Ordering::Release);
                    error!("dispatch queue failed; pool no longer dispatches");
                }
                break;
            }
        }
    }
    debug!("dispatcher exiting");
}

/// Repost one item into the worker queue and wait for a worker to dequeue
/// it. Returns `false` when the dispatch loop should terminate.
///
/// A pickup timeout re-evaluates scale-up and keeps waiting; once the pool
/// is at `max_threads` the wait is extended so saturation does not thrash
/// the scale-up check.
fn forward<P, H>(inner: &Arc<Inner<P, H>>, payload: Option<P>) -> bool
where
    P: Send + 'static,
    H: WorkHandler<P>,
{
    if inner
        .worker_queue
        .post(CompletionKey::Task, payload)
        .is_err()
    {
        if !inner.events.is_shutdown() {
            inner.healthy.store(false, Ordering::Release);
            error!("worker queue refused a packet; pool no longer dispatches");
        }
        return false;
    }

    loop {
        let mut timeout = inner.config.dispatch_timeout();
        if inner.threads.current() >= inner.config.max_threads {
            timeout += inner.config.max_threads_dispatch_timeout();
        }
        match inner.events.wait_pickup(timeout) {
            PickupWait::PickedUp => return true,
            PickupWait::Shutdown => return false,
            PickupWait::TimedOut => elasticity::grow_if_starved(inner),
        }
    }
}
