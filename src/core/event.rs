//! Manual-reset signalling between workers, the dispatcher, and shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Outcome of the dispatcher's pickup wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickupWait {
    /// A worker dequeued the forwarded item.
    PickedUp,
    /// Shutdown was signalled while waiting.
    Shutdown,
    /// Neither event fired within the timeout.
    TimedOut,
}

/// The pool's two events: `shutdown` and `pickup` (dispatch-complete).
///
/// Both share one mutex/condvar pair so the dispatcher can block on either.
/// `shutdown` latches permanently once set; `pickup` stays set until the
/// dispatcher consumes it, so a worker signalling before the dispatcher
/// starts waiting is never lost.
#[derive(Debug, Default)]
pub(crate) struct PoolEvents {
    shutdown: AtomicBool,
    picked_up: Mutex<bool>,
    cond: Condvar,
}

impl PoolEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the shutdown event and wake every waiter.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        // Take the lock so a waiter between its flag check and its sleep
        // cannot miss the notification.
        let _picked = self.picked_up.lock();
        self.cond.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Signal that a worker has dequeued the in-flight item.
    pub fn signal_pickup(&self) {
        let mut picked = self.picked_up.lock();
        *picked = true;
        self.cond.notify_all();
    }

    /// Block until the item is picked up, shutdown fires, or `timeout`
    /// elapses. A pickup observation consumes (resets) the event.
    pub fn wait_pickup(&self, timeout: Duration) -> PickupWait {
        let deadline = Instant::now() + timeout;
        let mut picked = self.picked_up.lock();
        loop {
            if self.is_shutdown() {
                return PickupWait::Shutdown;
            }
            if *picked {
                *picked = false;
                return PickupWait::PickedUp;
            }
            if self.cond.wait_until(&mut picked, deadline).timed_out() {
                if self.is_shutdown() {
                    return PickupWait::Shutdown;
                }
                if *picked {
                    *picked = false;
                    return PickupWait::PickedUp;
                }
                return PickupWait::TimedOut;
            }
        }
    }
}
