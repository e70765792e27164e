//! Completion queue: a FIFO packet queue with concurrency gating.
//!
//! Models the kernel completion-port contract the pool schedules through:
//! packets are delivered in post order, but at most `concurrency` consumers
//! may be checked out simultaneously. A consumer counts against the gate
//! from the moment `wait` hands it a packet until it drops that packet, so
//! a worker holding a packet through a long callback keeps its slot
//! occupied the whole time.
//!
//! Transport is a `crossbeam_channel` FIFO; the gate is a mutex/condvar
//! admission counter. `close` rejects further posts, drops the sender so
//! drained receivers wake with an error, and wakes all gate waiters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};

/// Control channel carried by every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompletionKey {
    /// A regular work item.
    Task,
    /// Sentinel instructing the receiving consumer to exit.
    Shutdown,
}

/// Why a `wait` call returned without a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitError {
    TimedOut,
    Closed,
}

/// The queue refused a post because it has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PostError;

#[derive(Debug)]
struct GateState {
    running: usize,
    closed: bool,
}

/// Admission counter bounding simultaneously checked-out packets.
#[derive(Debug)]
struct Gate {
    concurrency: usize,
    state: Mutex<GateState>,
    cond: Condvar,
}

impl Gate {
    fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            state: Mutex::new(GateState {
                running: 0,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn acquire(gate: &Arc<Gate>, deadline: Option<Instant>) -> Result<SlotGuard, WaitError> {
        let mut state = gate.state.lock();
        loop {
            if state.closed {
                return Err(WaitError::Closed);
            }
            if state.running < gate.concurrency {
                state.running += 1;
                return Ok(SlotGuard {
                    gate: Arc::clone(gate),
                });
            }
            match deadline {
                Some(when) => {
                    if gate.cond.wait_until(&mut state, when).timed_out()
                        && !state.closed
                        && state.running >= gate.concurrency
                    {
                        return Err(WaitError::TimedOut);
                    }
                }
                None => gate.cond.wait(&mut state),
            }
        }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.running = state.running.saturating_sub(1);
        self.cond.notify_one();
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.cond.notify_all();
    }
}

/// Holds one admission slot; released on drop.
#[derive(Debug)]
pub(crate) struct SlotGuard {
    gate: Arc<Gate>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[derive(Debug)]
struct Frame<P> {
    key: CompletionKey,
    payload: Option<P>,
}

/// A dequeued packet. Dropping it returns the admission slot to the gate,
/// so hold it for as long as the work it describes is running.
#[derive(Debug)]
pub(crate) struct Packet<P> {
    pub key: CompletionKey,
    pub payload: Option<P>,
    _slot: SlotGuard,
}

/// FIFO packet queue with bounded consumer concurrency.
#[derive(Debug)]
pub(crate) struct CompletionQueue<P> {
    tx: Mutex<Option<Sender<Frame<P>>>>,
    rx: Receiver<Frame<P>>,
    gate: Arc<Gate>,
}

impl<P> CompletionQueue<P> {
    pub fn new(concurrency: usize) -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
            gate: Arc::new(Gate::new(concurrency)),
        }
    }

    /// Enqueue a packet. Non-blocking; post order is delivery order.
    pub fn post(&self, key: CompletionKey, payload: Option<P>) -> Result<(), PostError> {
        let guard = self.tx.lock();
        match guard.as_ref() {
            Some(tx) => tx.send(Frame { key, payload }).map_err(|_| PostError),
            None => Err(PostError),
        }
    }

    /// Block until a packet is available and an admission slot is free.
    ///
    /// `None` waits indefinitely. On timeout no slot is held; on `Closed`
    /// the queue has been shut and drained.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Packet<P>, WaitError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let slot = Gate::acquire(&self.gate, deadline)?;
        let frame = match deadline {
            Some(when) => self.rx.recv_deadline(when).map_err(|e| match e {
                RecvTimeoutError::Timeout => WaitError::TimedOut,
                RecvTimeoutError::Disconnected => WaitError::Closed,
            })?,
            None => self.rx.recv().map_err(|_| WaitError::Closed)?,
        };
        Ok(Packet {
            key: frame.key,
            payload: frame.payload,
            _slot: slot,
        })
    }

    /// Packets posted but not yet dequeued.
    pub fn backlog(&self) -> usize {
        self.rx.len()
    }

    /// Reject further posts and wake all blocked waiters with an error.
    /// Packets still queued are drained and their payloads dropped.
    pub fn close(&self) {
        self.tx.lock().take();
        self.gate.close();
        while self.rx.try_recv().is_ok() {}
    }
}
