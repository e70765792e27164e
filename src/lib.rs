//! # portpool
//!
//! An elastic, instance-scoped thread pool scheduled through a
//! completion-queue substrate: a FIFO packet queue that gates how many
//! consumer threads may be simultaneously checked out, the way an I/O
//! completion port gates runnable threads.
//!
//! Clients submit opaque work items; a single dispatcher thread forwards
//! them, one at a time, from the submission queue to a worker queue whose
//! effective parallelism is capped at `max_concurrency`. The pool grows the
//! worker set when every worker is busy and forwarding stalls, and sheds
//! idle workers on a maintenance tick, always staying between `min_threads`
//! and `max_threads`.
//!
//! Multiple pools may coexist in one process, each with its own bounds and
//! concurrency cap.
//!
//! ## Modules
//!
//! - [`config`] - pool configuration with builder methods and validation
//! - [`core`] - the dispatch/worker pipeline, elasticity, and shutdown
//! - [`util`] - telemetry bootstrap helpers
//!
//! ## Example
//!
//! ```
//! use portpool::{Pool, PoolConfig};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! let done_in_pool = Arc::clone(&done);
//!
//! let pool = Pool::new(
//!     PoolConfig::new()
//!         .with_max_concurrency(2)
//!         .with_min_threads(1)
//!         .with_max_threads(4),
//!     move |payload: Option<u64>| {
//!         if payload.is_some() {
//!             done_in_pool.fetch_add(1, Ordering::Relaxed);
//!         }
//!     },
//! )
//! .expect("pool construction");
//!
//! pool.submit(7);
//! pool.submit(11);
//!
//! // Let both items drain before stopping the pool.
//! while pool.stats().completed < 2 {
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! }
//! pool.shutdown();
//!
//! assert_eq!(done.load(Ordering::Relaxed), 2);
//! assert_eq!(pool.current_threads(), 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod util;

// Re-export main types for convenience
pub use config::PoolConfig;
pub use core::{Pool, PoolError, PoolStats, WorkHandler};
