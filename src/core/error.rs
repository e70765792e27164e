//! Error types for pool construction.

use thiserror::Error;

/// Errors surfaced by [`Pool::new`](crate::Pool::new).
///
/// Only construction failures propagate to the caller. Runtime faults --
/// submissions after shutdown, panicking callbacks, a dispatcher losing its
/// queue -- are contained or dropped silently, favoring liveness over
/// observability at this layer. See [`Pool::is_healthy`](crate::Pool::is_healthy)
/// and [`Pool::stats`](crate::Pool::stats) for what can be observed.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The OS refused to spawn a pool thread.
    #[error("failed to spawn pool thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
