//! Pool configuration structure.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default concurrency cap: one slot per CPU.
fn default_max_concurrency() -> usize {
    num_cpus::get().max(1)
}

/// Default floor on live worker threads.
fn default_min_threads() -> usize {
    1
}

/// Default ceiling on live worker threads.
fn default_max_threads() -> usize {
    num_cpus::get().max(1)
}

/// Default idle surplus tolerated before shedding workers.
fn default_max_idle_threads() -> usize {
    2
}

/// Default dispatcher wait, in milliseconds. Drives both shutdown
/// responsiveness and the maintenance cadence while idle.
fn default_dispatch_timeout_ms() -> u64 {
    100
}

/// Default extra pickup patience once the pool is at `max_threads`.
fn default_max_threads_dispatch_timeout_ms() -> u64 {
    10_000
}

/// Default maintenance tick interval, in milliseconds.
fn default_maint_period_ms() -> u64 {
    5_000
}

/// Default thread stack size: 2MB.
fn default_thread_stack_size() -> usize {
    2 * 1024 * 1024
}

/// Default prefix for pool thread names.
fn default_thread_name_prefix() -> String {
    "portpool-".to_string()
}

/// Configuration for a [`Pool`](crate::Pool).
///
/// The concurrency cap and the thread bounds are independent: the pool may
/// keep up to `max_threads` workers alive, but the worker queue only lets
/// `max_concurrency` of them execute callbacks simultaneously.
///
/// # Example
///
/// ```
/// use portpool::PoolConfig;
///
/// let config = PoolConfig::new()
///     .with_max_concurrency(4)
///     .with_min_threads(2)
///     .with_max_threads(8)
///     .with_max_idle_threads(1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of callbacks executing simultaneously. The worker
    /// queue gates runnable workers at this count regardless of how many
    /// worker threads exist.
    ///
    /// Default: `num_cpus::get()`.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Minimum number of live worker threads. The pool starts with this
    /// many and never sheds below it.
    ///
    /// Default: 1.
    #[serde(default = "default_min_threads")]
    pub min_threads: usize,

    /// Maximum number of live worker threads. Scale-up stops here.
    ///
    /// Default: `num_cpus::get()`.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Number of idle workers tolerated before the maintenance tick starts
    /// shedding them.
    ///
    /// Default: 2.
    #[serde(default = "default_max_idle_threads")]
    pub max_idle_threads: usize,

    /// Dispatcher wait timeout in milliseconds. Bounds how long the
    /// dispatcher blocks for a submission or a pickup before re-checking
    /// shutdown and running maintenance.
    ///
    /// Default: 100.
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,

    /// Extra pickup patience, in milliseconds, applied only when the pool
    /// is already at `max_threads` and no further scale-up is possible.
    ///
    /// Default: 10 000.
    #[serde(default = "default_max_threads_dispatch_timeout_ms")]
    pub max_threads_dispatch_timeout_ms: u64,

    /// Maintenance tick interval in milliseconds, governing how often the
    /// receive path re-evaluates idle workers.
    ///
    /// Default: 5 000.
    #[serde(default = "default_maint_period_ms")]
    pub maint_period_ms: u64,

    /// Stack size per pool thread in bytes.
    ///
    /// Default: 2MB (2 * 1024 * 1024 bytes).
    #[serde(default = "default_thread_stack_size")]
    pub thread_stack_size: usize,

    /// Prefix for dispatcher and worker thread names.
    ///
    /// Default: `"portpool-"`.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            min_threads: default_min_threads(),
            max_threads: default_max_threads(),
            max_idle_threads: default_max_idle_threads(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
            max_threads_dispatch_timeout_ms: default_max_threads_dispatch_timeout_ms(),
            maint_period_ms: default_maint_period_ms(),
            thread_stack_size: default_thread_stack_size(),
            thread_name_prefix: default_thread_name_prefix(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency cap for the worker queue.
    #[must_use]
    pub fn with_max_concurrency(mut self, cap: usize) -> Self {
        self.max_concurrency = cap;
        self
    }

    /// Set the minimum number of live worker threads.
    #[must_use]
    pub fn with_min_threads(mut self, min: usize) -> Self {
        self.min_threads = min;
        self
    }

    /// Set the maximum number of live worker threads.
    #[must_use]
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Set the tolerated idle surplus before shedding workers.
    #[must_use]
    pub fn with_max_idle_threads(mut self, idle: usize) -> Self {
        self.max_idle_threads = idle;
        self
    }

    /// Set the dispatcher wait timeout in milliseconds.
    #[must_use]
    pub fn with_dispatch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.dispatch_timeout_ms = timeout_ms;
        self
    }

    /// Set the extra pickup patience used at `max_threads`, in milliseconds.
    #[must_use]
    pub fn with_max_threads_dispatch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.max_threads_dispatch_timeout_ms = timeout_ms;
        self
    }

    /// Set the maintenance tick interval in milliseconds.
    #[must_use]
    pub fn with_maint_period_ms(mut self, period_ms: u64) -> Self {
        self.maint_period_ms = period_ms;
        self
    }

    /// Set the thread stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Dispatcher wait timeout as a `Duration`.
    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Extra pickup patience at `max_threads` as a `Duration`.
    #[must_use]
    pub fn max_threads_dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.max_threads_dispatch_timeout_ms)
    }

    /// Maintenance tick interval as a `Duration`.
    #[must_use]
    pub fn maint_period(&self) -> Duration {
        Duration::from_millis(self.maint_period_ms)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        if self.min_threads == 0 {
            return Err("min_threads must be greater than 0".into());
        }
        if self.min_threads > self.max_threads {
            return Err(format!(
                "min_threads ({}) must not exceed max_threads ({})",
                self.min_threads, self.max_threads
            ));
        }
        if self.dispatch_timeout_ms == 0 {
            return Err("dispatch_timeout_ms must be greater than 0".into());
        }
        if self.maint_period_ms == 0 {
            return Err("maint_period_ms must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64KB".into());
        }
        Ok(())
    }

    /// Parse a pool configuration from a JSON string and validate it.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: PoolConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
