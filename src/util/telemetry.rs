//! Telemetry bootstrap for pool diagnostics.

use tracing_subscriber::EnvFilter;

/// Install a subscriber tailored to pool diagnostics if none is set.
///
/// `RUST_LOG` wins when present; otherwise only this crate's events are
/// enabled at `info`, so an embedding application gets pool lifecycle
/// edges without global logging. Thread names are included in the output
/// because the pool names its threads (`<prefix>dispatch`,
/// `<prefix>worker-N`), which is usually the fastest way to tell scale-up,
/// scale-down, and dispatch activity apart in a trace.
///
/// Applications with their own subscriber should skip this and add a
/// directive for this crate to their filter instead.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portpool=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
