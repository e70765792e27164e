//! The user-callback binding executed by worker threads.

/// Callback invoked by workers for every dequeued work item.
///
/// The payload is `None` for items posted through
/// [`Pool::submit_empty`](crate::Pool::submit_empty). The handler runs on a
/// worker thread and occupies one of the pool's `max_concurrency` slots for
/// its whole duration, so it should not block indefinitely.
///
/// A panicking handler is contained: the panic is caught, counted in
/// [`PoolStats::faulted`](crate::PoolStats), and the worker keeps running.
///
/// Any `Fn(Option<P>) + Send + Sync + 'static` closure implements this
/// trait.
///
/// # Example
///
/// ```
/// use portpool::WorkHandler;
///
/// struct Printer;
///
/// impl WorkHandler<String> for Printer {
///     fn handle(&self, payload: Option<String>) {
///         if let Some(text) = payload {
///             println!("{text}");
///         }
///     }
/// }
/// ```
pub trait WorkHandler<P>: Send + Sync + 'static {
    /// Execute one work item.
    fn handle(&self, payload: Option<P>);
}

impl<P, F> WorkHandler<P> for F
where
    F: Fn(Option<P>) + Send + Sync + 'static,
{
    fn handle(&self, payload: Option<P>) {
        self(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn closures_are_handlers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_handler = Arc::clone(&hits);
        let handler = move |payload: Option<u32>| {
            if payload.is_some() {
                hits_in_handler.fetch_add(1, Ordering::Relaxed);
            }
        };
        handler.handle(Some(1));
        handler.handle(None);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
