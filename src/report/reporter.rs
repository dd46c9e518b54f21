//! # Uncaught subscriber failure reporter.
//!
//! Provides [`ReportError`], the sink for subscriber panics isolated by
//! [`Channel::publish`](crate::Channel::publish), and the default
//! [`LogReporter`].
//!
//! ## Rules
//! - The reporter is invoked from a deferred job, never from inside `publish`.
//! - One call per failed subscriber invocation.
//! - Reporters should not panic; a panic here is not isolated.

use crate::error::SubscriberPanic;

/// Sink for isolated subscriber failures.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use diagnostics_channel::{ReportError, SubscriberPanic};
///
/// #[derive(Default)]
/// struct Collect(Mutex<Vec<String>>);
///
/// impl ReportError for Collect {
///     fn report(&self, err: SubscriberPanic) {
///         self.0.lock().unwrap().push(err.message);
///     }
/// }
///
/// let sink = Collect::default();
/// sink.report(SubscriberPanic {
///     channel: diagnostics_channel::Symbol::new("demo").into(),
///     subscriber: "audit".into(),
///     message: "boom".into(),
/// });
/// assert_eq!(sink.0.lock().unwrap().as_slice(), ["boom"]);
/// ```
pub trait ReportError: Send + Sync + 'static {
    /// Handles one failure.
    fn report(&self, err: SubscriberPanic);
}

/// Default reporter: writes the failure through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ReportError for LogReporter {
    fn report(&self, err: SubscriberPanic) {
        tracing::error!(
            label = err.as_label(),
            channel = %err.channel,
            subscriber = %err.subscriber,
            message = %err.message,
            "uncaught exception in channel subscriber"
        );
    }
}
