//! Lifecycle tracing over four channels.
//!
//! ## Contents
//! - [`TracingChannel`] the `start`/`end`/`asyncEnd`/`error` channel group
//! - [`TraceContext`] shared per-operation context, [`Outcome`] its settled state
//! - [`TracingHandlers`] optional handler per [`Phase`]
//! - [`Completion`] completion handle for callback-style operations
//!
//! ## Naming
//! ```text
//! tracing_channel("db.query")
//!   ├─ "tracing:db.query:start"
//!   ├─ "tracing:db.query:end"
//!   ├─ "tracing:db.query:asyncEnd"
//!   └─ "tracing:db.query:error"
//! ```
//! A [`Symbol`](crate::Symbol) base yields four symbol names distinct from
//! every string name.

mod channel;
mod context;
mod handlers;

pub use channel::{Completion, TracingChannel};
pub use context::{Outcome, Payload, TraceContext};
pub use handlers::{Phase, TracingHandlers};

use crate::error::ChannelError;
use crate::name::IntoChannelName;

/// Returns the tracing channel group for `name`.
///
/// # Errors
/// [`ChannelError::InvalidName`] when `name` is not a valid channel name.
///
/// # Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use diagnostics_channel::{TraceContext, TracingHandlers, tracing_channel};
///
/// let tc = tracing_channel("doc.trace.example")?;
/// let ended = Arc::new(Mutex::new(Vec::new()));
/// let log = Arc::clone(&ended);
/// let handlers = TracingHandlers::new().on_end(move |ctx: &TraceContext| {
///     log.lock().unwrap().push(ctx.result::<&str>());
/// });
/// tc.subscribe(&handlers);
/// assert_eq!(tc.trace(|| Ok::<_, std::fmt::Error>("ok"), TraceContext::empty()).ok(), Some("ok"));
/// assert_eq!(ended.lock().unwrap().as_slice(), [Some("ok")]);
/// assert!(tc.unsubscribe(&handlers));
/// # Ok::<(), diagnostics_channel::ChannelError>(())
/// ```
pub fn tracing_channel(name: impl IntoChannelName) -> Result<TracingChannel, ChannelError> {
    Ok(channel::lookup(name.into_channel_name()?))
}

#[cfg(test)]
mod tests {
    use std::future;
    use std::sync::{Arc, Mutex};

    use futures::FutureExt;

    use super::*;
    use crate::error::{TraceError, TracedPanic};
    use crate::{Subscriber, Symbol, has_subscribers, testing};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log) -> TracingHandlers {
        Phase::ALL.into_iter().fold(TracingHandlers::new(), |h, phase| {
            let log = Arc::clone(log);
            h.on(phase, move |ctx| {
                log.lock()
                    .unwrap()
                    .push(format!("{phase}:{}", ctx.outcome().as_label()));
            })
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn channel_names_are_derived() {
        let tc = tracing_channel("trace.test.names").unwrap();
        assert_eq!(tc.channel(Phase::Start).name(), "tracing:trace.test.names:start");
        assert_eq!(tc.channel(Phase::End).name(), "tracing:trace.test.names:end");
        assert_eq!(tc.channel(Phase::AsyncEnd).name(), "tracing:trace.test.names:asyncEnd");
        assert_eq!(tc.channel(Phase::Error).name(), "tracing:trace.test.names:error");
        assert_eq!(tc, tracing_channel("trace.test.names").unwrap());
    }

    #[test]
    fn symbol_base_is_private() {
        let sym = Symbol::new("trace.test.symbol");
        let by_symbol = tracing_channel(&sym).unwrap();
        let by_string = tracing_channel("trace.test.symbol").unwrap();
        assert_ne!(by_symbol, by_string);
        assert_eq!(by_symbol, tracing_channel(sym).unwrap());
        assert!(by_symbol.channel(Phase::Start).name().as_str().is_none());
    }

    #[test]
    fn sync_success_publishes_start_then_end() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.sync-ok").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::new("input"));
        let out = tc.trace(|| Ok::<_, Boom>(42u32), ctx.clone());

        assert_eq!(out.ok(), Some(42));
        assert_eq!(ctx.result::<u32>(), Some(42));
        assert_eq!(ctx.input::<&str>(), Some(&"input"));
        assert_eq!(entries(&log), ["start:pending", "end:result"]);
        assert!(tc.unsubscribe(&handlers));
    }

    #[test]
    fn sync_error_publishes_error_before_end() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.sync-err").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        let err = tc.trace(|| Err::<u32, _>(Boom), ctx.clone()).unwrap_err();

        assert_eq!(err.to_string(), "boom");
        let recorded: TraceError = ctx.error().unwrap();
        assert!(Arc::ptr_eq(&err, &recorded));
        assert_eq!(entries(&log), ["start:pending", "error:error", "end:error"]);
        assert!(tc.unsubscribe(&handlers));
    }

    #[test]
    fn sync_panic_is_published_and_resumed() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.sync-panic").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tc.trace(|| -> Result<u32, Boom> { panic!("kaboom") }, ctx.clone())
        }));

        assert!(caught.is_err());
        let err = ctx.error().unwrap();
        let panic = err.downcast_ref::<TracedPanic>().unwrap();
        assert_eq!(panic.message, "kaboom");
        assert_eq!(entries(&log), ["start:pending", "error:error", "end:error"]);
        assert!(tc.unsubscribe(&handlers));
    }

    #[tokio::test]
    async fn future_success_publishes_async_end_on_settle() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.async-ok").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        let fut = tc.trace_future(|| async { Ok::<_, Boom>("done") }, ctx.clone());
        assert_eq!(entries(&log), ["start:pending", "end:pending"]);

        assert_eq!(fut.await.ok(), Some("done"));
        assert_eq!(ctx.result::<&str>(), Some("done"));
        assert_eq!(entries(&log), ["start:pending", "end:pending", "asyncEnd:result"]);
        assert!(tc.unsubscribe(&handlers));
    }

    #[tokio::test]
    async fn future_error_publishes_error_then_async_end() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.async-err").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        let out = tc
            .trace_future(|| async { Err::<(), _>(Boom) }, ctx.clone())
            .await;

        assert_eq!(out.unwrap_err().to_string(), "boom");
        assert_eq!(
            entries(&log),
            ["start:pending", "end:pending", "error:error", "asyncEnd:error"]
        );
        assert!(tc.unsubscribe(&handlers));
    }

    #[tokio::test]
    async fn future_panic_is_published_and_resumed() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.async-panic").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        let fut = tc.trace_future(
            || future::ready(()).map(|()| -> Result<(), Boom> { panic!("async kaboom") }),
            ctx.clone(),
        );
        let joined = tokio::spawn(fut).await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(
            entries(&log),
            ["start:pending", "end:pending", "error:error", "asyncEnd:error"]
        );
        assert!(tc.unsubscribe(&handlers));
    }

    #[test]
    fn callback_completed_later_publishes_async_end_after_end() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.callback").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        let worker = tc.trace_callback(
            |done| std::thread::spawn(move || done.complete(Ok::<_, Boom>(7u8))),
            ctx.clone(),
        );
        worker.join().unwrap();

        assert_eq!(ctx.result::<u8>(), Some(7));
        assert_eq!(entries(&log), ["start:pending", "end:pending", "asyncEnd:result"]);
        assert!(tc.unsubscribe(&handlers));
    }

    #[test]
    fn callback_completed_inline_publishes_async_end_before_end() {
        let log = Log::default();
        let tc = tracing_channel("trace.test.callback-inline").unwrap();
        let handlers = recording(&log);
        tc.subscribe(&handlers);

        let ctx = Arc::new(TraceContext::empty());
        tc.trace_callback(|done| done.complete(Err::<(), _>(Boom)), ctx.clone());

        assert_eq!(
            entries(&log),
            ["start:pending", "error:error", "asyncEnd:error", "end:error"]
        );
        assert!(tc.unsubscribe(&handlers));
    }

    #[test]
    fn trace_without_subscribers_still_records_outcome() {
        let tc = tracing_channel("trace.test.quiet").unwrap();
        assert!(!tc.has_subscribers());

        let ctx = Arc::new(TraceContext::empty());
        assert_eq!(tc.trace(|| Ok::<_, Boom>(1i64), ctx.clone()).ok(), Some(1));
        assert_eq!(ctx.result::<i64>(), Some(1));
    }

    #[test]
    fn context_is_reusable_across_traces() {
        let tc = tracing_channel("trace.test.reuse").unwrap();
        let ctx = Arc::new(TraceContext::empty());

        assert!(tc.trace(|| Err::<u8, _>(Boom), ctx.clone()).is_err());
        assert!(ctx.error().is_some());

        assert_eq!(tc.trace(|| Ok::<_, Boom>(2u8), ctx.clone()).ok(), Some(2));
        assert!(ctx.error().is_none());
        assert_eq!(ctx.result::<u8>(), Some(2));
    }

    #[test]
    fn partial_handlers_subscribe_only_present_phases() {
        let tc = tracing_channel("trace.test.partial").unwrap();
        let handlers = TracingHandlers::new().on_error(|_| {});
        tc.subscribe(&handlers);

        assert!(tc.has_subscribers());
        assert!(has_subscribers("tracing:trace.test.partial:error"));
        assert!(!has_subscribers("tracing:trace.test.partial:start"));

        assert!(tc.unsubscribe(&handlers));
        assert!(!tc.has_subscribers());
        assert!(!tc.unsubscribe(&handlers));
    }

    #[test]
    fn unsubscribe_reports_partial_removal() {
        let tc = tracing_channel("trace.test.partial-removal").unwrap();
        let start = Subscriber::new(|_, _| {});
        let end = Subscriber::new(|_, _| {});
        tc.subscribe(&TracingHandlers::new().with(Phase::Start, start.clone()));

        let both = TracingHandlers::new()
            .with(Phase::Start, start)
            .with(Phase::End, end);
        assert!(!tc.unsubscribe(&both));
        assert!(!tc.has_subscribers());
    }

    #[tokio::test]
    async fn panicking_handler_does_not_change_outcome() {
        let reports = testing::reports();
        let tc = tracing_channel("trace.test.bad-handler").unwrap();
        let handlers = TracingHandlers::new().on_start(|_| panic!("handler failed"));
        tc.subscribe(&handlers);

        let out = tc.trace(|| Ok::<_, Boom>(5u8), TraceContext::empty());
        assert_eq!(out.ok(), Some(5));

        testing::settle().await;
        let seen = reports.for_channel("tracing:trace.test.bad-handler:start");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].subscriber, "trace-start");
        assert_eq!(seen[0].message, "handler failed");
        assert!(tc.unsubscribe(&handlers));
    }
}
