//! # Tracing channel.
//!
//! [`TracingChannel`] groups four ordinary channels named
//! `tracing:{name}:start|end|asyncEnd|error` and publishes one shared
//! [`TraceContext`] on them around a traced operation.
//!
//! ## Sequences
//! ```text
//! trace (sync)            start → f() ─┬─ Ok  ─► result  → end
//!                                      ├─ Err ─► error   → end
//!                                      └─ panic ─► error → end → resume unwind
//!
//! trace_future            start → f() → end ── await ─┬─ Ok  ─► result → asyncEnd
//!                                                     └─ Err ─► error  → asyncEnd
//!
//! trace_callback          start → f(done) → end      done.complete(..) ─► (error) → asyncEnd
//! ```
//!
//! ## Rules
//! - Every publish of one trace carries the same context.
//! - The value or error is returned unchanged; subscribers cannot alter it.
//! - Synchronous traces never publish `asyncEnd`.
//! - Without subscribers on any of the four channels publishing is skipped,
//!   but the context still records the outcome.

use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::context::TraceContext;
use super::handlers::{Phase, TracingHandlers};
use crate::channel::Channel;
use crate::error::{BoxError, TraceError, TracedPanic, share_error};
use crate::name::ChannelName;
use crate::registry;

/// Handle to the four channels of one traced operation name.
///
/// Obtained from [`tracing_channel`](crate::tracing_channel).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracingChannel {
    name: ChannelName,
    start: Channel,
    end: Channel,
    async_end: Channel,
    error: Channel,
}

/// Returns the tracing channel for an already validated name.
pub(crate) fn lookup(name: ChannelName) -> TracingChannel {
    let derive = |phase: Phase| registry::lookup(name.derive("tracing:", phase.suffix()));
    TracingChannel {
        start: derive(Phase::Start),
        end: derive(Phase::End),
        async_end: derive(Phase::AsyncEnd),
        error: derive(Phase::Error),
        name,
    }
}

impl TracingChannel {
    /// Returns the base name.
    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    /// Returns the channel of `phase`.
    pub fn channel(&self, phase: Phase) -> &Channel {
        match phase {
            Phase::Start => &self.start,
            Phase::End => &self.end,
            Phase::AsyncEnd => &self.async_end,
            Phase::Error => &self.error,
        }
    }

    /// Returns true iff any of the four channels has subscribers.
    pub fn has_subscribers(&self) -> bool {
        Phase::ALL.iter().any(|p| self.channel(*p).has_subscribers())
    }

    /// Subscribes every handler present in `handlers` to its channel.
    pub fn subscribe(&self, handlers: &TracingHandlers) {
        for phase in Phase::ALL {
            if let Some(sub) = handlers.get(phase) {
                self.channel(phase).subscribe(sub.clone());
            }
        }
    }

    /// Unsubscribes every handler present in `handlers`.
    ///
    /// Returns true iff every present handler was found and removed.
    pub fn unsubscribe(&self, handlers: &TracingHandlers) -> bool {
        let mut done = true;
        for phase in Phase::ALL {
            if let Some(sub) = handlers.get(phase) {
                done &= self.channel(phase).unsubscribe(sub);
            }
        }
        done
    }

    /// Traces a synchronous operation.
    ///
    /// A panic in `f` is recorded as a [`TracedPanic`] error, published on
    /// `error` and `end`, and then resumed.
    ///
    /// # Example
    /// ```rust
    /// use diagnostics_channel::{TraceContext, tracing_channel};
    ///
    /// let tc = tracing_channel("doc.trace.sync")?;
    /// let ctx = std::sync::Arc::new(TraceContext::new("input"));
    /// let out = tc.trace(|| Ok::<_, std::io::Error>(21 * 2), ctx.clone());
    /// assert_eq!(out.ok(), Some(42));
    /// assert_eq!(ctx.result::<i32>(), Some(42));
    /// # Ok::<(), diagnostics_channel::ChannelError>(())
    /// ```
    pub fn trace<T, E, F>(&self, f: F, context: impl Into<Arc<TraceContext>>) -> Result<T, TraceError>
    where
        T: Clone + Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Result<T, E>,
    {
        let ctx = context.into();
        self.start.publish(ctx.as_ref());
        let outcome = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(outcome) => outcome,
            Err(panic) => self.unwind(&self.end, &ctx, panic),
        };
        let out = self.settle(&ctx, outcome);
        self.end.publish(ctx.as_ref());
        out
    }

    /// Traces a callback-style operation.
    ///
    /// `f` receives a [`Completion`] it must eventually [`complete`](Completion::complete);
    /// `end` is published when `f` returns, `asyncEnd` when the completion fires.
    ///
    /// # Ordering
    /// If `f` completes before returning, the completion's events come first:
    /// ```text
    /// start ─► (error) ─► asyncEnd ─► end
    /// ```
    /// Subscribers must not assume `end` precedes `asyncEnd`.
    pub fn trace_callback<R, F>(&self, f: F, context: impl Into<Arc<TraceContext>>) -> R
    where
        F: FnOnce(Completion) -> R,
    {
        let ctx = context.into();
        self.start.publish(ctx.as_ref());
        let done = Completion {
            channel: self.clone(),
            context: Arc::clone(&ctx),
        };
        let out = match catch_unwind(AssertUnwindSafe(|| f(done))) {
            Ok(out) => out,
            Err(panic) => self.unwind(&self.end, &ctx, panic),
        };
        self.end.publish(ctx.as_ref());
        out
    }

    /// Traces an asynchronous operation.
    ///
    /// `start` and `end` are published around the call to `f`, which only
    /// creates the future. The returned future publishes `asyncEnd` (after
    /// `error` on failure) when it settles, and yields the outcome unchanged.
    pub fn trace_future<T, E, F, Fut>(
        &self,
        f: F,
        context: impl Into<Arc<TraceContext>>,
    ) -> BoxFuture<'static, Result<T, TraceError>>
    where
        T: Clone + Send + Sync + 'static,
        E: Into<BoxError> + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let ctx = context.into();
        self.start.publish(ctx.as_ref());
        let fut = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(fut) => fut,
            Err(panic) => self.unwind(&self.end, &ctx, panic),
        };
        self.end.publish(ctx.as_ref());

        let channel = self.clone();
        Box::pin(async move {
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => channel.unwind(&channel.async_end, &ctx, panic),
            };
            let out = channel.settle(&ctx, outcome);
            channel.async_end.publish(ctx.as_ref());
            out
        })
    }

    /// Records `outcome` on `ctx`, publishing `error` on failure.
    fn settle<T, E>(&self, ctx: &TraceContext, outcome: Result<T, E>) -> Result<T, TraceError>
    where
        T: Clone + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        match outcome {
            Ok(value) => {
                ctx.set_result(Arc::new(value.clone()));
                Ok(value)
            }
            Err(err) => {
                let err = share_error(err);
                self.fail(ctx, Arc::clone(&err));
                Err(err)
            }
        }
    }

    fn fail(&self, ctx: &TraceContext, err: TraceError) {
        ctx.set_error(err);
        self.error.publish(ctx);
    }

    /// Publishes the panic as an error, then `last`, then resumes unwinding.
    fn unwind(&self, last: &Channel, ctx: &TraceContext, panic: Box<dyn Any + Send>) -> ! {
        let err = TracedPanic::from_payload(panic.as_ref());
        tracing::debug!(trace = %self.name, label = err.as_label(), message = %err.message, "traced operation panicked");
        self.fail(ctx, Arc::new(err));
        last.publish(ctx);
        resume_unwind(panic)
    }
}

/// Completion handed to a [`TracingChannel::trace_callback`] operation.
///
/// Dropping it without completing publishes nothing further.
#[derive(Debug)]
#[must_use = "an uncompleted trace never publishes asyncEnd"]
pub struct Completion {
    channel: TracingChannel,
    context: Arc<TraceContext>,
}

impl Completion {
    /// Returns the context of the traced operation.
    pub fn context(&self) -> &Arc<TraceContext> {
        &self.context
    }

    /// Records `outcome`, publishing `error` on failure and then `asyncEnd`.
    pub fn complete<T, E>(self, outcome: Result<T, E>)
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
    {
        let ctx = self.context.as_ref();
        match outcome {
            Ok(value) => ctx.set_result(Arc::new(value)),
            Err(err) => self.channel.fail(ctx, share_error(err)),
        }
        self.channel.async_end.publish(ctx);
    }
}
