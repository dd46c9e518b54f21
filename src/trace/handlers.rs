//! Handler sets for the four tracing phases.

use std::fmt;

use super::context::TraceContext;
use crate::channel::Subscriber;
use crate::name::ChannelName;

/// Tracing lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the operation runs.
    Start,
    /// The synchronous part returned (or threw).
    End,
    /// The asynchronous outcome was observed.
    AsyncEnd,
    /// The operation failed.
    Error,
}

impl Phase {
    /// All phases in channel order.
    pub const ALL: [Phase; 4] = [Phase::Start, Phase::End, Phase::AsyncEnd, Phase::Error];

    /// Returns the role name used in channel names (`tracing:{name}:{role}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::End => "end",
            Phase::AsyncEnd => "asyncEnd",
            Phase::Error => "error",
        }
    }

    pub(crate) fn suffix(&self) -> &'static str {
        match self {
            Phase::Start => ":start",
            Phase::End => ":end",
            Phase::AsyncEnd => ":asyncEnd",
            Phase::Error => ":error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscribers for any subset of the four phases.
///
/// Absent phases are skipped by [`TracingChannel::subscribe`](crate::TracingChannel::subscribe)
/// and [`TracingChannel::unsubscribe`](crate::TracingChannel::unsubscribe).
/// Keep the set (or a clone) to unsubscribe later: identity is per subscriber.
///
/// # Example
/// ```rust
/// use diagnostics_channel::{TraceContext, TracingHandlers};
///
/// let handlers = TracingHandlers::new()
///     .on_start(|ctx: &TraceContext| println!("start {ctx:?}"))
///     .on_error(|ctx: &TraceContext| println!("failed: {:?}", ctx.error()));
/// assert!(handlers.end.is_none());
/// ```
#[derive(Clone, Default, Debug)]
pub struct TracingHandlers {
    /// Called before the operation runs.
    pub start: Option<Subscriber>,
    /// Called when the synchronous part returns.
    pub end: Option<Subscriber>,
    /// Called when the asynchronous outcome is known.
    pub async_end: Option<Subscriber>,
    /// Called when the operation fails.
    pub error: Option<Subscriber>,
}

impl TracingHandlers {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the subscriber for `phase`.
    pub fn get(&self, phase: Phase) -> Option<&Subscriber> {
        match phase {
            Phase::Start => self.start.as_ref(),
            Phase::End => self.end.as_ref(),
            Phase::AsyncEnd => self.async_end.as_ref(),
            Phase::Error => self.error.as_ref(),
        }
    }

    /// Sets a raw subscriber for `phase`.
    #[must_use]
    pub fn with(mut self, phase: Phase, subscriber: Subscriber) -> Self {
        let slot = match phase {
            Phase::Start => &mut self.start,
            Phase::End => &mut self.end,
            Phase::AsyncEnd => &mut self.async_end,
            Phase::Error => &mut self.error,
        };
        *slot = Some(subscriber);
        self
    }

    /// Sets a context handler for `phase`.
    #[must_use]
    pub fn on<F>(self, phase: Phase, f: F) -> Self
    where
        F: Fn(&TraceContext) + Send + Sync + 'static,
    {
        let sub = Subscriber::typed(move |ctx: &TraceContext, _: &ChannelName| f(ctx))
            .with_name(format!("trace-{phase}"));
        self.with(phase, sub)
    }

    /// Sets the `start` handler.
    #[must_use]
    pub fn on_start<F>(self, f: F) -> Self
    where
        F: Fn(&TraceContext) + Send + Sync + 'static,
    {
        self.on(Phase::Start, f)
    }

    /// Sets the `end` handler.
    #[must_use]
    pub fn on_end<F>(self, f: F) -> Self
    where
        F: Fn(&TraceContext) + Send + Sync + 'static,
    {
        self.on(Phase::End, f)
    }

    /// Sets the `asyncEnd` handler.
    #[must_use]
    pub fn on_async_end<F>(self, f: F) -> Self
    where
        F: Fn(&TraceContext) + Send + Sync + 'static,
    {
        self.on(Phase::AsyncEnd, f)
    }

    /// Sets the `error` handler.
    #[must_use]
    pub fn on_error<F>(self, f: F) -> Self
    where
        F: Fn(&TraceContext) + Send + Sync + 'static,
    {
        self.on(Phase::Error, f)
    }
}
