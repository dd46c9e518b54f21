//! # Trace context.
//!
//! One [`TraceContext`] is threaded by reference through every phase of a
//! traced operation. Subscribers see the same object at `start`, `end`,
//! `error` and `asyncEnd`, and may read what earlier phases recorded.
//!
//! ## Fields
//! - `input`: caller-supplied data, set once at construction.
//! - `outcome`: [`Outcome::Pending`] until the tracer records either a result
//!   or an error. The two are mutually exclusive by construction.
//!
//! `start` (and `end` of an asynchronous operation) fire while the outcome is
//! still pending. Reusing a context for a later trace replaces the outcome.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::TraceError;

/// Shared success value recorded on a context.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Recorded outcome of a traced operation.
#[derive(Clone, Default)]
pub enum Outcome {
    /// Not settled yet.
    #[default]
    Pending,
    /// Completed with a value.
    Result(Payload),
    /// Failed with an error.
    Error(TraceError),
}

impl Outcome {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::Result(_) => "result",
            Outcome::Error(_) => "error",
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => f.write_str("Pending"),
            Outcome::Result(_) => f.write_str("Result(..)"),
            Outcome::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
        }
    }
}

/// Per-operation context published on every tracing phase.
///
/// # Example
/// ```rust
/// use diagnostics_channel::TraceContext;
///
/// #[derive(Debug, PartialEq)]
/// struct Query { sql: &'static str }
///
/// let ctx = TraceContext::new(Query { sql: "select 1" });
/// assert_eq!(ctx.input::<Query>(), Some(&Query { sql: "select 1" }));
/// assert!(ctx.input::<u32>().is_none());
/// assert!(ctx.result::<u32>().is_none() && ctx.error().is_none());
/// ```
pub struct TraceContext {
    input: Box<dyn Any + Send + Sync>,
    outcome: RwLock<Outcome>,
}

impl TraceContext {
    /// Creates a context carrying `input`.
    pub fn new<I>(input: I) -> Self
    where
        I: Any + Send + Sync,
    {
        Self {
            input: Box::new(input),
            outcome: RwLock::new(Outcome::Pending),
        }
    }

    /// Creates a context without input fields.
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Returns the input if it is an `I`.
    pub fn input<I: Any>(&self) -> Option<&I> {
        self.input.downcast_ref::<I>()
    }

    /// Returns the raw input.
    pub fn input_any(&self) -> &(dyn Any + Send + Sync) {
        self.input.as_ref()
    }

    /// Returns a snapshot of the outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded result if the operation succeeded with a `T`.
    pub fn result<T: Any + Clone>(&self) -> Option<T> {
        match &*self.outcome.read().unwrap_or_else(PoisonError::into_inner) {
            Outcome::Result(value) => value.downcast_ref::<T>().cloned(),
            _ => None,
        }
    }

    /// Returns the recorded error if the operation failed.
    pub fn error(&self) -> Option<TraceError> {
        match &*self.outcome.read().unwrap_or_else(PoisonError::into_inner) {
            Outcome::Error(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    pub(crate) fn set_result(&self, value: Payload) {
        self.settle(Outcome::Result(value));
    }

    pub(crate) fn set_error(&self, err: TraceError) {
        self.settle(Outcome::Error(err));
    }

    fn settle(&self, outcome: Outcome) {
        let previous = {
            let mut slot = self.outcome.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, outcome)
        };
        drop(previous);
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceContext")
            .field("outcome", &self.outcome())
            .finish_non_exhaustive()
    }
}
