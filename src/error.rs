//! Error types used by the channel registry, storage bindings and tracer.
//!
//! This module defines:
//!
//! - [`ChannelError`] contract violations raised synchronously by the API.
//! - [`SubscriberPanic`] an isolated subscriber failure, delivered only to the
//!   deferred reporter ([`ReportError`](crate::ReportError)).
//! - [`TracedPanic`] stored in a [`TraceContext`](crate::TraceContext) when
//!   the traced closure or future panics.
//! - [`TraceError`] the shared error object recorded on a traced operation.
//!
//! Every concrete error type provides `as_label` for logs.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::name::ChannelName;

/// Boxed error accepted from traced operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error recorded on a [`TraceContext`](crate::TraceContext).
///
/// The same allocation is published to `error` subscribers and returned to the
/// caller, so `Arc::ptr_eq` identifies it.
pub type TraceError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors raised by the public API.
///
/// These are argument errors, raised at the call that violates the contract.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel name cannot identify a channel.
    #[error("invalid channel name: {reason}")]
    InvalidName {
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// The store is already bound to this storage channel.
    #[error("store already bound to storage channel {name}")]
    StoreAlreadyBound {
        /// Storage channel name.
        name: ChannelName,
    },
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use diagnostics_channel::ChannelError;
    ///
    /// let err = ChannelError::InvalidName { reason: "name must not be empty" };
    /// assert_eq!(err.as_label(), "channel_invalid_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::InvalidName { .. } => "channel_invalid_name",
            ChannelError::StoreAlreadyBound { .. } => "channel_store_already_bound",
        }
    }
}

/// A subscriber panicked while handling a published message.
#[derive(Error, Debug, Clone)]
#[error("subscriber {subscriber:?} on channel {channel} panicked: {message}")]
pub struct SubscriberPanic {
    /// Channel whose publish invoked the subscriber.
    pub channel: ChannelName,
    /// Name of the failing subscriber.
    pub subscriber: String,
    /// Panic message, or `"unknown panic"` for non-string payloads.
    pub message: String,
}

impl SubscriberPanic {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "subscriber_panicked"
    }
}

/// A traced closure or future panicked.
///
/// The tracer records it as the context error before resuming the unwind.
#[derive(Error, Debug, Clone)]
#[error("traced operation panicked: {message}")]
pub struct TracedPanic {
    /// Panic message, or `"unknown panic"` for non-string payloads.
    pub message: String,
}

impl TracedPanic {
    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        Self {
            message: panic_message(payload),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "traced_panic"
    }
}

/// Extracts the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Converts a user error into the shared form stored on a context.
pub(crate) fn share_error(err: impl Into<BoxError>) -> TraceError {
    Arc::from(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_handles_common_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");

        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn share_error_keeps_message() {
        let err = share_error("boom");
        assert_eq!(err.to_string(), "boom");
    }
}
