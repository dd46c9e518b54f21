//! Deferred failure reporting.
//!
//! A subscriber that panics during [`Channel::publish`](crate::Channel::publish)
//! is caught on the spot; the failure is then handed to the configured
//! [`ReportError`] through the configured [`Defer`] scheduler, so the
//! publisher never observes it and the remaining subscribers still run.
//!
//! ## Contents
//! - [`ReportError`], [`LogReporter`] failure sink and its `tracing` default
//! - [`Defer`], [`RuntimeDefer`] "run later" hook and its tokio/thread default

mod reporter;
mod scheduler;

pub use reporter::{LogReporter, ReportError};
pub use scheduler::{Defer, Job, RuntimeDefer};

use std::any::Any;

use crate::config;
use crate::error::{SubscriberPanic, panic_message};
use crate::name::ChannelName;

/// Converts a caught panic and schedules its report.
pub(crate) fn defer_panic(channel: &ChannelName, subscriber: &str, payload: Box<dyn Any + Send>) {
    let err = SubscriberPanic {
        channel: channel.clone(),
        subscriber: subscriber.to_string(),
        message: panic_message(payload.as_ref()),
    };
    let cfg = config::config();
    let reporter = cfg.reporter.clone();
    cfg.scheduler.defer(Box::new(move || reporter.report(err)));
}
