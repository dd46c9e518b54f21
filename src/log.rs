//! # Simple logging subscribers for debugging and demos.
//!
//! [`LogWriter`] emits one `info!` event per message it receives.
//!
//! ## Output format
//! ```text
//! INFO [publish] channel=db.query type=StoreFrame
//! INFO [start] channel=tracing:db.query:start outcome=pending
//! INFO [error] channel=tracing:db.query:error err="connection refused"
//! INFO [asyncEnd] channel=tracing:db.query:asyncEnd outcome=error
//! ```
//!
//! ## Example
//! ```rust
//! use diagnostics_channel::{LogWriter, tracing_channel};
//!
//! let tc = tracing_channel("doc.log.writer")?;
//! let handlers = LogWriter::handlers();
//! tc.subscribe(&handlers);
//! // every phase of every trace on "doc.log.writer" is now logged
//! assert!(tc.unsubscribe(&handlers));
//! # Ok::<(), diagnostics_channel::ChannelError>(())
//! ```

use std::any::Any;

use crate::channel::Subscriber;
use crate::name::ChannelName;
use crate::trace::{Phase, TraceContext, TracingHandlers};

/// Logging subscriber factory.
///
/// Enabled via the `logging` feature. Writes through `tracing`, so output
/// depends on the installed subscriber (see `tracing-subscriber`).
///
/// Not intended for production use - implement a custom [`Subscriber`] for
/// structured logging or metrics collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Returns a subscriber logging every publish on the channels it joins.
    pub fn subscriber() -> Subscriber {
        Subscriber::new(|data: &dyn Any, name: &ChannelName| {
            tracing::info!("[publish] channel={name} type={}", describe(data));
        })
        .with_name("log-writer")
    }

    /// Returns handlers logging all four tracing phases.
    pub fn handlers() -> TracingHandlers {
        Phase::ALL
            .into_iter()
            .fold(TracingHandlers::new(), |handlers, phase| {
                handlers.with(phase, Self::phase(phase))
            })
    }

    fn phase(phase: Phase) -> Subscriber {
        Subscriber::typed(move |ctx: &TraceContext, name: &ChannelName| match ctx.error() {
            Some(err) if phase == Phase::Error => {
                tracing::info!("[{phase}] channel={name} err={:?}", err.to_string());
            }
            _ => {
                tracing::info!("[{phase}] channel={name} outcome={}", ctx.outcome().as_label());
            }
        })
        .with_name("log-writer")
    }
}

fn describe(data: &dyn Any) -> &'static str {
    if data.is::<TraceContext>() {
        "TraceContext"
    } else if data.is::<crate::storage::StoreFrame>() {
        "StoreFrame"
    } else if data.is::<String>() || data.is::<&str>() {
        "string"
    } else {
        "opaque"
    }
}
