//! # diagnostics-channel
//!
//! **diagnostics-channel** is an in-process publish/subscribe bus for
//! diagnostic messages.
//!
//! Producers (libraries) publish onto named channels; consumers (APM agents,
//! profilers, audit hooks) subscribe. Publishing onto a channel nobody listens
//! to is a single atomic load, so producers can instrument hot paths freely.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      producer                                       consumers
//!   ┌─────────────┐   channel("db.query")       ┌───────────────────┐
//!   │  publish()  │ ──────────┐                 │ subscribe(sub)    │
//!   └─────────────┘           ▼                 └─────────┬─────────┘
//! ┌───────────────────────────────────────────────────────┴───────────┐
//! │  Registry (process-wide, weak + pinned by subscription count)     │
//! │  name ──► Channel { Inactive | Active(Arc<[Subscriber]>) }        │
//! └──────┬──────────────────────────┬──────────────────────────┬──────┘
//!        ▼                          ▼                          ▼
//! ┌──────────────┐       ┌─────────────────────┐     ┌──────────────────┐
//! │   Channel    │       │   StorageChannel    │     │  TracingChannel  │
//! │  fan-out in  │       │  {name}.enter-store │     │ tracing:{n}:start│
//! │  order, each │       │  {name}.exit-store  │     │ tracing:{n}:end  │
//! │  call guarded│       │  + bound stores     │     │   …:asyncEnd     │
//! └──────┬───────┘       └─────────────────────┘     │   …:error        │
//!        │ subscriber panicked                       └──────────────────┘
//!        ▼
//!  Config.scheduler ──(later)──► Config.reporter.report(SubscriberPanic)
//! ```
//!
//! ### Publish
//! ```text
//! publish(data)
//!   ├─ no subscribers ─► return
//!   └─ snapshot = current subscriber list (copy-on-write, no lock held after)
//!        for sub in snapshot:
//!          ├─ sub(data, name)
//!          └─ panicked? ─► defer report, continue with next subscriber
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / functions                          |
//! |-------------------|------------------------------------------------------------------|------------------------------------------------|
//! | **Channels**      | Named endpoints with ordered, fault-isolated fan-out.            | [`Channel`], [`Subscriber`], [`channel`]       |
//! | **Names**         | Shared string names or private, identity-compared symbols.       | [`ChannelName`], [`Symbol`]                    |
//! | **Storage**       | Enter/restore context stores around a producer's scoped call.    | [`StorageChannel`], [`bind_store`]             |
//! | **Tracing**       | `start`/`end`/`asyncEnd`/`error` around sync, callback, futures. | [`TracingChannel`], [`TraceContext`]           |
//! | **Reporting**     | Deferred delivery of subscriber failures.                        | [`ReportError`], [`Defer`]                     |
//! | **Errors**        | Typed errors with stable labels.                                 | [`ChannelError`], [`SubscriberPanic`]          |
//! | **Configuration** | Process-wide reporter and scheduler.                             | [`Config`], [`configure`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use diagnostics_channel::{
//!     AmbientStore, ContextStore, Subscriber, TraceContext, TracingHandlers,
//!     bind_store, channel, storage_channel, tracing_channel,
//! };
//!
//! fn main() -> Result<(), diagnostics_channel::ChannelError> {
//!     // Plain channel
//!     let ch = channel("app.request")?;
//!     let sub = Subscriber::typed(|path: &&str, _| println!("request {path}"));
//!     ch.subscribe(sub.clone());
//!     ch.publish(&"/health");
//!     ch.unsubscribe(&sub);
//!
//!     // Storage binding
//!     let store = Arc::new(AmbientStore::<u64>::new());
//!     let binding = bind_store("app.request-id", store.clone())?;
//!     storage_channel("app.request-id")?.run(7u64, || {
//!         assert_eq!(store.get_current(), Some(7));
//!     });
//!     binding.dispose();
//!
//!     // Tracing
//!     let tc = tracing_channel("app.handler")?;
//!     let handlers = TracingHandlers::new().on_error(|ctx: &TraceContext| {
//!         eprintln!("handler failed: {:?}", ctx.error());
//!     });
//!     tc.subscribe(&handlers);
//!     let _ = tc.trace(|| "42".parse::<u32>(), TraceContext::new("parse"));
//!     tc.unsubscribe(&handlers);
//!     Ok(())
//! }
//! ```
mod channel;
mod config;
mod error;
mod name;
mod registry;
mod report;
mod storage;
mod trace;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use channel::{Channel, Subscriber};
pub use config::{Config, config, configure};
pub use error::{BoxError, ChannelError, SubscriberPanic, TraceError, TracedPanic};
pub use name::{ChannelName, IntoChannelName, NameRef, Symbol};
pub use registry::{channel, has_subscribers, subscribe, unsubscribe};
pub use report::{Defer, Job, LogReporter, ReportError, RuntimeDefer};
pub use storage::{
    AmbientStore, ContextStore, ENTER_SUFFIX, EXIT_SUFFIX, RunToken, StorageChannel, StoreDisposer,
    StoreFrame, bind_store, bind_store_with, storage_channel,
};
pub use trace::{
    Completion, Outcome, Payload, Phase, TraceContext, TracingChannel, TracingHandlers,
    tracing_channel,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
