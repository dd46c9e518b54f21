//! Channels and their subscribers.
//!
//! ## Contents
//! - [`Channel`] named endpoint with synchronous, fault-isolated fan-out
//! - [`Subscriber`] cloneable callback handle with identity equality
//!
//! ## State machine
//! ```text
//!                 subscribe
//!   ┌──────────┐ ──────────► ┌──────────────────────┐
//!   │ Inactive │             │ Active(subscribers)  │ ◄─┐ subscribe /
//!   └──────────┘ ◄────────── └──────────────────────┘ ──┘ unsubscribe (len > 1)
//!    publish: no-op   unsubscribe     publish: fan-out
//!    unsubscribe: false  (last)
//! ```

mod handle;
mod state;
mod subscriber;

pub(crate) use handle::ChannelInner;
pub use handle::Channel;
pub use subscriber::Subscriber;
