//! # Named publish/subscribe endpoint.
//!
//! Provides [`Channel`], a cheap cloneable handle to one registered channel.
//!
//! ## Architecture
//! ```text
//! publish(&data)
//!     │ has_subscribers()? ── no ──► return          (one atomic load)
//!     ▼
//! snapshot = state.read().snapshot()                 (lock released here)
//!     │
//!     ├──► sub1(data, name)
//!     ├──► sub2(data, name) ── panic ──► catch_unwind ──► Defer ──► ReportError
//!     └──► subN(data, name)
//! ```
//!
//! ## Rules
//! - Subscribers run synchronously, in registration order, on the publisher's thread.
//! - A panicking subscriber never reaches the publisher and never stops the fan-out.
//! - Subscribers may (un)subscribe during a publish; the running publish keeps
//!   its snapshot, so no unaffected entry is skipped or invoked twice.
//! - No crate lock is held while a subscriber runs.
//! - While subscribed, the channel is pinned in the registry.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::state::State;
use super::subscriber::Subscriber;
use crate::name::ChannelName;
use crate::registry::CHANNELS;
use crate::report;

/// Shared channel state; owned by the registry (weakly) and by handles.
pub(crate) struct ChannelInner {
    name: ChannelName,
    /// Mirrors `state.is_active()`; read without locking.
    active: AtomicBool,
    state: RwLock<State>,
}

impl ChannelInner {
    pub(crate) fn new(name: &ChannelName) -> Self {
        tracing::debug!(channel = %name, "channel created");
        Self {
            name: name.clone(),
            active: AtomicBool::new(false),
            state: RwLock::new(State::Inactive),
        }
    }

    #[inline]
    pub(crate) fn has_subscribers(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a named channel.
///
/// Obtained from [`channel`](crate::channel). All handles for one name share the
/// same subscriber list; equality compares channel identity.
///
/// # Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use diagnostics_channel::{Subscriber, channel};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let sub = Subscriber::typed(move |n: &u32, name| {
///     sink.lock().unwrap().push(format!("{name}={n}"));
/// });
///
/// let ch = channel("doc.channel.example")?;
/// assert!(!ch.has_subscribers());
/// ch.publish(&1u32); // no-op
///
/// ch.subscribe(sub.clone());
/// ch.publish(&2u32);
/// assert!(ch.unsubscribe(&sub));
/// assert!(!ch.unsubscribe(&sub));
///
/// assert_eq!(seen.lock().unwrap().as_slice(), ["doc.channel.example=2"]);
/// # Ok::<(), diagnostics_channel::ChannelError>(())
/// ```
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    pub(crate) fn from_inner(inner: Arc<ChannelInner>) -> Self {
        Self { inner }
    }

    /// Returns the channel name.
    pub fn name(&self) -> &ChannelName {
        &self.inner.name
    }

    /// Returns true iff at least one subscriber is registered.
    #[inline]
    pub fn has_subscribers(&self) -> bool {
        self.inner.has_subscribers()
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().len()
    }

    /// Appends `subscriber` to the subscriber list.
    ///
    /// The same handle may be subscribed more than once; it is then invoked
    /// once per registration.
    pub fn subscribe(&self, subscriber: Subscriber) {
        let mut state = self.inner.write();
        tracing::trace!(channel = %self.inner.name, subscriber = subscriber.name(), "subscribe");
        *state = state.with(subscriber);
        self.inner.active.store(true, Ordering::Release);
        CHANNELS.inc_ref(&self.inner.name, &self.inner);
    }

    /// Removes the first registration of `subscriber`.
    ///
    /// Returns `false` (and changes nothing) when it is not subscribed.
    pub fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
        let mut state = self.inner.write();
        let Some(next) = state.without(subscriber) else {
            return false;
        };
        tracing::trace!(channel = %self.inner.name, subscriber = subscriber.name(), "unsubscribe");
        let retired = std::mem::replace(&mut *state, next);
        self.inner.active.store(state.is_active(), Ordering::Release);
        CHANNELS.dec_ref(&self.inner.name, &self.inner);
        drop(state);
        drop(retired);
        true
    }

    /// Invokes every subscriber with `(data, name)`.
    ///
    /// No-op without subscribers. Subscriber panics are isolated and reported
    /// later through the configured [`ReportError`](crate::ReportError).
    pub fn publish(&self, data: &dyn Any) {
        if !self.has_subscribers() {
            return;
        }
        let snapshot = self.inner.read().snapshot();
        let Some(subscribers) = snapshot else {
            return;
        };
        for sub in subscribers.iter() {
            let delivered = catch_unwind(AssertUnwindSafe(|| sub.call(data, &self.inner.name)));
            if let Err(payload) = delivered {
                report::defer_panic(&self.inner.name, sub.name(), payload);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> std::sync::Weak<ChannelInner> {
        Arc::downgrade(&self.inner)
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Channel {}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
