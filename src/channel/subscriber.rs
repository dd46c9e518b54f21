//! # Subscriber handle.
//!
//! Provides [`Subscriber`], a cloneable handle around a callback invoked with
//! `(data, channel_name)` for every publish on the channels it is attached to.
//!
//! ## Identity
//! Unsubscription matches by identity, not by behaviour:
//! ```text
//! let a = Subscriber::new(f);
//! let b = a.clone();           // same identity as `a`
//! let c = Subscriber::new(f);  // different identity
//! ```
//! Keep a clone of the handle you subscribed if you intend to unsubscribe it.
//!
//! ## Example
//! ```rust
//! use std::any::Any;
//! use diagnostics_channel::{ChannelName, Subscriber};
//!
//! let any = Subscriber::new(|data: &dyn Any, name: &ChannelName| {
//!     println!("{name}: {:?}", data.downcast_ref::<u32>());
//! });
//! let typed = Subscriber::typed(|n: &u32, _name: &ChannelName| println!("got {n}"));
//!
//! assert_eq!(any, any.clone());
//! assert_ne!(any, typed);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::name::ChannelName;

type Callback = dyn Fn(&dyn Any, &ChannelName) + Send + Sync + 'static;

/// Callback attached to one or more channels.
#[derive(Clone)]
pub struct Subscriber {
    name: Cow<'static, str>,
    callback: Arc<Callback>,
}

impl Subscriber {
    /// Wraps a callback receiving the raw payload.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&dyn Any, &ChannelName) + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed("anonymous"),
            callback: Arc::new(callback),
        }
    }

    /// Wraps a callback that only receives payloads of type `T`.
    ///
    /// Payloads of any other type are skipped silently.
    pub fn typed<T, F>(callback: F) -> Self
    where
        T: Any,
        F: Fn(&T, &ChannelName) + Send + Sync + 'static,
    {
        Self::new(move |data: &dyn Any, name: &ChannelName| {
            if let Some(value) = data.downcast_ref::<T>() {
                callback(value, name);
            }
        })
    }

    /// Sets the name used in failure reports and logs.
    ///
    /// Prefer short, descriptive names (e.g., "apm", "audit", "profiler").
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the subscriber name (`"anonymous"` unless set).
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn call(&self, data: &dyn Any, channel: &ChannelName) {
        (self.callback)(data, channel);
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.callback), Arc::as_ptr(&other.callback))
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn renamed_clone_keeps_identity() {
        let a = Subscriber::new(|_, _| {});
        let b = a.clone().with_name("audit");
        assert_eq!(a, b);
        assert_eq!(b.name(), "audit");
        assert_eq!(a.name(), "anonymous");
    }

    #[test]
    fn typed_skips_other_payloads() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let sub = Subscriber::typed(move |n: &u32, _| {
            seen.fetch_add(*n as usize, Ordering::SeqCst);
        });
        let name: ChannelName = crate::Symbol::new("t").into();

        sub.call(&5u32, &name);
        sub.call(&"text", &name);
        sub.call(&2u32, &name);
        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }
}
