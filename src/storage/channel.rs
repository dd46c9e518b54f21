//! # Storage channel.
//!
//! [`StorageChannel`] couples two ordinary channels to any number of bound
//! stores:
//!
//! ```text
//! run(data, f)
//!   ├─► publish "{name}.enter-store" (StoreFrame{token, data})
//!   │        └─► each binding: save current, set build(data)
//!   ├─► f()
//!   └─► publish "{name}.exit-store"  (same frame)     ← from a drop guard,
//!            └─► each binding: restore saved            also on panic
//! ```
//!
//! The producer only calls `run`; it never knows which stores are bound.
//! Other consumers may subscribe to the enter/exit channels directly.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use super::binding::{Binding, StoreBinding, StoreFrame, StoreId};
use super::store::ContextStore;
use crate::channel::{Channel, Subscriber};
use crate::name::ChannelName;
use crate::registry::{self, Registry};

static STORAGE: LazyLock<Registry<StorageInner>> = LazyLock::new(|| Registry::new("storage"));

/// Suffix of the channel published before the scoped function runs.
pub const ENTER_SUFFIX: &str = ".enter-store";
/// Suffix of the channel published after the scoped function returns.
pub const EXIT_SUFFIX: &str = ".exit-store";

struct BoundStore {
    store: StoreId,
    enter: Subscriber,
    exit: Subscriber,
}

pub(crate) struct StorageInner {
    name: ChannelName,
    enter: Channel,
    exit: Channel,
    bindings: Mutex<Vec<BoundStore>>,
}

impl StorageInner {
    fn new(name: &ChannelName) -> Self {
        Self {
            name: name.clone(),
            enter: registry::lookup(name.derive("", ENTER_SUFFIX)),
            exit: registry::lookup(name.derive("", EXIT_SUFFIX)),
            bindings: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BoundStore>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the storage channel for an already validated name.
pub(crate) fn lookup(name: ChannelName) -> StorageChannel {
    StorageChannel {
        inner: STORAGE.get_or_insert_with(name, StorageInner::new),
    }
}

/// Publishes the exit frame when dropped.
struct ExitGuard<'a> {
    exit: &'a Channel,
    frame: &'a StoreFrame,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.exit.publish(self.frame);
    }
}

/// Handle to a named storage channel.
///
/// Obtained from [`storage_channel`](crate::storage_channel).
#[derive(Clone)]
pub struct StorageChannel {
    inner: Arc<StorageInner>,
}

impl StorageChannel {
    /// Returns the storage channel name.
    pub fn name(&self) -> &ChannelName {
        &self.inner.name
    }

    /// Returns the `{name}.enter-store` channel.
    pub fn enter_channel(&self) -> &Channel {
        &self.inner.enter
    }

    /// Returns the `{name}.exit-store` channel.
    pub fn exit_channel(&self) -> &Channel {
        &self.inner.exit
    }

    /// Returns true iff the enter or exit channel has subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.inner.enter.has_subscribers() || self.inner.exit.has_subscribers()
    }

    /// Returns true iff `store` is bound to this storage channel.
    pub fn is_bound_to_store<S: ContextStore>(&self, store: &Arc<S>) -> bool {
        let id = StoreId::of(store);
        self.inner.lock().iter().any(|b| b.store == id)
    }

    /// Binds `store`, entering the published data itself.
    ///
    /// Payloads that are not a `S::Value` clear the store for the run.
    /// Returns `false` if `store` is already bound.
    pub fn bind_store<S>(&self, store: Arc<S>) -> bool
    where
        S: ContextStore,
        S::Value: Clone,
    {
        self.bind_store_with(store, |data: &dyn Any| data.downcast_ref::<S::Value>().cloned())
    }

    /// Binds `store`, entering `build(data)` for each run.
    ///
    /// Returns `false` if `store` is already bound.
    pub fn bind_store_with<S, B>(&self, store: Arc<S>, build: B) -> bool
    where
        S: ContextStore,
        B: Fn(&dyn Any) -> Option<S::Value> + Send + Sync + 'static,
    {
        let id = StoreId::of(&store);
        let mut bindings = self.inner.lock();
        if bindings.iter().any(|b| b.store == id) {
            return false;
        }

        let binding: Arc<dyn Binding> = Arc::new(StoreBinding::new(store, build));
        let on_enter = Arc::clone(&binding);
        let enter = Subscriber::typed(move |frame: &StoreFrame, _: &ChannelName| {
            on_enter.enter(frame);
        })
        .with_name("store-binding");
        let exit = Subscriber::typed(move |frame: &StoreFrame, _: &ChannelName| {
            binding.exit(frame);
        })
        .with_name("store-binding");

        self.inner.enter.subscribe(enter.clone());
        self.inner.exit.subscribe(exit.clone());
        bindings.push(BoundStore {
            store: id,
            enter,
            exit,
        });
        STORAGE.inc_ref(&self.inner.name, &self.inner);
        tracing::debug!(storage = %self.inner.name, bindings = bindings.len(), "store bound");
        true
    }

    /// Unbinds `store`. Returns `false` if it was not bound.
    pub fn unbind_store<S: ContextStore>(&self, store: &Arc<S>) -> bool {
        self.unbind(StoreId::of(store))
    }

    pub(crate) fn unbind(&self, id: StoreId) -> bool {
        let removed = {
            let mut bindings = self.inner.lock();
            let Some(index) = bindings.iter().position(|b| b.store == id) else {
                return false;
            };
            let removed = bindings.remove(index);
            self.inner.enter.unsubscribe(&removed.enter);
            self.inner.exit.unsubscribe(&removed.exit);
            STORAGE.dec_ref(&self.inner.name, &self.inner);
            tracing::debug!(storage = %self.inner.name, bindings = bindings.len(), "store unbound");
            removed
        };
        drop(removed);
        true
    }

    /// Runs `f` with every bound store entered with `data`.
    ///
    /// The exit publish fires when `f` returns or panics. Without
    /// subscribers, `f` runs directly and `data` is dropped untouched.
    ///
    /// # Example
    /// ```rust
    /// use std::sync::Arc;
    /// use diagnostics_channel::{AmbientStore, ContextStore, bind_store, storage_channel};
    ///
    /// let store = Arc::new(AmbientStore::<u64>::new());
    /// let binding = bind_store("doc.storage.run", store.clone())?;
    ///
    /// let inside = storage_channel("doc.storage.run")?.run(7u64, || store.get_current());
    /// assert_eq!(inside, Some(7));
    /// assert_eq!(store.get_current(), None);
    ///
    /// assert!(binding.dispose());
    /// # Ok::<(), diagnostics_channel::ChannelError>(())
    /// ```
    pub fn run<D, R, F>(&self, data: D, f: F) -> R
    where
        D: Any,
        F: FnOnce() -> R,
    {
        if !self.has_subscribers() {
            return f();
        }
        let frame = StoreFrame::new(Box::new(data));
        self.inner.enter.publish(&frame);
        let _exit = ExitGuard {
            exit: &self.inner.exit,
            frame: &frame,
        };
        f()
    }
}

impl PartialEq for StorageChannel {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for StorageChannel {}

impl fmt::Debug for StorageChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageChannel")
            .field("name", &self.inner.name)
            .field("bindings", &self.inner.lock().len())
            .finish()
    }
}

/// Disposer returned by [`bind_store`](crate::bind_store).
///
/// Dropping it leaves the binding in place; call [`dispose`](Self::dispose)
/// to remove it.
#[derive(Debug)]
pub struct StoreDisposer {
    channel: StorageChannel,
    store: StoreId,
}

impl StoreDisposer {
    pub(crate) fn new(channel: StorageChannel, store: StoreId) -> Self {
        Self { channel, store }
    }

    /// Returns the storage channel the store is bound to.
    pub fn channel(&self) -> &StorageChannel {
        &self.channel
    }

    /// Unsubscribes the enter and exit handlers of this binding.
    ///
    /// Returns `false` if the binding was already removed.
    pub fn dispose(self) -> bool {
        self.channel.unbind(self.store)
    }
}
