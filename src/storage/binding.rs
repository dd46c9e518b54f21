//! # Store binding with correlated save-stack.
//!
//! A binding snapshots a store's current value on `enter` and restores it on
//! the matching `exit`. Every run carries a [`RunToken`]; `exit` only
//! restores what its own `enter` saved.
//!
//! ## Save-stack discipline
//! ```text
//! enter(A)  stack: [A:v0]            current: build(a)
//! enter(B)  stack: [A:v0, B:a']      current: build(b)
//!
//! nested:       exit(B) → pop B, restore a'      exit(A) → pop A, restore v0
//! interleaved:  exit(A) → A is buried: drop it, hand v0 to B, keep current
//!               exit(B) → pop B, restore v0
//! unmatched:    exit(X) → no entry, no-op
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::store::ContextStore;

/// Global counter for run tokens.
static RUN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Correlation token of one storage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

impl RunToken {
    pub(crate) fn next() -> Self {
        Self(RUN_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Payload published on `{name}.enter-store` and `{name}.exit-store`.
///
/// The same frame is published on both channels of one run.
pub struct StoreFrame {
    token: RunToken,
    data: Box<dyn Any>,
}

impl StoreFrame {
    pub(crate) fn new(data: Box<dyn Any>) -> Self {
        Self {
            token: RunToken::next(),
            data,
        }
    }

    /// Token shared by the enter and exit publish of this run.
    pub fn token(&self) -> RunToken {
        self.token
    }

    /// Data passed to [`StorageChannel::run`](crate::StorageChannel::run).
    pub fn data(&self) -> &dyn Any {
        self.data.as_ref()
    }
}

impl fmt::Debug for StoreFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFrame")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Identity of a bound store (its `Arc` allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StoreId(usize);

impl StoreId {
    pub(crate) fn of<S: ?Sized>(store: &Arc<S>) -> Self {
        Self(Arc::as_ptr(store).cast::<()>() as usize)
    }
}

/// Type-erased binding, as held by a storage channel.
pub(crate) trait Binding: Send + Sync + 'static {
    fn enter(&self, frame: &StoreFrame);
    fn exit(&self, frame: &StoreFrame);
}

struct Saved<V> {
    token: RunToken,
    value: Option<V>,
}

/// One store bound to one storage channel.
pub(crate) struct StoreBinding<S: ContextStore, B> {
    store: Arc<S>,
    build: B,
    stack: Mutex<Vec<Saved<S::Value>>>,
}

impl<S, B> StoreBinding<S, B>
where
    S: ContextStore,
    B: Fn(&dyn Any) -> Option<S::Value> + Send + Sync + 'static,
{
    pub(crate) fn new(store: Arc<S>, build: B) -> Self {
        Self {
            store,
            build,
            stack: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Saved<S::Value>>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.lock().len()
    }
}

impl<S, B> Binding for StoreBinding<S, B>
where
    S: ContextStore,
    B: Fn(&dyn Any) -> Option<S::Value> + Send + Sync + 'static,
{
    fn enter(&self, frame: &StoreFrame) {
        let saved = self.store.get_current();
        let next = (self.build)(frame.data());
        self.lock().push(Saved {
            token: frame.token,
            value: saved,
        });
        self.store.set_current(next);
    }

    fn exit(&self, frame: &StoreFrame) {
        let restore = {
            let mut stack = self.lock();
            let Some(index) = stack.iter().rposition(|s| s.token == frame.token) else {
                return;
            };
            let saved = stack.remove(index);
            match stack.get_mut(index) {
                // Buried: the run entered right after inherits the older value.
                Some(above) => {
                    above.value = saved.value;
                    return;
                }
                None => saved.value,
            }
        };
        self.store.set_current(restore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::AmbientStore;

    fn binding() -> (Arc<AmbientStore<String>>, impl Binding) {
        let store = Arc::new(AmbientStore::new());
        let build = |data: &dyn Any| data.downcast_ref::<&str>().map(|s| s.to_uppercase());
        (store.clone(), StoreBinding::new(store, build))
    }

    fn frame(data: &'static str) -> StoreFrame {
        StoreFrame::new(Box::new(data))
    }

    #[test]
    fn enter_builds_and_exit_restores() {
        let (store, b) = binding();
        store.set_current(Some("outer".into()));

        let f = frame("inner");
        b.enter(&f);
        assert_eq!(store.get_current().as_deref(), Some("INNER"));
        b.exit(&f);
        assert_eq!(store.get_current().as_deref(), Some("outer"));
    }

    #[test]
    fn nested_runs_unwind_in_order() {
        let (store, b) = binding();
        let (a, c) = (frame("a"), frame("c"));

        b.enter(&a);
        b.enter(&c);
        assert_eq!(store.get_current().as_deref(), Some("C"));
        b.exit(&c);
        assert_eq!(store.get_current().as_deref(), Some("A"));
        b.exit(&a);
        assert_eq!(store.get_current(), None);
    }

    #[test]
    fn interleaved_exit_does_not_clobber_inner_run() {
        let (store, b) = binding();
        store.set_current(Some("root".into()));
        let (a, c) = (frame("a"), frame("c"));

        b.enter(&a);
        b.enter(&c);
        b.exit(&a);
        assert_eq!(store.get_current().as_deref(), Some("C"));
        b.exit(&c);
        assert_eq!(store.get_current().as_deref(), Some("root"));
    }

    #[test]
    fn unmatched_exit_is_noop() {
        let store = Arc::new(AmbientStore::<String>::new());
        let b = StoreBinding::new(store.clone(), |_: &dyn Any| Some("x".to_string()));
        store.set_current(Some("keep".into()));

        b.exit(&frame("never-entered"));
        assert_eq!(store.get_current().as_deref(), Some("keep"));
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn duplicate_exit_is_noop() {
        let (store, b) = binding();
        let a = frame("a");
        b.enter(&a);
        b.exit(&a);
        store.set_current(Some("later".into()));
        b.exit(&a);
        assert_eq!(store.get_current().as_deref(), Some("later"));
    }
}
