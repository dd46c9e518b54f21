//! # Execution-context store.
//!
//! [`ContextStore`] is the collaborator a storage binding writes into: an
//! opaque holder of one "current value" per store instance. Any ambient
//! mechanism (thread-local slot, task-local map, request context) can
//! implement it.
//!
//! [`AmbientStore`] is a ready-made implementation: a process-wide cell.

use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Opaque get/set "current value" scope.
///
/// Stores are identified by their `Arc` allocation when bound.
pub trait ContextStore: Send + Sync + 'static {
    /// Value held by the store.
    type Value: Send + 'static;

    /// Returns the current value (`None` when unset).
    fn get_current(&self) -> Option<Self::Value>;

    /// Replaces the current value (`None` clears it).
    fn set_current(&self, value: Option<Self::Value>);
}

/// Process-wide current-value cell.
///
/// # Example
/// ```rust
/// use diagnostics_channel::{AmbientStore, ContextStore};
///
/// let store = AmbientStore::new();
/// assert_eq!(store.get_current(), None);
/// store.set_current(Some("request-42"));
/// assert_eq!(store.get_current(), Some("request-42"));
/// ```
pub struct AmbientStore<T> {
    current: RwLock<Option<T>>,
}

impl<T> AmbientStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }
}

impl<T> Default for AmbientStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ContextStore for AmbientStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn get_current(&self) -> Option<T> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_current(&self, value: Option<T>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl<T: fmt::Debug> fmt::Debug for AmbientStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("AmbientStore")
            .field("current", &*current)
            .finish()
    }
}
