//! # Weakly-held name registry with reference counting.
//!
//! [`Registry`] maps a [`ChannelName`] to an object it only holds weakly,
//! unless the object has outstanding references registered via
//! [`Registry::inc_ref`], in which case the slot also pins a strong handle.
//!
//! ## Slot lifecycle
//! ```text
//! get_or_insert_with(name) ──► Slot { weak, refs: 0, strong: None }
//!        inc_ref ──► refs += 1, strong = Some(arc)     (pinned)
//!        dec_ref ──► refs -= 1, refs == 0 → strong = None
//!   last handle dropped, refs == 0 ──► weak dead ──► pruned / replaced
//! ```
//!
//! ## Rules
//! - At most one live object per name.
//! - A dead slot is replaced on the next lookup by the same name.
//! - Dead slots are pruned in bulk when the map doubles past the last prune.
//! - Strong handles are released after the registry lock is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::name::{ChannelName, NameKey, NameRef};

/// Map size below which dead slots are never pruned in bulk.
const MIN_PRUNE_AT: usize = 64;

struct Slot<T> {
    weak: Weak<T>,
    refs: usize,
    strong: Option<Arc<T>>,
}

impl<T> Slot<T> {
    fn vacant(target: &Arc<T>) -> Self {
        Self {
            weak: Arc::downgrade(target),
            refs: 0,
            strong: None,
        }
    }

    fn holds(&self, target: &Arc<T>) -> bool {
        std::ptr::eq(self.weak.as_ptr(), Arc::as_ptr(target))
    }

    fn is_live(&self) -> bool {
        self.weak.strong_count() > 0
    }
}

struct Slots<T> {
    map: HashMap<ChannelName, Slot<T>>,
    prune_at: usize,
}

/// Weak name → object map.
pub(crate) struct Registry<T> {
    kind: &'static str,
    slots: Mutex<Slots<T>>,
}

impl<T> Registry<T> {
    /// Creates an empty registry; `kind` labels its log records.
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                prune_at: MIN_PRUNE_AT,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live object for `name`, if any. Never registers.
    pub(crate) fn get(&self, name: &ChannelName) -> Option<Arc<T>> {
        self.get_by(name.as_name_ref())
    }

    /// Same as [`get`](Self::get), keyed by a borrowed name. Does not allocate.
    pub(crate) fn get_by(&self, name: NameRef<'_>) -> Option<Arc<T>> {
        let key: &dyn NameKey = &name;
        self.lock().map.get(key).and_then(|slot| slot.weak.upgrade())
    }

    /// Returns the live object for `name`, creating and registering one if needed.
    ///
    /// `make` runs under the registry lock and must not call back into this registry.
    pub(crate) fn get_or_insert_with(
        &self,
        name: ChannelName,
        make: impl FnOnce(&ChannelName) -> T,
    ) -> Arc<T> {
        let mut slots = self.lock();
        if let Some(live) = slots.map.get(&name).and_then(|slot| slot.weak.upgrade()) {
            return live;
        }

        let created = Arc::new(make(&name));
        self.prune_if_due(&mut slots);
        slots.map.insert(name, Slot::vacant(&created));
        created
    }

    /// Registers one more reference to `target`; pins it while references remain.
    pub(crate) fn inc_ref(&self, name: &ChannelName, target: &Arc<T>) {
        let mut slots = self.lock();
        let slot = slots
            .map
            .entry(name.clone())
            .or_insert_with(|| Slot::vacant(target));
        if !slot.holds(target) {
            *slot = Slot::vacant(target);
        }
        slot.refs += 1;
        if slot.strong.is_none() {
            slot.strong = Some(Arc::clone(target));
        }
    }

    /// Releases one reference to `target`; unpins it when none remain.
    pub(crate) fn dec_ref(&self, name: &ChannelName, target: &Arc<T>) {
        let released = {
            let mut slots = self.lock();
            match slots.map.get_mut(name) {
                Some(slot) if slot.holds(target) => {
                    slot.refs = slot.refs.saturating_sub(1);
                    if slot.refs == 0 {
                        slot.strong.take()
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };
        drop(released);
    }

    fn prune_if_due(&self, slots: &mut Slots<T>) {
        if slots.map.len() < slots.prune_at {
            return;
        }
        let before = slots.map.len();
        slots.map.retain(|_, slot| slot.is_live());
        slots.prune_at = (slots.map.len() * 2).max(MIN_PRUNE_AT);
        tracing::debug!(
            registry = self.kind,
            pruned = before - slots.map.len(),
            live = slots.map.len(),
            "pruned dead registry slots"
        );
    }

    #[cfg(test)]
    pub(crate) fn refs(&self, name: &ChannelName) -> usize {
        self.lock().map.get(name).map_or(0, |slot| slot.refs)
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.lock().map.len()
    }
}
