//! Two-state subscriber storage.
//!
//! ```text
//!   Inactive ── with(sub) ──► Active([sub])
//!   Active([..]) ── with(sub) ──► Active([.., sub])
//!   Active([s]) ── without(s) ──► Inactive      (storage released)
//!   Active([..]) ── without(x) ──► None          (x not subscribed)
//! ```
//!
//! Lists are immutable once built; every mutation produces a new list so a
//! publish in progress keeps iterating the snapshot it started with.

use std::sync::Arc;

use super::subscriber::Subscriber;

#[derive(Default)]
pub(crate) enum State {
    /// No subscribers; nothing allocated.
    #[default]
    Inactive,
    /// At least one subscriber, in registration order.
    Active(Arc<[Subscriber]>),
}

impl State {
    pub(crate) fn is_active(&self) -> bool {
        matches!(self, State::Active(_))
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            State::Inactive => 0,
            State::Active(subs) => subs.len(),
        }
    }

    /// Shared snapshot for iteration, `None` when inactive.
    pub(crate) fn snapshot(&self) -> Option<Arc<[Subscriber]>> {
        match self {
            State::Inactive => None,
            State::Active(subs) => Some(Arc::clone(subs)),
        }
    }

    /// State with `sub` appended.
    pub(crate) fn with(&self, sub: Subscriber) -> State {
        let subs: Arc<[Subscriber]> = match self {
            State::Inactive => Arc::from([sub]),
            State::Active(subs) => subs.iter().cloned().chain(std::iter::once(sub)).collect(),
        };
        State::Active(subs)
    }

    /// State with the first entry identical to `sub` removed.
    ///
    /// Returns `None` when `sub` is not present.
    pub(crate) fn without(&self, sub: &Subscriber) -> Option<State> {
        let State::Active(subs) = self else {
            return None;
        };
        let index = subs.iter().position(|s| s == sub)?;
        if subs.len() == 1 {
            return Some(State::Inactive);
        }
        let rest: Arc<[Subscriber]> = subs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, s)| s.clone())
            .collect();
        Some(State::Active(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_removal_returns_to_inactive() {
        let a = Subscriber::new(|_, _| {});
        let state = State::default().with(a.clone());
        assert!(state.is_active());

        let state = state.without(&a).unwrap();
        assert!(!state.is_active());
        assert!(state.snapshot().is_none());
    }

    #[test]
    fn removes_only_first_duplicate() {
        let a = Subscriber::new(|_, _| {});
        let b = Subscriber::new(|_, _| {});
        let state = State::default().with(a.clone()).with(b.clone()).with(a.clone());

        let state = state.without(&a).unwrap();
        let snap = state.snapshot().unwrap();
        assert_eq!(snap.as_ref(), [b, a]);
    }

    #[test]
    fn unknown_subscriber_is_not_removed() {
        let a = Subscriber::new(|_, _| {});
        let b = Subscriber::new(|_, _| {});
        assert!(State::default().without(&a).is_none());
        assert!(State::default().with(a).without(&b).is_none());
    }

    #[test]
    fn snapshot_survives_mutation() {
        let a = Subscriber::new(|_, _| {});
        let b = Subscriber::new(|_, _| {});
        let state = State::default().with(a.clone());
        let snap = state.snapshot().unwrap();

        let state = state.with(b);
        assert_eq!(snap.len(), 1);
        assert_eq!(state.len(), 2);
    }
}
