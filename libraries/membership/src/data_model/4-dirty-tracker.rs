//! # DirtyTracker
//! A DirtyTracker is a wrapper around any type, that adds a "dirty" flag. This is used to track whether the local view has changed since listeners were last notified.
//! A change made on behalf of one listener (the "modifier") does not notify that listener, since it already knows.

use std::ops::{Deref, DerefMut};

use crate::data_model::ListenerKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirtyState {
    /// Not dirty, no pending notifications
    Clean,
    /// Dirty, notify all listeners except the specified one
    DirtyExcept(ListenerKey),
    /// Dirty, notify all listeners
    DirtyAll,
}

#[derive(Clone, Debug)]
pub struct DirtyTracker<Store> {
    store: Store,
    /// Tracks whether there are pending notifications and who should be notified
    dirty_state: DirtyState,
    loaded_at_least_once: bool,
}

impl<Store: Default> Default for DirtyTracker<Store> {
    fn default() -> Self {
        Self::new(Store::default())
    }
}

/// Smart pointer that marks the store as dirty when dereferenced mutably
pub struct DirtyOnDerefMut<'a, Store> {
    store: &'a mut Store,
    dirty_state: &'a mut DirtyState,
    modifier: Option<ListenerKey>,
}

impl<Store> Deref for DirtyOnDerefMut<'_, Store> {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl<Store> DerefMut for DirtyOnDerefMut<'_, Store> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.mark_dirty();
        self.store
    }
}

impl<Store> DirtyOnDerefMut<'_, Store> {
    fn mark_dirty(&mut self) {
        use DirtyState::*;
        *self.dirty_state = match (&self.dirty_state, self.modifier) {
            (Clean, Some(key)) => DirtyExcept(key),
            (DirtyExcept(key1), Some(key2)) if key1 == &key2 => DirtyExcept(*key1),
            (Clean, None) => DirtyAll,
            (DirtyExcept(_), _) | (DirtyAll, _) => DirtyAll,
        };
    }
}

impl<Store> DirtyTracker<Store> {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            dirty_state: DirtyState::Clean,
            loaded_at_least_once: false,
        }
    }

    /// Returns true if the `loaded` marker was changed
    pub(crate) fn mark_loaded(&mut self, modifier: Option<ListenerKey>) -> bool {
        if !self.loaded_at_least_once {
            self.loaded_at_least_once = true;
            self.store_mut(modifier).mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn store_mut(&mut self, modifier: Option<ListenerKey>) -> DirtyOnDerefMut<'_, Store> {
        DirtyOnDerefMut {
            store: &mut self.store,
            dirty_state: &mut self.dirty_state,
            modifier,
        }
    }

    /// Returns the pending dirty state and resets it to clean.
    pub(crate) fn take_dirty_state(&mut self) -> DirtyState {
        std::mem::replace(&mut self.dirty_state, DirtyState::Clean)
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty_state
    }

    pub fn loaded_at_least_once(&self) -> bool {
        self.loaded_at_least_once
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (ListenerKey, ListenerKey) {
        let mut map = slotmap::SlotMap::new();
        (ListenerKey(map.insert(())), ListenerKey(map.insert(())))
    }

    #[test]
    fn test_reading_does_not_dirty() {
        let mut tracker = DirtyTracker::new(vec![1, 2]);
        let view = tracker.store_mut(None);
        assert_eq!(view.len(), 2);
        assert_eq!(tracker.dirty_state(), DirtyState::Clean);
    }

    #[test]
    fn test_modifier_is_excluded() {
        let (a, _) = keys();
        let mut tracker = DirtyTracker::new(Vec::new());
        tracker.store_mut(Some(a)).push(1);
        tracker.store_mut(Some(a)).push(2);
        assert_eq!(tracker.take_dirty_state(), DirtyState::DirtyExcept(a));
        assert_eq!(tracker.dirty_state(), DirtyState::Clean);
    }

    #[test]
    fn test_changes_from_different_modifiers_notify_everyone() {
        let (a, b) = keys();
        let mut tracker = DirtyTracker::new(Vec::new());
        tracker.store_mut(Some(a)).push(1);
        tracker.store_mut(Some(b)).push(2);
        assert_eq!(tracker.take_dirty_state(), DirtyState::DirtyAll);

        tracker.store_mut(Some(a)).push(3);
        tracker.store_mut(None).push(4);
        assert_eq!(tracker.take_dirty_state(), DirtyState::DirtyAll);
    }

    #[test]
    fn test_mark_loaded_only_once() {
        let mut tracker = DirtyTracker::new(Vec::<u32>::new());
        assert!(!tracker.loaded_at_least_once());
        assert!(tracker.mark_loaded(None));
        assert!(!tracker.mark_loaded(None));
        assert!(tracker.loaded_at_least_once());
        assert_eq!(tracker.dirty_state(), DirtyState::DirtyAll);
    }
}
