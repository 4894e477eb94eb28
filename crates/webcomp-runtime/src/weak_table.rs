#![forbid(unsafe_code)]

//! Side table keyed by `Rc` identity.
//!
//! [`WeakKeyTable`] attaches metadata to shared objects without owning them
//! and without touching their own fields. Each entry keeps a `Weak` to its
//! key: the key object is free to drop, and an entry whose key has died is
//! treated as absent and removed by the next [`WeakKeyTable::prune`] (which
//! every insert runs first).
//!
//! The weak reference also pins the key's allocation, so a dead key's
//! address cannot be handed to a new object while its entry is still here.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Identity of an `Rc` allocation, usable as a log field.
#[must_use]
pub fn key_of<K: ?Sized>(key: &Rc<K>) -> usize {
    Rc::as_ptr(key) as *const () as usize
}

struct Entry<K: ?Sized, V> {
    key: Weak<K>,
    value: V,
}

/// Map from live `Rc<K>` identities to values.
pub struct WeakKeyTable<K: ?Sized, V> {
    entries: HashMap<usize, Entry<K, V>>,
}

impl<K: ?Sized, V> Default for WeakKeyTable<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: ?Sized, V> std::fmt::Debug for WeakKeyTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakKeyTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<K: ?Sized, V> WeakKeyTable<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `key`, returning the previous one.
    pub fn insert(&mut self, key: &Rc<K>, value: V) -> Option<V> {
        self.prune();
        self.entries
            .insert(
                key_of(key),
                Entry {
                    key: Rc::downgrade(key),
                    value,
                },
            )
            .map(|old| old.value)
    }

    #[must_use]
    pub fn get(&self, key: &Rc<K>) -> Option<&V> {
        self.entries
            .get(&key_of(key))
            .filter(|e| e.key.strong_count() > 0)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &Rc<K>) -> Option<&mut V> {
        self.entries
            .get_mut(&key_of(key))
            .filter(|e| e.key.strong_count() > 0)
            .map(|e| &mut e.value)
    }

    #[must_use]
    pub fn contains(&self, key: &Rc<K>) -> bool {
        self.get(key).is_some()
    }

    /// Remove the entry for `key` and hand back its value.
    pub fn remove(&mut self, key: &Rc<K>) -> Option<V> {
        self.entries.remove(&key_of(key)).map(|e| e.value)
    }

    /// Drop entries whose key has been deallocated. Returns how many.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.key.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of entries, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose key is still alive.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.key.strong_count() > 0)
            .count()
    }
}
