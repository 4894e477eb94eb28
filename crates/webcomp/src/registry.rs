#![forbid(unsafe_code)]

//! Per-element listener bookkeeping.
//!
//! A [`ListenerRegistry`] maps a normalized event name to the one listener
//! this crate attached for it. It mirrors the element exactly: an entry
//! exists if and only if the listener is attached. Iteration follows the
//! order in which events were first recorded.

use indexmap::IndexMap;
use webcomp_runtime::Callback;

#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry {
    entries: IndexMap<String, Callback>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, event: &str) -> Option<&Callback> {
        self.entries.get(event)
    }

    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.entries.contains_key(event)
    }

    /// Record `listener` for `event`, returning the one it replaces.
    pub fn insert(&mut self, event: impl Into<String>, listener: Callback) -> Option<Callback> {
        self.entries.insert(event.into(), listener)
    }

    /// Forget the listener for `event`, keeping the order of the rest.
    pub fn remove(&mut self, event: &str) -> Option<Callback> {
        self.entries.shift_remove(event)
    }

    /// Event names in registration order.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Callback)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_and_remove_keeps_order() {
        let (a, b, c) = (
            Callback::new(|_| {}),
            Callback::new(|_| {}),
            Callback::new(|_| {}),
        );
        let mut reg = ListenerRegistry::new();
        assert_eq!(reg.insert("click", a.clone()), None);
        reg.insert("hover", b.clone());
        reg.insert("load", c);
        assert_eq!(reg.insert("click", b.clone()), Some(a));
        assert_eq!(reg.remove("hover"), Some(b.clone()));
        assert_eq!(reg.events().collect::<Vec<_>>(), vec!["click", "load"]);
        assert_eq!(reg.get("click"), Some(&b));
        assert!(!reg.contains("hover"));
        assert_eq!(reg.len(), 2);
    }
}
