#![forbid(unsafe_code)]

//! Observable cell with change notification and dependency recording.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value in shared `Rc<RefCell<..>>` storage.
//! Handles are cheap clones of the same cell. A value-changing write bumps
//! the version and notifies live subscribers in registration order.
//!
//! Reads through [`Observable::get`] and [`Observable::with`] are reported to
//! the innermost active [`track`](super::dependency::track) frame so a
//! binding can re-run when anything it read changes. [`Observable::peek`]
//! reads without being recorded.
//!
//! # Failure Modes
//!
//! - **Re-entrant write**: calling `set()` on the same observable from inside
//!   its own `update()` closure panics (RefCell borrow rules). Writing from a
//!   subscriber callback is fine; no borrow is held while callbacks run.
//! - **Leaked guards**: a [`Subscription`] that is never dropped keeps its
//!   callback alive. Dead weak entries are pruned on the next notification.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::dependency::{self, Dependency};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Two handles compare equal when they share the same cell, never by value.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing write.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Observable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T> Observable<T> {
    /// True when both handles share one cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity of the shared cell, used to deduplicate dependencies.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    /// Current version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable at version 0 with no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone the current value and record the read as a dependency.
    #[must_use]
    pub fn get(&self) -> T {
        self.record_read();
        self.peek()
    }

    /// Clone the current value without recording a dependency.
    #[must_use]
    pub fn peek(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value and record the read as a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.record_read();
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Subscribers run only if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutate in place. Subscribers run only if the result differs from a
    /// snapshot taken before `f`.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.value.clone();
            f(&mut inner.value);
            if inner.value == before {
                false
            } else {
                inner.version += 1;
                true
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Register a change callback. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    fn record_read(&self) {
        let id = self.id();
        dependency::record(id, || {
            let source = self.clone();
            Dependency::new(id, move |on_change| {
                source.subscribe(move |_| on_change())
            })
        });
    }

    fn notify(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        let value = self.peek();
        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// RAII guard for a subscriber callback.
///
/// Holds the only strong reference to the callback; once dropped, the weak
/// entry in the observable can no longer be upgraded.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::dependency::track;
    use std::cell::Cell;

    #[test]
    fn set_bumps_version_only_on_change() {
        let obs = Observable::new(7);
        obs.set(7);
        assert_eq!(obs.version(), 0);
        obs.set(8);
        assert_eq!(obs.get(), 8);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn update_in_place_notifies_once() {
        let obs = Observable::new(vec!["a".to_string()]);
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));

        obs.update(|v| v.push("b".to_string()));
        obs.update(|_| {});
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn dropped_subscription_stops_callbacks_and_is_pruned() {
        let obs = Observable::new(0);
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let sub = obs.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));

        obs.set(1);
        drop(sub);
        assert_eq!(obs.subscriber_count(), 1);
        obs.set(2);
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        let _a = obs.subscribe(move |v| first.borrow_mut().push(("a", *v)));
        let _b = obs.subscribe(move |v| second.borrow_mut().push(("b", *v)));

        obs.set(3);
        assert_eq!(*log.borrow(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn subscriber_may_write_back() {
        let obs = Observable::new(0);
        let mirror = Observable::new(0);
        let target = mirror.clone();
        let _sub = obs.subscribe(move |v| target.set(*v * 10));

        obs.set(4);
        assert_eq!(mirror.peek(), 40);
    }

    #[test]
    fn equality_is_identity() {
        let a = Observable::new(1);
        let b = Observable::new(1);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn peek_is_not_recorded() {
        let obs = Observable::new(1);
        let ((), deps) = track(|| {
            let _ = obs.peek();
        });
        assert!(deps.is_empty());

        let ((), deps) = track(|| {
            let _ = obs.get();
            obs.with(|_| ());
        });
        assert_eq!(deps.len(), 1);
    }

    #[test]
    fn debug_lists_value_and_version() {
        let dbg = format!("{:?}", Observable::new(42));
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }
}
