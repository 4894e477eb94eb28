#![forbid(unsafe_code)]

//! Per-node disposal callbacks.
//!
//! A binding that allocates state for a node registers a teardown closure
//! here when it attaches. When the host removes the node it calls
//! [`DisposalRegistry::dispose_node`], which runs every callback registered
//! for that node exactly once, in registration order, and forgets the node.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Node dropped without disposal | Last `Rc` released first | Callbacks never run; entry pruned on next registration |
//! | Registration during disposal | Callback adds a callback for the same node | Queued for the next `dispose_node` call |
//! | Double disposal | `dispose_node` called twice | Second call runs nothing |

use std::cell::RefCell;
use std::rc::Rc;

use crate::weak_table::{WeakKeyTable, key_of};

type DisposeCallback<E> = Box<dyn FnOnce(&Rc<E>)>;

/// Registry of teardown closures keyed by node identity.
pub struct DisposalRegistry<E: ?Sized> {
    callbacks: RefCell<WeakKeyTable<E, Vec<DisposeCallback<E>>>>,
}

impl<E: ?Sized> Default for DisposalRegistry<E> {
    fn default() -> Self {
        Self {
            callbacks: RefCell::new(WeakKeyTable::new()),
        }
    }
}

impl<E: ?Sized> std::fmt::Debug for DisposalRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalRegistry")
            .field("nodes", &self.callbacks.borrow().len())
            .finish()
    }
}

impl<E: ?Sized> DisposalRegistry<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` with the node when `node` is disposed.
    pub fn add_dispose_callback(&self, node: &Rc<E>, callback: impl FnOnce(&Rc<E>) + 'static) {
        let mut table = self.callbacks.borrow_mut();
        if let Some(list) = table.get_mut(node) {
            list.push(Box::new(callback));
        } else {
            table.insert(node, vec![Box::new(callback)]);
        }
    }

    /// Number of callbacks waiting on `node`.
    #[must_use]
    pub fn pending(&self, node: &Rc<E>) -> usize {
        self.callbacks.borrow().get(node).map_or(0, Vec::len)
    }

    /// Run and forget every callback registered for `node`. Returns how many
    /// ran.
    pub fn dispose_node(&self, node: &Rc<E>) -> usize {
        let callbacks = self.callbacks.borrow_mut().remove(node).unwrap_or_default();
        let count = callbacks.len();
        tracing::debug!(node = key_of(node), callbacks = count, "disposing node");
        for callback in callbacks {
            callback(node);
        }
        count
    }

    /// Number of nodes with pending callbacks whose node is still alive.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.callbacks.borrow().live_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn callbacks_run_once_in_registration_order() {
        let registry = DisposalRegistry::new();
        let node = Rc::new("node");
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            registry.add_dispose_callback(&node, move |n: &Rc<&str>| {
                log.borrow_mut().push(format!("{tag}:{n}"));
            });
        }
        assert_eq!(registry.pending(&node), 2);

        assert_eq!(registry.dispose_node(&node), 2);
        assert_eq!(*log.borrow(), vec!["first:node", "second:node"]);
        assert_eq!(registry.dispose_node(&node), 0);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn nodes_are_independent() {
        let registry = DisposalRegistry::new();
        let a = Rc::new(1);
        let b = Rc::new(2);
        registry.add_dispose_callback(&a, |_| {});
        registry.add_dispose_callback(&b, |_| {});
        registry.dispose_node(&a);
        assert_eq!(registry.pending(&a), 0);
        assert_eq!(registry.pending(&b), 1);
    }

    #[test]
    fn registration_during_disposal_is_deferred() {
        let registry = Rc::new(DisposalRegistry::new());
        let node = Rc::new(());
        let inner = Rc::clone(&registry);
        registry.add_dispose_callback(&node, move |n| {
            inner.add_dispose_callback(n, |_| {});
        });
        assert_eq!(registry.dispose_node(&node), 1);
        assert_eq!(registry.pending(&node), 1);
    }

    #[test]
    fn dropped_nodes_do_not_count_as_live() {
        let registry = DisposalRegistry::new();
        let node = Rc::new(0u8);
        registry.add_dispose_callback(&node, |_| {});
        assert_eq!(registry.live_nodes(), 1);
        drop(node);
        assert_eq!(registry.live_nodes(), 0);
    }
}
