#![forbid(unsafe_code)]

//! Dependency detection for reactive bindings.
//!
//! [`track`] runs a closure inside a thread-local frame. Every observable
//! read through a recording accessor while the frame is on top of the stack
//! is collected once, in first-read order. The caller then subscribes to the
//! returned [`Dependencies`] to learn when the closure should run again.
//!
//! Frames nest: an inner `track` collects only its own reads and never leaks
//! them into the outer frame. [`untracked`] pushes a frame whose reads are
//! discarded. Frames are popped by an RAII guard, so a panic inside the
//! closure leaves the stack balanced.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::observable::Subscription;

type SubscribeFn = Box<dyn Fn(Rc<dyn Fn()>) -> Subscription>;

/// A type-erased observable that was read inside a tracking frame.
pub struct Dependency {
    id: usize,
    subscribe: SubscribeFn,
}

impl Dependency {
    /// Wrap a subscribe function for the observable identified by `id`.
    pub fn new(id: usize, subscribe: impl Fn(Rc<dyn Fn()>) -> Subscription + 'static) -> Self {
        Self {
            id,
            subscribe: Box::new(subscribe),
        }
    }

    /// Identity of the underlying observable.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Subscribe `on_change` to the underlying observable.
    pub fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        (self.subscribe)(on_change)
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency").field("id", &self.id).finish()
    }
}

/// Observables read during one [`track`] call, deduplicated.
#[derive(Debug, Default)]
pub struct Dependencies {
    entries: Vec<Dependency>,
}

impl Dependencies {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities in first-read order.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(Dependency::id)
    }

    /// Subscribe one shared callback to every dependency.
    #[must_use]
    pub fn subscribe_all(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        self.entries
            .iter()
            .map(|dep| dep.subscribe(Rc::clone(&on_change)))
            .collect()
    }
}

enum Frame {
    Recording {
        seen: HashSet<usize>,
        deps: Dependencies,
    },
    Ignoring,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct FrameGuard {
    depth: usize,
}

impl FrameGuard {
    fn push(frame: Frame) -> Self {
        let depth = FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            frames.push(frame);
            frames.len()
        });
        Self { depth }
    }

    fn take(self) -> Dependencies {
        let frame = FRAMES.with(|frames| frames.borrow_mut().pop());
        std::mem::forget(self);
        match frame {
            Some(Frame::Recording { deps, .. }) => deps,
            _ => Dependencies::default(),
        }
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            debug_assert_eq!(frames.len(), self.depth, "tracking frames unbalanced");
            frames.truncate(self.depth.saturating_sub(1));
        });
    }
}

/// Run `f` and collect every observable it reads.
pub fn track<R>(f: impl FnOnce() -> R) -> (R, Dependencies) {
    let guard = FrameGuard::push(Frame::Recording {
        seen: HashSet::new(),
        deps: Dependencies::default(),
    });
    let result = f();
    (result, guard.take())
}

/// Run `f` with dependency recording suspended.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let guard = FrameGuard::push(Frame::Ignoring);
    let result = f();
    drop(guard);
    result
}

/// True while a recording frame is on top of the stack.
#[must_use]
pub fn is_tracking() -> bool {
    FRAMES.with(|frames| matches!(frames.borrow().last(), Some(Frame::Recording { .. })))
}

/// Report a read of observable `id`. `make` is only called the first time
/// the id is seen in the current frame.
pub(crate) fn record(id: usize, make: impl FnOnce() -> Dependency) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        if let Some(Frame::Recording { seen, deps }) = frames.last_mut() {
            if seen.insert(id) {
                deps.entries.push(make());
            }
        }
    });
}
