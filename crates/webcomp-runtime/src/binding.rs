#![forbid(unsafe_code)]

//! Reactive binding application.
//!
//! A [`BindingHandler`] is the adapter between a node and a parameter
//! accessor: `init` runs once when the binding is applied, `update` runs
//! whenever the parameters it read may have changed.
//!
//! [`BindingHost::apply`] drives a handler:
//!
//! 1. `init(element, disposal)` lets the handler allocate per-node state and
//!    register its teardown.
//! 2. `update` runs inside a [`track`] frame; every observable it reads
//!    becomes a dependency.
//! 3. A change to any dependency re-runs `update` and re-collects the
//!    dependencies, so conditional reads are followed.
//! 4. [`BindingHost::dispose`] fires the node's disposal callbacks, which
//!    also stops every binding applied to the node.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | First update fails | `update` returns `Err` during `apply` or `mount` | Error returned; dependencies read so far stay subscribed; `mount` also returns the handle |
//! | Reactive re-run fails | `update` returns `Err` after a change | Logged at `error`, kept for [`Binding::take_last_error`] |
//! | Update writes its own dependency | Change notification during `update` | Nested re-run skipped |
//! | Element dropped without disposal | Last `Rc` released | Next change stops the binding |

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::disposal::DisposalRegistry;
use crate::reactive::{Subscription, track};
use crate::value::Value;
use crate::weak_table::key_of;

/// Adapter invoked by the host at attach time and on every relevant change.
pub trait BindingHandler<E: ?Sized> {
    type Error: std::error::Error + 'static;

    /// Called once, before the first update.
    fn init(&self, element: &Rc<E>, disposal: &DisposalRegistry<E>);

    /// Converge `element` to the parameters produced by `accessor`.
    fn update(&self, element: &Rc<E>, accessor: &dyn Fn() -> Value) -> Result<(), Self::Error>;
}

struct BindingCore<E: ?Sized, H: BindingHandler<E>> {
    element: Weak<E>,
    element_key: usize,
    handler: Rc<H>,
    accessor: Box<dyn Fn() -> Value>,
    subscriptions: RefCell<Vec<Subscription>>,
    dependency_count: Cell<usize>,
    runs: Cell<u64>,
    running: Cell<bool>,
    active: Cell<bool>,
    last_error: RefCell<Option<H::Error>>,
}

impl<E: ?Sized + 'static, H: BindingHandler<E> + 'static> BindingCore<E, H> {
    fn run(self: &Rc<Self>) -> Result<(), H::Error> {
        if !self.active.get() {
            return Ok(());
        }
        if self.running.get() {
            tracing::trace!(element = self.element_key, "skipping nested binding update");
            return Ok(());
        }
        let Some(element) = self.element.upgrade() else {
            self.stop();
            return Ok(());
        };

        self.running.set(true);
        let (result, deps) = track(|| self.handler.update(&element, &*self.accessor));
        self.running.set(false);
        self.runs.set(self.runs.get() + 1);

        if self.active.get() {
            let weak = Rc::downgrade(self);
            let subscriptions = deps.subscribe_all(Rc::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.rerun();
                }
            }));
            self.dependency_count.set(deps.len());
            let previous = self.subscriptions.replace(subscriptions);
            drop(previous);
        }
        result
    }

    fn rerun(self: &Rc<Self>) {
        if let Err(err) = self.run() {
            tracing::error!(element = self.element_key, error = %err, "binding update failed");
            *self.last_error.borrow_mut() = Some(err);
        }
    }

    fn stop(&self) {
        if self.active.replace(false) {
            tracing::debug!(element = self.element_key, "binding stopped");
        }
        self.dependency_count.set(0);
        let subscriptions = self.subscriptions.take();
        drop(subscriptions);
    }
}

/// Handle to an applied binding.
///
/// The binding stays alive until its node is disposed or dropped; dropping
/// the handle does not stop it.
pub struct Binding<E: ?Sized, H: BindingHandler<E>> {
    core: Rc<BindingCore<E, H>>,
}

impl<E: ?Sized, H: BindingHandler<E>> std::fmt::Debug for Binding<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("element", &self.core.element_key)
            .field("active", &self.core.active.get())
            .field("runs", &self.core.runs.get())
            .field("dependencies", &self.core.dependency_count.get())
            .finish()
    }
}

impl<E: ?Sized + 'static, H: BindingHandler<E> + 'static> Binding<E, H> {
    /// Number of completed `update` calls, including failed ones.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.core.runs.get()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.core.active.get()
    }

    /// Observables the last update read.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.core.dependency_count.get()
    }

    /// Run `update` now, regardless of changes.
    pub fn refresh(&self) -> Result<(), H::Error> {
        self.core.run()
    }

    /// Stop reacting to changes. The handler's own disposal still runs when
    /// the node is disposed.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Take the error from the most recent failed reactive re-run.
    pub fn take_last_error(&self) -> Option<H::Error> {
        self.core.last_error.borrow_mut().take()
    }
}

/// Applies handlers to nodes and owns the nodes' disposal callbacks.
pub struct BindingHost<E: ?Sized> {
    disposal: Rc<DisposalRegistry<E>>,
}

impl<E: ?Sized> Default for BindingHost<E> {
    fn default() -> Self {
        Self {
            disposal: Rc::new(DisposalRegistry::new()),
        }
    }
}

impl<E: ?Sized> std::fmt::Debug for BindingHost<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingHost")
            .field("disposal", &self.disposal)
            .finish()
    }
}

impl<E: ?Sized + 'static> BindingHost<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn disposal(&self) -> &Rc<DisposalRegistry<E>> {
        &self.disposal
    }

    /// Initialize `handler` on `element`, run the first update and keep it
    /// current as the observables it reads change.
    ///
    /// On a failed first update the binding stays applied but its handle is
    /// dropped; use [`BindingHost::mount`] to keep it.
    pub fn apply<H>(
        &self,
        handler: Rc<H>,
        element: &Rc<E>,
        accessor: impl Fn() -> Value + 'static,
    ) -> Result<Binding<E, H>, H::Error>
    where
        H: BindingHandler<E> + 'static,
    {
        let (binding, first) = self.mount(handler, element, accessor);
        first.map(|()| binding)
    }

    /// Like [`BindingHost::apply`], but the handle is returned whatever the
    /// outcome of the first update. The observables that update read are
    /// subscribed either way, and [`Binding::refresh`] retries it.
    pub fn mount<H>(
        &self,
        handler: Rc<H>,
        element: &Rc<E>,
        accessor: impl Fn() -> Value + 'static,
    ) -> (Binding<E, H>, Result<(), H::Error>)
    where
        H: BindingHandler<E> + 'static,
    {
        handler.init(element, &self.disposal);

        let core = Rc::new(BindingCore {
            element: Rc::downgrade(element),
            element_key: key_of(element),
            handler,
            accessor: Box::new(accessor),
            subscriptions: RefCell::new(Vec::new()),
            dependency_count: Cell::new(0),
            runs: Cell::new(0),
            running: Cell::new(false),
            active: Cell::new(true),
            last_error: RefCell::new(None),
        });
        let keep_alive = Rc::clone(&core);
        self.disposal
            .add_dispose_callback(element, move |_| keep_alive.stop());

        let first = core.run();
        (Binding { core }, first)
    }

    /// Fire the disposal callbacks of `element`. Returns how many ran.
    pub fn dispose(&self, element: &Rc<E>) -> usize {
        self.disposal.dispose_node(element)
    }
}
