#![forbid(unsafe_code)]

//! The `webcomp` binding handler.
//!
//! [`WebcompBinding`] owns one [`ListenerRegistry`] per attached element,
//! kept in a [`WeakKeyTable`] so the element's own namespace is untouched
//! and a dropped element cannot be kept alive by its bookkeeping.
//!
//! # Lifecycle
//!
//! | Step | Entry point | Effect |
//! |------|-------------|--------|
//! | attach | [`WebcompBinding::attach`] / `BindingHandler::init` | Empty registry; teardown registered with the host's disposal |
//! | update | [`WebcompBinding::update_params`] / `BindingHandler::update` | [`reconcile`] against the registry |
//! | dispose | host disposal, or [`WebcompBinding::teardown`] | Every listener detached; registry released |
//!
//! Updating an element with no registry is a lifecycle violation. It is
//! logged at `warn` and returned as [`BindError::NotAttached`], or panics
//! when [`BindingConfig::strict_lifecycle`] is set.
//!
//! Each registry sits in its own cell. A pass borrows that cell and never the
//! table, so the element's setters may query the binding, and a setter that
//! unwinds leaves the registry attached and still mirroring the element.
//! An update issued from inside a pass on the same element is skipped.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, debug_span, warn};
use webcomp_runtime::{
    BindingHandler, Callback, ComponentElement, DisposalRegistry, Value, WeakKeyTable, key_of,
};

use crate::config::BindingConfig;
use crate::error::BindError;
use crate::reconcile::{ReconcileReport, Teardown, reconcile, teardown};
use crate::registry::ListenerRegistry;

type SharedRegistry = Rc<RefCell<ListenerRegistry>>;
type RegistryTable<E> = Rc<RefCell<WeakKeyTable<E, SharedRegistry>>>;

/// Binding handler routing parameters to properties and listeners.
pub struct WebcompBinding<E: ?Sized> {
    registries: RegistryTable<E>,
    config: BindingConfig,
}

impl<E: ?Sized> std::fmt::Debug for WebcompBinding<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebcompBinding")
            .field("config", &self.config)
            .field("registries", &self.registries.borrow().len())
            .finish()
    }
}

impl<E: ComponentElement + ?Sized + 'static> Default for WebcompBinding<E> {
    fn default() -> Self {
        Self::with_config(BindingConfig::default())
    }
}

impl<E: ComponentElement + ?Sized + 'static> WebcompBinding<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: BindingConfig) -> Self {
        Self {
            registries: Rc::new(RefCell::new(WeakKeyTable::new())),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Create the element's registry and register its teardown with
    /// `disposal`. Attaching an already attached element changes nothing.
    pub fn attach(&self, element: &Rc<E>, disposal: &DisposalRegistry<E>) {
        let key = key_of(element);
        if self.registries.borrow().contains(element) {
            debug!(binding = %self.config.binding_name(), element = key, "already attached");
            return;
        }
        self.registries
            .borrow_mut()
            .insert(element, Rc::new(RefCell::new(ListenerRegistry::new())));

        let registries = Rc::clone(&self.registries);
        disposal.add_dispose_callback(element, move |node| {
            release(&registries, node);
        });
        debug!(binding = %self.config.binding_name(), element = key, "attached");
    }

    /// Converge `element` to `params`.
    pub fn update_params(
        &self,
        element: &Rc<E>,
        params: &Value,
    ) -> Result<ReconcileReport, BindError<E::Error>> {
        let key = key_of(element);
        let _span = debug_span!(
            "webcomp.update",
            binding = %self.config.binding_name(),
            element = key
        )
        .entered();

        let shared = self.registries.borrow().get(element).cloned();
        let Some(shared) = shared else {
            return Err(self.lifecycle_violation(key));
        };
        let Ok(mut registry) = shared.try_borrow_mut() else {
            warn!(element = key, "update issued during a pass on the same element; skipped");
            return Ok(ReconcileReport::default());
        };
        let result = reconcile(&**element, &mut registry, params);
        drop(registry);

        match &result {
            Ok(report) => debug!(?report, "update complete"),
            Err(err) => debug!(error = %err, "update aborted"),
        }
        result
    }

    /// Detach every listener and release the element's registry. Safe to
    /// call on an element that is not attached.
    pub fn teardown(&self, element: &Rc<E>) -> Teardown<E::Error> {
        release(&self.registries, element)
    }

    #[must_use]
    pub fn is_attached(&self, element: &Rc<E>) -> bool {
        self.registries.borrow().contains(element)
    }

    /// Number of listeners attached through this binding, if attached.
    #[must_use]
    pub fn listener_count(&self, element: &Rc<E>) -> Option<usize> {
        self.registries
            .borrow()
            .get(element)
            .and_then(|reg| reg.try_borrow().ok().map(|reg| reg.len()))
    }

    /// The listener currently attached for `event`.
    #[must_use]
    pub fn listener(&self, element: &Rc<E>, event: &str) -> Option<Callback> {
        self.registries
            .borrow()
            .get(element)
            .and_then(|reg| reg.try_borrow().ok()?.get(event).cloned())
    }

    /// Number of attached elements that are still alive. Associations of
    /// elements dropped without disposal are pruned.
    pub fn attached_count(&self) -> usize {
        let mut table = self.registries.borrow_mut();
        table.prune();
        table.len()
    }

    fn lifecycle_violation(&self, key: usize) -> BindError<E::Error> {
        warn!(
            binding = %self.config.binding_name(),
            element = key,
            "update on an element that is not attached"
        );
        assert!(
            !self.config.strict_lifecycle(),
            "{}: update on element {key:#x} before attach or after disposal",
            self.config.binding_name()
        );
        BindError::NotAttached
    }
}

fn release<E>(
    registries: &RefCell<WeakKeyTable<E, SharedRegistry>>,
    element: &Rc<E>,
) -> Teardown<E::Error>
where
    E: ComponentElement + ?Sized,
{
    let taken = registries.borrow_mut().remove(element);
    let Some(shared) = taken else {
        return Teardown {
            removed: 0,
            error: None,
        };
    };
    let Ok(mut registry) = shared.try_borrow_mut() else {
        warn!(
            element = key_of(element),
            "disposed during a pass on the same element; listeners left attached"
        );
        return Teardown {
            removed: 0,
            error: None,
        };
    };
    let outcome = teardown(&**element, &mut registry);
    debug!(
        element = key_of(element),
        removed = outcome.removed,
        failed = outcome.error.is_some(),
        "registry released"
    );
    outcome
}

impl<E: ComponentElement + ?Sized + 'static> BindingHandler<E> for WebcompBinding<E> {
    type Error = BindError<E::Error>;

    fn init(&self, element: &Rc<E>, disposal: &DisposalRegistry<E>) {
        self.attach(element, disposal);
    }

    fn update(&self, element: &Rc<E>, accessor: &dyn Fn() -> Value) -> Result<(), Self::Error> {
        self.update_params(element, &accessor()).map(|_| ())
    }
}
