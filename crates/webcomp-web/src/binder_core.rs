#![forbid(unsafe_code)]

//! Platform-independent bookkeeping behind the JS binder.
//!
//! [`BinderCore`] applies one shared [`WebcompBinding`] to any number of
//! elements through a [`BindingHost`]. Each mounted element keeps its
//! latest parameter set in a cell read by the binding's accessor, so an
//! explicit update is "replace the cell, then refresh", and observables
//! nested in the parameters keep re-running the binding on their own.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | First pass fails | Element rejects a mutation during `bind` | Element stays mounted; error returned; next `update` retries through the same tracked binding |
//! | Update unknown element | `update` before `bind` or after `dispose` | `BindError::NotAttached` |
//! | Dispose unknown element | Not mounted | Returns `false`, nothing else happens |

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use webcomp::{BindError, BindingConfig, WebcompBinding};
use webcomp_runtime::{Binding, BindingHost, ComponentElement, Value};

type Handle<E> = Binding<E, WebcompBinding<E>>;

struct Mounted<E: ComponentElement + 'static> {
    element: Rc<E>,
    params: Rc<RefCell<Value>>,
    handle: Handle<E>,
}

/// Mounted elements plus the binding applied to them.
pub struct BinderCore<E: ComponentElement + 'static> {
    host: BindingHost<E>,
    binding: Rc<WebcompBinding<E>>,
    mounted: Vec<Mounted<E>>,
}

impl<E: ComponentElement + 'static> Default for BinderCore<E> {
    fn default() -> Self {
        Self::new(BindingConfig::default())
    }
}

impl<E: ComponentElement + 'static> BinderCore<E> {
    #[must_use]
    pub fn new(config: BindingConfig) -> Self {
        Self {
            host: BindingHost::new(),
            binding: Rc::new(WebcompBinding::with_config(config)),
            mounted: Vec::new(),
        }
    }

    #[must_use]
    pub fn binding(&self) -> &WebcompBinding<E> {
        &self.binding
    }

    /// The mounted element matching `pred`.
    pub fn find(&self, pred: impl Fn(&E) -> bool) -> Option<Rc<E>> {
        self.mounted
            .iter()
            .find(|m| pred(&m.element))
            .map(|m| Rc::clone(&m.element))
    }

    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Apply the binding to `element` and run the first pass. Binding an
    /// element that is already mounted is an update.
    pub fn bind(&mut self, element: Rc<E>, params: Value) -> Result<(), BindError<E::Error>> {
        if self.position(&element).is_some() {
            return self.update(&element, params);
        }
        let cell = Rc::new(RefCell::new(params));
        let source = Rc::clone(&cell);
        let (handle, result) = self
            .host
            .mount(Rc::clone(&self.binding), &element, move || {
                source.borrow().clone()
            });
        debug!(mounted = self.mounted.len() + 1, ok = result.is_ok(), "element bound");
        self.mounted.push(Mounted {
            element,
            params: cell,
            handle,
        });
        result
    }

    /// Replace the parameters of a mounted element and run a tracked pass.
    pub fn update(&mut self, element: &Rc<E>, params: Value) -> Result<(), BindError<E::Error>> {
        let Some(index) = self.position(element) else {
            return self.binding.update_params(element, &params).map(|_| ());
        };
        let mounted = &self.mounted[index];
        mounted.params.replace(params);
        mounted.handle.refresh()
    }

    /// Dispose `element`: listeners are detached and reactive updates stop.
    pub fn dispose(&mut self, element: &Rc<E>) -> bool {
        let Some(index) = self.position(element) else {
            return false;
        };
        let mounted = self.mounted.swap_remove(index);
        let callbacks = self.host.dispose(&mounted.element);
        debug!(callbacks, mounted = self.mounted.len(), "element disposed");
        true
    }

    /// Take the error of the most recent failed reactive re-run on `element`.
    pub fn take_last_error(&self, element: &Rc<E>) -> Option<BindError<E::Error>> {
        let index = self.position(element)?;
        self.mounted[index].handle.take_last_error()
    }

    fn position(&self, element: &Rc<E>) -> Option<usize> {
        self.mounted
            .iter()
            .position(|m| Rc::ptr_eq(&m.element, element))
    }
}
