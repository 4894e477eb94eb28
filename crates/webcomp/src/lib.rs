#![forbid(unsafe_code)]

//! Observable parameter bindings for custom elements.
//!
//! # Role
//! `webcomp` is the adapter between a reactive parameter set and the
//! imperative surface of a web component. For each parameter name it
//! decides whether to assign a property or to attach a listener, and keeps
//! that decision current as the parameters change or the element is
//! disposed.
//!
//! # Naming convention
//! A parameter whose name starts with `on` and whose resolved value is a
//! function binds a listener for the event named by lower-casing the
//! character after `on` (`onCustomEvent` → `customEvent`). Every other
//! parameter, including `on…` names bound to non-functions, is assigned as
//! a property of exactly that name.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use webcomp::WebcompBinding;
//! use webcomp_harness::{CallRecorder, MockElement};
//! use webcomp_runtime::{BindingHost, Observable, Value};
//!
//! let host = BindingHost::new();
//! let element = Rc::new(MockElement::new("x-chart"));
//! let title = Observable::new(Value::from("Sales"));
//! let clicks = CallRecorder::new();
//!
//! let (t, cb) = (title.clone(), clicks.callback());
//! host.apply(Rc::new(WebcompBinding::new()), &element, move || {
//!     Value::object([
//!         ("title", Value::Observable(t.clone())),
//!         ("onClick", Value::from(cb.clone())),
//!     ])
//! })
//! .unwrap();
//!
//! title.set(Value::from("Revenue"));
//! assert_eq!(element.property("title"), Some(Value::from("Revenue")));
//! assert_eq!(element.listeners_for("click").len(), 1);
//!
//! host.dispose(&element);
//! assert_eq!(element.listener_count(), 0);
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod event_name;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod reconcile;
pub mod registry;

pub use binding::WebcompBinding;
pub use config::BindingConfig;
pub use error::BindError;
pub use event_name::{EVENT_PREFIX, event_name, is_event_binding};
pub use reconcile::{ReconcileReport, Teardown, reconcile, teardown};
pub use registry::ListenerRegistry;
