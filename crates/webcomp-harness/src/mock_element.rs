#![forbid(unsafe_code)]

//! In-memory custom element that records every DOM mutation.
//!
//! [`MockElement`] implements [`ComponentElement`] with DOM listener
//! semantics: adding the same `(event, listener)` pair twice keeps one
//! registration, removing an unknown pair is a no-op. Every call is appended
//! to an operation log, so tests can assert on exactly which mutations a
//! pass issued, in order.
//!
//! Properties and events can be marked as rejected to simulate a platform
//! setter that throws.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use webcomp_runtime::{Callback, ComponentElement, Event, Value};

/// One recorded call against the element.
#[derive(Debug, Clone, PartialEq)]
pub enum DomOp {
    SetProperty { name: String, value: Value },
    AddListener { event: String, listener: Callback },
    RemoveListener { event: String, listener: Callback },
}

impl DomOp {
    #[must_use]
    pub fn set(name: &str, value: impl Into<Value>) -> Self {
        Self::SetProperty {
            name: name.to_owned(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn add(event: &str, listener: &Callback) -> Self {
        Self::AddListener {
            event: event.to_owned(),
            listener: listener.clone(),
        }
    }

    #[must_use]
    pub fn remove(event: &str, listener: &Callback) -> Self {
        Self::RemoveListener {
            event: event.to_owned(),
            listener: listener.clone(),
        }
    }
}

/// Failure raised by a rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockDomError {
    /// The property setter threw.
    RejectedProperty(String),
    /// `addEventListener` or `removeEventListener` threw.
    RejectedListener(String),
}

impl fmt::Display for MockDomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RejectedProperty(name) => write!(f, "property '{name}' rejected"),
            Self::RejectedListener(event) => write!(f, "listener for '{event}' rejected"),
        }
    }
}

impl std::error::Error for MockDomError {}

/// Recording DOM double for a custom element.
#[derive(Default)]
pub struct MockElement {
    tag: String,
    properties: RefCell<IndexMap<String, Value>>,
    listeners: RefCell<Vec<(String, Callback)>>,
    ops: RefCell<Vec<DomOp>>,
    rejected_properties: RefCell<HashSet<String>>,
    rejected_events: RefCell<HashSet<String>>,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElement")
            .field("tag", &self.tag)
            .field("properties", &self.properties.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .field("ops", &self.ops.borrow().len())
            .finish()
    }
}

impl MockElement {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Last value assigned to `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.borrow().get(name).cloned()
    }

    /// How many times the setter for `name` was called successfully.
    #[must_use]
    pub fn set_count(&self, name: &str) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, DomOp::SetProperty { name: n, .. } if n == name))
            .count()
    }

    /// Listeners currently attached for `event`, in attach order.
    #[must_use]
    pub fn listeners_for(&self, event: &str) -> Vec<Callback> {
        self.listeners
            .borrow()
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, l)| l.clone())
            .collect()
    }

    /// Total number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Event types with at least one listener, in first-attach order.
    #[must_use]
    pub fn listened_events(&self) -> Vec<String> {
        let mut events: Vec<String> = Vec::new();
        for (event, _) in self.listeners.borrow().iter() {
            if !events.contains(event) {
                events.push(event.clone());
            }
        }
        events
    }

    #[must_use]
    pub fn ops(&self) -> Vec<DomOp> {
        self.ops.borrow().clone()
    }

    /// Drain the operation log.
    pub fn take_ops(&self) -> Vec<DomOp> {
        self.ops.take()
    }

    /// Make the setter for `name` fail until [`MockElement::accept_property`].
    pub fn reject_property(&self, name: &str) {
        self.rejected_properties.borrow_mut().insert(name.to_owned());
    }

    pub fn accept_property(&self, name: &str) {
        self.rejected_properties.borrow_mut().remove(name);
    }

    /// Make listener calls for `event` fail until
    /// [`MockElement::accept_listener`].
    pub fn reject_listener(&self, event: &str) {
        self.rejected_events.borrow_mut().insert(event.to_owned());
    }

    pub fn accept_listener(&self, event: &str) {
        self.rejected_events.borrow_mut().remove(event);
    }

    /// Deliver `event` to every listener attached for its kind. Returns the
    /// number of listeners invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        let targets = self.listeners_for(event.kind());
        for listener in &targets {
            listener.call(event);
        }
        targets.len()
    }

    fn check_listener(&self, event: &str) -> Result<(), MockDomError> {
        if self.rejected_events.borrow().contains(event) {
            return Err(MockDomError::RejectedListener(event.to_owned()));
        }
        Ok(())
    }
}

impl ComponentElement for MockElement {
    type Error = MockDomError;

    fn set_property(&self, name: &str, value: &Value) -> Result<(), MockDomError> {
        if self.rejected_properties.borrow().contains(name) {
            return Err(MockDomError::RejectedProperty(name.to_owned()));
        }
        self.properties
            .borrow_mut()
            .insert(name.to_owned(), value.clone());
        self.ops.borrow_mut().push(DomOp::set(name, value.clone()));
        Ok(())
    }

    fn add_event_listener(&self, event: &str, listener: &Callback) -> Result<(), MockDomError> {
        self.check_listener(event)?;
        self.ops.borrow_mut().push(DomOp::add(event, listener));
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|(e, l)| e == event && l == listener) {
            listeners.push((event.to_owned(), listener.clone()));
        }
        Ok(())
    }

    fn remove_event_listener(&self, event: &str, listener: &Callback) -> Result<(), MockDomError> {
        self.check_listener(event)?;
        self.ops.borrow_mut().push(DomOp::remove(event, listener));
        self.listeners
            .borrow_mut()
            .retain(|(e, l)| !(e == event && l == listener));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallRecorder;
    use pretty_assertions::assert_eq;

    #[test]
    fn duplicate_add_keeps_one_registration() {
        let el = MockElement::new("x-widget");
        let rec = CallRecorder::new();
        el.add_event_listener("click", &rec.callback()).unwrap();
        el.add_event_listener("click", &rec.callback()).unwrap();
        assert_eq!(el.listener_count(), 1);
        assert_eq!(el.dispatch(&Event::new("click")), 1);
        assert_eq!(rec.count(), 1);
    }

    #[test]
    fn remove_unknown_is_noop_but_logged() {
        let el = MockElement::new("x-widget");
        let cb = Callback::new(|_| {});
        el.remove_event_listener("click", &cb).unwrap();
        assert_eq!(el.ops(), vec![DomOp::remove("click", &cb)]);
        assert_eq!(el.listener_count(), 0);
    }

    #[test]
    fn rejected_property_leaves_state_untouched() {
        let el = MockElement::new("x-widget");
        el.reject_property("label");
        assert_eq!(
            el.set_property("label", &Value::from("a")),
            Err(MockDomError::RejectedProperty("label".into()))
        );
        assert_eq!(el.property("label"), None);
        assert_eq!(el.set_count("label"), 0);

        el.accept_property("label");
        el.set_property("label", &Value::from("a")).unwrap();
        assert_eq!(el.property("label"), Some(Value::from("a")));
    }

    #[test]
    fn rejected_listener_fails_both_directions() {
        let el = MockElement::new("x-widget");
        let cb = Callback::new(|_| {});
        el.add_event_listener("load", &cb).unwrap();
        el.reject_listener("load");
        assert!(el.remove_event_listener("load", &cb).is_err());
        assert_eq!(el.listeners_for("load"), vec![cb]);
    }

    #[test]
    fn take_ops_drains_log() {
        let el = MockElement::new("x-widget");
        el.set_property("a", &Value::Null).unwrap();
        assert_eq!(el.take_ops(), vec![DomOp::set("a", Value::Null)]);
        assert!(el.ops().is_empty());
        assert_eq!(el.tag(), "x-widget");
    }
}
