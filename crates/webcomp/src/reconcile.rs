#![forbid(unsafe_code)]

//! Convergence of an element to a parameter set.
//!
//! # Algorithm
//!
//! 1. Resolve the parameter set once (observables become plain snapshots).
//! 2. **Prune**: every registered event that the new set would not bind
//!    (name with the `on` prefix *and* a function value) is detached and
//!    forgotten.
//! 3. **Assign**, in parameter order:
//!    - event binding: attach when the registered listener is absent or a
//!      different reference, otherwise leave it alone;
//!    - anything else: assign the property, every pass.
//!
//! Pruning always finishes before assignment begins.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Setter throws | Element rejects a property | Pass aborts with `BindError::Dom`; earlier mutations stay |
//! | Remove throws | Element rejects a detach | Pass aborts; the entry stays (listener still attached) |
//! | Add throws | Element rejects an attach | Pass aborts; no entry (nothing attached) |
//! | Non-object params | Resolved set is not an object | `BindError::InvalidParams` before any mutation |
//!
//! The registry stays an exact mirror of the element after every failure,
//! so the next pass converges from wherever this one stopped.

use std::collections::HashSet;

use tracing::{debug, trace};
use webcomp_runtime::{Callback, ComponentElement, Params, Value};

use crate::error::BindError;
use crate::event_name::{event_name, is_event_binding};
use crate::registry::ListenerRegistry;

/// Mutations issued by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub properties_set: usize,
    pub listeners_added: usize,
    /// Listeners detached, by pruning or by replacement.
    pub listeners_removed: usize,
    pub listeners_unchanged: usize,
}

impl ReconcileReport {
    /// True when the pass attached or detached nothing.
    #[must_use]
    pub fn listeners_stable(&self) -> bool {
        self.listeners_added == 0 && self.listeners_removed == 0
    }
}

/// Result of tearing down a registry.
#[derive(Debug)]
pub struct Teardown<E> {
    /// Listeners successfully detached.
    pub removed: usize,
    /// First detach failure; later entries were still attempted.
    pub error: Option<E>,
}

/// Converge `element` and `registry` to `params`.
pub fn reconcile<E>(
    element: &E,
    registry: &mut ListenerRegistry,
    params: &Value,
) -> Result<ReconcileReport, BindError<E::Error>>
where
    E: ComponentElement + ?Sized,
{
    let resolved = params.resolve();
    let empty = Params::new();
    let params = match &resolved {
        Value::Object(map) => map,
        Value::Undefined | Value::Null => &empty,
        other => {
            return Err(BindError::InvalidParams {
                found: other.type_name(),
            });
        }
    };

    let mut report = ReconcileReport::default();

    let wanted: HashSet<String> = params
        .iter()
        .filter(|(name, value)| is_event_binding(name, value))
        .map(|(name, _)| event_name(name).into_owned())
        .collect();
    let stale: Vec<String> = registry
        .events()
        .filter(|event| !wanted.contains(*event))
        .map(str::to_owned)
        .collect();
    for event in &stale {
        detach(element, registry, event)?;
        report.listeners_removed += 1;
    }

    for (name, value) in params {
        match value {
            Value::Function(listener) if is_event_binding(name, value) => {
                let event = event_name(name);
                bind_listener(element, registry, &event, listener, &mut report)?;
            }
            _ => {
                element.set_property(name, value)?;
                trace!(property = %name, kind = value.type_name(), "property assigned");
                report.properties_set += 1;
            }
        }
    }

    Ok(report)
}

/// Detach every registered listener and empty the registry.
///
/// A failed detach is logged and recorded; the remaining entries are still
/// attempted and the registry always ends up empty.
pub fn teardown<E>(element: &E, registry: &mut ListenerRegistry) -> Teardown<E::Error>
where
    E: ComponentElement + ?Sized,
{
    let mut outcome = Teardown {
        removed: 0,
        error: None,
    };
    let entries = std::mem::take(registry);
    for (event, listener) in entries.iter() {
        match element.remove_event_listener(event, listener) {
            Ok(()) => {
                debug!(event, listener = ?listener, "listener removed on teardown");
                outcome.removed += 1;
            }
            Err(err) => {
                tracing::warn!(event, error = %err, "listener removal failed during teardown");
                if outcome.error.is_none() {
                    outcome.error = Some(err);
                }
            }
        }
    }
    outcome
}

fn bind_listener<E>(
    element: &E,
    registry: &mut ListenerRegistry,
    event: &str,
    listener: &Callback,
    report: &mut ReconcileReport,
) -> Result<(), E::Error>
where
    E: ComponentElement + ?Sized,
{
    if registry.get(event) == Some(listener) {
        report.listeners_unchanged += 1;
        return Ok(());
    }
    if registry.contains(event) {
        detach(element, registry, event)?;
        report.listeners_removed += 1;
    }
    element.add_event_listener(event, listener)?;
    registry.insert(event, listener.clone());
    debug!(event, listener = ?listener, "listener added");
    report.listeners_added += 1;
    Ok(())
}

fn detach<E>(element: &E, registry: &mut ListenerRegistry, event: &str) -> Result<(), E::Error>
where
    E: ComponentElement + ?Sized,
{
    if let Some(listener) = registry.get(event).cloned() {
        element.remove_event_listener(event, &listener)?;
        registry.remove(event);
        debug!(event, listener = ?listener, "listener removed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use webcomp_harness::{DomOp, MockDomError, MockElement};
    use webcomp_runtime::Observable;

    fn f() -> Callback {
        Callback::new(|_| {})
    }

    #[test]
    fn first_pass_assigns_and_attaches_in_order() {
        let el = MockElement::new("x-card");
        let click = f();
        let mut reg = ListenerRegistry::new();
        let params = Value::object([
            ("title", Value::from("Hi")),
            ("onClick", Value::from(click.clone())),
            ("count", Value::from(2)),
        ]);
        let report = reconcile(&el, &mut reg, &params).unwrap();
        assert_eq!(
            el.ops(),
            vec![
                DomOp::set("title", "Hi"),
                DomOp::add("click", &click),
                DomOp::set("count", 2),
            ]
        );
        assert_eq!(
            report,
            ReconcileReport {
                properties_set: 2,
                listeners_added: 1,
                listeners_removed: 0,
                listeners_unchanged: 0,
            }
        );
        assert_eq!(reg.get("click"), Some(&click));
    }

    #[test]
    fn prune_runs_before_any_assignment() {
        let el = MockElement::new("x-card");
        let (old, new) = (f(), f());
        let mut reg = ListenerRegistry::new();
        reconcile(&el, &mut reg, &Value::object([("onLoad", Value::from(old.clone()))])).unwrap();
        el.take_ops();

        let params = Value::object([
            ("label", Value::from("x")),
            ("onChange", Value::from(new.clone())),
        ]);
        reconcile(&el, &mut reg, &params).unwrap();
        assert_eq!(
            el.take_ops(),
            vec![
                DomOp::remove("load", &old),
                DomOp::set("label", "x"),
                DomOp::add("change", &new),
            ]
        );
    }

    #[test]
    fn non_function_on_name_is_a_property_and_prunes() {
        let el = MockElement::new("x-card");
        let handler = f();
        let mut reg = ListenerRegistry::new();
        reconcile(&el, &mut reg, &Value::object([("onClick", Value::from(handler.clone()))]))
            .unwrap();
        el.take_ops();

        reconcile(&el, &mut reg, &Value::object([("onClick", Value::from("noop"))])).unwrap();
        assert_eq!(
            el.take_ops(),
            vec![
                DomOp::remove("click", &handler),
                DomOp::set("onClick", "noop"),
            ]
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn function_without_prefix_is_a_property() {
        let el = MockElement::new("x-card");
        let renderer = f();
        let mut reg = ListenerRegistry::new();
        reconcile(&el, &mut reg, &Value::object([("renderer", Value::from(renderer.clone()))]))
            .unwrap();
        assert_eq!(el.property("renderer"), Some(Value::Function(renderer)));
        assert!(reg.is_empty());
    }

    #[test]
    fn observable_params_resolve_before_classification() {
        let el = MockElement::new("x-card");
        let handler = f();
        let mut reg = ListenerRegistry::new();
        let wrapped_fn = Observable::new(Value::from(handler.clone()));
        let wrapped_text = Observable::new(Value::from("plain"));
        let params = Value::observable(Value::object([
            ("onPick", Value::Observable(wrapped_fn)),
            ("onText", Value::Observable(wrapped_text)),
        ]));
        reconcile(&el, &mut reg, &params).unwrap();
        assert_eq!(el.listeners_for("pick"), vec![handler]);
        assert_eq!(el.property("onText"), Some(Value::from("plain")));
    }

    #[test]
    fn nullish_params_prune_everything() {
        let el = MockElement::new("x-card");
        let handler = f();
        let mut reg = ListenerRegistry::new();
        reconcile(&el, &mut reg, &Value::object([("onClick", Value::from(handler))])).unwrap();
        let report = reconcile(&el, &mut reg, &Value::Null).unwrap();
        assert_eq!(report.listeners_removed, 1);
        assert!(reg.is_empty());
        assert_eq!(el.listener_count(), 0);
    }

    #[test]
    fn scalar_params_are_rejected_without_mutation() {
        let el = MockElement::new("x-card");
        let mut reg = ListenerRegistry::new();
        let err = reconcile(&el, &mut reg, &Value::from("oops")).unwrap_err();
        assert_eq!(err, BindError::InvalidParams { found: "string" });
        assert!(el.ops().is_empty());
    }

    #[test]
    fn failed_add_leaves_no_entry() {
        let el = MockElement::new("x-card");
        let mut reg = ListenerRegistry::new();
        el.reject_listener("click");
        let err = reconcile(&el, &mut reg, &Value::object([("onClick", Value::from(f()))]))
            .unwrap_err();
        assert!(matches!(err, BindError::Dom(MockDomError::RejectedListener(_))));
        assert!(reg.is_empty());
        assert_eq!(el.listener_count(), 0);
    }

    #[test]
    fn rejected_replacement_keeps_old_listener() {
        let el = MockElement::new("x-card");
        let (old, new) = (f(), f());
        let mut reg = ListenerRegistry::new();
        reconcile(&el, &mut reg, &Value::object([("onClick", Value::from(old.clone()))])).unwrap();

        el.reject_listener("click");
        let err = reconcile(&el, &mut reg, &Value::object([("onClick", Value::from(new))]))
            .unwrap_err();
        assert_eq!(err, BindError::Dom(MockDomError::RejectedListener("click".into())));
        // Remove was rejected first, so the old listener is still attached
        // and still recorded.
        assert_eq!(reg.get("click"), Some(&old));
        assert_eq!(el.listeners_for("click"), vec![old]);
    }

    #[test]
    fn teardown_continues_past_failures() {
        let el = MockElement::new("x-card");
        let (a, b) = (f(), f());
        let mut reg = ListenerRegistry::new();
        let params = Value::object([
            ("onA", Value::from(a)),
            ("onB", Value::from(b.clone())),
        ]);
        reconcile(&el, &mut reg, &params).unwrap();

        el.reject_listener("a");
        let outcome = teardown(&el, &mut reg);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.error, Some(MockDomError::RejectedListener("a".into())));
        assert!(reg.is_empty());
        assert!(el.listeners_for("b").is_empty());
    }

    #[test]
    fn teardown_of_empty_registry_is_noop() {
        let el = MockElement::new("x-card");
        let mut reg = ListenerRegistry::new();
        let outcome = teardown(&el, &mut reg);
        assert_eq!(outcome.removed, 0);
        assert!(outcome.error.is_none());
        assert!(el.ops().is_empty());
    }
}
