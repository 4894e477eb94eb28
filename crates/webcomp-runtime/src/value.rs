#![forbid(unsafe_code)]

//! Dynamic values passed through bindings.
//!
//! A [`Value`] is either plain data, a [`Callback`], or an
//! [`Observable<Value>`] that must be resolved before use. Resolution is the
//! single place where observables are unwrapped: [`Value::resolve`] performs
//! a deep unwrap (observables nested in arrays and objects are resolved too),
//! [`Value::unwrap_shallow`] unwraps one level.
//!
//! # Equality
//!
//! | Variant | Compared by |
//! |---------|-------------|
//! | plain data | value (`Number` uses `f64` equality, so `NaN != NaN`) |
//! | `Function` | callback identity |
//! | `Observable` | shared-cell identity |

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::reactive::Observable;

/// Ordered name → value mapping. Iteration follows insertion order.
pub type Params = IndexMap<String, Value>;

/// An event delivered to a [`Callback`].
#[derive(Clone)]
pub struct Event {
    kind: String,
    detail: Value,
    native: Option<Rc<dyn Any>>,
}

impl Event {
    /// Create an event of type `kind` with no detail.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            detail: Value::Undefined,
            native: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Attach the platform event object this event was built from.
    #[must_use]
    pub fn with_native(mut self, native: Rc<dyn Any>) -> Self {
        self.native = Some(native);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn detail(&self) -> &Value {
        &self.detail
    }

    /// Downcast the attached platform event, if any.
    #[must_use]
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.as_deref().and_then(|n| n.downcast_ref::<T>())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("has_native", &self.native.is_some())
            .finish()
    }
}

/// A shared listener function. Clones refer to the same function; equality
/// is reference identity, never behavior.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Event)>);

impl Callback {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Address of the shared function, stable for the callback's lifetime.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Callback {}

impl std::hash::Hash for Callback {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:#x})", self.id())
    }
}

/// A dynamically typed binding value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Params),
    Function(Callback),
    Observable(Observable<Value>),
}

impl Value {
    /// Build an `Object` from `(name, value)` pairs, keeping their order.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wrap `value` in a fresh observable.
    #[must_use]
    pub fn observable(value: Value) -> Self {
        Self::Observable(Observable::new(value))
    }

    /// Short type label used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
            Self::Observable(_) => "observable",
        }
    }

    #[must_use]
    pub fn is_observable(&self) -> bool {
        matches!(self, Self::Observable(_))
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Function(cb) => Some(cb),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Params> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Unwrap one level of observable. Nested observables are left alone.
    #[must_use]
    pub fn unwrap_shallow(&self) -> Value {
        match self {
            Self::Observable(obs) => obs.get(),
            other => other.clone(),
        }
    }

    /// Produce a plain snapshot: every observable reachable from `self` is
    /// replaced by its current (recursively resolved) value.
    ///
    /// Reads are recorded as dependencies when a tracking frame is active.
    /// An observable that contains itself resolves to `Undefined` at the
    /// point of the cycle.
    #[must_use]
    pub fn resolve(&self) -> Value {
        let mut path = HashSet::new();
        self.resolve_inner(&mut path)
    }

    fn resolve_inner(&self, path: &mut HashSet<usize>) -> Value {
        match self {
            Self::Observable(obs) => {
                if !path.insert(obs.id()) {
                    tracing::warn!(observable = obs.id(), "observable cycle while resolving");
                    return Value::Undefined;
                }
                let resolved = obs.get().resolve_inner(path);
                path.remove(&obs.id());
                resolved
            }
            Self::Array(items) => Self::Array(items.iter().map(|v| v.resolve_inner(path)).collect()),
            Self::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.resolve_inner(path)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Callback> for Value {
    fn from(v: Callback) -> Self {
        Self::Function(v)
    }
}

impl From<Observable<Value>> for Value {
    fn from(v: Observable<Value>) -> Self {
        Self::Observable(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Params> for Value {
    fn from(v: Params) -> Self {
        Self::Object(v)
    }
}
