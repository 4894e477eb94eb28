#![forbid(unsafe_code)]

//! The DOM surface a binding writes to.
//!
//! [`ComponentElement`] is the small imperative interface of a custom
//! element: property assignment and listener attach/detach. Methods take
//! `&self`; implementations own their interior mutability, the same way a
//! DOM node is mutated through a shared handle.
//!
//! Errors are the element's own type and are never translated by callers.

use crate::value::{Callback, Value};

pub trait ComponentElement {
    /// Failure raised by the platform for a rejected mutation.
    type Error: std::error::Error + 'static;

    /// Assign the property `name`. Called on every pass, even when the value
    /// is unchanged.
    fn set_property(&self, name: &str, value: &Value) -> Result<(), Self::Error>;

    /// Attach `listener` for events of type `event`.
    fn add_event_listener(&self, event: &str, listener: &Callback) -> Result<(), Self::Error>;

    /// Detach a listener previously attached with the same `event` and
    /// `listener`.
    fn remove_event_listener(&self, event: &str, listener: &Callback) -> Result<(), Self::Error>;
}
