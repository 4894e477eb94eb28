#![forbid(unsafe_code)]

//! [`ComponentElement`] over a live DOM element.
//!
//! Listeners are wrapped in one `Closure` per `(event, callback)` pair. The
//! closure is what the DOM sees, so removal must hand back the exact same
//! closure; dropping it afterwards frees the JS side.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, Element};
use webcomp_runtime::{Callback, ComponentElement, Event, Value};

use crate::convert::{FunctionCache, params_from_js, to_js};

/// A value thrown by the DOM.
#[derive(Clone, PartialEq)]
pub struct JsError(pub JsValue);

impl JsError {
    fn rejected(name: &str) -> Self {
        Self(JsValue::from_str(&format!("property '{name}' is not writable")))
    }
}

impl fmt::Debug for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsError({self})")
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_string() {
            Some(message) => f.write_str(&message),
            None => write!(f, "{:?}", self.0),
        }
    }
}

impl std::error::Error for JsError {}

type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// A custom element driven by the binding.
pub struct WebComponent {
    element: Element,
    listeners: RefCell<HashMap<(String, usize), Listener>>,
    functions: RefCell<FunctionCache>,
}

impl WebComponent {
    #[must_use]
    pub fn new(element: Element) -> Self {
        Self {
            element,
            listeners: RefCell::new(HashMap::new()),
            functions: RefCell::new(FunctionCache::default()),
        }
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Convert a JS parameter object for the next pass, keeping callback
    /// identity for functions that were already passed. On failure the
    /// previous pass's functions are kept.
    pub fn convert_params(&self, params: &JsValue) -> Result<Value, JsError> {
        let (value, cache) = params_from_js(params, &self.functions.borrow()).map_err(JsError)?;
        tracing::trace!(functions = cache.len(), "parameters converted");
        self.functions.replace(cache);
        Ok(value)
    }

    /// Number of DOM listeners currently registered through this wrapper.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl fmt::Debug for WebComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebComponent")
            .field("tag", &self.element.tag_name())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

fn to_event(native: web_sys::Event) -> Event {
    let mut event = Event::new(native.type_());
    if let Some(custom) = native.dyn_ref::<CustomEvent>() {
        let detail = custom.detail();
        if !detail.is_undefined() && !detail.is_null() {
            event = event.with_detail(detail_value(&detail));
        }
    }
    event.with_native(Rc::new(native))
}

fn detail_value(detail: &JsValue) -> Value {
    match params_from_js(detail, &FunctionCache::default()) {
        Ok((value, _)) => value,
        Err(err) => {
            tracing::warn!(error = ?err, "event detail not convertible");
            Value::Undefined
        }
    }
}

impl ComponentElement for WebComponent {
    type Error = JsError;

    fn set_property(&self, name: &str, value: &Value) -> Result<(), JsError> {
        let functions = self.functions.borrow();
        let js = to_js(value, Some(&*functions)).map_err(JsError);
        drop(functions);
        let js = js?;
        let written = Reflect::set(&self.element, &JsValue::from_str(name), &js).map_err(JsError)?;
        if written {
            Ok(())
        } else {
            Err(JsError::rejected(name))
        }
    }

    fn add_event_listener(&self, event: &str, listener: &Callback) -> Result<(), JsError> {
        let key = (event.to_owned(), listener.id());
        if self.listeners.borrow().contains_key(&key) {
            return Ok(());
        }
        let callback = listener.clone();
        let closure: Listener = Closure::new(move |native: web_sys::Event| {
            callback.call(&to_event(native));
        });
        self.element
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(JsError)?;
        self.listeners.borrow_mut().insert(key, closure);
        Ok(())
    }

    fn remove_event_listener(&self, event: &str, listener: &Callback) -> Result<(), JsError> {
        let key = (event.to_owned(), listener.id());
        let Some(closure) = self.listeners.borrow_mut().remove(&key) else {
            return Ok(());
        };
        let removed = self
            .element
            .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        if let Err(err) = removed {
            self.listeners.borrow_mut().insert(key, closure);
            return Err(JsError(err));
        }
        Ok(())
    }
}
