#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the binder.
//!
//! Wraps [`crate::binder_core::BinderCore`] with JS-facing types. Only
//! compiled on `wasm32` targets.

use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;
use webcomp::{BindError, BindingConfig};

use crate::binder_core::BinderCore;
use crate::element::{JsError, WebComponent};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("panic at {}:{}:{}: {info}", loc.file(), loc.line(), loc.column()),
                None => format!("panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

/// DOM failures rethrow the original JS value; everything else becomes a
/// string message.
fn to_js_error(err: BindError<JsError>) -> JsValue {
    let message = err.to_string();
    match err.into_dom() {
        Some(JsError(value)) => value,
        None => JsValue::from_str(&message),
    }
}

/// Binds parameter objects to custom elements.
///
/// ```js
/// const binder = new WebcompBinder();
/// binder.bind(el, { label: "Save", onClick: save });
/// binder.update(el, { label: "Saving", onClick: save });
/// binder.dispose(el);
/// ```
#[wasm_bindgen]
pub struct WebcompBinder {
    inner: BinderCore<WebComponent>,
}

impl Default for WebcompBinder {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WebcompBinder {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        install_panic_hook();
        Self {
            inner: BinderCore::new(BindingConfig::new()),
        }
    }

    /// Attach to `element` and apply `params`. Binding an element twice
    /// updates it.
    pub fn bind(&mut self, element: Element, params: JsValue) -> Result<(), JsValue> {
        let component = match self.lookup(&element) {
            Some(component) => component,
            None => Rc::new(WebComponent::new(element)),
        };
        let value = component.convert_params(&params).map_err(|JsError(err)| err)?;
        self.inner.bind(component, value).map_err(to_js_error)
    }

    /// Apply a new parameter object to a bound element.
    pub fn update(&mut self, element: Element, params: JsValue) -> Result<(), JsValue> {
        let Some(component) = self.lookup(&element) else {
            return Err(to_js_error(BindError::NotAttached));
        };
        let value = component.convert_params(&params).map_err(|JsError(err)| err)?;
        self.inner.update(&component, value).map_err(to_js_error)
    }

    /// Detach every listener the binder added to `element` and forget it.
    /// Returns `false` if the element was not bound.
    pub fn dispose(&mut self, element: Element) -> bool {
        match self.lookup(&element) {
            Some(component) => self.inner.dispose(&component),
            None => false,
        }
    }

    /// Number of listeners currently attached to `element` by the binder.
    #[wasm_bindgen(js_name = listenerCount)]
    pub fn listener_count(&self, element: Element) -> u32 {
        self.lookup(&element)
            .and_then(|component| self.inner.binding().listener_count(&component))
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
    }

    #[wasm_bindgen(getter, js_name = boundCount)]
    pub fn bound_count(&self) -> u32 {
        u32::try_from(self.inner.mounted_count()).unwrap_or(u32::MAX)
    }

    fn lookup(&self, element: &Element) -> Option<Rc<WebComponent>> {
        self.inner.find(|component| component.element() == element)
    }
}
