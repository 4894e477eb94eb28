#![forbid(unsafe_code)]

//! `JsValue` ⇄ [`Value`] conversion.
//!
//! JS functions become [`Callback`]s. Listener identity on the Rust side is
//! callback identity, so the same JS function must map to the same
//! `Callback` on every pass: [`FunctionCache`] remembers the mapping for the
//! functions seen in the most recent pass and is rebuilt on each one.
//!
//! A getter or setter that throws during conversion aborts it; the thrown
//! value is returned unchanged.

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use webcomp_runtime::{Callback, Event, Params, Value};

/// JS function ⇄ callback mapping for one element.
#[derive(Default)]
pub struct FunctionCache {
    entries: Vec<(Function, Callback)>,
}

impl FunctionCache {
    fn callback_for(&self, function: &Function) -> Option<Callback> {
        self.entries
            .iter()
            .find(|(f, _)| f == function)
            .map(|(_, cb)| cb.clone())
    }

    fn function_for(&self, callback: &Callback) -> Option<&Function> {
        self.entries
            .iter()
            .find(|(_, cb)| cb == callback)
            .map(|(f, _)| f)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Convert one pass worth of parameters. Functions already in `previous`
/// keep their callback; the returned cache holds only this pass's functions.
pub fn params_from_js(
    params: &JsValue,
    previous: &FunctionCache,
) -> Result<(Value, FunctionCache), JsValue> {
    let mut next = FunctionCache::default();
    let value = from_js(params, previous, &mut next, 0)?;
    Ok((value, next))
}

const MAX_DEPTH: usize = 64;

fn from_js(
    value: &JsValue,
    previous: &FunctionCache,
    next: &mut FunctionCache,
    depth: usize,
) -> Result<Value, JsValue> {
    if value.is_undefined() {
        return Ok(Value::Undefined);
    }
    if value.is_null() {
        return Ok(Value::Null);
    }
    if let Some(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Some(n) = value.as_f64() {
        return Ok(Value::Number(n));
    }
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s));
    }
    if let Some(function) = value.dyn_ref::<Function>() {
        return Ok(Value::Function(callback(function, previous, next)));
    }
    if depth >= MAX_DEPTH {
        tracing::warn!(depth, "parameter nesting too deep; value dropped");
        return Ok(Value::Undefined);
    }
    if Array::is_array(value) {
        let array: &Array = value.unchecked_ref();
        let items = array
            .iter()
            .map(|item| from_js(&item, previous, next, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Array(items));
    }
    let Some(object) = value.dyn_ref::<Object>() else {
        return Ok(Value::Undefined);
    };
    let mut map = Params::new();
    for key in Object::keys(object).iter() {
        let Some(name) = key.as_string() else {
            continue;
        };
        let item = Reflect::get(object, &key)?;
        map.insert(name, from_js(&item, previous, next, depth + 1)?);
    }
    Ok(Value::Object(map))
}

fn callback(function: &Function, previous: &FunctionCache, next: &mut FunctionCache) -> Callback {
    if let Some(cb) = next.callback_for(function) {
        return cb;
    }
    let cb = previous.callback_for(function).unwrap_or_else(|| {
        let function = function.clone();
        Callback::new(move |event: &Event| invoke(&function, event))
    });
    next.entries.push((function.clone(), cb.clone()));
    cb
}

fn invoke(function: &Function, event: &Event) {
    let arg = match event.native::<web_sys::Event>() {
        Some(native) => JsValue::from(native.clone()),
        None => match to_js(event.detail(), None) {
            Ok(detail) => detail,
            Err(err) => {
                tracing::warn!(event = event.kind(), error = ?err, "event detail not convertible");
                JsValue::UNDEFINED
            }
        },
    };
    if let Err(err) = function.call1(&JsValue::NULL, &arg) {
        tracing::warn!(event = event.kind(), error = ?err, "listener threw");
    }
}

/// Convert a value for a property write. Callbacks are mapped back to the
/// JS functions they came from; callbacks created on the Rust side have no
/// JS counterpart and become `undefined`.
pub fn to_js(value: &Value, functions: Option<&FunctionCache>) -> Result<JsValue, JsValue> {
    let js = match value {
        Value::Undefined => JsValue::UNDEFINED,
        Value::Null => JsValue::NULL,
        Value::Bool(b) => JsValue::from_bool(*b),
        Value::Number(n) => JsValue::from_f64(*n),
        Value::String(s) => JsValue::from_str(s),
        Value::Array(items) => {
            let array = Array::new();
            for item in items {
                array.push(&to_js(item, functions)?);
            }
            array.into()
        }
        Value::Object(map) => {
            let object = Object::new();
            for (name, item) in map {
                let written = Reflect::set(&object, &JsValue::from_str(name), &to_js(item, functions)?)?;
                if !written {
                    return Err(JsValue::from_str(&format!("key '{name}' is not writable")));
                }
            }
            object.into()
        }
        Value::Function(cb) => match functions.and_then(|cache| cache.function_for(cb)) {
            Some(function) => function.clone().into(),
            None => {
                tracing::warn!(callback = ?cb, "callback has no JS function");
                JsValue::UNDEFINED
            }
        },
        Value::Observable(_) => return to_js(&value.resolve(), functions),
    };
    Ok(js)
}
