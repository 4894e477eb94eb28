#![forbid(unsafe_code)]

//! Parameter-name conventions.
//!
//! A parameter named `on` + `X` + `rest` whose resolved value is a function
//! binds a listener for the event `lower(X)` + `rest`:
//!
//! | Parameter | Event |
//! |-----------|-------|
//! | `onClick` | `click` |
//! | `onCustomThing` | `customThing` |
//! | `onAB` | `aB` |
//! | `onx` | `x` |
//!
//! Only the leading prefix is rewritten, once. Names without a character
//! after `on` are returned unchanged. Lower-casing is the full Unicode
//! mapping, so one character may become several.

use std::borrow::Cow;

use webcomp_runtime::Value;

/// Prefix marking a parameter as an event binding.
pub const EVENT_PREFIX: &str = "on";

/// Derive the DOM event name from a parameter name.
#[must_use]
pub fn event_name(param: &str) -> Cow<'_, str> {
    let Some(tail) = param.strip_prefix(EVENT_PREFIX) else {
        return Cow::Borrowed(param);
    };
    let mut chars = tail.chars();
    let Some(first) = chars.next() else {
        return Cow::Borrowed(param);
    };
    let mut name = String::with_capacity(tail.len());
    name.extend(first.to_lowercase());
    name.push_str(chars.as_str());
    Cow::Owned(name)
}

/// True when `name` with the resolved `value` binds a listener rather than
/// a property.
#[must_use]
pub fn is_event_binding(name: &str, value: &Value) -> bool {
    name.starts_with(EVENT_PREFIX) && value.is_function()
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcomp_runtime::Callback;

    #[test]
    fn strips_prefix_and_lowercases_next_char() {
        assert_eq!(event_name("onClick"), "click");
        assert_eq!(event_name("onCustomThing"), "customThing");
        assert_eq!(event_name("onAB"), "aB");
        assert_eq!(event_name("onx"), "x");
    }

    #[test]
    fn only_the_prefix_is_rewritten() {
        assert_eq!(event_name("onOnOff"), "onOff");
        assert_eq!(event_name("onValue-Changed"), "value-Changed");
    }

    #[test]
    fn names_without_prefix_are_borrowed_unchanged() {
        assert!(matches!(event_name("label"), Cow::Borrowed("label")));
        assert!(matches!(event_name("button"), Cow::Borrowed("button")));
        assert!(matches!(event_name("on"), Cow::Borrowed("on")));
        assert!(matches!(event_name("On"), Cow::Borrowed("On")));
        assert_eq!(event_name(""), "");
    }

    #[test]
    fn multibyte_and_expanding_lowercase() {
        assert_eq!(event_name("onÄnderung"), "änderung");
        assert_eq!(event_name("onİx"), "i\u{307}x");
    }

    #[test]
    fn classification_needs_prefix_and_function() {
        let f = Value::Function(Callback::new(|_| {}));
        assert!(is_event_binding("onClick", &f));
        assert!(is_event_binding("on", &f));
        assert!(!is_event_binding("click", &f));
        assert!(!is_event_binding("onClick", &Value::from("handler")));
        assert!(!is_event_binding("onClick", &Value::observable(f.clone())));
    }
}
