#![forbid(unsafe_code)]

//! Browser backend for the webcomp binding.
//!
//! On `wasm32`, [`WebcompBinder`] is exported to JavaScript: it wraps each
//! DOM element in a [`WebComponent`], converts JS parameter objects into
//! binding values and drives the shared binding through [`BinderCore`].
//!
//! [`BinderCore`] is platform independent and is tested natively against
//! the mock element.

pub mod binder_core;

#[cfg(target_arch = "wasm32")]
mod convert;
#[cfg(target_arch = "wasm32")]
mod element;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use binder_core::BinderCore;

#[cfg(target_arch = "wasm32")]
pub use element::{JsError, WebComponent};
#[cfg(target_arch = "wasm32")]
pub use wasm::WebcompBinder;
