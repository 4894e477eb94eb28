#![forbid(unsafe_code)]

//! Host runtime for webcomp bindings.
//!
//! # Role
//! `webcomp-runtime` is the host side of a binding: the observable data model
//! and the node lifecycle that a binding adapter plugs into. It does not know
//! what a binding does to its element; that lives in the `webcomp` crate.
//!
//! # Primary responsibilities
//! - **Reactive values**: [`Observable`], [`Subscription`] and dependency
//!   tracking ([`reactive::track`]).
//! - **Binding values**: [`Value`], [`Callback`], [`Event`] and deep
//!   resolution of observables.
//! - **Node lifecycle**: [`DisposalRegistry`] and the identity-keyed
//!   [`WeakKeyTable`] used for per-node metadata.
//! - **DOM surface**: the [`ComponentElement`] trait.
//! - **Binding application**: [`BindingHandler`] and [`BindingHost`], which
//!   re-run a handler whenever the observables it read change.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); none of the types
//! are `Send`.

pub mod binding;
pub mod disposal;
pub mod dom;
pub mod reactive;
pub mod value;
pub mod weak_table;

pub use binding::{Binding, BindingHandler, BindingHost};
pub use disposal::DisposalRegistry;
pub use dom::ComponentElement;
pub use reactive::{Observable, Subscription};
pub use value::{Callback, Event, Params, Value};
pub use weak_table::{WeakKeyTable, key_of};
