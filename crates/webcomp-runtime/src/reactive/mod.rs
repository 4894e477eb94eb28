#![forbid(unsafe_code)]

//! Reactive primitives the binding layer is driven by.
//!
//! - [`Observable`]: shared, version-tracked value with change callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`track`]: dependency detection, so a binding knows which observables
//!   to watch after running once.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per value-changing write.
//! 2. Subscribers are notified in registration order.
//! 3. Writing a value equal to the current one is a no-op.
//! 4. A dropped [`Subscription`] is never called again.
//! 5. Only reads made while a recording frame is on top of the stack are
//!    reported as dependencies.

pub mod dependency;
pub mod observable;

pub use dependency::{Dependencies, Dependency, is_tracking, track, untracked};
pub use observable::{Observable, Subscription};
