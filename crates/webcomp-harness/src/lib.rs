#![forbid(unsafe_code)]

//! Test harness for webcomp bindings.
//!
//! - [`MockElement`]: a recording DOM double implementing
//!   [`webcomp_runtime::ComponentElement`].
//! - [`CallRecorder`]: a listener with a stable identity that records the
//!   events it receives.

pub mod mock_element;

use std::cell::RefCell;
use std::rc::Rc;

use webcomp_runtime::{Callback, Event};

pub use mock_element::{DomOp, MockDomError, MockElement};

/// A single listener that remembers every event delivered to it.
///
/// [`CallRecorder::callback`] always returns the same function reference, so
/// handing it to two consecutive updates is an unchanged listener.
#[derive(Debug, Clone)]
pub struct CallRecorder {
    callback: Callback,
    events: Rc<RefCell<Vec<Event>>>,
}

impl Default for CallRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRecorder {
    #[must_use]
    pub fn new() -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        Self {
            callback: Callback::new(move |ev: &Event| sink.borrow_mut().push(ev.clone())),
            events,
        }
    }

    #[must_use]
    pub fn callback(&self) -> Callback {
        self.callback.clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.events.borrow().len()
    }

    /// Kinds of the received events, in delivery order.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|ev| ev.kind().to_owned())
            .collect()
    }
}
