use std::rc::Rc;

use crate::ListenerError;

/// Callback registered through [`Element::add_event_listener`](crate::Element::add_event_listener).
pub type Listener = Rc<dyn Fn(&Event) -> Result<(), ListenerError>>;

/// An event dispatched against an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: String,
    bubbles: bool,
}

impl Event {
    /// Creates an event that is only delivered to the target element.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            bubbles: false,
        }
    }

    /// Creates an event that is delivered to the target and then to each ancestor.
    #[must_use]
    pub fn bubbling(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            bubbles: true,
        }
    }

    /// Returns the event type, e.g. `click`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns whether the event propagates to ancestors.
    #[must_use]
    pub const fn bubbles(&self) -> bool {
        self.bubbles
    }
}
