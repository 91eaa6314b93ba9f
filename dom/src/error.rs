use thiserror::Error;

/// Error returned by an event listener.
///
/// Listeners are written by the embedding layer, so the error type is left open.
pub type ListenerError = Box<dyn std::error::Error + 'static>;

/// Error type produced by document operations.
#[derive(Debug, Error)]
pub enum DomError {
    /// The element cannot be appended into itself or one of its descendants.
    #[error("cannot append an element into itself or one of its descendants")]
    HierarchyRequest,
    /// The element was created by a different document.
    #[error("element belongs to a different document")]
    WrongDocument,
    /// One or more listeners failed while an event was dispatched.
    ///
    /// Every listener still runs; the failures are collected in dispatch order.
    #[error("{} listener(s) failed while dispatching `{event}`", .errors.len())]
    Listener {
        /// The dispatched event type.
        event: String,
        /// The errors returned by the failing listeners.
        errors: Vec<ListenerError>,
    },
}
