#![allow(clippy::module_name_repetitions)]

//! In-memory document tree for the Tidewater binding engine.
//!
//! This crate provides the small slice of the DOM that the binding engine needs:
//! a [`Document`] arena, cheap [`Element`] handles, ordered attributes, text content,
//! event listeners and a ready state that can be awaited through [`Document::ready`].
//!
//! Handles are reference counted and single-threaded, mirroring how browser DOM
//! handles behave inside `wasm32` targets. Listeners are invoked without holding
//! any borrow on the document, so a listener is free to mutate the tree it was
//! dispatched from.

mod document;
mod element;
mod error;
mod event;

pub use document::{Document, NodeId, Ready, ReadyState};
pub use element::{Attribute, Element};
pub use error::{DomError, ListenerError};
pub use event::{Event, Listener};
