#![doc = include_str!("../README.md")]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::future_not_send)]

pub mod component;
/// Engine configuration.
pub mod config;
pub mod directive;
/// Errors produced while mounting and driving components.
pub mod error;
pub mod logging;
pub mod runtime;
pub mod store;
pub mod walker;

#[doc(inline)]
pub use component::{Component, ComponentState};
#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use runtime::{MountFailure, Runtime, Startup, global, start};

pub use tidewater_dom as dom;
pub use tidewater_expr as expr;

pub mod prelude {
    //! Commonly used types, importable with a single `use`.
    //!
    //! ```
    //! use tidewater::prelude::*;
    //!
    //! let document = Document::new_loaded();
    //! let root = document.create_element("button");
    //! root.set_attribute("x-data", "{ count: 0 }");
    //! root.set_attribute("x-text", "count");
    //! root.set_attribute("x-on:click", "count++");
    //!
    //! let component = Component::new(root.clone()).unwrap();
    //! root.dispatch_event(&Event::new("click")).unwrap();
    //! assert_eq!(root.text_content(), "1");
    //! assert_eq!(component.data().get("count"), Value::from(1));
    //! ```

    pub use crate::{Component, Config, Error, Runtime, Startup, start};
    pub use tidewater_dom::{Document, Element, Event};
    pub use tidewater_expr::{Bindings, Value};
}
