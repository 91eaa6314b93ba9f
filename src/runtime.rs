//! Startup: waiting for the document, discovering roots and mounting components.

use core::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use tidewater_dom::{Document, Element};

use crate::{Component, Config, Error, Result};

/// A root that failed to mount.
#[derive(Debug)]
pub struct MountFailure {
    /// The element carrying the data attribute.
    pub root: Element,
    /// Why mounting failed.
    pub error: Error,
}

/// Outcome of mounting every discovered root.
#[derive(Debug, Default)]
pub struct Startup {
    /// Number of components mounted.
    pub mounted: usize,
    /// Roots that failed to mount. Other roots are unaffected.
    pub failures: Vec<MountFailure>,
}

impl Startup {
    /// Returns `true` if every discovered root mounted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns a document's mounted components.
///
/// Roots are discovered once, after the document is ready; roots added afterwards are
/// never mounted.
#[derive(Debug)]
pub struct Runtime {
    document: Document,
    config: Config,
    started: Cell<bool>,
    components: RefCell<Vec<Component>>,
}

impl Runtime {
    /// Creates a runtime for `document`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrefix`] if the configuration is unusable.
    pub fn new(document: Document, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            document,
            config,
            started: Cell::new(false),
            components: RefCell::new(Vec::new()),
        })
    }

    /// Waits for the document to finish loading, then mounts every root.
    ///
    /// Returns `None` if this runtime has already been started.
    pub async fn start(&self) -> Option<Startup> {
        if self.started.replace(true) {
            tracing::warn!("runtime already started");
            return None;
        }

        self.document.ready().await;
        Some(self.mount_all())
    }

    fn mount_all(&self) -> Startup {
        let attribute = self.config.data_attribute();
        let roots = self.document.elements_with_attribute(&attribute);
        tracing::debug!(roots = roots.len(), %attribute, "discovered component roots");

        let mut startup = Startup::default();
        for root in roots {
            match Component::with_config(root.clone(), self.config.clone()) {
                Ok(component) => {
                    self.components.borrow_mut().push(component);
                    startup.mounted += 1;
                }
                Err(error) => {
                    tracing::error!(root = ?root, %error, "failed to mount component");
                    startup.failures.push(MountFailure { root, error });
                }
            }
        }

        tracing::info!(
            mounted = startup.mounted,
            failed = startup.failures.len(),
            "tidewater started"
        );
        startup
    }

    /// Returns the component mounted on `root`, if any.
    #[must_use]
    pub fn component_for(&self, root: &Element) -> Option<Component> {
        self.components
            .borrow()
            .iter()
            .find(|component| component.root() == root)
            .cloned()
    }

    /// Returns every mounted component, in document order.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        self.components.borrow().clone()
    }

    /// Returns the document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

thread_local! {
    static GLOBAL: OnceCell<Rc<Runtime>> = const { OnceCell::new() };
}

/// Starts the engine for `document` on this thread.
///
/// Only the first call does anything: it installs a global [`Runtime`], waits for the
/// document to be ready and mounts every root. Later calls return `Ok(None)`.
///
/// # Errors
///
/// Returns [`Error::InvalidPrefix`] if the configuration is unusable. A rejected
/// configuration does not count as a start.
pub async fn start(document: Document, config: Config) -> Result<Option<Startup>> {
    if global().is_some() {
        tracing::debug!("tidewater already started on this thread");
        return Ok(None);
    }

    let runtime = Rc::new(Runtime::new(document, config)?);
    let installed = GLOBAL.with(|cell| cell.set(Rc::clone(&runtime)).is_ok());
    if !installed {
        return Ok(None);
    }

    Ok(runtime.start().await)
}

/// Returns the runtime installed by [`start`] on this thread.
#[must_use]
pub fn global() -> Option<Rc<Runtime>> {
    GLOBAL.with(|cell| cell.get().cloned())
}
