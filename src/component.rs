//! Component lifecycle: data evaluation, directive binding and refresh.

use core::{
    cell::{Cell, RefCell},
    fmt,
};
use std::rc::{Rc, Weak};

use tidewater_dom::{Element, Event, ListenerError};
use tidewater_expr::{Bindings, Map, Value};

use crate::{
    Config, Error, Result,
    directive::{Directive, DirectiveKind, directives},
    store::ObservableData,
    walker::walk,
};

/// Lifecycle state of a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentState {
    /// Data evaluated, directives not yet bound.
    #[default]
    Uninitialized,
    /// Listeners registered and text rendered. Components never leave this state.
    Bound,
}

/// A mounted component: one root element and the data its directives bind to.
///
/// `Component` is a cheap handle; clones refer to the same component. Event listeners
/// registered on the root's subtree keep the component alive, so dropping every handle
/// leaves its bindings working. There is no teardown: a component lives as long as the
/// document holding its listeners.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

struct ComponentInner {
    root: Element,
    config: Config,
    data: ObservableData,
    state: Cell<ComponentState>,
}

impl Component {
    /// Mounts a component on `root` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Component::with_config`].
    pub fn new(root: Element) -> Result<Self> {
        Self::with_config(root, Config::default())
    }

    /// Mounts a component on `root`.
    ///
    /// The root's data attribute is evaluated once to produce the initial data; a
    /// missing or blank attribute yields an empty mapping. The subtree is then walked,
    /// registering `on` handlers and rendering `text` bindings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrefix`] if `config` is rejected by
    /// [`Config::validate`], [`Error::Expression`] if the data attribute fails to
    /// evaluate and [`Error::DataNotObject`] if it evaluates to anything but an object.
    pub fn with_config(root: Element, config: Config) -> Result<Self> {
        config.validate()?;
        let initial = initial_data(&root, &config)?;

        let inner = Rc::new_cyclic(|weak: &Weak<ComponentInner>| {
            let weak = weak.clone();
            ComponentInner {
                root,
                config,
                data: ObservableData::new(initial, move |key| {
                    if let Some(inner) = weak.upgrade() {
                        tracing::trace!(property = key, "data changed");
                        inner.refresh();
                    }
                }),
                state: Cell::new(ComponentState::Uninitialized),
            }
        });

        let component = Self { inner };
        component.initialize();
        Ok(component)
    }

    fn initialize(&self) {
        let inner = &self.inner;
        tracing::debug!(
            root = ?inner.root,
            properties = inner.data.len(),
            "mounting component"
        );

        walk(&inner.root, |el| inner.is_nested_root(el), |element| {
            for directive in directives(element, &inner.config) {
                match directive.kind {
                    DirectiveKind::On => self.register_listener(element, directive),
                    DirectiveKind::Text => inner.render_text(element, &directive.expression),
                    kind => tracing::trace!(%kind, "directive has no behavior"),
                }
            }
        });

        inner.state.set(ComponentState::Bound);
    }

    fn register_listener(&self, element: &Element, directive: Directive) {
        let Directive {
            value,
            modifiers,
            expression,
            ..
        } = directive;

        let Some(event) = value else {
            tracing::warn!(
                element = ?element,
                expression = %expression,
                "`on` directive without an event name"
            );
            return;
        };
        if !modifiers.is_empty() {
            tracing::trace!(event = %event, ?modifiers, "ignoring listener modifiers");
        }
        tracing::trace!(event = %event, expression = %expression, "registering listener");

        let inner = Rc::clone(&self.inner);
        element.add_event_listener(&event, move |event: &Event| {
            inner
                .run_handler(&expression, event)
                .map_err(ListenerError::from)
        });
    }

    /// Re-renders every `text` binding in the component's scope.
    ///
    /// Writes to the component's data already trigger a refresh; this is for hosts that
    /// mutate the document and want bindings re-applied.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Evaluates `expression` against the component's data and `extras`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Expression`] if the expression fails to parse or evaluate.
    pub fn evaluate(&self, expression: &str, extras: &Bindings) -> Result<Value> {
        self.inner.evaluate(expression, extras)
    }

    /// Runs `expression` for its side effects. Each write it performs triggers a refresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Expression`] if the expression fails to parse or evaluate.
    pub fn execute(&self, expression: &str, extras: &Bindings) -> Result<()> {
        self.inner.evaluate(expression, extras).map(drop)
    }

    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.inner.root
    }

    /// Returns the component's observable data.
    #[must_use]
    pub fn data(&self) -> &ObservableData {
        &self.inner.data
    }

    /// Returns the configuration the component was mounted with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ComponentState {
        self.inner.state.get()
    }

    /// Returns `true` if both handles refer to the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ComponentInner {
    fn is_nested_root(&self, element: &Element) -> bool {
        element.has_attribute(&self.config.data_attribute())
    }

    fn refresh(&self) {
        if self.state.get() != ComponentState::Bound {
            return;
        }

        tracing::trace!(root = ?self.root, "refreshing component");
        walk(&self.root, |el| self.is_nested_root(el), |element| {
            for directive in directives(element, &self.config) {
                if directive.kind == DirectiveKind::Text {
                    self.render_text(element, &directive.expression);
                }
            }
        });
    }

    /// `text` bindings are a bare property lookup, not a general expression.
    fn render_text(&self, element: &Element, property: &str) {
        let text = match self.data.get(property.trim()) {
            Value::Null => String::new(),
            value => value.to_string(),
        };
        if element.text_content() != text {
            element.set_text_content(&text);
        }
    }

    fn run_handler(&self, expression: &str, event: &Event) -> Result<()> {
        let mut extras = Bindings::new();
        if let Some(name) = &self.config.event_variable {
            let mut object = Map::new();
            object.insert("type".to_string(), Value::from(event.kind()));
            extras.insert(name.clone(), Value::Object(object));
        }

        tracing::trace!(event = event.kind(), expression, "running handler");
        self.evaluate(expression, &extras).map(drop).inspect_err(|error| {
            tracing::debug!(event = event.kind(), %error, "handler failed");
        })
    }

    fn evaluate(&self, expression: &str, extras: &Bindings) -> Result<Value> {
        tidewater_expr::evaluate(expression, &self.data, extras)
            .map_err(|source| Error::expression(expression, source))
    }
}

fn initial_data(root: &Element, config: &Config) -> Result<Map> {
    let attribute = config.data_attribute();
    let source = root.get_attribute(&attribute).unwrap_or_default();
    if source.trim().is_empty() {
        return Ok(Map::new());
    }

    let value = tidewater_expr::evaluate(&source, &RefCell::new(Map::new()), &Bindings::new())
        .map_err(|error| Error::expression(&source, error))?;

    value.into_object().map_err(|other| Error::DataNotObject {
        attribute,
        found: other.type_name(),
    })
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("root", &self.inner.root)
            .field("state", &self.inner.state.get())
            .field("data", &self.inner.data)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewater_dom::{Document, DomError};

    fn element(document: &Document, tag: &str, attributes: &[(&str, &str)]) -> Element {
        let element = document.create_element(tag);
        for (name, value) in attributes {
            element.set_attribute(name, value);
        }
        element
    }

    #[test]
    fn test_missing_or_blank_data_is_empty() {
        let document = Document::new();
        let root = document.create_element("div");
        let component = Component::new(root.clone()).unwrap();
        assert!(component.data().is_empty());
        assert_eq!(component.state(), ComponentState::Bound);

        root.set_attribute("x-data", "  ");
        assert!(Component::new(root).unwrap().data().is_empty());
    }

    #[test]
    fn test_data_must_be_object() {
        let document = Document::new();
        let root = element(&document, "div", &[("x-data", "[1, 2]")]);
        assert!(matches!(
            Component::new(root),
            Err(Error::DataNotObject { found: "array", .. })
        ));
    }

    #[test]
    fn test_data_parse_error() {
        let document = Document::new();
        let root = element(&document, "div", &[("x-data", "{ open: }")]);
        assert!(matches!(
            Component::new(root),
            Err(Error::Expression { expression, .. }) if expression == "{ open: }"
        ));
    }

    #[test]
    fn test_root_directives_are_processed() {
        let document = Document::new();
        let root = element(
            &document,
            "button",
            &[
                ("x-data", "{ count: 0 }"),
                ("x-text", "count"),
                ("x-on:click", "count = count + 1"),
            ],
        );
        let component = Component::new(root.clone()).unwrap();
        assert_eq!(root.text_content(), "0");

        root.dispatch_event(&Event::new("click")).unwrap();
        assert_eq!(component.data().get("count"), Value::from(1));
        assert_eq!(root.text_content(), "1");
    }

    #[test]
    fn test_text_rendering_of_special_values() {
        let document = Document::new();
        let root = element(&document, "div", &[("x-data", "{ empty: null, half: 0.5 }")]);
        let empty = element(&document, "span", &[("x-text", "empty")]);
        let missing = element(&document, "span", &[("x-text", "missing")]);
        let half = element(&document, "span", &[("x-text", "half")]);
        for child in [&empty, &missing, &half] {
            root.append_child(child).unwrap();
        }

        Component::new(root).unwrap();
        assert_eq!(empty.text_content(), "");
        assert_eq!(missing.text_content(), "undefined");
        assert_eq!(half.text_content(), "0.5");
    }

    #[test]
    fn test_text_binding_is_a_property_lookup() {
        let document = Document::new();
        let root = element(&document, "div", &[("x-data", "{ count: 2 }")]);
        let span = element(&document, "span", &[("x-text", "count + 1")]);
        root.append_child(&span).unwrap();

        Component::new(root).unwrap();
        assert_eq!(span.text_content(), "undefined");
    }

    #[test]
    fn test_failing_handler_reports_through_dispatch() {
        let document = Document::new();
        let root = element(
            &document,
            "div",
            &[("x-data", "{}"), ("x-on:click", "missing + 1")],
        );
        let _component = Component::new(root.clone()).unwrap();

        let error = root.dispatch_event(&Event::new("click")).unwrap_err();
        assert!(matches!(error, DomError::Listener { ref errors, .. } if errors.len() == 1));
    }

    #[test]
    fn test_event_variable_is_opt_in() {
        let document = Document::new();
        let root = element(
            &document,
            "div",
            &[("x-data", "{ last: '' }"), ("x-on:input", "last = $event.type")],
        );
        let _plain = Component::new(root.clone()).unwrap();
        assert!(root.dispatch_event(&Event::new("input")).is_err());

        let root = element(
            &document,
            "div",
            &[("x-data", "{ last: '' }"), ("x-on:input", "last = $event.type")],
        );
        let config = Config::default().with_event_variable("$event");
        let component = Component::with_config(root.clone(), config).unwrap();
        root.dispatch_event(&Event::new("input")).unwrap();
        assert_eq!(component.data().get("last"), Value::from("input"));
    }

    #[test]
    fn test_bindings_outlive_dropped_handle() {
        let document = Document::new();
        let root = element(
            &document,
            "button",
            &[
                ("x-data", "{ count: 0 }"),
                ("x-text", "count"),
                ("x-on:click", "count++"),
            ],
        );
        drop(Component::new(root.clone()).unwrap());
        assert_eq!(root.listener_count(), 1);

        root.dispatch_event(&Event::new("click")).unwrap();
        root.dispatch_event(&Event::new("click")).unwrap();
        assert_eq!(root.text_content(), "2");
    }

    #[test]
    fn test_invalid_prefix_is_rejected_on_manual_mount() {
        let document = Document::new();
        let root = element(&document, "div", &[("-data", "{}"), ("-on:click", "n++")]);
        let config = Config::default().with_prefix("");
        assert!(matches!(
            Component::with_config(root.clone(), config),
            Err(Error::InvalidPrefix(prefix)) if prefix.is_empty()
        ));
        assert_eq!(root.listener_count(), 0);
    }

    #[test]
    fn test_on_without_event_name_registers_nothing() {
        let document = Document::new();
        let root = element(&document, "div", &[("x-data", "{}"), ("x-on", "n++")]);
        let _component = Component::new(root.clone()).unwrap();
        assert_eq!(root.listener_count(), 0);
    }

    #[test]
    fn test_execute_and_evaluate_with_extras() {
        let document = Document::new();
        let root = element(&document, "div", &[("x-data", "{ total: 1 }"), ("x-text", "total")]);
        let component = Component::new(root.clone()).unwrap();

        let mut extras = Bindings::new();
        extras.insert("step".into(), Value::from(4));
        component.execute("total += step", &extras).unwrap();
        assert_eq!(root.text_content(), "5");
        assert_eq!(
            component.evaluate("total * 2", &Bindings::new()).unwrap(),
            Value::from(10)
        );
        assert!(matches!(
            component.execute("step = 0", &extras),
            Err(Error::Expression { .. })
        ));
    }
}
