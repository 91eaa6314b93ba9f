//! Element handles.

use core::fmt;
use std::rc::Rc;

use crate::{
    Document, DomError, Event, Listener, ListenerError, NodeId,
    document::{NodeData, RegisteredListener},
};

/// A single `name="value"` attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    value: String,
}

impl Attribute {
    /// Creates a new attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the attribute name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the literal attribute value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Handle to an element node of a [`Document`].
///
/// Two handles compare equal when they point at the same node of the same document.
#[derive(Clone)]
pub struct Element {
    document: Document,
    id: NodeId,
}

impl Element {
    pub(crate) const fn from_parts(document: Document, id: NodeId) -> Self {
        Self { document, id }
    }

    /// Returns the node identifier of this element.
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.id
    }

    /// Returns the owning document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.document.with(|inner| match &inner.entry(self.id).data {
            NodeData::Element { tag, .. } => tag.clone(),
            NodeData::Text(_) => String::new(),
        })
    }

    /// Returns the value of the named attribute.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.document.with(|inner| match &inner.entry(self.id).data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|attr| attr.name == name)
                .map(|attr| attr.value.clone()),
            NodeData::Text(_) => None,
        })
    }

    /// Returns `true` if the element carries the named attribute.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.document.with(|inner| match &inner.entry(self.id).data {
            NodeData::Element { attributes, .. } => attributes.iter().any(|attr| attr.name == name),
            NodeData::Text(_) => false,
        })
    }

    /// Sets an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.document.with_mut(|inner| {
            if let NodeData::Element { attributes, .. } = &mut inner.entry_mut(self.id).data {
                if let Some(existing) = attributes.iter_mut().find(|attr| attr.name == name) {
                    value.clone_into(&mut existing.value);
                } else {
                    attributes.push(Attribute::new(name, value));
                }
            }
        });
    }

    /// Removes an attribute, returning `true` if it was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        self.document.with_mut(|inner| {
            if let NodeData::Element { attributes, .. } = &mut inner.entry_mut(self.id).data {
                let before = attributes.len();
                attributes.retain(|attr| attr.name != name);
                before != attributes.len()
            } else {
                false
            }
        })
    }

    /// Returns a snapshot of the attributes in the order they were first set.
    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        self.document.with(|inner| match &inner.entry(self.id).data {
            NodeData::Element { attributes, .. } => attributes.clone(),
            NodeData::Text(_) => Vec::new(),
        })
    }

    /// Appends `child` as the last child of this element, moving it if it is already attached.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::WrongDocument`] if `child` belongs to another document, and
    /// [`DomError::HierarchyRequest`] if `child` is this element or one of its ancestors.
    pub fn append_child(&self, child: &Self) -> Result<(), DomError> {
        if !self.document.same_document(&child.document) {
            return Err(DomError::WrongDocument);
        }
        self.document.with_mut(|inner| {
            if inner.is_inclusive_ancestor(child.id, self.id) {
                return Err(DomError::HierarchyRequest);
            }
            inner.detach(child.id);
            inner.entry_mut(child.id).parent = Some(self.id);
            inner.entry_mut(self.id).children.push(child.id);
            Ok(())
        })
    }

    /// Appends a text node as the last child of this element.
    pub fn append_text(&self, text: &str) {
        self.document.with_mut(|inner| {
            let id = inner.push_text(text);
            inner.entry_mut(id).parent = Some(self.id);
            inner.entry_mut(self.id).children.push(id);
        });
    }

    /// Returns the parent element, if attached.
    #[must_use]
    pub fn parent_element(&self) -> Option<Self> {
        let parent = self.document.with(|inner| inner.entry(self.id).parent)?;
        Some(Self::from_parts(self.document.clone(), parent))
    }

    /// Returns the child elements in document order. Text nodes are skipped.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.document.with(|inner| {
            inner
                .entry(self.id)
                .children
                .iter()
                .filter(|child| inner.entry(**child).is_element())
                .map(|child| Self::from_parts(self.document.clone(), *child))
                .collect()
        })
    }

    /// Returns the first child element.
    #[must_use]
    pub fn first_element_child(&self) -> Option<Self> {
        self.document.with(|inner| {
            inner
                .entry(self.id)
                .children
                .iter()
                .find(|child| inner.entry(**child).is_element())
                .map(|child| Self::from_parts(self.document.clone(), *child))
        })
    }

    /// Returns the next sibling element.
    #[must_use]
    pub fn next_element_sibling(&self) -> Option<Self> {
        self.document.with(|inner| {
            let parent = inner.entry(self.id).parent?;
            let siblings = &inner.entry(parent).children;
            let position = siblings.iter().position(|id| *id == self.id)?;
            siblings[position + 1..]
                .iter()
                .find(|id| inner.entry(**id).is_element())
                .map(|id| Self::from_parts(self.document.clone(), *id))
        })
    }

    /// Returns the concatenated text of every descendant text node.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.document.with(|inner| {
            let mut text = String::new();
            let mut stack = vec![self.id];
            while let Some(id) = stack.pop() {
                let entry = inner.entry(id);
                if let NodeData::Text(content) = &entry.data {
                    text.push_str(content);
                }
                stack.extend(entry.children.iter().rev().copied());
            }
            text
        })
    }

    /// Replaces every child of this element with a single text node.
    ///
    /// An empty string leaves the element without children. A lone text child is
    /// rewritten in place.
    pub fn set_text_content(&self, text: &str) {
        self.document.with_mut(|inner| {
            let only_child = match inner.entry(self.id).children.as_slice() {
                [only] if !text.is_empty() => Some(*only),
                _ => None,
            };
            if let Some(only) = only_child
                && let NodeData::Text(content) = &mut inner.entry_mut(only).data
            {
                text.clone_into(content);
                return;
            }

            let children = core::mem::take(&mut inner.entry_mut(self.id).children);
            for child in children {
                inner.release(child);
            }
        });
        if !text.is_empty() {
            self.append_text(text);
        }
    }

    /// Registers a listener for events of type `event` targeting this element.
    pub fn add_event_listener<F>(&self, event: &str, listener: F)
    where
        F: Fn(&Event) -> Result<(), ListenerError> + 'static,
    {
        let callback: Listener = Rc::new(listener);
        self.document.with_mut(|inner| {
            inner.entry_mut(self.id).listeners.push(RegisteredListener {
                event: event.to_string(),
                callback,
            });
        });
    }

    /// Returns the number of listeners registered on this element, for any event type.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.document
            .with(|inner| inner.entry(self.id).listeners.len())
    }

    /// Dispatches `event` at this element.
    ///
    /// Listeners run in registration order, then on each ancestor when the event bubbles.
    /// A failing listener does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Listener`] with every listener error raised during dispatch.
    pub fn dispatch_event(&self, event: &Event) -> Result<(), DomError> {
        let mut errors = Vec::new();
        let mut current = Some(self.clone());
        while let Some(element) = current {
            for listener in element.listeners_for(event.kind()) {
                if let Err(error) = listener(event) {
                    tracing::error!(
                        event = event.kind(),
                        node = element.id.index(),
                        %error,
                        "uncaught error in event listener"
                    );
                    errors.push(error);
                }
            }
            current = if event.bubbles() {
                element.parent_element()
            } else {
                None
            };
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomError::Listener {
                event: event.kind().to_string(),
                errors,
            })
        }
    }

    fn listeners_for(&self, event: &str) -> Vec<Listener> {
        self.document.with(|inner| {
            inner
                .entry(self.id)
                .listeners
                .iter()
                .filter(|listener| listener.event == event)
                .map(|listener| listener.callback.clone())
                .collect()
        })
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.document.same_document(&other.document)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag_name())
            .field("id", &self.id.index())
            .finish()
    }
}
