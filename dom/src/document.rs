//! Document arena and ready state.

use core::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use std::{cell::RefCell, rc::Rc};

use futures::{FutureExt, channel::oneshot, future::Shared};

use crate::{Attribute, Element, Listener};

/// Identifier for a node stored inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Loading state of a [`Document`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The document is still being populated.
    #[default]
    Loading,
    /// The document finished loading; [`Document::ready`] resolves immediately.
    Complete,
}

pub(crate) enum NodeData {
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
}

pub(crate) struct RegisteredListener {
    pub(crate) event: String,
    pub(crate) callback: Listener,
}

pub(crate) struct NodeEntry {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
    pub(crate) listeners: Vec<RegisteredListener>,
}

impl NodeEntry {
    const fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
            listeners: Vec::new(),
        }
    }

    pub(crate) const fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }
}

pub(crate) struct DocumentInner {
    pub(crate) nodes: Vec<NodeEntry>,
    body: NodeId,
    ready: ReadyState,
    loaded: Option<oneshot::Sender<()>>,
    signal: Shared<oneshot::Receiver<()>>,
    /// Detached text slots. No handle can name a text node, so these are free to reuse.
    free_text: Vec<NodeId>,
}

impl DocumentInner {
    pub(crate) fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry::new(data));
        id
    }

    pub(crate) fn push_text(&mut self, text: &str) -> NodeId {
        match self.free_text.pop() {
            Some(id) => {
                *self.entry_mut(id) = NodeEntry::new(NodeData::Text(text.to_string()));
                id
            }
            None => self.push(NodeData::Text(text.to_string())),
        }
    }

    /// Clears the parent link of a child that was already removed from its parent's
    /// children. Text nodes go back to the free list.
    pub(crate) fn release(&mut self, id: NodeId) {
        let entry = self.entry_mut(id);
        entry.parent = None;
        if let NodeData::Text(content) = &mut entry.data {
            content.clear();
            self.free_text.push(id);
        }
    }

    pub(crate) fn entry(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.0]
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> &mut NodeEntry {
        &mut self.nodes[id.0]
    }

    /// Returns `true` when `ancestor` is `node` or one of its ancestors.
    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entry(id).parent;
        }
        false
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.entry_mut(id).parent.take() {
            self.entry_mut(parent).children.retain(|child| *child != id);
        }
    }
}

/// Shared handle to an in-memory document.
///
/// Cloning the handle is cheap; every clone refers to the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    /// Creates an empty document in the [`ReadyState::Loading`] state.
    ///
    /// The document starts with a single `body` element.
    #[must_use]
    pub fn new() -> Self {
        let (loaded, signal) = oneshot::channel();
        let mut inner = DocumentInner {
            nodes: Vec::new(),
            body: NodeId(0),
            ready: ReadyState::Loading,
            loaded: Some(loaded),
            signal: signal.shared(),
            free_text: Vec::new(),
        };
        inner.body = inner.push(NodeData::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Creates an empty document that has already finished loading.
    #[must_use]
    pub fn new_loaded() -> Self {
        let document = Self::new();
        document.finish_loading();
        document
    }

    /// Returns the `body` element every attached node descends from.
    #[must_use]
    pub fn body(&self) -> Element {
        let body = self.inner.borrow().body;
        Element::from_parts(self.clone(), body)
    }

    /// Creates a detached element with the given tag name.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        let id = self.inner.borrow_mut().push(NodeData::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
        });
        Element::from_parts(self.clone(), id)
    }

    /// Returns every attached element carrying `attribute`, in document order.
    #[must_use]
    pub fn elements_with_attribute(&self, attribute: &str) -> Vec<Element> {
        let inner = self.inner.borrow();
        let mut found = Vec::new();
        let mut stack = vec![inner.body];
        while let Some(id) = stack.pop() {
            let entry = inner.entry(id);
            if let NodeData::Element { attributes, .. } = &entry.data
                && attributes.iter().any(|attr| attr.name() == attribute)
            {
                found.push(Element::from_parts(self.clone(), id));
            }
            stack.extend(entry.children.iter().rev().copied());
        }
        found
    }

    /// Returns the current ready state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.borrow().ready
    }

    /// Returns a future that resolves once the document has finished loading.
    pub fn ready(&self) -> Ready {
        Ready {
            signal: self.inner.borrow().signal.clone(),
        }
    }

    /// Marks the document as loaded and wakes every pending [`Ready`] future.
    ///
    /// Calling this more than once has no further effect.
    pub fn finish_loading(&self) {
        let Some(loaded) = ({
            let mut inner = self.inner.borrow_mut();
            inner.ready = ReadyState::Complete;
            inner.loaded.take()
        }) else {
            return;
        };
        tracing::debug!("document finished loading");
        // The receiver lives in the document itself, so this cannot fail.
        let _ = loaded.send(());
    }

    /// Returns the number of node slots in this document, detached elements included.
    ///
    /// Text slots released by [`Element::set_text_content`] are reused, so re-rendering
    /// text does not grow the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Returns `true` if the document holds no nodes. A document always owns its body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().nodes.is_empty()
    }

    /// Returns `true` if both handles refer to the same document.
    #[must_use]
    pub fn same_document(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&DocumentInner) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut DocumentInner) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("ready", &inner.ready)
            .finish_non_exhaustive()
    }
}

/// Future returned by [`Document::ready`].
#[must_use = "futures do nothing unless polled"]
pub struct Ready {
    signal: Shared<oneshot::Receiver<()>>,
}

impl Future for Ready {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // A cancelled signal means the document was dropped; nothing is left to wait for.
        self.signal.poll_unpin(cx).map(drop)
    }
}

impl fmt::Debug for Ready {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ready")
            .field("complete", &self.signal.peek().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{executor::LocalPool, task::LocalSpawnExt};
    use std::cell::Cell;

    #[test]
    fn test_new_document_has_body() {
        let document = Document::new();
        assert_eq!(document.body().tag_name(), "body");
        assert_eq!(document.len(), 1);
        assert!(!document.is_empty());
        assert_eq!(document.ready_state(), ReadyState::Loading);
    }

    #[test]
    fn test_elements_with_attribute_in_document_order() {
        let document = Document::new_loaded();
        let outer = document.create_element("div");
        outer.set_attribute("x-data", "{}");
        let inner = document.create_element("div");
        inner.set_attribute("x-data", "{}");
        let sibling = document.create_element("section");
        sibling.set_attribute("x-data", "{}");
        let plain = document.create_element("p");

        outer.append_child(&inner).unwrap();
        document.body().append_child(&outer).unwrap();
        document.body().append_child(&plain).unwrap();
        document.body().append_child(&sibling).unwrap();

        let detached = document.create_element("div");
        detached.set_attribute("x-data", "{}");

        let found = document.elements_with_attribute("x-data");
        assert_eq!(found, vec![outer, inner, sibling]);
    }

    #[test]
    fn test_ready_resolves_after_finish_loading() {
        let document = Document::new();
        let resolved = Rc::new(Cell::new(false));

        let mut pool = LocalPool::new();
        let flag = resolved.clone();
        let ready = document.ready();
        pool.spawner()
            .spawn_local(async move {
                ready.await;
                flag.set(true);
            })
            .unwrap();

        pool.run_until_stalled();
        assert!(!resolved.get());

        document.finish_loading();
        pool.run_until_stalled();
        assert!(resolved.get());
        assert_eq!(document.ready_state(), ReadyState::Complete);
    }

    #[test]
    fn test_ready_is_immediate_when_loaded() {
        let document = Document::new_loaded();
        futures::executor::block_on(document.ready());
    }

    #[test]
    fn test_repeated_polls_resolve_every_waiter_once() {
        let document = Document::new();
        let resolved = Rc::new(Cell::new(0));

        let mut pool = LocalPool::new();
        for _ in 0..3 {
            let count = Rc::clone(&resolved);
            let ready = document.ready();
            pool.spawner()
                .spawn_local(async move {
                    ready.await;
                    count.set(count.get() + 1);
                })
                .unwrap();
        }

        for _ in 0..10 {
            pool.run_until_stalled();
        }
        assert_eq!(resolved.get(), 0);

        document.finish_loading();
        document.finish_loading();
        pool.run_until_stalled();
        assert_eq!(resolved.get(), 3);
    }

    #[test]
    fn test_ready_resolves_when_document_is_dropped() {
        let document = Document::new();
        let ready = document.ready();
        drop(document);
        futures::executor::block_on(ready);
    }

    #[test]
    fn test_text_slots_are_reused() {
        let document = Document::new();
        let element = document.create_element("p");
        element.set_text_content("first");
        let before = document.len();

        for round in 0..1000 {
            element.set_text_content("");
            element.set_text_content(&round.to_string());
        }
        assert_eq!(document.len(), before);
        assert_eq!(element.text_content(), "999");
    }
}
