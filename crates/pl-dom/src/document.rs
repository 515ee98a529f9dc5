//! Document - High-level document API

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::events::{DomEventType, EventListener};
use crate::matching::{Selector, SelectorError};
use crate::mutation::MutationCallback;
use crate::{DomTree, NodeId, SharedDocument};

/// HTML Document
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    listeners: HashMap<(NodeId, DomEventType), Vec<EventListener>>,
    mutation_observers: Vec<MutationCallback>,
}

impl Document {
    /// Create a new document with an empty html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut document = Self::empty(url);
        let tree = &mut document.tree;

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(NodeId::ROOT, html);
        tree.append_child(html, head);
        tree.append_child(html, body);
        tree.take_records();

        document.html_element = html;
        document.head_element = head;
        document.body_element = body;
        document
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            listeners: HashMap::new(),
            mutation_observers: Vec::new(),
        }
    }

    /// Wrap the document for sharing with listeners and handles
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Locate the html/head/body elements after the tree was built externally
    pub fn finalize(&mut self) {
        let html = self
            .tree
            .element_children(NodeId::ROOT)
            .find(|&id| self.tag_is(id, "html"))
            .unwrap_or(NodeId::NONE);
        let find_in_html = |name: &str| {
            self.tree
                .element_children(html)
                .find(|&id| self.tag_is(id, name))
                .unwrap_or(NodeId::NONE)
        };
        let head = find_in_html("head");
        let body = find_in_html("body");

        self.html_element = html;
        self.head_element = head;
        self.body_element = body;
    }

    fn tag_is(&self, id: NodeId, name: &str) -> bool {
        self.tree
            .get(id)
            .and_then(|n| n.tag_name())
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get the first connected element with the given ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .find(|(_, node)| node.as_element().and_then(|e| e.id()) == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// All connected elements matching a parsed selector, in document order
    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .filter(|&(id, _)| selector.matches(&self.tree, id))
            .map(|(id, _)| id)
            .collect()
    }

    /// First connected element matching a selector string
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tree
            .descendants(NodeId::ROOT)
            .find(|&(id, _)| selector.matches(&self.tree, id))
            .map(|(id, _)| id))
    }

    /// Register an event listener on a node
    pub fn add_event_listener(
        &mut self,
        target: NodeId,
        event_type: DomEventType,
        listener: EventListener,
    ) {
        self.listeners
            .entry((target, event_type))
            .or_default()
            .push(listener);
    }

    /// Listeners registered on a node for an event type
    pub fn listeners(&self, target: NodeId, event_type: DomEventType) -> Vec<EventListener> {
        self.listeners
            .get(&(target, event_type))
            .map(|listeners| listeners.to_vec())
            .unwrap_or_default()
    }

    /// Register an observer for batched mutation records
    pub fn observe_mutations(&mut self, observer: MutationCallback) {
        self.mutation_observers.push(observer);
    }

    /// Snapshot of the registered mutation observers
    pub fn mutation_observers(&self) -> Vec<MutationCallback> {
        self.mutation_observers.clone()
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
