//! Selector subscriptions
//!
//! A subscription invokes its callback once for every connected node that
//! matches a selector, both at subscription time and whenever delivered
//! mutations make further nodes match. A document holds at most one
//! subscription per selector; subscribing again replaces its callback.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::matching::Selector;
use crate::{Document, NodeId, SharedDocument};

/// Callback invoked with each matching node
pub type MatchCallback = Rc<dyn Fn(NodeId)>;

/// Watches a document for nodes matching a selector
pub trait SelectorSubscriber {
    /// Invoke `callback` for every node that matches `selector` now or later
    fn subscribe(&self, document: &SharedDocument, selector: &str, callback: MatchCallback);
}

/// Default subscriber driven by the document's mutation records
#[derive(Default)]
pub struct DomSubscriber {
    subscriptions: RefCell<Vec<Rc<Subscription>>>,
}

impl DomSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions on live documents
    pub fn len(&self) -> usize {
        self.prune();
        self.subscriptions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self) {
        self.subscriptions
            .borrow_mut()
            .retain(|subscription| subscription.document.strong_count() > 0);
    }

    fn existing(&self, document: &SharedDocument, selector: &str) -> Option<Rc<Subscription>> {
        self.subscriptions
            .borrow()
            .iter()
            .find(|subscription| subscription.source == selector && subscription.watches(document))
            .cloned()
    }
}

struct Subscription {
    document: Weak<RefCell<Document>>,
    source: String,
    selector: Selector,
    callback: RefCell<MatchCallback>,
    seen: RefCell<HashSet<NodeId>>,
}

impl Subscription {
    fn watches(&self, document: &SharedDocument) -> bool {
        std::ptr::eq(self.document.as_ptr(), Rc::as_ptr(document))
    }

    /// Fire for matching nodes not yet reported. Nodes that stop matching
    /// are forgotten and fire again if they match later.
    fn sweep(&self, document: &SharedDocument) {
        let fresh: Vec<NodeId> = {
            let doc = document.borrow();
            let matches = doc.select_all(&self.selector);
            let current: HashSet<NodeId> = matches.iter().copied().collect();
            let mut seen = self.seen.borrow_mut();
            seen.retain(|id| current.contains(id));
            matches.into_iter().filter(|id| seen.insert(*id)).collect()
        };

        // The callback may resubscribe, so no borrow is held while it runs
        let callback = Rc::clone(&self.callback.borrow());
        for node in fresh {
            callback(node);
        }
    }
}

impl SelectorSubscriber for DomSubscriber {
    fn subscribe(&self, document: &SharedDocument, selector: &str, callback: MatchCallback) {
        self.prune();
        if let Some(subscription) = self.existing(document, selector) {
            tracing::debug!("Replacing subscription for {:?}", selector);
            *subscription.callback.borrow_mut() = callback;
            subscription.seen.borrow_mut().clear();
            subscription.sweep(document);
            return;
        }

        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("Ignoring subscription for {:?}: {}", selector, err);
                return;
            }
        };
        tracing::debug!("Subscribing to {:?}", selector);

        let subscription = Rc::new(Subscription {
            document: Rc::downgrade(document),
            source: selector.to_string(),
            selector: parsed,
            callback: RefCell::new(callback),
            seen: RefCell::new(HashSet::new()),
        });
        self.subscriptions.borrow_mut().push(Rc::clone(&subscription));

        let watcher = Rc::clone(&subscription);
        document.borrow_mut().observe_mutations(Rc::new(move |_records| {
            if let Some(document) = watcher.document.upgrade() {
                watcher.sweep(&document);
            }
        }));

        subscription.sweep(document);
    }
}
