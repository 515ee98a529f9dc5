//! Pagelove DOM
//!
//! Arena-backed document tree used by the capability binding layer:
//! nodes, stable selector synthesis, selector matching, event dispatch
//! and batched mutation delivery.

mod node;
mod tree;
mod document;
pub mod events;
pub mod matching;
pub mod mutation;
pub mod selector;
pub mod subscriber;

use std::cell::RefCell;
use std::rc::Rc;

pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use tree::{Children, Descendants, DomTree};
pub use document::Document;
pub use events::{
    CapabilityDetail, CompletionDetail, DomEvent, DomEventType, EventDetail, EventDispatcher,
    EventListener,
};
pub use matching::{Selector, SelectorError};
pub use mutation::{deliver_mutations, MutationCallback, MutationRecord, MutationType};
pub use selector::{css_escape, synthesize_selector};
pub use subscriber::{DomSubscriber, MatchCallback, SelectorSubscriber};

/// A document shared between the binding layer, its listeners and observers.
///
/// Borrows are never held across listener or observer invocation.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this ID refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
