//! Mutation records
//!
//! Tree mutations queue records on the tree; `deliver_mutations` hands
//! them to the document's observers in batches, with no borrow held.

use std::rc::Rc;

use crate::{NodeId, SharedDocument};

/// Upper bound on delivery rounds when observers keep mutating the tree
const MAX_DELIVERY_ROUNDS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
}

impl MutationRecord {
    pub fn child_added(parent: NodeId, child: NodeId) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target: parent,
            added_nodes: vec![child],
            removed_nodes: Vec::new(),
            attribute_name: None,
        }
    }

    pub fn child_removed(parent: NodeId, child: NodeId) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target: parent,
            added_nodes: Vec::new(),
            removed_nodes: vec![child],
            attribute_name: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
        }
    }
}

/// Observer invoked with each batch of records
pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;

/// Deliver queued mutation records to the document's observers.
///
/// Observers may mutate the tree again; the resulting records are delivered
/// in further rounds. Returns the number of records delivered.
pub fn deliver_mutations(document: &SharedDocument) -> usize {
    let mut delivered = 0;

    for _ in 0..MAX_DELIVERY_ROUNDS {
        let (records, observers) = {
            let mut doc = document.borrow_mut();
            let records = doc.tree_mut().take_records();
            if records.is_empty() {
                return delivered;
            }
            (records, doc.mutation_observers())
        };

        delivered += records.len();
        for observer in observers {
            observer(&records);
        }
    }

    tracing::warn!(
        "Mutation delivery stopped after {} rounds; observers keep mutating the tree",
        MAX_DELIVERY_ROUNDS
    );
    delivered
}
