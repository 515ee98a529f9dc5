//! DOM Tree (arena-based allocation)
//!
//! Node 0 is always the document node. Detached nodes stay in the arena,
//! so their `NodeId`s remain valid after removal.

use crate::mutation::MutationRecord;
use crate::{Node, NodeId};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    records: Vec<MutationRecord>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            records: Vec::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Create a detached DOCTYPE node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::doctype(name, public_id, system_id))
    }

    /// Set an attribute on an element. Returns false for non-elements.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        let Some(elem) = self.get_mut(node).and_then(Node::as_element_mut) else {
            return false;
        };
        elem.set_attr(name, value);
        self.records.push(MutationRecord::attribute(node, name));
        true
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Check whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Check whether a node is attached to the document
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.get(node).is_some() && self.is_inclusive_ancestor(NodeId::ROOT, node)
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    ///
    /// Refuses to attach the document node or to create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child == NodeId::ROOT || self.get(parent).is_none() || self.get(child).is_none() {
            return false;
        }
        if self.is_inclusive_ancestor(child, parent) {
            tracing::warn!("Refusing to append {:?} into its own subtree", child);
            return false;
        }

        self.detach(child);

        let prev = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = NodeId::NONE;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;

        self.records.push(MutationRecord::child_added(parent, child));
        true
    }

    /// Detach a node (and its subtree) from its parent
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.parent(node) else {
            return false;
        };

        let (prev, next) = {
            let n = &self.nodes[node.index()];
            (n.prev_sibling, n.next_sibling)
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let n = &mut self.nodes[node.index()];
        n.parent = NodeId::NONE;
        n.prev_sibling = NodeId::NONE;
        n.next_sibling = NodeId::NONE;

        self.records.push(MutationRecord::child_removed(parent, node));
        true
    }

    /// Iterate over the direct children of a node
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let next = self.get(parent).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Iterate over the direct element children of a node
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent)
            .filter(|(_, node)| node.is_element())
            .map(|(id, _)| id)
    }

    /// 1-based position of `child` among the element children of `parent`
    pub fn element_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.element_children(parent)
            .position(|id| id == child)
            .map(|pos| pos + 1)
    }

    /// Pre-order iteration over the descendants of a node (excluding itself)
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        let next = self.get(node).map_or(NodeId::NONE, |n| n.first_child);
        Descendants {
            tree: self,
            root: node,
            next,
        }
    }

    /// Take the mutation records queued since the last call
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Check whether mutation records are pending
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut current = id;
            loop {
                if current == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(current) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                current = n.parent;
                if !current.is_valid() {
                    break NodeId::NONE;
                }
            }
        };

        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_tree() -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        tree.append_child(NodeId::ROOT, ul);
        let items: Vec<NodeId> = (0..3)
            .map(|_| {
                let li = tree.create_element("li");
                tree.append_child(ul, li);
                li
            })
            .collect();
        tree.take_records();
        (tree, ul, items)
    }

    #[test]
    fn test_append_links_siblings() {
        let (tree, ul, items) = list_tree();
        let children: Vec<NodeId> = tree.children(ul).map(|(id, _)| id).collect();
        assert_eq!(children, items);
        assert_eq!(tree.get(items[1]).unwrap().prev_sibling, items[0]);
        assert_eq!(tree.get(items[1]).unwrap().next_sibling, items[2]);
    }

    #[test]
    fn test_detach_middle_child() {
        let (mut tree, ul, items) = list_tree();
        assert!(tree.detach(items[1]));

        let children: Vec<NodeId> = tree.children(ul).map(|(id, _)| id).collect();
        assert_eq!(children, vec![items[0], items[2]]);
        assert!(!tree.is_connected(items[1]));
        assert_eq!(tree.parent(items[1]), None);
        assert!(!tree.detach(items[1]));
    }

    #[test]
    fn test_element_index_skips_text() {
        let (mut tree, ul, items) = list_tree();
        let text = tree.create_text("\n");
        tree.append_child(ul, text);
        let li = tree.create_element("li");
        tree.append_child(ul, li);

        assert_eq!(tree.element_index(ul, items[0]), Some(1));
        assert_eq!(tree.element_index(ul, li), Some(4));
        assert_eq!(tree.element_index(ul, text), None);
    }

    #[test]
    fn test_append_moves_node() {
        let (mut tree, ul, items) = list_tree();
        let ol = tree.create_element("ol");
        tree.append_child(NodeId::ROOT, ol);
        tree.append_child(ol, items[0]);

        assert_eq!(tree.parent(items[0]), Some(ol));
        assert_eq!(tree.element_children(ul).count(), 2);
    }

    #[test]
    fn test_append_rejects_cycle() {
        let (mut tree, ul, items) = list_tree();
        assert!(!tree.append_child(items[0], ul));
        assert!(!tree.append_child(ul, ul));
        assert!(!tree.append_child(ul, NodeId::ROOT));
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, ul, items) = list_tree();
        let span = tree.create_element("span");
        tree.append_child(items[0], span);

        let order: Vec<NodeId> = tree.descendants(ul).map(|(id, _)| id).collect();
        assert_eq!(order, vec![items[0], span, items[1], items[2]]);

        let inner: Vec<NodeId> = tree.descendants(items[0]).map(|(id, _)| id).collect();
        assert_eq!(inner, vec![span]);
    }

    #[test]
    fn test_mutations_are_recorded() {
        let (mut tree, ul, items) = list_tree();
        tree.detach(items[2]);
        tree.set_attribute(ul, "id", "list");

        let records = tree.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].removed_nodes, vec![items[2]]);
        assert_eq!(records[1].attribute_name.as_deref(), Some("id"));
        assert!(!tree.has_records());
    }
}
