//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts the result into our DOM format.
//! Fragments are parsed with a `<template>` context element, which accepts
//! any markup without context-dependent fixups.

use html5ever::tendril::TendrilSink;
use html5ever::{QualName, local_name, ns, parse_document};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use pl_dom::{Document, DomTree, NodeId};

use crate::HtmlError;

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, HtmlError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = read_dom(html)?;

        let mut document = Document::empty(url);
        let root = document.tree().root();
        for child in dom.document.children.borrow().iter() {
            self.convert_node(child, document.tree_mut(), Some(root));
        }
        document.finalize();
        document.tree_mut().take_records();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse markup representing exactly one node into a detached node of `tree`
    pub fn parse_fragment(&self, tree: &mut DomTree, html: &str) -> Result<NodeId, HtmlError> {
        let dom = read_fragment(html.trim())?;

        // The fragment parser hangs its output off a synthetic `<html>` root
        let root = dom
            .document
            .children
            .borrow()
            .first()
            .cloned()
            .ok_or(HtmlError::FragmentCardinality { count: 0 })?;
        let children = root.children.borrow();
        if children.len() != 1 {
            tracing::error!("Failed to parse HTML fragment: {} top-level nodes", children.len());
            return Err(HtmlError::FragmentCardinality {
                count: children.len(),
            });
        }

        self.convert_node(&children[0], tree, None)
            .ok_or(HtmlError::FragmentCardinality { count: 0 })
    }

    /// Convert an RcDom node to our DOM format, attaching it under `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: Option<NodeId>) -> Option<NodeId> {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
                return parent;
            }
            RcNodeData::Doctype { name, public_id, system_id } => {
                tree.create_doctype(name, public_id, system_id)
            }
            RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, template_contents, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &attr.value);
                }

                // Template children live in their own content fragment
                let contents = template_contents.borrow();
                let source = contents.as_ref().unwrap_or(handle);
                for child in source.children.borrow().iter() {
                    self.convert_node(child, tree, Some(id));
                }
                id
            }
            RcNodeData::ProcessingInstruction { .. } => return None,
        };

        if let Some(parent) = parent {
            tree.append_child(parent, id);
        }
        Some(id)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn read_dom(html: &str) -> Result<RcDom, HtmlError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    Ok(dom)
}

fn read_fragment(html: &str) -> Result<RcDom, HtmlError> {
    let context = QualName::new(None, ns!(html), local_name!("template"));
    let dom = html5ever::parse_fragment(RcDom::default(), Default::default(), context, Vec::new(), false)
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    Ok(dom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p id=\"intro\">Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html).unwrap();

        assert!(doc.document_element().is_valid());
        assert!(doc.body().is_valid());
        assert!(doc.get_element_by_id("intro").is_some());
        assert!(!doc.tree().has_records());
    }

    #[test]
    fn test_parse_keeps_url() {
        let doc = HtmlParser::new()
            .parse_with_url("<p>x</p>", "https://example.com/page")
            .unwrap();
        assert_eq!(doc.url(), "https://example.com/page");
    }

    #[test]
    fn test_fragment_single_node() {
        let mut tree = DomTree::new();
        let node = HtmlParser::new()
            .parse_fragment(&mut tree, "  <li class=\"new\">Three</li>\n")
            .unwrap();

        let elem = tree.get(node).and_then(|n| n.as_element()).unwrap();
        assert_eq!(elem.name, "li");
        assert_eq!(elem.get_attr("class"), Some("new"));
        assert_eq!(tree.parent(node), None);
    }

    #[test]
    fn test_fragment_table_row_without_context() {
        let mut tree = DomTree::new();
        let node = HtmlParser::new()
            .parse_fragment(&mut tree, "<tr><td>1</td></tr>")
            .unwrap();
        assert_eq!(tree.get(node).and_then(|n| n.tag_name()), Some("tr"));
    }

    #[test]
    fn test_fragment_cardinality() {
        let mut tree = DomTree::new();
        let parser = HtmlParser::new();

        let err = parser.parse_fragment(&mut tree, "<li>a</li><li>b</li>").unwrap_err();
        assert!(matches!(err, HtmlError::FragmentCardinality { count: 2 }));

        let err = parser.parse_fragment(&mut tree, "   ").unwrap_err();
        assert!(matches!(err, HtmlError::FragmentCardinality { count: 0 }));
    }

    #[test]
    fn test_fragment_stray_template_end_tag_keeps_trailing_nodes() {
        let mut tree = DomTree::new();
        let err = HtmlParser::new()
            .parse_fragment(&mut tree, "<li>a</li></template><p>b</p>")
            .unwrap_err();
        assert!(matches!(err, HtmlError::FragmentCardinality { count: 2 }));
    }

    #[test]
    fn test_fragment_text_node() {
        let mut tree = DomTree::new();
        let node = HtmlParser::new().parse_fragment(&mut tree, "just text").unwrap();
        assert_eq!(tree.get(node).and_then(|n| n.as_text()), Some("just text"));
    }
}
