//! Selector synthesis
//!
//! Produces a selector that addresses a node by its current position:
//! `#id` when the node has an identifier, `#anchor > tag:nth-child(n)`
//! when the nearest identified ancestor is its parent, and otherwise a
//! structural `tag:nth-child(n) > ...` path. The result is lower-cased and
//! recomputed on every call.

use crate::{DomTree, NodeId};

#[derive(Debug, thiserror::Error)]
enum SynthesisError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0:?} has no tag name")]
    MissingTagName(NodeId),

    #[error("node {child:?} is not an element child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
}

/// Synthesize a stable selector for `node`.
///
/// Never fails: internal errors are logged and degrade to the node's
/// lower-cased tag name, or `unknown`.
pub fn synthesize_selector(tree: &DomTree, node: NodeId) -> String {
    match build_selector(tree, node) {
        Ok(selector) => selector,
        Err(err) => {
            tracing::error!("Failed to generate selector: {}", err);
            tree.get(node)
                .and_then(|n| n.tag_name())
                .unwrap_or("unknown")
                .to_lowercase()
        }
    }
}

fn tag_of(tree: &DomTree, node: NodeId) -> Result<&str, SynthesisError> {
    tree.get(node)
        .ok_or(SynthesisError::UnknownNode(node))?
        .tag_name()
        .ok_or(SynthesisError::MissingTagName(node))
}

fn build_selector(tree: &DomTree, node: NodeId) -> Result<String, SynthesisError> {
    let element = tree
        .get(node)
        .ok_or(SynthesisError::UnknownNode(node))?
        .as_element()
        .ok_or(SynthesisError::MissingTagName(node))?;

    if let Some(id) = element.id() {
        return Ok(format!("#{}", css_escape(id)).to_lowercase());
    }

    // Segments are collected leaf-first and reversed at the end
    let mut segments = Vec::new();
    let mut current = node;

    while let Some(parent) = tree.parent(current) {
        let parent_node = tree.get(parent).ok_or(SynthesisError::UnknownNode(parent))?;
        if !parent_node.is_element() && !parent_node.is_document() {
            break;
        }

        let tag = tag_of(tree, current)?;
        let position = tree
            .element_index(parent, current)
            .ok_or(SynthesisError::NotAChild { parent, child: current })?;

        if let Some(anchor) = parent_node.as_element().and_then(|e| e.id()) {
            segments.push(format!("#{} > {}:nth-child({})", css_escape(anchor), tag, position));
            break;
        }

        segments.push(format!("{}:nth-child({})", tag, position));
        current = parent;
    }

    segments.reverse();
    Ok(segments.join(" > ").to_lowercase())
}

/// Serialize a string as a CSS identifier (CSSOM `CSS.escape`)
pub fn css_escape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();

    for (index, &c) in chars.iter().enumerate() {
        match c {
            '\0' => output.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => push_hex_escape(&mut output, c),
            '0'..='9' if index == 0 => push_hex_escape(&mut output, c),
            '0'..='9' if index == 1 && chars[0] == '-' => push_hex_escape(&mut output, c),
            '-' if index == 0 && chars.len() == 1 => output.push_str("\\-"),
            c if !c.is_ascii() || c == '-' || c == '_' || c.is_ascii_alphanumeric() => {
                output.push(c)
            }
            c => {
                output.push('\\');
                output.push(c);
            }
        }
    }

    output
}

fn push_hex_escape(output: &mut String, c: char) {
    output.push_str(&format!("\\{:x} ", c as u32));
}
