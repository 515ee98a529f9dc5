//! Pagelove HTML
//!
//! HTML5 parsing built on html5ever, converted into the Pagelove DOM,
//! plus outer markup serialization.

mod parser;
mod serializer;

use pl_dom::{Document, DomTree, NodeId};

pub use parser::HtmlParser;
pub use serializer::{outer_html, HtmlSerializer};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Parse markup that must represent exactly one node into `tree`.
///
/// The new node is created detached; the caller decides where it goes.
pub fn parse_fragment(tree: &mut DomTree, html: &str) -> Result<NodeId, HtmlError> {
    HtmlParser::new().parse_fragment(tree, html)
}

/// HTML error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("html parameter must represent a single node; got {count}")]
    FragmentCardinality { count: usize },
}
