//! fOS HTML Parser
//!
//! HTML5 parsing built on html5ever, converting into the fOS DOM, plus the
//! serializer used for `innerHTML`/`outerHTML`.

mod parser;
mod serializer;

pub use fos_dom::{Document, NodeId};
pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;

/// Markup parsing error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to read markup: {0}")]
    Io(#[from] std::io::Error),

    #[error("tree construction failed: {0}")]
    Dom(#[from] fos_dom::DomError),
}

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Replace a node's children with parsed markup (`innerHTML = ...`)
pub fn set_inner_html(document: &Document, node: NodeId, html: &str) -> Result<(), HtmlError> {
    document.clear_children(node);
    HtmlParser::new().parse_fragment_into(document, node, html)?;
    Ok(())
}

/// Serialize a node including itself
pub fn outer_html(document: &Document, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(&document.tree(), node)
}

/// Serialize a node's children
pub fn inner_html(document: &Document, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(&document.tree(), node)
}
