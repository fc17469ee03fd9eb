//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to the fOS DOM.

use fos_dom::{Document, DomTree, NodeId};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::HtmlError;

/// HTML5 parser
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        let dom = self.parse_rcdom(html)?;

        let document = Document::empty();
        {
            let mut tree = document.tree_mut();
            let root = tree.root();
            self.convert_children(&dom.document, &mut tree, root)?;
        }
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse markup as the content of `parent` and append the resulting
    /// nodes under it.
    ///
    /// The tag of `parent` is the parsing context, as for `innerHTML`, so
    /// `<tr>` survives under a `<tbody>`. Non-elements parse as `body`.
    pub fn parse_fragment_into(&self, document: &Document, parent: NodeId, html: &str) -> Result<Vec<NodeId>, HtmlError> {
        let context = document.tag_name(parent).unwrap_or_else(|| "body".to_string());
        let dom = parse_fragment(
            RcDom::default(),
            ParseOpts::default(),
            QualName::new(None, ns!(html), LocalName::from(context.as_str())),
            Vec::new(),
            true,
        )
        .one(html);

        // The fragment lands under a synthetic <html> root
        let Some(root) = dom.document.children.borrow().first().cloned() else {
            return Ok(Vec::new());
        };

        let mut tree = document.tree_mut();
        let before = tree.children(parent).count();
        self.convert_children(&root, &mut tree, parent)?;
        Ok(tree.children(parent).skip(before).map(|(id, _)| id).collect())
    }

    fn parse_rcdom(&self, html: &str) -> Result<RcDom, HtmlError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;
        Ok(dom)
    }

    fn convert_children(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<(), HtmlError> {
        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, parent)?;
        }
        Ok(())
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<(), HtmlError> {
        match &handle.data {
            RcNodeData::Document => self.convert_children(handle, tree, parent)?,
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.trim().is_empty() {
                    let id = tree.create_text(&text);
                    tree.append_child(parent, id)?;
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(&contents.to_string());
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                if let Some(elem) = tree.get_mut(id).and_then(|n| n.as_element_mut()) {
                    for attr in attrs.borrow().iter() {
                        elem.set_attr(&attr.name.local, attr.value.to_string());
                    }
                }
                tree.append_child(parent, id)?;
                self.convert_children(handle, tree, id)?;
            }
            // Doctypes and processing instructions carry nothing bindable
            RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}
        }
        Ok(())
    }
}
