//! Error types
//!
//! [`ReactiveError`] is returned to callers. A [`BindingIssue`] is never
//! returned: the binding simply does not activate, and the issue is logged
//! and optionally collected as a diagnostic.

use fos_dom::NodeId;

/// Errors returned by the entry point
#[derive(Debug, thiserror::Error)]
pub enum ReactiveError {
    /// Scoped activation on a node that is not in the document
    #[error("scope node {0} not found")]
    NodeNotFound(NodeId),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// A binding that did not activate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingIssue {
    #[error("{node}: `{attribute}` names unknown signal `{name}`")]
    UnresolvedSignal { node: NodeId, attribute: String, name: String },

    #[error("{node}: `{attribute}` names `{name}`, a {kind}, not a signal")]
    NotASignal { node: NodeId, attribute: String, name: String, kind: &'static str },

    #[error("{node}: handler `{name}` for `{attribute}` is not registered")]
    UnresolvedHandler { node: NodeId, attribute: String, name: String },

    #[error("{node}: `{name}` for `{attribute}` is a {kind}, not a handler")]
    NotCallable { node: NodeId, attribute: String, name: String, kind: &'static str },

    #[error("list `{name}` holds a non-sequence value; rendering nothing")]
    NotASequence { name: String },

    #[error("{node}: list template for `{name}` has no parent")]
    DetachedTemplate { node: NodeId, name: String },

    #[error("interpolation path `{path}` missing on item {index}")]
    MissingPath { path: String, index: usize },

    #[error("{node}: markup could not be applied: {message}")]
    Markup { node: NodeId, message: String },
}
