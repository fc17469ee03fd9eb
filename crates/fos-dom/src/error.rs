//! DOM operation errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not name a live node
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Inserting a node into itself or one of its descendants
    #[error("hierarchy request error: {child} cannot be inserted under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// Operation requires a node kind that can hold children
    #[error("node {0} cannot have children")]
    InvalidNodeType(NodeId),

    /// The document node lives as long as the tree
    #[error("the document node cannot be released")]
    DocumentNode,
}
