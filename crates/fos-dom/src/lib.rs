//! fOS DOM - Document Object Model
//!
//! Generational arena DOM tree shared through a [`Document`] handle.
//!
//! The tree lives behind interior mutability so that event listeners may
//! mutate the document while an event is being dispatched. Every method on
//! [`Document`] borrows the tree only for the duration of the call.

mod classlist;
mod document;
mod error;
mod events;
mod node;
mod tree;

pub use classlist::DOMTokenList;
pub use document::Document;
pub use error::{DomError, DomResult};
pub use events::{DomEvent, EventCallback, ListenerId};
pub use node::{Attribute, ElementData, Node, NodeData, NodeType, PropValue};
pub use tree::{Children, Descendants, DomTree};

/// Node identifier: arena slot plus generation
///
/// A released slot may hold a new node later, but under a new generation,
/// so an id never refers to two different nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId::new(0, 0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId::new(u32::MAX, 0);

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Check if this id can point at a node slot
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}.{}", self.index, self.generation)
        }
    }
}
