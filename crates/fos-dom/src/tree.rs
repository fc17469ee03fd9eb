//! DOM Tree (arena-based allocation)

use crate::{DomError, DomResult, Node, NodeData, NodeId};

/// Slot in the arena; `node` is `None` once released
#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based DOM tree
///
/// Slot 0 always holds the document node. `remove` only unlinks a node;
/// `release` frees a detached subtree so its slots can be reused under a
/// new generation.
#[derive(Debug)]
pub struct DomTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Create a tree with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Slot {
            generation: 0,
            node: Some(Node::document()),
        });
        Self {
            slots,
            free: Vec::new(),
            live: 1,
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a live node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    /// Get a mutable live node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    /// Number of live nodes, detached ones included
    pub fn len(&self) -> usize {
        self.live
    }

    /// Always false: the document node is never released
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of allocated slots, free ones included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, NodeId::NONE)
    }

    /// Insert `child` under `parent` before `reference` (append when NONE)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> DomResult<()> {
        if !self.node(parent)?.can_have_children() {
            return Err(DomError::InvalidNodeType(parent));
        }
        self.node(child)?;
        if child == NodeId::ROOT || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if reference.is_valid() && self.node(reference)?.parent != parent {
            return Err(DomError::NotFound(reference));
        }
        if reference == child {
            return Ok(());
        }

        self.detach(child);

        let prev = match self.get(reference) {
            Some(node) => node.prev_sibling,
            None => self.get(parent).map_or(NodeId::NONE, |n| n.last_child),
        };

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }

        match self.get_mut(prev) {
            Some(node) => node.next_sibling = child,
            None => self.set_first_child(parent, child),
        }
        match self.get_mut(reference) {
            Some(node) => node.prev_sibling = child,
            None => self.set_last_child(parent, child),
        }
        Ok(())
    }

    /// Detach a node (and its subtree) from its parent
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        self.node(id)?;
        self.detach(id);
        Ok(())
    }

    /// Detach a node and free its whole subtree.
    ///
    /// Returns the released ids, `id` first. Every one of them is stale
    /// afterwards.
    pub fn release(&mut self, id: NodeId) -> DomResult<Vec<NodeId>> {
        if id == NodeId::ROOT {
            return Err(DomError::DocumentNode);
        }
        self.node(id)?;
        self.detach(id);

        let mut released = vec![id];
        released.extend(self.descendants(id).map(|(child, _)| child));
        for &node in &released {
            let slot = &mut self.slots[node.index()];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index() as u32);
        }
        self.live -= released.len();
        Ok(released)
    }

    fn detach(&mut self, id: NodeId) {
        let Some((parent, prev, next)) = self
            .get(id)
            .map(|node| (node.parent, node.prev_sibling, node.next_sibling))
        else {
            return;
        };
        if !parent.is_valid() {
            return;
        }

        match self.get_mut(prev) {
            Some(node) => node.next_sibling = next,
            None => self.set_first_child(parent, next),
        }
        match self.get_mut(next) {
            Some(node) => node.prev_sibling = prev,
            None => self.set_last_child(parent, prev),
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    fn set_first_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.get_mut(parent) {
            node.first_child = child;
        }
    }

    fn set_last_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.get_mut(parent) {
            node.last_child = child;
        }
    }

    /// Release every child of a node; returns the released ids
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let kids: Vec<NodeId> = self.children(id).map(|(child, _)| child).collect();
        let mut released = Vec::new();
        for child in kids {
            if let Ok(ids) = self.release(child) {
                released.extend(ids);
            }
        }
        released
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Iterate over all descendants in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Inclusive ancestry check: `node` is `ancestor` or lies beneath it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map_or(NodeId::NONE, |n| n.parent);
        }
        false
    }

    /// Whether the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(NodeId::ROOT, id)
    }

    /// Deep-clone a subtree; the copy is detached
    pub fn clone_subtree(&mut self, id: NodeId) -> DomResult<NodeId> {
        let copy = self.node(id)?.detached_copy();
        let new_root = self.push(copy);

        let mut stack = vec![(id, new_root)];
        while let Some((source, target)) = stack.pop() {
            let kids: Vec<NodeId> = self.children(source).map(|(child, _)| child).collect();
            for child in kids {
                let copy = self.node(child)?.detached_copy();
                let cloned = self.push(copy);
                self.insert_before(target, cloned, NodeId::NONE)?;
                stack.push((child, cloned));
            }
        }
        Ok(new_root)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) | Some(NodeData::Comment(text)) => text.clone(),
            Some(_) => self
                .descendants(id)
                .filter_map(|(_, node)| node.as_text())
                .collect(),
            None => String::new(),
        }
    }

    /// Replace all children with a single text node; returns the released ids
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<Vec<NodeId>> {
        let node = self.get_mut(id).ok_or(DomError::NotFound(id))?;
        match &mut node.data {
            NodeData::Text(content) | NodeData::Comment(content) => {
                *content = text.to_string();
                Ok(Vec::new())
            }
            _ => {
                let released = self.clear_children(id);
                if !text.is_empty() {
                    let text_node = self.create_text(text);
                    self.append_child(id, text_node)?;
                }
                Ok(released)
            }
        }
    }
}

/// Iterator over a node's children
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

/// Pre-order iterator over a subtree, excluding its root
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
            }
        };
        Some((id, node))
    }
}
