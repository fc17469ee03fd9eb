//! Document - High-level document API
//!
//! Shared handle over a [`DomTree`] plus per-node event listeners. All
//! methods take `&self`; the tree is borrowed only inside each call, and
//! listeners run with no borrow held.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;

use crate::events::Listener;
use crate::{
    Attribute, DOMTokenList, DomError, DomEvent, DomResult, DomTree, EventCallback, ListenerId,
    NodeData, NodeId, NodeType, PropValue,
};

/// Properties stored as booleans whatever value is written
const BOOLEAN_PROPERTIES: &[&str] = &[
    "checked", "disabled", "hidden", "multiple", "open", "readonly", "required", "selected",
];

/// HTML Document
pub struct Document {
    tree: RefCell<DomTree>,
    listeners: RefCell<HashMap<NodeId, Vec<Listener>>>,
    next_listener: Cell<u64>,
    html_element: Cell<NodeId>,
    head_element: Cell<NodeId>,
    body_element: Cell<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.borrow().len())
            .field("body", &self.body_element.get())
            .finish()
    }
}

impl Document {
    /// Create a document with `html`, `head` and `body`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        let linked = tree
            .append_child(tree.root(), html)
            .and_then(|_| tree.append_child(html, head))
            .and_then(|_| tree.append_child(html, body));
        debug_assert!(linked.is_ok());

        let doc = Self::from_tree(tree);
        doc.html_element.set(html);
        doc.head_element.set(head);
        doc.body_element.set(body);
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty() -> Self {
        Self::from_tree(DomTree::new())
    }

    fn from_tree(tree: DomTree) -> Self {
        Self {
            tree: RefCell::new(tree),
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
            html_element: Cell::new(NodeId::NONE),
            head_element: Cell::new(NodeId::NONE),
            body_element: Cell::new(NodeId::NONE),
        }
    }

    /// Locate `html`, `head` and `body` after the tree was built externally
    pub fn finalize(&self) {
        let tree = self.tree.borrow();
        for (id, node) in tree.descendants(tree.root()) {
            let Some(elem) = node.as_element() else {
                continue;
            };
            let slot = match elem.tag.as_str() {
                "html" => &self.html_element,
                "head" => &self.head_element,
                "body" => &self.body_element,
                _ => continue,
            };
            if !slot.get().is_valid() {
                slot.set(id);
            }
        }
    }

    /// Access the DOM tree
    pub fn tree(&self) -> Ref<'_, DomTree> {
        self.tree.borrow()
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&self) -> RefMut<'_, DomTree> {
        self.tree.borrow_mut()
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element.get()
    }

    /// Get `<head>` element
    pub fn head(&self) -> NodeId {
        self.head_element.get()
    }

    /// Get `<body>` element
    pub fn body(&self) -> NodeId {
        self.body_element.get()
    }

    // --- structure -------------------------------------------------------

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree.borrow_mut().create_element(tag)
    }

    pub fn create_text(&self, content: &str) -> NodeId {
        self.tree.borrow_mut().create_text(content)
    }

    pub fn create_comment(&self, content: &str) -> NodeId {
        self.tree.borrow_mut().create_comment(content)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.tree.borrow_mut().append_child(parent, child)
    }

    /// Insert before `reference`; appends when `reference` is NONE
    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: NodeId) -> DomResult<()> {
        self.tree.borrow_mut().insert_before(parent, child, reference)
    }

    /// Detach a node from its parent
    pub fn remove(&self, node: NodeId) -> DomResult<()> {
        self.tree.borrow_mut().remove(node)
    }

    /// Detach a node and free its subtree along with its listeners.
    ///
    /// Ids inside the subtree are stale afterwards.
    pub fn release(&self, node: NodeId) -> DomResult<()> {
        let released = self.tree.borrow_mut().release(node)?;
        self.forget_listeners(&released);
        Ok(())
    }

    /// Release every child of a node
    pub fn clear_children(&self, node: NodeId) {
        let released = self.tree.borrow_mut().clear_children(node);
        self.forget_listeners(&released);
    }

    fn forget_listeners(&self, released: &[NodeId]) {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.is_empty() {
            return;
        }
        for node in released {
            listeners.remove(node);
        }
    }

    /// Deep clone; listeners are not copied and the clone is detached
    pub fn clone_node(&self, node: NodeId) -> DomResult<NodeId> {
        self.tree.borrow_mut().clone_subtree(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.borrow().get(node).is_some()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.borrow().is_connected(node)
    }

    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.tree.borrow().get(node).map(|n| n.node_type())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree
            .borrow()
            .get(node)
            .map(|n| n.parent)
            .filter(|p| p.is_valid())
    }

    /// Snapshot of direct children
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.borrow().children(node).map(|(id, _)| id).collect()
    }

    /// Snapshot of element children
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .borrow()
            .children(node)
            .filter(|(_, n)| n.is_element())
            .map(|(id, _)| id)
            .collect()
    }

    /// Snapshot of all descendants in document order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.borrow().descendants(node).map(|(id, _)| id).collect()
    }

    // --- attributes ------------------------------------------------------

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .map(|e| e.tag.clone())
    }

    /// `type` of an `<input>`, lower-cased
    pub fn input_type(&self, node: NodeId) -> Option<String> {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .and_then(|e| e.input_type())
    }

    /// Snapshot of attributes in source order
    pub fn attributes(&self, node: NodeId) -> Vec<Attribute> {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .map(|e| e.attrs.clone())
            .unwrap_or_default()
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .and_then(|e| e.get_attr(name))
            .map(str::to_string)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .is_some_and(|e| e.get_attr(name).is_some())
    }

    /// Attribute presence ignoring ASCII case of the name
    pub fn has_attribute_ignore_case(&self, node: NodeId, name: &str) -> bool {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .is_some_and(|e| e.has_attr_ignore_case(name))
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let mut tree = self.tree.borrow_mut();
        let elem = tree
            .get_mut(node)
            .and_then(|n| n.as_element_mut())
            .ok_or(DomError::NotFound(node))?;
        elem.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .borrow_mut()
            .get_mut(node)
            .and_then(|n| n.as_element_mut())
            .and_then(|e| e.remove_attr(name))
    }

    /// Descendants of `scope` whose attribute `name` equals `value`
    pub fn query_attribute(&self, scope: NodeId, name: &str, value: &str) -> Vec<NodeId> {
        self.tree
            .borrow()
            .descendants(scope)
            .filter(|(_, n)| {
                n.as_element()
                    .and_then(|e| e.get_attr(name))
                    .is_some_and(|v| v == value)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Get element by `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(tree.root())
            .find(|(_, n)| n.as_element().and_then(|e| e.get_attr("id")) == Some(id))
            .map(|(node, _)| node)
    }

    // --- class list ------------------------------------------------------

    pub fn class_list(&self, node: NodeId) -> DOMTokenList {
        DOMTokenList::from_string(&self.get_attribute(node, "class").unwrap_or_default())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).contains(class)
    }

    /// Toggle a class; returns whether it is now present
    pub fn toggle_class(&self, node: NodeId, class: &str, force: Option<bool>) -> DomResult<bool> {
        let mut list = self.class_list(node);
        let before = list.clone();
        let present = list.toggle(class, force);
        if list != before {
            self.set_attribute(node, "class", &list.value())?;
        }
        Ok(present)
    }

    // --- properties ------------------------------------------------------

    /// Read a property. `value` and boolean properties fall back to their
    /// attributes.
    pub fn property(&self, node: NodeId, name: &str) -> Option<PropValue> {
        let tree = self.tree.borrow();
        let elem = tree.get(node)?.as_element()?;
        if let Some(value) = elem.props.get(name) {
            return Some(value.clone());
        }
        match name {
            "value" => Some(PropValue::Str(
                elem.get_attr("value").unwrap_or_default().to_string(),
            )),
            _ if BOOLEAN_PROPERTIES.contains(&name) => Some(PropValue::Bool(elem.get_attr(name).is_some())),
            _ => None,
        }
    }

    /// Write a property; returns false when the value was already equal.
    ///
    /// `value` is coerced to a string and boolean properties (`checked`,
    /// `disabled`, ...) by truthiness.
    pub fn set_property(&self, node: NodeId, name: &str, value: PropValue) -> DomResult<bool> {
        let value = match name {
            "value" => PropValue::Str(value.to_text()),
            _ if BOOLEAN_PROPERTIES.contains(&name) => PropValue::Bool(value.is_truthy()),
            _ => value,
        };
        if self.property(node, name).as_ref() == Some(&value) {
            return Ok(false);
        }
        let mut tree = self.tree.borrow_mut();
        let elem = tree
            .get_mut(node)
            .and_then(|n| n.as_element_mut())
            .ok_or(DomError::NotFound(node))?;
        elem.props.insert(name.to_string(), value);
        Ok(true)
    }

    /// Current `value` property as text
    pub fn value(&self, node: NodeId) -> String {
        self.property(node, "value")
            .map(|v| v.to_text())
            .unwrap_or_default()
    }

    pub fn set_value(&self, node: NodeId, value: &str) -> DomResult<bool> {
        self.set_property(node, "value", PropValue::from(value))
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.property(node, "checked").is_some_and(|v| v.is_truthy())
    }

    pub fn set_checked(&self, node: NodeId, checked: bool) -> DomResult<bool> {
        self.set_property(node, "checked", PropValue::Bool(checked))
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.tree.borrow().text_content(node)
    }

    /// Replace children with one text node; no-op when the text is unchanged
    pub fn set_text_content(&self, node: NodeId, text: &str) -> DomResult<bool> {
        if self.text_content(node) == text {
            return Ok(false);
        }
        let released = self.tree.borrow_mut().set_text_content(node, text)?;
        self.forget_listeners(&released);
        Ok(true)
    }

    // --- visibility ------------------------------------------------------

    /// `false` when the element is hidden (`display: none`)
    pub fn is_displayed(&self, node: NodeId) -> bool {
        self.tree
            .borrow()
            .get(node)
            .and_then(|n| n.as_element())
            .is_none_or(|e| e.displayed)
    }

    /// Show or hide an element without detaching it
    pub fn set_displayed(&self, node: NodeId, displayed: bool) -> DomResult<bool> {
        let mut tree = self.tree.borrow_mut();
        let elem = tree
            .get_mut(node)
            .and_then(|n| n.as_element_mut())
            .ok_or(DomError::NotFound(node))?;
        let changed = elem.displayed != displayed;
        elem.displayed = displayed;
        Ok(changed)
    }

    // --- events ----------------------------------------------------------

    /// Attach a listener for `event_type` on `node`
    pub fn add_event_listener(&self, node: NodeId, event_type: &str, callback: EventCallback) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().entry(node).or_default().push(Listener {
            id,
            event_type: event_type.to_string(),
            callback,
        });
        id
    }

    /// Detach a listener; returns false if it was not attached
    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = before != list.len();
        if list.is_empty() {
            listeners.remove(&node);
        }
        removed
    }

    /// Number of listeners attached to a node
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.borrow().get(&node).map_or(0, Vec::len)
    }

    /// Total number of attached listeners
    pub fn total_listener_count(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }

    fn is_attached(&self, node: NodeId, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(&node)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    /// Dispatch a bubbling event at `target`
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> DomEvent {
        let event = DomEvent::new(event_type, target);
        self.dispatch(&event);
        event
    }

    /// Dispatch a prepared event: target first, then ancestors if it bubbles
    pub fn dispatch(&self, event: &DomEvent) {
        let path: Vec<NodeId> = {
            let tree = self.tree.borrow();
            let mut path = Vec::new();
            let mut current = event.target;
            while current.is_valid() && tree.get(current).is_some() {
                path.push(current);
                if !event.bubbles {
                    break;
                }
                current = tree.get(current).map_or(NodeId::NONE, |n| n.parent);
            }
            path
        };

        tracing::trace!("dispatch {} at {} ({} hops)", event.event_type, event.target, path.len());

        for node in path {
            let matching: Vec<(ListenerId, EventCallback)> = self
                .listeners
                .borrow()
                .get(&node)
                .map(|list| {
                    list.iter()
                        .filter(|l| l.event_type == event.event_type)
                        .map(|l| (l.id, l.callback.clone()))
                        .collect()
                })
                .unwrap_or_default();

            event.set_current_target(node);
            for (id, callback) in matching {
                // A listener removed by an earlier one in this pass is skipped.
                if self.is_attached(node, id) {
                    callback(event);
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
    }

    // --- user interaction ------------------------------------------------

    /// Simulate typing: set `value` then dispatch `input`
    pub fn input(&self, node: NodeId, text: &str) -> DomResult<()> {
        self.set_value(node, text)?;
        self.dispatch_event(node, "input");
        Ok(())
    }

    /// Simulate a click, toggling checkboxes and selecting radios.
    ///
    /// When the checked state changes, `input` and `change` follow `click`.
    pub fn click(&self, node: NodeId) -> DomResult<()> {
        let toggled = match self.input_type(node).as_deref() {
            Some("checkbox") => {
                let checked = self.checked(node);
                self.set_checked(node, !checked)?
            }
            Some("radio") if !self.checked(node) => {
                for other in self.radio_group(node) {
                    if other != node {
                        self.set_checked(other, false)?;
                    }
                }
                self.set_checked(node, true)?
            }
            _ => false,
        };

        self.dispatch_event(node, "click");
        if toggled {
            self.dispatch_event(node, "input");
            self.dispatch_event(node, "change");
        }
        Ok(())
    }

    /// Radios sharing `node`'s `name` within the same tree
    fn radio_group(&self, node: NodeId) -> Vec<NodeId> {
        let Some(name) = self.get_attribute(node, "name") else {
            return vec![node];
        };
        let tree = self.tree.borrow();
        let mut top = node;
        while let Some(parent) = tree.get(top).map(|n| n.parent).filter(|p| p.is_valid()) {
            top = parent;
        }
        tree.descendants(top)
            .filter(|(_, n)| {
                n.as_element().is_some_and(|e| {
                    e.input_type().as_deref() == Some("radio") && e.get_attr("name") == Some(name.as_str())
                })
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Text of a text node, if `node` is one
    pub fn text(&self, node: NodeId) -> Option<String> {
        match self.tree.borrow().get(node).map(|n| &n.data) {
            Some(NodeData::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn body_with(doc: &Document, tag: &str) -> NodeId {
        let node = doc.create_element(tag);
        doc.append_child(doc.body(), node).unwrap();
        node
    }

    #[test]
    fn test_document_structure() {
        let doc = Document::new();
        assert!(doc.document_element().is_valid());
        assert_eq!(doc.parent(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.tag_name(doc.head()).as_deref(), Some("head"));
    }

    #[test]
    fn test_set_property_reports_unchanged() {
        let doc = Document::new();
        let input = body_with(&doc, "input");
        assert!(doc.set_value(input, "a").unwrap());
        assert!(!doc.set_value(input, "a").unwrap());
        assert!(doc.set_property(input, "value", PropValue::Number(4.0)).unwrap());
        assert_eq!(doc.value(input), "4");
    }

    #[test]
    fn test_boolean_properties_coerce_by_truthiness() {
        let doc = Document::new();
        let input = body_with(&doc, "input");
        doc.set_property(input, "checked", PropValue::Number(0.0)).unwrap();
        assert_eq!(doc.property(input, "checked"), Some(PropValue::Bool(false)));
        doc.set_property(input, "disabled", PropValue::Number(1.0)).unwrap();
        assert_eq!(doc.property(input, "disabled"), Some(PropValue::Bool(true)));
        doc.set_property(input, "disabled", PropValue::Null).unwrap();
        assert_eq!(doc.property(input, "disabled"), Some(PropValue::Bool(false)));
        assert_eq!(doc.property(input, "hidden"), Some(PropValue::Bool(false)));
    }

    #[test]
    fn test_value_and_checked_fall_back_to_attributes() {
        let doc = Document::new();
        let input = body_with(&doc, "input");
        doc.set_attribute(input, "value", "x").unwrap();
        doc.set_attribute(input, "checked", "").unwrap();
        assert_eq!(doc.value(input), "x");
        assert!(doc.checked(input));
    }

    #[test]
    fn test_toggle_class_rewrites_attribute() {
        let doc = Document::new();
        let div = body_with(&doc, "div");
        doc.set_attribute(div, "class", "a").unwrap();
        assert!(doc.toggle_class(div, "b", Some(true)).unwrap());
        assert_eq!(doc.get_attribute(div, "class").as_deref(), Some("a b"));
        assert!(!doc.toggle_class(div, "a", Some(false)).unwrap());
        assert_eq!(doc.get_attribute(div, "class").as_deref(), Some("b"));
    }

    #[test]
    fn test_event_bubbles_until_stopped() {
        let doc = Document::new();
        let outer = body_with(&doc, "div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for node in [inner, outer, doc.body()] {
            let seen = seen.clone();
            doc.add_event_listener(
                node,
                "click",
                Rc::new(move |e: &DomEvent| {
                    seen.borrow_mut().push(e.current_target());
                    if e.current_target() == outer {
                        e.stop_propagation();
                    }
                }),
            );
        }

        doc.dispatch_event(inner, "click");
        assert_eq!(*seen.borrow(), vec![inner, outer]);
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let doc = Rc::new(Document::new());
        let button = body_with(&doc, "button");
        let weak = Rc::downgrade(&doc);
        doc.add_event_listener(
            button,
            "click",
            Rc::new(move |e: &DomEvent| {
                if let Some(doc) = weak.upgrade() {
                    doc.remove(e.target).unwrap();
                }
            }),
        );
        doc.click(button).unwrap();
        assert!(!doc.is_connected(button));
    }

    #[test]
    fn test_removed_listener_is_not_invoked() {
        let doc = Rc::new(Document::new());
        let button = body_with(&doc, "button");
        let hits = Rc::new(Cell::new(0));

        let second = {
            let hits = hits.clone();
            Rc::new(move |_: &DomEvent| hits.set(hits.get() + 1)) as EventCallback
        };
        let weak = Rc::downgrade(&doc);
        let second_id = Rc::new(Cell::new(None));
        let id_slot = second_id.clone();
        doc.add_event_listener(
            button,
            "click",
            Rc::new(move |e: &DomEvent| {
                if let (Some(doc), Some(id)) = (weak.upgrade(), id_slot.get()) {
                    doc.remove_event_listener(e.target, id);
                }
            }),
        );
        second_id.set(Some(doc.add_event_listener(button, "click", second)));

        doc.dispatch_event(button, "click");
        assert_eq!(hits.get(), 0);
        assert_eq!(doc.listener_count(button), 1);
    }

    #[test]
    fn test_click_checkbox_fires_change() {
        let doc = Document::new();
        let input = body_with(&doc, "input");
        doc.set_attribute(input, "type", "checkbox").unwrap();
        let changes = Rc::new(Cell::new(0));
        let counter = changes.clone();
        doc.add_event_listener(input, "change", Rc::new(move |_: &DomEvent| counter.set(counter.get() + 1)));

        doc.click(input).unwrap();
        assert!(doc.checked(input));
        doc.click(input).unwrap();
        assert!(!doc.checked(input));
        assert_eq!(changes.get(), 2);
    }

    #[test]
    fn test_click_radio_unchecks_group() {
        let doc = Document::new();
        let radios: Vec<_> = (0..2)
            .map(|_| {
                let r = body_with(&doc, "input");
                doc.set_attribute(r, "type", "radio").unwrap();
                doc.set_attribute(r, "name", "size").unwrap();
                r
            })
            .collect();

        doc.click(radios[0]).unwrap();
        doc.click(radios[1]).unwrap();
        assert!(!doc.checked(radios[0]));
        assert!(doc.checked(radios[1]));
    }

    #[test]
    fn test_query_attribute_and_visibility() {
        let doc = Document::new();
        let a = body_with(&doc, "li");
        let b = body_with(&doc, "li");
        doc.set_attribute(a, "data-foreach", "items").unwrap();
        doc.set_attribute(b, "data-foreach", "other").unwrap();
        assert_eq!(doc.query_attribute(doc.root(), "data-foreach", "items"), vec![a]);

        assert!(doc.is_displayed(a));
        assert!(doc.set_displayed(a, false).unwrap());
        assert!(!doc.is_displayed(a));
        assert!(doc.is_connected(a));
    }
}
