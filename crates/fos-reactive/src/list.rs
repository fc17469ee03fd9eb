//! List reconciler for `foreach`
//!
//! On activation the node becomes a detached template and a comment anchor
//! takes its place. Every rebuild disposes and releases all rendered
//! instances, then clones the template once per element in order,
//! interpolates the clone, binds its event-handler attributes, dispatches
//! directives inside it and inserts it before the anchor.
//!
//! A change rebuilds the list when the value was replaced or its length
//! changed. An in-place update of equal length is skipped unless
//! `deep_list_compare` is set and the content differs.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fos_dom::{Document, DomEvent, NodeId, NodeType};
use serde_json::Value;

use crate::context::{BindingContext, WeakContext};
use crate::directive::FOREACH_ATTR;
use crate::dispatcher::{self, Activation};
use crate::interpolate::interpolate_with;
use crate::registry::Entry;
use crate::signal::WeakSignal;
use crate::{BindingIssue, BindingScope, Signal};

/// One rendered element and the bindings installed in it
struct Instance {
    node: NodeId,
    scope: BindingScope,
}

struct ListBinding {
    ctx: WeakContext,
    name: String,
    signal: WeakSignal,
    /// The element the directive was found on, detached
    source: NodeId,
    template: NodeId,
    anchor: NodeId,
    marker: String,
    instances: RefCell<Vec<Instance>>,
    rebuilding: Cell<bool>,
    dirty: Cell<bool>,
}

/// Turn `node` into a list template bound to `signal`
pub(crate) fn bind_list(ctx: &BindingContext, scope: &BindingScope, node: NodeId, name: &str, signal: &Signal) {
    let doc = ctx.document();
    let Some(parent) = doc.parent(node) else {
        ctx.report(BindingIssue::DetachedTemplate {
            node,
            name: name.to_string(),
        });
        return;
    };

    let template = match doc.clone_node(node) {
        Ok(template) => template,
        Err(err) => {
            tracing::warn!("foreach {}: template capture failed: {}", name, err);
            return;
        }
    };
    doc.remove_attribute(template, FOREACH_ATTR);

    let anchor = doc.create_comment(&format!(" foreach: {name} "));
    if let Err(err) = doc.insert_before(parent, anchor, node).and_then(|_| doc.remove(node)) {
        tracing::warn!("foreach {}: anchor insertion failed: {}", name, err);
        return;
    }

    let binding = Rc::new(ListBinding {
        ctx: ctx.downgrade(),
        name: name.to_string(),
        signal: signal.downgrade(),
        source: node,
        template,
        anchor,
        marker: ctx.next_marker(name),
        instances: RefCell::new(Vec::new()),
        rebuilding: Cell::new(false),
        dirty: Cell::new(false),
    });
    binding.rebuild();

    let deep = ctx.config().deep_list_compare;
    let on_change = binding.clone();
    let subscription = signal.subscribe(move |change| {
        if change.replaced || change.length_changed() || (deep && change.old != change.new) {
            on_change.rebuild();
        }
    });

    scope.on_dispose(move || {
        subscription.unsubscribe();
        binding.dispose_instances();
        binding.release_templates();
    });
}

impl ListBinding {
    fn rebuild(&self) {
        // A change raised while rendering is applied once the pass ends.
        if self.rebuilding.replace(true) {
            self.dirty.set(true);
            return;
        }
        loop {
            self.dirty.set(false);
            self.render();
            if !self.dirty.get() {
                break;
            }
        }
        self.rebuilding.set(false);
    }

    fn render(&self) {
        let (Some(ctx), Some(signal)) = (self.ctx.upgrade(), self.signal.upgrade()) else {
            return;
        };
        let doc = ctx.document().clone();

        self.dispose_instances();
        let Some(parent) = doc.parent(self.anchor) else {
            return;
        };

        let items = match signal.get() {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            _ => {
                ctx.report(BindingIssue::NotASequence {
                    name: self.name.clone(),
                });
                Vec::new()
            }
        };

        let mut instances = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(instance) = self.render_item(&ctx, &doc, &signal, parent, index, item) {
                instances.push(instance);
            }
        }

        tracing::debug!("foreach {}: rendered {} instances", self.marker, instances.len());
        *self.instances.borrow_mut() = instances;
    }

    fn render_item(
        &self,
        ctx: &BindingContext,
        doc: &Rc<Document>,
        signal: &Signal,
        parent: NodeId,
        index: usize,
        item: &Value,
    ) -> Option<Instance> {
        let clone = match doc.clone_node(self.template) {
            Ok(clone) => clone,
            Err(err) => {
                tracing::warn!("foreach {}: clone failed: {}", self.name, err);
                return None;
            }
        };
        if let Err(err) = doc.set_attribute(clone, &ctx.config().marker_attribute, &self.marker) {
            tracing::warn!("foreach {}: marking {} failed: {}", self.name, clone, err);
        }

        let scope = BindingScope::new();
        self.prepare(ctx, doc, signal, &scope, clone, index, item);
        dispatcher::dispatch(ctx, &scope, Activation::Scoped(clone));

        if let Err(err) = doc.insert_before(parent, clone, self.anchor) {
            tracing::warn!("foreach {}: insertion failed: {}", self.name, err);
            scope.dispose();
            let _ = doc.release(clone);
            return None;
        }
        Some(Instance { node: clone, scope })
    }

    /// Interpolate text and attributes and attach event handlers.
    ///
    /// Nested list templates keep their content for their own pass; only
    /// their `foreach` value is interpolated here.
    #[allow(clippy::too_many_arguments)]
    fn prepare(
        &self,
        ctx: &BindingContext,
        doc: &Rc<Document>,
        signal: &Signal,
        scope: &BindingScope,
        root: NodeId,
        index: usize,
        item: &Value,
    ) {
        let report_missing = |path: &str| {
            ctx.report(BindingIssue::MissingPath {
                path: path.to_string(),
                index,
            })
        };

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match doc.node_type(node) {
                Some(NodeType::Text) => {
                    let Some(text) = doc.text(node) else {
                        continue;
                    };
                    if let Cow::Owned(out) = interpolate_with(&text, item, index, report_missing) {
                        let _ = doc.set_text_content(node, &out);
                    }
                }
                Some(NodeType::Element) => {
                    let nested = node != root && doc.has_attribute(node, FOREACH_ATTR);
                    for attr in doc.attributes(node) {
                        if nested && attr.name != FOREACH_ATTR {
                            continue;
                        }
                        if !nested {
                            if let Some(event) = self.event_name(ctx, &attr.name) {
                                self.attach_handler(ctx, doc, signal, scope, node, &attr.name, &event, &attr.value, index, item);
                                continue;
                            }
                        }
                        if let Cow::Owned(out) = interpolate_with(&attr.value, item, index, report_missing) {
                            let _ = doc.set_attribute(node, &attr.name, &out);
                        }
                    }
                    if !nested {
                        stack.extend(doc.children(node).into_iter().rev());
                    }
                }
                _ => {}
            }
        }
    }

    /// Event type for an event-handler attribute (`onClick` → `click`)
    fn event_name(&self, ctx: &BindingContext, attribute: &str) -> Option<String> {
        let prefix = &ctx.config().event_prefix;
        let head = attribute.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) || attribute.len() == prefix.len() {
            return None;
        }
        Some(attribute[prefix.len()..].to_ascii_lowercase())
    }

    #[allow(clippy::too_many_arguments)]
    fn attach_handler(
        &self,
        ctx: &BindingContext,
        doc: &Rc<Document>,
        signal: &Signal,
        scope: &BindingScope,
        node: NodeId,
        attribute: &str,
        event: &str,
        name: &str,
        index: usize,
        item: &Value,
    ) {
        let entry = ctx.registry().lookup(name).cloned();
        let handler = match entry {
            Some(Entry::Handler(handler)) => handler,
            Some(other) => {
                ctx.report(BindingIssue::NotCallable {
                    node,
                    attribute: attribute.to_string(),
                    name: name.to_string(),
                    kind: other.kind(),
                });
                return;
            }
            None => {
                ctx.report(BindingIssue::UnresolvedHandler {
                    node,
                    attribute: attribute.to_string(),
                    name: name.to_string(),
                });
                return;
            }
        };

        let signal = signal.downgrade();
        let item = item.clone();
        let id = doc.add_event_listener(
            node,
            event,
            Rc::new(move |e: &DomEvent| {
                if let Some(signal) = signal.upgrade() {
                    handler(e, index, &item, &signal);
                }
            }),
        );
        scope.track_listener(doc, node, id);
    }

    /// Dispose every instance's bindings and release every node carrying
    /// this list's marker
    fn dispose_instances(&self) {
        let old = std::mem::take(&mut *self.instances.borrow_mut());
        let Some(ctx) = self.ctx.upgrade() else {
            return;
        };
        let doc = ctx.document();

        let mut stale: Vec<NodeId> = Vec::with_capacity(old.len());
        for instance in old {
            instance.scope.dispose();
            stale.push(instance.node);
        }
        for node in doc.query_attribute(doc.root(), &ctx.config().marker_attribute, &self.marker) {
            if !stale.contains(&node) {
                stale.push(node);
            }
        }
        for node in stale {
            // Already gone when nested in an instance released before it
            let _ = doc.release(node);
        }
    }

    /// Free the detached template and its source once the list is torn down
    fn release_templates(&self) {
        let Some(ctx) = self.ctx.upgrade() else {
            return;
        };
        let doc = ctx.document();
        for node in [self.template, self.source] {
            if doc.parent(node).is_none() {
                let _ = doc.release(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use serde_json::json;

    fn list_fixture(template_text: &str) -> (BindingContext, NodeId, NodeId) {
        let ctx = BindingContext::new(Rc::new(Document::new()), Config::default());
        let doc = ctx.document();
        let ul = doc.create_element("ul");
        doc.append_child(doc.body(), ul).unwrap();
        let li = doc.create_element("li");
        doc.set_attribute(li, FOREACH_ATTR, "items").unwrap();
        let text = doc.create_text(template_text);
        doc.append_child(li, text).unwrap();
        doc.append_child(ul, li).unwrap();
        (ctx, ul, li)
    }

    fn rendered(ctx: &BindingContext, ul: NodeId) -> Vec<String> {
        let doc = ctx.document();
        doc.element_children(ul).into_iter().map(|li| doc.text_content(li)).collect()
    }

    #[test]
    fn test_template_replaced_by_anchor() {
        let (ctx, ul, li) = list_fixture("${item}");
        let items = Signal::new(json!([]));
        bind_list(&ctx, &BindingScope::new(), li, "items", &items);

        let doc = ctx.document();
        assert!(!doc.is_connected(li));
        let children = doc.children(ul);
        assert_eq!(children.len(), 1);
        assert_eq!(doc.node_type(children[0]), Some(NodeType::Comment));
    }

    #[test]
    fn test_rebuild_rules() {
        let (ctx, ul, li) = list_fixture("${index}:${item}");
        let items = Signal::new(json!(["a", "b"]));
        bind_list(&ctx, &BindingScope::new(), li, "items", &items);
        assert_eq!(rendered(&ctx, ul), vec!["0:a", "1:b"]);
        let first = ctx.document().element_children(ul)[0];

        // same length, in place: skipped
        items.update(|v| v[0] = json!("z"));
        assert_eq!(rendered(&ctx, ul), vec!["0:a", "1:b"]);
        assert_eq!(ctx.document().element_children(ul)[0], first);

        // replaced by an equal array: rebuilt
        items.set(json!(["z", "b"]));
        assert_eq!(rendered(&ctx, ul), vec!["0:z", "1:b"]);
        assert_ne!(ctx.document().element_children(ul)[0], first);
        assert!(!ctx.document().is_connected(first));

        // in place, length changed: rebuilt
        items.update(|v| {
            if let Some(list) = v.as_array_mut() {
                list.push(json!("c"));
            }
        });
        assert_eq!(rendered(&ctx, ul), vec!["0:z", "1:b", "2:c"]);
    }

    #[test]
    fn test_deep_compare_catches_in_place_edits() {
        let config = Config {
            deep_list_compare: true,
            ..Config::default()
        };
        let ctx = BindingContext::new(Rc::new(Document::new()), config);
        let doc = ctx.document();
        let ul = doc.create_element("ul");
        doc.append_child(doc.body(), ul).unwrap();
        let li = doc.create_element("li");
        let text = doc.create_text("${item}");
        doc.append_child(li, text).unwrap();
        doc.append_child(ul, li).unwrap();

        let items = Signal::new(json!(["a"]));
        bind_list(&ctx, &BindingScope::new(), li, "items", &items);
        items.update(|v| v[0] = json!("b"));
        assert_eq!(rendered(&ctx, ul), vec!["b"]);
    }

    #[test]
    fn test_instances_carry_marker() {
        let (ctx, ul, li) = list_fixture("${item}");
        let items = Signal::new(json!([1, 2]));
        bind_list(&ctx, &BindingScope::new(), li, "items", &items);
        let doc = ctx.document();
        for node in doc.element_children(ul) {
            assert_eq!(doc.get_attribute(node, "data-foreach").as_deref(), Some("items#0"));
            assert!(!doc.has_attribute(node, FOREACH_ATTR));
        }
    }

    #[test]
    fn test_non_sequence_renders_nothing() {
        let (ctx, ul, li) = list_fixture("${item}");
        let items = Signal::new(json!(["a"]));
        bind_list(&ctx, &BindingScope::new(), li, "items", &items);
        items.set("oops");
        assert!(rendered(&ctx, ul).is_empty());
        items.set(json!(["x"]));
        assert_eq!(rendered(&ctx, ul), vec!["x"]);
    }

    #[test]
    fn test_scope_dispose_removes_instances_and_subscription() {
        let (ctx, ul, li) = list_fixture("${item}");
        let items = Signal::new(json!(["a", "b"]));
        let scope = BindingScope::new();
        bind_list(&ctx, &scope, li, "items", &items);
        assert_eq!(items.subscriber_count(), 1);

        scope.dispose();
        assert_eq!(items.subscriber_count(), 0);
        assert!(rendered(&ctx, ul).is_empty());
    }

    #[test]
    fn test_event_name_strips_prefix() {
        let (ctx, _, li) = list_fixture("");
        let binding = ListBinding {
            ctx: ctx.downgrade(),
            name: "items".into(),
            signal: Signal::new(json!([])).downgrade(),
            source: li,
            template: li,
            anchor: li,
            marker: "items#0".into(),
            instances: RefCell::new(Vec::new()),
            rebuilding: Cell::new(false),
            dirty: Cell::new(false),
        };
        assert_eq!(binding.event_name(&ctx, "onclick").as_deref(), Some("click"));
        assert_eq!(binding.event_name(&ctx, "onKeyDown").as_deref(), Some("keydown"));
        assert_eq!(binding.event_name(&ctx, "on"), None);
        assert_eq!(binding.event_name(&ctx, "class:on"), None);
    }
}
