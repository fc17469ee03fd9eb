//! Binding handlers, one per directive kind
//!
//! Each handler syncs the node from the signal once, then subscribes so the
//! sync repeats on every change. Bidirectional handlers also attach a node
//! listener that writes back into the signal only, never into the node.
//! Callbacks hold the document weakly: listeners live inside it.

use std::rc::{Rc, Weak};

use fos_dom::{DomEvent, Document, NodeId};
use serde_json::Value;

use crate::context::{BindingContext, WeakContext};
use crate::directive::Property;
use crate::value::{is_truthy, to_prop};
use crate::{BindingIssue, BindingScope, Signal};

/// `this="name"`: store the node under `name`
pub(crate) fn capture(ctx: &BindingContext, node: NodeId, name: &str) {
    ctx.registry_mut().register(name, node);
}

/// `bind:<prop>`, `bind:text` and `bind:html`
pub(crate) fn bind_property(
    ctx: &BindingContext,
    scope: &BindingScope,
    node: NodeId,
    property: &Property,
    signal: &Signal,
) {
    let doc = ctx.document();
    let weak_ctx = ctx.downgrade();
    signal.with(|value| apply_property(doc, &weak_ctx, node, property, value));

    let weak_doc = Rc::downgrade(doc);
    let prop = property.clone();
    scope.track_subscription(signal.subscribe(move |change| {
        if let Some(doc) = weak_doc.upgrade() {
            apply_property(&doc, &weak_ctx, node, &prop, change.new);
        }
    }));

    let writes_back = matches!(property, Property::Named(name) if name == "value")
        && doc
            .tag_name(node)
            .is_some_and(|tag| ctx.config().is_input_like(&tag));
    if writes_back {
        let weak_doc = Rc::downgrade(doc);
        let signal = signal.clone();
        let id = doc.add_event_listener(
            node,
            "input",
            Rc::new(move |_: &DomEvent| {
                if let Some(doc) = weak_doc.upgrade() {
                    signal.set(Value::String(doc.value(node)));
                }
            }),
        );
        scope.track_listener(doc, node, id);
    }
}

fn apply_property(doc: &Document, ctx: &WeakContext, node: NodeId, property: &Property, value: &Value) {
    let result = match property {
        Property::Text => doc.set_text_content(node, &to_prop(value).to_text()),
        Property::Html => {
            let markup = to_prop(value).to_text();
            if fos_html::inner_html(doc, node) == markup {
                return;
            }
            if let Err(err) = fos_html::set_inner_html(doc, node, &markup) {
                ctx.report(BindingIssue::Markup {
                    node,
                    message: err.to_string(),
                });
            }
            return;
        }
        Property::Named(name) => doc.set_property(node, name, to_prop(value)),
    };
    if let Err(err) = result {
        tracing::warn!("property sync on {} failed: {}", node, err);
    }
}

/// `class:<name>`: class present iff the signal is truthy
pub(crate) fn bind_class(ctx: &BindingContext, scope: &BindingScope, node: NodeId, class: &str, signal: &Signal) {
    let apply = {
        let class = class.to_string();
        move |doc: &Document, value: &Value| {
            if let Err(err) = doc.toggle_class(node, &class, Some(is_truthy(value))) {
                tracing::warn!("class sync on {} failed: {}", node, err);
            }
        }
    };
    bind_one_way(ctx, scope, signal, apply);
}

/// `if`: shown iff the signal is truthy
pub(crate) fn bind_if(ctx: &BindingContext, scope: &BindingScope, node: NodeId, signal: &Signal) {
    bind_one_way(ctx, scope, signal, move |doc: &Document, value: &Value| {
        if let Err(err) = doc.set_displayed(node, is_truthy(value)) {
            tracing::warn!("visibility sync on {} failed: {}", node, err);
        }
    });
}

fn bind_one_way(
    ctx: &BindingContext,
    scope: &BindingScope,
    signal: &Signal,
    apply: impl Fn(&Document, &Value) + 'static,
) {
    let doc = ctx.document();
    signal.with(|value| apply(doc.as_ref(), value));

    let weak_doc: Weak<Document> = Rc::downgrade(doc);
    scope.track_subscription(signal.subscribe(move |change| {
        if let Some(doc) = weak_doc.upgrade() {
            apply(doc.as_ref(), change.new);
        }
    }));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    /// Checked iff the node's value is in the signal's array
    Checkbox,
    /// Checked iff the node's value equals the signal
    Radio,
}

/// `bind:group` on a checkbox or radio
pub(crate) fn bind_group(ctx: &BindingContext, scope: &BindingScope, node: NodeId, signal: &Signal) {
    let doc = ctx.document();
    let kind = match doc.input_type(node).as_deref() {
        Some("checkbox") => GroupKind::Checkbox,
        Some("radio") => GroupKind::Radio,
        other => {
            tracing::debug!("bind:group on {} ignored: input type {:?}", node, other);
            return;
        }
    };

    signal.with(|value| sync_group(doc, node, kind, value));

    let weak_doc = Rc::downgrade(doc);
    scope.track_subscription(signal.subscribe(move |change| {
        if let Some(doc) = weak_doc.upgrade() {
            sync_group(&doc, node, kind, change.new);
        }
    }));

    let weak_doc = Rc::downgrade(doc);
    let target = signal.clone();
    let id = doc.add_event_listener(
        node,
        "change",
        Rc::new(move |_: &DomEvent| {
            let Some(doc) = weak_doc.upgrade() else {
                return;
            };
            let own = doc.value(node);
            match kind {
                GroupKind::Checkbox => {
                    let next = toggled_members(&target.get(), &own, doc.checked(node));
                    target.set(next);
                }
                GroupKind::Radio => {
                    if doc.checked(node) {
                        target.set(Value::String(own));
                    }
                }
            }
        }),
    );
    scope.track_listener(doc, node, id);
}

fn sync_group(doc: &Document, node: NodeId, kind: GroupKind, value: &Value) {
    let own = doc.value(node);
    let checked = match kind {
        GroupKind::Checkbox => value
            .as_array()
            .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(own.as_str()))),
        GroupKind::Radio => value.as_str() == Some(own.as_str()),
    };
    if let Err(err) = doc.set_checked(node, checked) {
        tracing::warn!("group sync on {} failed: {}", node, err);
    }
}

/// Set semantics over the current array: duplicates collapse (first wins),
/// then `own` is added or removed
fn toggled_members(current: &Value, own: &str, checked: bool) -> Value {
    let mut members: Vec<Value> = Vec::new();
    for item in current.as_array().into_iter().flatten() {
        if !members.contains(item) {
            members.push(item.clone());
        }
    }
    let own = Value::String(own.to_string());
    if checked {
        if !members.contains(&own) {
            members.push(own);
        }
    } else {
        members.retain(|m| m != &own);
    }
    Value::Array(members)
}
