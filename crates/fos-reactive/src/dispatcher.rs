//! Tree walker and directive dispatch
//!
//! Walks elements in document order with an explicit stack. For each element
//! the attributes are classified once; `this` is applied first, and a
//! `foreach` element is handed to the list reconciler alone and not
//! descended into (its other directives apply per rendered instance).

use fos_dom::{Attribute, NodeId, NodeType};

use crate::context::BindingContext;
use crate::directive::Directive;
use crate::registry::Entry;
use crate::{BindingIssue, BindingScope, handlers, list};

/// Which part of the document an activation pass scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Every element in the document
    Implicit,
    /// Every element, binding only those with the opt-in attribute
    Explicit,
    /// One sub-tree, root included, binding every element
    Scoped(NodeId),
}

impl Activation {
    /// Mode for the `(explicit, scope)` flag pair. A scope always wins.
    pub fn from_flags(explicit: bool, scope: Option<NodeId>) -> Self {
        match scope {
            Some(node) => Activation::Scoped(node),
            None if explicit => Activation::Explicit,
            None => Activation::Implicit,
        }
    }
}

/// Run one activation pass; returns the number of elements scanned
pub(crate) fn dispatch(ctx: &BindingContext, scope: &BindingScope, activation: Activation) -> usize {
    let doc = ctx.document().clone();
    let (roots, opt_in_only) = match activation {
        Activation::Implicit => (doc.children(doc.root()), false),
        Activation::Explicit => (doc.children(doc.root()), true),
        Activation::Scoped(node) => (vec![node], false),
    };
    let opt_in = ctx.config().opt_in_attribute.clone();

    let mut stack: Vec<NodeId> = roots.into_iter().rev().collect();
    let mut scanned = 0;
    while let Some(node) = stack.pop() {
        if doc.node_type(node) != Some(NodeType::Element) {
            continue;
        }
        scanned += 1;

        let descend = if opt_in_only && !doc.has_attribute_ignore_case(node, &opt_in) {
            true
        } else {
            bind_node(ctx, scope, node)
        };
        if descend {
            stack.extend(doc.children(node).into_iter().rev());
        }
    }

    tracing::debug!("{:?} activation scanned {} elements", activation, scanned);
    scanned
}

/// Apply every directive on `node`; returns whether to descend
fn bind_node(ctx: &BindingContext, scope: &BindingScope, node: NodeId) -> bool {
    let mut directives: Vec<(Attribute, Directive)> = ctx
        .document()
        .attributes(node)
        .into_iter()
        .filter_map(|attr| Directive::parse(&attr.name, &attr.value).map(|d| (attr, d)))
        .collect();

    if let Some(pos) = directives
        .iter()
        .position(|(_, d)| matches!(d, Directive::Foreach { .. }))
    {
        let (attr, directive) = directives.swap_remove(pos);
        apply(ctx, scope, node, &attr, &directive);
        return false;
    }

    directives.sort_by_key(|(_, d)| !d.is_capture());
    for (attr, directive) in &directives {
        apply(ctx, scope, node, attr, directive);
    }
    true
}

fn apply(ctx: &BindingContext, scope: &BindingScope, node: NodeId, attr: &Attribute, directive: &Directive) {
    let Some(name) = directive.signal_name() else {
        if let Directive::Capture { name } = directive {
            handlers::capture(ctx, node, name);
        }
        return;
    };

    let entry = ctx.registry().lookup(name).cloned();
    let signal = match entry {
        Some(Entry::Signal(signal)) => signal,
        Some(other) => {
            ctx.report(BindingIssue::NotASignal {
                node,
                attribute: attr.name.clone(),
                name: name.to_string(),
                kind: other.kind(),
            });
            return;
        }
        None => {
            ctx.report(BindingIssue::UnresolvedSignal {
                node,
                attribute: attr.name.clone(),
                name: name.to_string(),
            });
            return;
        }
    };

    if matches!(directive, Directive::Foreach { .. }) && ctx.document().parent(node).is_none() {
        ctx.report(BindingIssue::DetachedTemplate {
            node,
            name: name.to_string(),
        });
        return;
    }

    if !ctx.claim(scope, node, &attr.name, &attr.value) {
        tracing::trace!("{} `{}` already bound", node, attr.name);
        return;
    }

    match directive {
        Directive::Group { .. } => handlers::bind_group(ctx, scope, node, &signal),
        Directive::Property { property, .. } => handlers::bind_property(ctx, scope, node, property, &signal),
        Directive::Class { class, .. } => handlers::bind_class(ctx, scope, node, class, &signal),
        Directive::If { .. } => handlers::bind_if(ctx, scope, node, &signal),
        Directive::Foreach { .. } => list::bind_list(ctx, scope, node, name, &signal),
        Directive::Capture { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Signal};
    use fos_dom::Document;
    use std::rc::Rc;

    fn context(markup: &str, config: Config) -> BindingContext {
        let doc = fos_html::parse(markup).unwrap();
        BindingContext::new(Rc::new(doc), config)
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Activation::from_flags(false, None), Activation::Implicit);
        assert_eq!(Activation::from_flags(true, None), Activation::Explicit);
        assert_eq!(
            Activation::from_flags(true, Some(NodeId::ROOT)),
            Activation::Scoped(NodeId::ROOT)
        );
    }

    #[test]
    fn test_capture_precedes_other_directives() {
        let ctx = context(r#"<p if="shown" this="para"></p>"#, Config::default());
        ctx.registry_mut().register("shown", Signal::new(false));
        dispatch(&ctx, &BindingScope::new(), Activation::Implicit);

        let para = ctx.registry().node("para");
        assert!(para.is_some_and(|p| !ctx.document().is_displayed(p)));
    }

    #[test]
    fn test_explicit_binds_only_opted_in_nodes() {
        let ctx = context(
            r#"<div><p id="a" reactiveDom bind:text="msg"></p><p id="b" bind:text="msg"></p></div>"#,
            Config::default(),
        );
        ctx.registry_mut().register("msg", Signal::new("hi"));
        dispatch(&ctx, &BindingScope::new(), Activation::Explicit);

        let doc = ctx.document();
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        assert_eq!(doc.text_content(a), "hi");
        assert_eq!(doc.text_content(b), "");
    }

    #[test]
    fn test_redispatch_does_not_duplicate_subscriptions() {
        let ctx = context(r#"<p class:on="flag"></p>"#, Config::default());
        let flag = Signal::new(true);
        ctx.registry_mut().register("flag", flag.clone());

        let scope = BindingScope::new();
        dispatch(&ctx, &scope, Activation::Implicit);
        dispatch(&ctx, &scope, Activation::Implicit);
        assert_eq!(flag.subscriber_count(), 1);

        scope.dispose();
        dispatch(&ctx, &BindingScope::new(), Activation::Implicit);
        assert_eq!(flag.subscriber_count(), 1);
    }

    #[test]
    fn test_unresolved_and_wrong_kind_are_reported() {
        let config = Config {
            collect_diagnostics: true,
            ..Config::default()
        };
        let ctx = context(r#"<p if="missing"></p><p if="node"></p>"#, config);
        ctx.registry_mut().register("node", NodeId::ROOT);
        let scanned = dispatch(&ctx, &BindingScope::new(), Activation::Implicit);

        assert!(scanned >= 5);
        let issues = ctx.diagnostics();
        assert!(matches!(&issues[0], BindingIssue::UnresolvedSignal { name, .. } if name == "missing"));
        assert!(matches!(&issues[1], BindingIssue::NotASignal { kind: "node", .. }));
    }

    #[test]
    fn test_scoped_includes_root() {
        let doc = Rc::new(Document::new());
        let holder = doc.create_element("div");
        doc.set_attribute(holder, "if", "shown").unwrap();
        let ctx = BindingContext::new(doc.clone(), Config::default());
        ctx.registry_mut().register("shown", Signal::new(false));

        assert_eq!(dispatch(&ctx, &BindingScope::new(), Activation::Scoped(holder)), 1);
        assert!(!doc.is_displayed(holder));
    }
}
