//! Binding context shared by the dispatcher, handlers and list bindings
//!
//! Owns the document handle, the registry and the configuration. Callbacks
//! installed on signals and listeners hold a [`WeakContext`] so that the
//! registry (which owns the signals) never keeps itself alive.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use fos_dom::{Document, NodeId};

use crate::{BindingIssue, BindingScope, Config, Registry};

/// Key of an installed binding: node, attribute name, attribute value
type BoundKey = (NodeId, String, String);

struct ContextInner {
    document: Rc<Document>,
    registry: RefCell<Registry>,
    config: Config,
    bound: RefCell<HashSet<BoundKey>>,
    diagnostics: RefCell<Vec<BindingIssue>>,
    markers: Cell<u64>,
}

#[derive(Clone)]
pub(crate) struct BindingContext {
    inner: Rc<ContextInner>,
}

#[derive(Clone)]
pub(crate) struct WeakContext {
    inner: Weak<ContextInner>,
}

impl WeakContext {
    pub(crate) fn upgrade(&self) -> Option<BindingContext> {
        self.inner.upgrade().map(|inner| BindingContext { inner })
    }

    /// Report through the context, or only log once it is gone
    pub(crate) fn report(&self, issue: BindingIssue) {
        match self.upgrade() {
            Some(ctx) => ctx.report(issue),
            None => tracing::warn!("binding skipped: {}", issue),
        }
    }
}

impl BindingContext {
    pub(crate) fn new(document: Rc<Document>, config: Config) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                document,
                registry: RefCell::new(Registry::new()),
                config,
                bound: RefCell::new(HashSet::new()),
                diagnostics: RefCell::new(Vec::new()),
                markers: Cell::new(0),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakContext {
        WeakContext {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn document(&self) -> &Rc<Document> {
        &self.inner.document
    }

    pub(crate) fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn registry(&self) -> Ref<'_, Registry> {
        self.inner.registry.borrow()
    }

    pub(crate) fn registry_mut(&self) -> RefMut<'_, Registry> {
        self.inner.registry.borrow_mut()
    }

    /// Log a binding that did not activate
    pub(crate) fn report(&self, issue: BindingIssue) {
        tracing::debug!("binding skipped: {}", issue);
        if self.inner.config.collect_diagnostics {
            self.inner.diagnostics.borrow_mut().push(issue);
        }
    }

    pub(crate) fn diagnostics(&self) -> Vec<BindingIssue> {
        self.inner.diagnostics.borrow().clone()
    }

    pub(crate) fn take_diagnostics(&self) -> Vec<BindingIssue> {
        std::mem::take(&mut *self.inner.diagnostics.borrow_mut())
    }

    /// Record that `(node, attribute)` is bound for the lifetime of `scope`.
    ///
    /// Returns `false` if a live binding already exists for it.
    pub(crate) fn claim(&self, scope: &BindingScope, node: NodeId, name: &str, value: &str) -> bool {
        let key = (node, name.to_string(), value.to_string());
        if !self.inner.bound.borrow_mut().insert(key.clone()) {
            return false;
        }
        let weak = self.downgrade();
        scope.on_dispose(move || {
            if let Some(ctx) = weak.upgrade() {
                ctx.inner.bound.borrow_mut().remove(&key);
            }
        });
        true
    }

    /// Unique marker value for one list binding
    pub(crate) fn next_marker(&self, name: &str) -> String {
        let n = self.inner.markers.get();
        self.inner.markers.set(n + 1);
        format!("{name}#{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_until_scope_disposed() {
        let ctx = BindingContext::new(Rc::new(Document::new()), Config::default());
        let node = ctx.document().body();
        let scope = BindingScope::new();

        assert!(ctx.claim(&scope, node, "if", "shown"));
        assert!(!ctx.claim(&scope, node, "if", "shown"));
        assert!(ctx.claim(&scope, node, "if", "other"));

        scope.dispose();
        assert!(ctx.claim(&BindingScope::new(), node, "if", "shown"));
    }

    #[test]
    fn test_markers_are_unique() {
        let ctx = BindingContext::new(Rc::new(Document::new()), Config::default());
        assert_eq!(ctx.next_marker("items"), "items#0");
        assert_eq!(ctx.next_marker("items"), "items#1");
    }

    #[test]
    fn test_diagnostics_collected_when_enabled() {
        let config = Config {
            collect_diagnostics: true,
            ..Config::default()
        };
        let ctx = BindingContext::new(Rc::new(Document::new()), config);
        ctx.report(BindingIssue::NotASequence { name: "items".into() });
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.take_diagnostics().len(), 1);
        assert!(ctx.diagnostics().is_empty());

        let quiet = BindingContext::new(Rc::new(Document::new()), Config::default());
        quiet.report(BindingIssue::NotASequence { name: "items".into() });
        assert!(quiet.diagnostics().is_empty());
    }
}
