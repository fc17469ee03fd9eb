//! Binding scopes - explicit teardown of installed bindings
//!
//! Every handler registers its cleanup with the scope it was installed in.
//! Disposing the scope runs the cleanups newest first, exactly once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use fos_dom::{Document, ListenerId, NodeId};

use crate::Subscription;

/// Deferred teardown action
pub type Cleanup = Box<dyn FnOnce()>;

#[derive(Default)]
struct ScopeInner {
    cleanups: RefCell<Vec<Cleanup>>,
    disposed: Cell<bool>,
}

/// Owner of the cleanups for one activation pass or one list instance
#[derive(Clone, Default)]
pub struct BindingScope {
    inner: Rc<ScopeInner>,
}

impl BindingScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cleanup. On an already disposed scope it runs immediately.
    pub fn on_dispose(&self, cleanup: impl FnOnce() + 'static) {
        if self.inner.disposed.get() {
            cleanup();
            return;
        }
        self.inner.cleanups.borrow_mut().push(Box::new(cleanup));
    }

    /// Unsubscribe on dispose
    pub fn track_subscription(&self, subscription: Subscription) {
        self.on_dispose(move || subscription.unsubscribe());
    }

    /// Remove an event listener on dispose
    pub fn track_listener(&self, document: &Rc<Document>, node: NodeId, id: ListenerId) {
        let document: Weak<Document> = Rc::downgrade(document);
        self.on_dispose(move || {
            if let Some(document) = document.upgrade() {
                document.remove_event_listener(node, id);
            }
        });
    }

    /// Run every cleanup, newest first. Later calls do nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        loop {
            // Pop outside the borrow so a cleanup may register more cleanups.
            let next = self.inner.cleanups.borrow_mut().pop();
            match next {
                Some(cleanup) => cleanup(),
                None => break,
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of pending cleanups
    pub fn len(&self) -> usize {
        self.inner.cleanups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("pending", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;

    #[test]
    fn test_dispose_runs_newest_first_once() {
        let scope = BindingScope::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = order.clone();
            scope.on_dispose(move || order.borrow_mut().push(n));
        }
        assert_eq!(scope.len(), 3);

        scope.dispose();
        scope.dispose();
        assert_eq!(*order.borrow(), vec![2, 1, 0]);
        assert!(scope.is_disposed());
        assert!(scope.is_empty());
    }

    #[test]
    fn test_cleanup_after_dispose_runs_immediately() {
        let scope = BindingScope::new();
        scope.dispose();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        scope.on_dispose(move || flag.set(true));
        assert!(ran.get());
    }

    #[test]
    fn test_tracked_resources_are_released() {
        let doc = Rc::new(Document::new());
        let button = doc.create_element("button");
        doc.append_child(doc.body(), button).unwrap();
        let signal = Signal::new(0);

        let scope = BindingScope::new();
        scope.track_subscription(signal.subscribe(|_| {}));
        let id = doc.add_event_listener(button, "click", Rc::new(|_| {}));
        scope.track_listener(&doc, button, id);

        scope.dispose();
        assert_eq!(signal.subscriber_count(), 0);
        assert_eq!(doc.listener_count(button), 0);
    }
}
