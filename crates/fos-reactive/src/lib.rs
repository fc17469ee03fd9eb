//! fOS Reactive - attribute-driven data binding for the fOS DOM
//!
//! Scans a document for binding attributes and keeps nodes in sync with
//! named [`Signal`]s:
//!
//! | attribute | effect |
//! |---|---|
//! | `this="name"` | register the node under `name` |
//! | `bind:group="s"` | checkbox membership / radio equality with `s` |
//! | `bind:text`, `bind:html`, `bind:<prop>` | content or property follows `s` |
//! | `class:<name>="s"` | class present while `s` is truthy |
//! | `if="s"` | node shown while `s` is truthy |
//! | `foreach="s"` | one interpolated copy of the node per element of `s` |
//! | `on<event>="f"` | inside a `foreach`, call handler `f` on `<event>` |
//!
//! Bindings stay live while the [`ReactiveDom`] (or a clone of it) exists,
//! until the [`BindingScope`] returned by the activation is disposed.
//!
//! ```
//! use std::rc::Rc;
//! use fos_reactive::{Activation, ReactiveDom, Registry, Signal};
//!
//! let doc = Rc::new(fos_html::parse(r#"<ul><li foreach="items">${item}</li></ul>"#).unwrap());
//! let items = Signal::new(serde_json::json!(["a", "b"]));
//! let dom = ReactiveDom::new(doc.clone());
//! dom.activate(Activation::Implicit, Registry::new().with_signal("items", items.clone())).unwrap();
//!
//! items.set(serde_json::json!(["a", "b", "c"]));
//! assert_eq!(doc.text_content(doc.body()), "abc");
//! ```

mod config;
mod context;
mod directive;
mod dispatcher;
mod error;
mod handlers;
mod interpolate;
mod list;
pub mod path;
mod registry;
mod scope;
mod signal;
mod value;

use std::cell::Ref;
use std::fmt;
use std::rc::Rc;

use fos_dom::{Document, DomEvent, NodeId};
use serde_json::Value;

use context::BindingContext;

pub use config::Config;
pub use directive::{Directive, Property};
pub use dispatcher::Activation;
pub use error::{BindingIssue, ReactiveError};
pub use interpolate::{interpolate, interpolate_with};
pub use registry::{Entry, Handler, Registry};
pub use scope::{BindingScope, Cleanup};
pub use signal::{Change, Signal, Subscription, WeakSignal};
pub use value::{is_truthy, sequence_len, to_display, to_prop};

/// Binding engine bound to one document
#[derive(Clone)]
pub struct ReactiveDom {
    ctx: BindingContext,
}

impl ReactiveDom {
    pub fn new(document: Rc<Document>) -> Self {
        Self::with_config(document, Config::default())
    }

    pub fn with_config(document: Rc<Document>, config: Config) -> Self {
        Self {
            ctx: BindingContext::new(document, config),
        }
    }

    pub fn document(&self) -> &Rc<Document> {
        self.ctx.document()
    }

    pub fn config(&self) -> &Config {
        self.ctx.config()
    }

    /// Current registry contents
    pub fn registry(&self) -> Ref<'_, Registry> {
        self.ctx.registry()
    }

    /// Register an entry, returning the one it shadows
    pub fn register(&self, name: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.ctx.registry_mut().register(name, entry)
    }

    pub fn register_handler(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&DomEvent, usize, &Value, &Signal) + 'static,
    ) -> Option<Entry> {
        self.ctx.registry_mut().register_handler(name, handler)
    }

    pub fn signal(&self, name: &str) -> Option<Signal> {
        self.ctx.registry().signal(name)
    }

    /// Node captured with `this="name"`
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.ctx.registry().node(name)
    }

    /// Merge `data` into the registry (its entries win), then bind.
    ///
    /// Returns the scope owning every binding installed by this pass.
    pub fn activate(&self, activation: Activation, data: Registry) -> Result<BindingScope, ReactiveError> {
        if let Activation::Scoped(node) = activation {
            if !self.document().contains(node) {
                return Err(ReactiveError::NodeNotFound(node));
            }
        }
        self.ctx.registry_mut().merge(data);

        let scope = BindingScope::new();
        dispatcher::dispatch(&self.ctx, &scope, activation);
        Ok(scope)
    }

    /// Flag-style entry point: `explicit` selects opt-in mode, `scope`
    /// restricts the scan to a sub-tree
    pub fn run(
        &self,
        explicit: bool,
        scope: Option<NodeId>,
        data: Option<Registry>,
    ) -> Result<BindingScope, ReactiveError> {
        self.activate(Activation::from_flags(explicit, scope), data.unwrap_or_default())
    }

    /// Binding issues reported so far (requires `collect_diagnostics`)
    pub fn diagnostics(&self) -> Vec<BindingIssue> {
        self.ctx.diagnostics()
    }

    pub fn take_diagnostics(&self) -> Vec<BindingIssue> {
        self.ctx.take_diagnostics()
    }
}

impl fmt::Debug for ReactiveDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveDom")
            .field("document", self.document())
            .field("entries", &self.registry().len())
            .finish()
    }
}
