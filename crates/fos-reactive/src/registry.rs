//! Registry - names to signals, node references and event handlers
//!
//! Names are unique across all three kinds. A later registration under the
//! same name shadows the earlier one.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fos_dom::{DomEvent, NodeId};
use serde_json::Value;

use crate::Signal;

/// Event handler invoked from a list instance as `(event, index, item, signal)`
pub type Handler = Rc<dyn Fn(&DomEvent, usize, &Value, &Signal)>;

/// A registered value
#[derive(Clone)]
pub enum Entry {
    Signal(Signal),
    Node(NodeId),
    Handler(Handler),
}

impl Entry {
    /// Short kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Signal(_) => "signal",
            Entry::Node(_) => "node",
            Entry::Handler(_) => "handler",
        }
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Entry::Signal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Entry::Node(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Entry::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Signal(s) => f.debug_tuple("Signal").field(s).finish(),
            Entry::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Entry::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<Signal> for Entry {
    fn from(signal: Signal) -> Self {
        Entry::Signal(signal)
    }
}

impl From<NodeId> for Entry {
    fn from(node: NodeId) -> Self {
        Entry::Node(node)
    }
}

impl From<Handler> for Entry {
    fn from(handler: Handler) -> Self {
        Entry::Handler(handler)
    }
}

/// Name → entry mapping
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry, returning the one it shadows
    pub fn register(&mut self, name: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(name.into(), entry.into())
    }

    /// Register an event handler closure
    pub fn register_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&DomEvent, usize, &Value, &Signal) + 'static,
    ) -> Option<Entry> {
        self.register(name, Entry::Handler(Rc::new(handler)))
    }

    /// Builder form of [`register`](Self::register) for signals
    pub fn with_signal(mut self, name: impl Into<String>, signal: Signal) -> Self {
        self.register(name, signal);
        self
    }

    /// Builder form of [`register_handler`](Self::register_handler)
    pub fn with_handler(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&DomEvent, usize, &Value, &Signal) + 'static,
    ) -> Self {
        self.register_handler(name, handler);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn signal(&self, name: &str) -> Option<Signal> {
        self.lookup(name).and_then(Entry::as_signal).cloned()
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.lookup(name).and_then(Entry::as_node)
    }

    pub fn handler(&self, name: &str) -> Option<Handler> {
        self.lookup(name).and_then(Entry::as_handler).cloned()
    }

    /// Shallow merge; entries from `other` win
    pub fn merge(&mut self, other: Registry) {
        self.entries.extend(other.entries);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
