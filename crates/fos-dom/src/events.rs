//! DOM Events
//!
//! Event objects and listener bookkeeping for [`crate::Document`].

use std::cell::Cell;
use std::rc::Rc;

use crate::NodeId;

/// Listener callback. Listeners may freely mutate the document.
pub type EventCallback = Rc<dyn Fn(&DomEvent)>;

/// Handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) event_type: String,
    pub(crate) callback: EventCallback,
}

/// DOM event
#[derive(Debug)]
pub struct DomEvent {
    pub event_type: String,
    pub target: NodeId,
    pub bubbles: bool,
    current_target: Cell<NodeId>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl DomEvent {
    /// Create a bubbling event
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            bubbles: true,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Create an event that only reaches its target
    pub fn non_bubbling(event_type: &str, target: NodeId) -> Self {
        Self {
            bubbles: false,
            ..Self::new(event_type, target)
        }
    }

    /// Node whose listener is currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    /// Stop the event from reaching further ancestors
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}
