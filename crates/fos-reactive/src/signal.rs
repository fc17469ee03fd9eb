//! Signal - shared value cell with synchronous change notification
//!
//! A [`Signal`] is a cheap handle; clones share the same cell. Writing a
//! value invokes every live subscriber, in subscription order, before the
//! write returns. No borrow of the cell is held while subscribers run, so a
//! subscriber may read or write the signal again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

type Callback = Rc<dyn Fn(&Change<'_>)>;

struct Subscriber {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Callback,
}

struct SignalInner {
    value: RefCell<Value>,
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
}

/// One notification: the value before and after a write
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    pub old: &'a Value,
    pub new: &'a Value,
    /// `true` for [`Signal::set`] (a new value), `false` for an in-place
    /// [`Signal::update`] of the same value
    pub replaced: bool,
}

impl Change<'_> {
    /// Whether the sequence length differs (non-sequences count as length 0)
    pub fn length_changed(&self) -> bool {
        seq_len(self.old) != seq_len(self.new)
    }
}

fn seq_len(value: &Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}

/// Reactive value container
#[derive(Clone)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl Signal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value.into()),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current value (cloned)
    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify
    pub fn set(&self, value: impl Into<Value>) {
        let new = value.into();
        let old = self.inner.value.replace(new.clone());
        self.notify(&Change {
            old: &old,
            new: &new,
            replaced: true,
        });
    }

    /// Mutate the value in place and notify
    pub fn update(&self, f: impl FnOnce(&mut Value)) {
        let old = self.get();
        let new = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value);
            value.clone()
        };
        self.notify(&Change {
            old: &old,
            new: &new,
            replaced: false,
        });
    }

    /// Register a change callback
    pub fn subscribe(&self, callback: impl Fn(&Change<'_>) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let active = Rc::new(Cell::new(true));
        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            active: active.clone(),
            callback: Rc::new(callback),
        });
        Subscription {
            signal: Rc::downgrade(&self.inner),
            id,
            active,
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether two handles share the same cell
    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakSignal {
        WeakSignal {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn notify(&self, change: &Change<'_>) {
        let pass: Vec<(Rc<Cell<bool>>, Callback)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.active.clone(), s.callback.clone()))
            .collect();

        for (active, callback) in pass {
            if active.get() {
                callback(change);
            }
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Non-owning signal handle
#[derive(Clone)]
pub struct WeakSignal {
    inner: Weak<SignalInner>,
}

impl WeakSignal {
    pub fn upgrade(&self) -> Option<Signal> {
        self.inner.upgrade().map(|inner| Signal { inner })
    }
}

/// Handle to a registered callback.
///
/// Dropping it leaves the callback registered; call [`unsubscribe`](Self::unsubscribe).
#[derive(Clone)]
pub struct Subscription {
    signal: Weak<SignalInner>,
    id: u64,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Remove the callback. It is not invoked again, even later in a
    /// notification pass already under way.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(inner) = self.signal.upgrade() {
            inner.subscribers.borrow_mut().retain(|s| s.id != self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}
