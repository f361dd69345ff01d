use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::error::Result;

pub(crate) type Listener = Rc<dyn Fn(Value)>;

/// Ordered list of state listeners.
pub(crate) struct Registry {
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_id: Cell<u64>,
}

impl Registry {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    pub(crate) fn add(&self, listener: Listener) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        tracing::trace!(listener = id, "listener added");
        id
    }

    pub(crate) fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id);
        tracing::trace!(listener = id, "listener removed");
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Copy of the listener list at this moment.
    ///
    /// Notification iterates the snapshot, so listeners added or removed by a
    /// listener only take effect from the next notification on.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the listener subscribed; call
/// [`unsubscribe`](Self::unsubscribe) or turn it into a
/// [`SubscriptionGuard`] to tie the listener to a scope.
#[must_use = "dropping a Subscription does not unsubscribe; call `unsubscribe` or `into_guard`"]
pub struct Subscription {
    id: Cell<Option<u64>>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Rc<Registry>) -> Self {
        Self {
            id: Cell::new(Some(id)),
            registry: Rc::downgrade(registry),
        }
    }

    /// Remove the listener. Calls after the first one do nothing.
    pub fn unsubscribe(&self) {
        if let Some(id) = self.id.take() {
            if let Some(registry) = self.registry.upgrade() {
                registry.remove(id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.get().is_some()
    }

    /// Unsubscribe automatically when the returned guard is dropped.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

/// RAII guard for a subscription.
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

/// The one capability a binding layer needs from a store.
pub trait Subscribable {
    fn subscribe(&self, listener: Box<dyn Fn(Value)>) -> Result<Subscription>;
}
