use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use super::subscription::{Listener, Registry, Subscription};
use crate::config::{StateShape, StoreConfig};
use crate::error::{Result, StoreError};
use crate::runtime::{Lock, LockGuard};

pub(crate) type StateInitializer = Rc<dyn Fn() -> anyhow::Result<Value>>;

/// Merge `delta` into `current`.
///
/// Two mappings are merged key by key, one level deep, with `delta` winning.
/// In every other combination `delta` replaces `current`.
pub fn merge(current: Value, delta: Value) -> Value {
    match (current, delta) {
        (Value::Object(mut current), Value::Object(delta)) => {
            for (key, value) in delta {
                current.insert(key, value);
            }
            Value::Object(current)
        }
        (_, delta) => delta,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The canonical state of one store plus its listeners.
///
/// The cell owns its value outright; reads and notifications hand out clones,
/// so nothing a caller does to a value it received can reach back in here.
pub(crate) struct StateCell {
    value: RefCell<Option<Value>>,
    initializer: Option<StateInitializer>,
    default_state: Value,
    shape: StateShape,
    listeners: Rc<Registry>,
    notifying: Option<Lock>,
    initializing: Lock,
}

impl StateCell {
    pub(crate) fn new(config: &StoreConfig, initializer: Option<StateInitializer>) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(None),
            initializer,
            default_state: config.default_state.clone(),
            shape: config.state_shape,
            listeners: Registry::new(),
            notifying: config
                .strict_notifications
                .then(|| Lock::new(StoreError::IN_NOTIFICATION)),
            initializing: Lock::new(StoreError::IN_INITIALIZER),
        })
    }

    /// A fresh copy of the current state, seeding it on first use.
    pub(crate) fn read(&self) -> Result<Value> {
        self.ensure_initialized()?;
        Ok(self.value.borrow().clone().unwrap_or(Value::Null))
    }

    /// Merge `delta` into the state and notify listeners.
    pub(crate) fn write(&self, delta: Value) -> Result<()> {
        self.check_shape(&delta)?;
        let _notifying = self.enter_write()?;
        self.ensure_initialized()?;
        let current = self.value.borrow_mut().take().unwrap_or(Value::Null);
        *self.value.borrow_mut() = Some(merge(current, delta));
        self.notify();
        Ok(())
    }

    /// Drop the current state and write `state` over nothing.
    pub(crate) fn replace(&self, state: Value) -> Result<()> {
        self.check_shape(&state)?;
        let _notifying = self.enter_write()?;
        *self.value.borrow_mut() = Some(state);
        self.notify();
        Ok(())
    }

    pub(crate) fn subscribe(&self, listener: Listener) -> Result<Subscription> {
        let id = self.listeners.add(Rc::clone(&listener));
        let subscription = Subscription::new(id, &self.listeners);
        match self.read() {
            Ok(state) => {
                listener(state);
                Ok(subscription)
            }
            Err(err) => {
                subscription.unsubscribe();
                Err(err)
            }
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn enter_write(&self) -> Result<Option<LockGuard<'_>>> {
        self.notifying.as_ref().map(Lock::acquire).transpose()
    }

    fn check_shape(&self, value: &Value) -> Result<()> {
        if self.shape.admits(value) {
            Ok(())
        } else {
            Err(StoreError::InvalidState {
                found: kind_of(value),
            })
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.value.borrow().is_some() {
            return Ok(());
        }
        let state = match &self.initializer {
            Some(initializer) => {
                let _initializing = self.initializing.acquire()?;
                tracing::debug!("seeding state from initializer");
                let state = initializer().map_err(StoreError::from_handler)?;
                self.check_shape(&state)?;
                state
            }
            None => self.default_state.clone(),
        };
        *self.value.borrow_mut() = Some(state);
        Ok(())
    }

    fn notify(&self) {
        let listeners = self.listeners.snapshot();
        tracing::trace!(listeners = listeners.len(), "notifying listeners");
        for listener in listeners {
            let state = self.value.borrow().clone().unwrap_or(Value::Null);
            listener(state);
        }
    }
}
