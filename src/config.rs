use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Which guard an action has to take before it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// Each store owns its own guard. Actions of different stores may nest.
    #[default]
    Store,
    /// Every store on the current thread shares one guard, so no action may
    /// start while any other action is running.
    Thread,
}

/// Shape a store's state has to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateShape {
    #[default]
    Any,
    /// Initial state and every written value must be a key/value mapping.
    Object,
}

impl StateShape {
    pub(crate) fn admits(self, value: &Value) -> bool {
        match self {
            StateShape::Any => true,
            StateShape::Object => value.is_object(),
        }
    }
}

/// Per-store settings.
///
/// # Examples
///
/// ```
/// use hoverboard::{LockScope, StoreConfig};
///
/// let config = StoreConfig::from_json(r#"{ "lock_scope": "thread" }"#).unwrap();
/// assert_eq!(config.lock_scope, LockScope::Thread);
/// assert!(config.strict_notifications);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub lock_scope: LockScope,
    pub state_shape: StateShape,
    /// Reject writes issued while this store is still notifying its listeners.
    pub strict_notifications: bool,
    /// State used when the handler source has no initializer.
    pub default_state: Value,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_scope: LockScope::Store,
            state_shape: StateShape::Any,
            strict_notifications: true,
            default_state: Value::Object(serde_json::Map::new()),
        }
    }
}

impl StoreConfig {
    /// Parse a JSON configuration document. Missing fields keep their defaults.
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn with_lock_scope(mut self, scope: LockScope) -> Self {
        self.lock_scope = scope;
        self
    }

    pub fn with_state_shape(mut self, shape: StateShape) -> Self {
        self.state_shape = shape;
        self
    }

    pub fn with_strict_notifications(mut self, strict: bool) -> Self {
        self.strict_notifications = strict;
        self
    }

    pub fn with_default_state(mut self, state: Value) -> Self {
        self.default_state = state;
        self
    }
}
