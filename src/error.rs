use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by stores, actions and compositions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An action (or a write) was attempted while the guard for its scope was held.
    #[error("hoverboard: {operation}")]
    Reentrant { operation: &'static str },

    #[error("state must be an object, found {found}")]
    InvalidState { found: &'static str },

    #[error("unknown action: {name}")]
    UnknownAction { name: String },

    /// A user handler or initializer failed.
    #[error("action handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    #[error("invalid store configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) const IN_ACTION: &'static str = "cannot call action in the middle of an action";
    pub(crate) const IN_NOTIFICATION: &'static str =
        "cannot set state in the middle of a notification";
    pub(crate) const IN_INITIALIZER: &'static str = "cannot read state while initializing";

    /// Convert an error returned by user code.
    ///
    /// Store errors travelling through a handler (for example the re-entrancy
    /// error of a nested action call) come back out unchanged.
    pub(crate) fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(other) => StoreError::Handler(other),
        }
    }

    #[must_use]
    pub fn is_reentrant(&self) -> bool {
        matches!(self, Self::Reentrant { .. })
    }
}
