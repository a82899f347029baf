use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal reason a context was canceled.
///
/// The set is closed: a context is either canceled explicitly, expired by its
/// deadline, or canceled with a cause supplied by the caller (for example a
/// foreign context reporting its own reason).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CancelCause {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Custom(String),
}

impl CancelCause {
    pub fn custom(message: impl Into<String>) -> Self {
        CancelCause::Custom(message.into())
    }

    /// True for a cause produced by a deadline elapsing.
    pub fn is_deadline(&self) -> bool {
        matches!(self, CancelCause::DeadlineExceeded)
    }
}

impl From<anyhow::Error> for CancelCause {
    fn from(err: anyhow::Error) -> Self {
        CancelCause::Custom(err.to_string())
    }
}

/// Error type for operations around the context tree
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ContextError {
    #[error("Config: {0}")]
    Config(String),

    #[error("Cache: {0}")]
    Cache(String),

    // A canceled context surfaces its cause unchanged
    #[error(transparent)]
    Cancelled(#[from] CancelCause),

    #[error("Other: {0}")]
    Other(String),
}

impl From<anyhow::Error> for ContextError {
    fn from(err: anyhow::Error) -> Self {
        ContextError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        ContextError::Config(err.to_string())
    }
}
