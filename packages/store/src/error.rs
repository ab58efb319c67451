use thiserror::Error;

/// Failures reported by a [`crate::Store`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("write to `{path}` failed: {reason}")]
    WriteFailure { path: String, reason: String },

    #[error("read of `{path}` failed: {reason}")]
    ReadFailure { path: String, reason: String },

    #[error("subscription to `{path}` failed: {reason}")]
    SubscriptionFailure { path: String, reason: String },

    #[error("invalid path `{0}`")]
    InvalidPath(String),

    #[error("value at `{path}` has an unexpected shape: {reason}")]
    Decode { path: String, reason: String },
}
