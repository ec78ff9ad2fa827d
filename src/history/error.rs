//! Error types for the history layer.
//!
//! [`StoreError`] is what a storage backend reports. [`HistoryError`] is
//! what callers of the service see: it separates "who are you" failures from
//! bad input and from the store being unavailable.

/// Failures raised by a [`HistoryStore`](super::HistoryStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row does not match the expected shape.
    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    /// The store could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures surfaced by [`HistoryService`](super::HistoryService).
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("sign in to use saved calculations")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("history store failure: {0}")]
    Persistence(#[from] StoreError),
}
