//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document with the same `_id` already exists in the collection.
    #[error("duplicate key in {collection}: {id}")]
    DuplicateKey { collection: String, id: String },

    /// The filter used an operator the store does not evaluate.
    #[error("unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),

    /// The connection lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    LockPoisoned,
}
