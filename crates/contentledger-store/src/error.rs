//! Error types for the store module.

use contentledger_core::ContentId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A write referenced content that does not exist.
    #[error("content not found: {0}")]
    ContentNotFound(ContentId),

    /// An insert did not carry the next sequential id.
    #[error("content id conflict: expected {expected}, got {got}")]
    IdConflict { expected: ContentId, got: ContentId },

    /// A total would not fit in its column.
    #[error("overflow: {0}")]
    Overflow(String),

    /// Invalid data in storage or in a write.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A blocking task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
