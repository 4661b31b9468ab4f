//! Error types for the access module.

use thiserror::Error;

/// Errors that can occur while planning access grants.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Subscription expiry does not fit in a timestamp.
    #[error("subscription expiry overflows: now={now}, period={period}")]
    ExpiryOverflow { now: u64, period: u64 },

    /// Grant belongs to a different user or content entry.
    #[error("invalid grant: {0}")]
    InvalidGrant(String),
}

/// Result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;
