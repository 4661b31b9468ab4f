//! Error types for the Content Ledger Core.

use thiserror::Error;

/// Core errors that can occur while encoding ledger data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors for caller-supplied input.
///
/// Every variant maps to the `400` response code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("royalty percentage {0} must be below 100")]
    RoyaltyOutOfRange(u64),

    #[error("{field} is {len} bytes, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("principal must not be empty")]
    EmptyPrincipal,

    #[error("amount overflow: {0}")]
    AmountOverflow(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
