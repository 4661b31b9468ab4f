//! Error types for the Ledger.

use std::fmt;

use contentledger_access::AccessError;
use contentledger_core::{ContentId, CoreError, Principal, ValidationError};
use contentledger_store::StoreError;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Grant planning failed.
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Canonical encoding failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),

    /// Referenced content does not exist.
    #[error("content not found: {0}")]
    ContentNotFound(ContentId),

    /// Caller lacks the role the operation requires.
    #[error("not authorized: {caller} is not the {role} of content {content_id}")]
    Unauthorized {
        caller: Principal,
        role: Role,
        content_id: ContentId,
    },
}

/// The role an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Creator,
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Creator => f.write_str("creator"),
            Role::Owner => f.write_str("owner"),
        }
    }
}

/// Numeric error code reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// 400: validation failure.
    BadRequest,
    /// 401: wrong creator or owner.
    Unauthorized,
    /// 404: referenced content does not exist.
    NotFound,
    /// 500: storage backend failure.
    Internal,
}

impl ErrorCode {
    pub const fn as_u16(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

impl LedgerError {
    /// The code this error is reported as.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Validation(_) | LedgerError::Access(_) => ErrorCode::BadRequest,
            LedgerError::ContentNotFound(_) => ErrorCode::NotFound,
            LedgerError::Unauthorized { .. } => ErrorCode::Unauthorized,
            LedgerError::Store(err) => match err {
                StoreError::Overflow(_) => ErrorCode::BadRequest,
                StoreError::ContentNotFound(_) => ErrorCode::NotFound,
                _ => ErrorCode::Internal,
            },
            LedgerError::Encoding(_) => ErrorCode::Internal,
        }
    }

    pub(crate) fn unauthorized(caller: &Principal, role: Role, content_id: ContentId) -> Self {
        LedgerError::Unauthorized {
            caller: caller.clone(),
            role,
            content_id,
        }
    }
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            LedgerError::from(ValidationError::RoyaltyOutOfRange(100)).code(),
            ErrorCode::BadRequest
        );
        assert_eq!(
            LedgerError::ContentNotFound(ContentId(999)).code().as_u16(),
            404
        );
        assert_eq!(
            LedgerError::unauthorized(&Principal::new("x").unwrap(), Role::Owner, ContentId(0))
                .code()
                .as_u16(),
            401
        );
        assert_eq!(
            LedgerError::from(StoreError::Overflow("total".into())).code(),
            ErrorCode::BadRequest
        );
        assert_eq!(
            LedgerError::from(StoreError::LockPoisoned("x".into())).code(),
            ErrorCode::Internal
        );
    }

    #[test]
    fn test_unauthorized_message() {
        let err =
            LedgerError::unauthorized(&Principal::new("mallory").unwrap(), Role::Creator, ContentId(3));
        assert_eq!(
            err.to_string(),
            "not authorized: mallory is not the creator of content 3"
        );
    }
}
