//! # Store Error Type
//!
//! What callers of [`PosStore`](crate::PosStore) see when an operation fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CoreError (rule broken) ───────┐                                      │
//! │                                  │                                      │
//! │  DbError (write refused) ───────┼──► StoreError ──► code() ──► caller  │
//! │                                  │                  "INSUFFICIENT_STOCK"│
//! │  serde_json / argon2 / toml ────┘                                      │
//! │                                                                         │
//! │  Any error: in-memory state unchanged, no notification.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use famyank_core::CoreError;
use famyank_db::{DbError, RecordKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The backend refused the write or read.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// A persisted record could not be decoded.
    #[error("Corrupt {key} record: {source}")]
    CorruptRecord {
        key: RecordKey,
        #[source]
        source: serde_json::Error,
    },

    /// State could not be encoded for storage.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Invalid store configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Stable machine-readable error codes.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Slim Fit Jeans: available 2, requested 5" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or sale not found (404)
    NotFound,

    /// Cart asks for more than is on hand (409)
    InsufficientStock,

    /// Input validation failed (400)
    ValidationError,

    /// Id or email already taken (409)
    Duplicate,

    /// Storage failed (500)
    StorageError,

    /// Anything else (500)
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Duplicate => "DUPLICATE",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    /// The code a UI or HTTP layer switches on.
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::Core(err) => match err {
                CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::DuplicateId(_) | CoreError::DuplicateAccount { .. } => {
                    ErrorCode::Duplicate
                }
                CoreError::EmptyCart | CoreError::CartTooLarge { .. } | CoreError::Validation(_) => {
                    ErrorCode::ValidationError
                }
            },
            StoreError::Storage(_) | StoreError::CorruptRecord { .. } => ErrorCode::StorageError,
            StoreError::InvalidConfig(_) | StoreError::TomlParse(_) => ErrorCode::ValidationError,
            StoreError::Serialization(_) | StoreError::PasswordHash(_) | StoreError::Io(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// The underlying business error, if that is what this is.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            StoreError::Core(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use famyank_core::ValidationError;

    #[test]
    fn test_error_codes() {
        let stock = StoreError::from(CoreError::InsufficientStock {
            product_id: "B".into(),
            name: "B".into(),
            available: 2,
            requested: 5,
        });
        assert_eq!(stock.code(), ErrorCode::InsufficientStock);
        assert_eq!(
            StoreError::from(CoreError::ProductNotFound("X".into())).code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            StoreError::from(CoreError::DuplicateId("P-1".into())).code(),
            ErrorCode::Duplicate
        );
        assert_eq!(
            StoreError::from(CoreError::Validation(ValidationError::required("name"))).code(),
            ErrorCode::ValidationError
        );
        assert_eq!(
            StoreError::from(DbError::Unavailable("down".into())).code(),
            ErrorCode::StorageError
        );
    }

    #[test]
    fn test_code_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
        assert_eq!(ErrorCode::StorageError.to_string(), "STORAGE_ERROR");
    }
}
