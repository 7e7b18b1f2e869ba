//! # Sync Error Types

use famyank_core::ValidationError;
use famyank_db::DbError;
use famyank_store::StoreError;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Remote URL is malformed or not http(s).
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote did not answer in time.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The remote answered with a non-success status.
    #[error("Remote returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    /// The response body was not what the protocol expects.
    #[error("Invalid response body: {0}")]
    Decode(String),

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// The catalog server could not listen.
    #[error("Failed to bind to {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// A catalog upload was refused.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(#[from] ValidationError),

    /// The upload body was not `{ "products": [...] }`.
    #[error("Malformed request: {0}")]
    BadRequest(String),

    // =========================================================================
    // Local State Errors
    // =========================================================================
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Corrupt catalog record: {0}")]
    CorruptRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
