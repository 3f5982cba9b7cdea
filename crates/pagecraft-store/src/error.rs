//! Error types for pagecraft-store

use thiserror::Error;

/// Errors raised by output and metadata stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Requested record does not exist
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Digest string is not 64 hex characters
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Stored bytes no longer match their recorded digest
    #[error("digest mismatch for {key}: expected {expected}, got {actual}")]
    DigestMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// Backend rejected the operation
    #[error("store backend failed: {0}")]
    Backend(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
