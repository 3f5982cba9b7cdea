//! Domain-level error taxonomy for PageCraft.

use crate::page::PageError;
use crate::recovery::RecoveryError;
use crate::synthesis::SynthesisError;

/// PageCraft domain errors.
#[derive(Debug, thiserror::Error)]
pub enum PagecraftError {
    #[error("page automation error: {0}")]
    Page(#[from] PageError),

    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for PageCraft domain operations.
pub type Result<T> = std::result::Result<T, PagecraftError>;
