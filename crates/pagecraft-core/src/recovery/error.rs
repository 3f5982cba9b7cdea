//! The structured error record carried through a run, and recovery-layer
//! faults.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classify::classify;
use super::code::{ErrorCode, Severity};
use crate::domain::{Phase, SemanticType};

/// One recorded failure.
///
/// `severity`, `recoverable` and `max_retries` are always derived from
/// `code`, including when a record is deserialized; the only mutable field
/// after construction is `retry_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ErrorRecord")]
pub struct PipelineError {
    pub id: Uuid,
    pub code: ErrorCode,
    #[serde(default)]
    pub owner: Option<SemanticType>,
    #[serde(default)]
    pub component_id: Option<String>,
    pub phase: Phase,
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
    pub severity: Severity,
    pub recoverable: bool,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
    pub max_retries: u32,
}

/// Wire form of [`PipelineError`]. Derived fields present in the input are
/// ignored and recomputed from `code`.
#[derive(Deserialize)]
struct ErrorRecord {
    id: Uuid,
    code: ErrorCode,
    #[serde(default)]
    owner: Option<SemanticType>,
    #[serde(default)]
    component_id: Option<String>,
    phase: Phase,
    message: String,
    #[serde(default)]
    detail: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    retry_count: u32,
}

impl From<ErrorRecord> for PipelineError {
    fn from(record: ErrorRecord) -> Self {
        let code = record.code;
        Self {
            id: record.id,
            code,
            owner: record.owner,
            component_id: record.component_id,
            phase: record.phase,
            message: record.message,
            detail: record.detail,
            severity: code.severity(),
            recoverable: code.recoverable(),
            timestamp: record.timestamp,
            retry_count: record.retry_count.min(code.max_retries()),
            max_retries: code.max_retries(),
        }
    }
}

impl PipelineError {
    pub fn new(code: ErrorCode, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            owner: None,
            component_id: None,
            phase,
            message: message.into(),
            detail: None,
            severity: code.severity(),
            recoverable: code.recoverable(),
            timestamp: Utc::now(),
            retry_count: 0,
            max_retries: code.max_retries(),
        }
    }

    /// Build a record from a raw fault message, classifying it first.
    pub fn classified(phase: Phase, message: impl Into<String>) -> Self {
        let message = message.into();
        let code = classify(&message, Some(phase));
        Self::new(code, phase, message)
    }

    pub fn with_owner(mut self, owner: SemanticType) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_component(mut self, component_id: impl Into<String>) -> Self {
        self.component_id = Some(component_id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn can_retry(&self) -> bool {
        self.code.recoverable() && self.retry_count < self.code.max_retries()
    }

    /// Count one more retry, never beyond `max_retries`. Returns whether the
    /// counter moved.
    pub fn record_retry(&mut self) -> bool {
        if self.retry_count < self.code.max_retries() {
            self.retry_count += 1;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} during {}: {}", self.code, self.phase, self.message)
    }
}

impl std::error::Error for PipelineError {}

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{operation} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
