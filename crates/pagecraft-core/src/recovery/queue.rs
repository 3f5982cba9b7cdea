//! Ordered, shareable collection of recorded errors.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::code::ErrorCode;
use super::error::PipelineError;
use crate::domain::SemanticType;
use crate::metrics::METRICS;

/// Aggregate counts over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub total: usize,
    pub recoverable: usize,
    pub non_recoverable: usize,
    pub retried: usize,
}

/// Errors in insertion order. Shared as `Arc<ErrorQueue>` within a run.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    errors: Mutex<Vec<PipelineError>>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<PipelineError>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, error: PipelineError) {
        METRICS.inc_errors_recorded();
        self.guard().push(error);
    }

    pub fn extend(&self, errors: impl IntoIterator<Item = PipelineError>) {
        for error in errors {
            self.push(error);
        }
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Snapshot of every error in order.
    pub fn all(&self) -> Vec<PipelineError> {
        self.guard().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<PipelineError> {
        self.guard().iter().find(|e| e.id == id).cloned()
    }

    /// Errors that can still be retried.
    pub fn recoverable(&self) -> Vec<PipelineError> {
        self.guard().iter().filter(|e| e.can_retry()).cloned().collect()
    }

    pub fn by_owner(&self, owner: SemanticType) -> Vec<PipelineError> {
        self.guard()
            .iter()
            .filter(|e| e.owner == Some(owner))
            .cloned()
            .collect()
    }

    pub fn by_code(&self, code: ErrorCode) -> Vec<PipelineError> {
        self.guard()
            .iter()
            .filter(|e| e.code == code)
            .cloned()
            .collect()
    }

    pub fn remove(&self, id: Uuid) -> Option<PipelineError> {
        let mut errors = self.guard();
        let pos = errors.iter().position(|e| e.id == id)?;
        Some(errors.remove(pos))
    }

    /// Drop every error owned by `owner`. Returns how many were removed.
    pub fn clear_owner(&self, owner: SemanticType) -> usize {
        let mut errors = self.guard();
        let before = errors.len();
        errors.retain(|e| e.owner != Some(owner));
        before - errors.len()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    /// Apply `f` to the error with `id`, if still queued.
    pub fn update<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut PipelineError),
    {
        match self.guard().iter_mut().find(|e| e.id == id) {
            Some(error) => {
                f(error);
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> QueueSummary {
        let errors = self.guard();
        let recoverable = errors.iter().filter(|e| e.code.recoverable()).count();
        QueueSummary {
            total: errors.len(),
            recoverable,
            non_recoverable: errors.len() - recoverable,
            retried: errors.iter().filter(|e| e.retry_count > 0).count(),
        }
    }
}
