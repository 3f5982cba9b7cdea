//! Progress reporting.

use pagecraft_core::Phase;
use serde::Serialize;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub phase: Phase,
    /// 0-100, never decreasing within a run.
    pub percent: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<usize>,
}

impl ProgressUpdate {
    /// Phase start notification.
    pub fn phase(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent: phase.start_percent(),
            message: message.into(),
            current_item: None,
            total_items: None,
        }
    }

    /// Per-item notification; `current` is 1-based. The percent is
    /// interpolated inside the phase's range.
    pub fn item(phase: Phase, current: usize, total: usize, message: impl Into<String>) -> Self {
        let start = phase.start_percent() as usize;
        let end = phase.end_percent() as usize;
        let percent = if total == 0 {
            start
        } else {
            start + (end - start) * current.min(total) / total
        };
        Self {
            phase,
            percent: percent as u8,
            message: message.into(),
            current_item: Some(current),
            total_items: Some(total),
        }
    }
}

/// Progress sink. `&|_| {}` discards updates.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressUpdate) + Send + Sync);

/// Sink that ignores every update.
pub fn no_progress(_: ProgressUpdate) {}
