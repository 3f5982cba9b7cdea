//! Structured observability hooks for pipeline run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for lifecycle events: run start, phase change,
//!   component generation, recorded error, run finish
//!
//! Events are emitted at `info!` level. For JSON output run the CLI with
//! `--json`.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("run-12345");
/// // every event below carries run_id = "run-12345"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        Self {
            _span: run_span(run_id).entered(),
        }
    }
}

/// The run span itself, for instrumenting futures (an entered guard must not
/// be held across `.await`).
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("pagecraft.run", run_id = %run_id)
}

/// Emit event: run started against a page source.
pub fn emit_run_started(run_id: &str, source: &str) {
    info!(event = "run.started", run_id = %run_id, source = %source);
}

/// Emit event: a pipeline phase began.
pub fn emit_phase_started(run_id: &str, phase: &str, percent: u8) {
    info!(event = "run.phase", run_id = %run_id, phase = %phase, percent = percent);
}

/// Emit event: one region was synthesized.
pub fn emit_component_generated(run_id: &str, region_id: &str, variants: usize, failed: bool) {
    info!(
        event = "component.generated",
        run_id = %run_id,
        region_id = %region_id,
        variants = variants,
        failed = failed,
    );
}

/// Emit event: an error was classified and recorded (warning level).
pub fn emit_error_recorded(run_id: &str, code: &str, severity: &str, message: &str) {
    warn!(
        event = "run.error_recorded",
        run_id = %run_id,
        code = %code,
        severity = %severity,
        message = %message,
    );
}

/// Emit event: run finished with duration, counts and success status.
pub fn emit_run_finished(
    run_id: &str,
    duration_ms: u64,
    generated: usize,
    failed: usize,
    success: bool,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        generated = generated,
        failed = failed,
        success = success,
    );
}
