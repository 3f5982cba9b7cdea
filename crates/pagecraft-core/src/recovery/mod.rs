//! Error Classifier & Recovery Queue.
//!
//! This module provides:
//! - a closed error-code table with static severity and retry budgets
//! - keyword classification of raw fault messages
//! - an ordered, shareable error queue with filters
//! - a unified retry policy and a scheduler that sweeps recoverable errors
//! - durable per-run persistence and report formatting

pub mod classify;
pub mod code;
pub mod error;
pub mod export;
pub mod persist;
pub mod policy;
pub mod queue;
pub mod scheduler;

pub use classify::classify;
pub use code::{ErrorCode, Severity};
pub use error::{PipelineError, RecoveryError, Result};
pub use export::{format_error_line, ErrorSummary};
pub use persist::FailedErrorStore;
pub use policy::{backoff_delay, retry_with_policy, BackoffKind, RetryPolicy};
pub use queue::{ErrorQueue, QueueSummary};
pub use scheduler::{RecoveryReport, RecoveryScheduler};
