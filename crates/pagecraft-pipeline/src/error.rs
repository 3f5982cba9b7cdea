//! Errors raised while assembling a pipeline.
//!
//! Faults during a run never surface here: they are classified into
//! `PipelineError` records and carried in the run result.

use pagecraft_core::{RecoveryError, VisionError};

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot create vision generator: {0}")]
    Vision(#[from] VisionError),

    #[error("cannot open failed-error store: {0}")]
    FailedStore(#[from] RecoveryError),
}
