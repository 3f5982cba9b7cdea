//! PageCraft pipeline orchestration.
//!
//! Composes the section detector, screenshot capture, variant synthesis and
//! the stores into one run with progress reporting, classified error
//! recording, single-component retry and batch refinement.

pub mod capture;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod refine;
pub mod result;

pub use capture::{capture_region, screenshot_path};
pub use config::{ConfigError, PipelineConfig};
pub use error::SetupError;
pub use pipeline::Pipeline;
pub use progress::{no_progress, ProgressFn, ProgressUpdate};
pub use refine::{refine_components, RefineOptions, RefineReport};
pub use result::PipelineResult;
