//! Pipeline configuration, loadable from TOML.
//!
//! ```toml
//! source = "landing.json"
//! screenshot_dir = "out/screenshots"
//! failed_error_dir = "out/failed"
//!
//! [detect]
//! max_regions = 12
//! min_height = 50.0
//!
//! [retry]
//! kind = "exponential"
//! base_delay_ms = 500
//! max_delay_ms = 8000
//! jitter = 0.3
//! max_attempts = 4
//! ```

use std::path::{Path, PathBuf};

use pagecraft_core::{DetectOptions, RetryPolicy, SynthesisOptions, VisionConfig};
use serde::{Deserialize, Serialize};

use crate::refine::RefineOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Label for the page being processed (URL or snapshot path).
    pub source: String,
    pub screenshot_dir: PathBuf,
    /// Directory for persisted failed errors; none disables persistence.
    pub failed_error_dir: Option<PathBuf>,
    pub capture_screenshots: bool,
    pub detect: DetectOptions,
    pub synthesis: SynthesisOptions,
    pub retry: RetryPolicy,
    pub vision: Option<VisionConfig>,
    pub refine: RefineOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: "page".to_string(),
            screenshot_dir: PathBuf::from("screenshots"),
            failed_error_dir: None,
            capture_screenshots: true,
            detect: DetectOptions::default(),
            synthesis: SynthesisOptions::default(),
            retry: RetryPolicy::default(),
            vision: None,
            refine: RefineOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detect.max_regions == 0 {
            return Err(ConfigError::Invalid("detect.max_regions must be > 0".into()));
        }
        if self.synthesis.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "synthesis.strategies must name at least one strategy".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::Invalid("retry.jitter must be within [0, 1]".into()));
        }
        if self.refine.batch_size == 0 || self.refine.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "refine.batch_size and refine.concurrency must be > 0".into(),
            ));
        }
        Ok(())
    }
}
