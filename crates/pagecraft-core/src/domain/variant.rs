//! Code artifacts produced by one synthesis strategy for one region.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the three independent code-synthesis approaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    PixelFaithful,
    Semantic,
    Accessible,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::PixelFaithful,
        StrategyKind::Semantic,
        StrategyKind::Accessible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::PixelFaithful => "pixel_faithful",
            StrategyKind::Semantic => "semantic",
            StrategyKind::Accessible => "accessible",
        }
    }

    /// Suffix appended to the generated component name.
    pub fn component_suffix(&self) -> &'static str {
        match self {
            StrategyKind::PixelFaithful => "Pixel",
            StrategyKind::Semantic => "Semantic",
            StrategyKind::Accessible => "Accessible",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pixel_faithful" | "pixel" => Ok(StrategyKind::PixelFaithful),
            "semantic" => Ok(StrategyKind::Semantic),
            "accessible" | "a11y" => Ok(StrategyKind::Accessible),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Immutable generated source for one region under one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub strategy: StrategyKind,
    pub description: String,
    pub code: String,
    /// Visual-similarity score (0-100) filled in by an external comparator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<PathBuf>,
}

impl Variant {
    pub fn new(strategy: StrategyKind, description: impl Into<String>, code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy,
            description: description.into(),
            code,
            accuracy_score: None,
            preview: None,
        }
    }

    /// Attach an externally computed score, clamped to 0-100.
    pub fn with_accuracy(mut self, score: u8) -> Self {
        self.accuracy_score = Some(score.min(100));
        self
    }

    pub fn with_preview(mut self, path: PathBuf) -> Self {
        self.preview = Some(path);
        self
    }
}
