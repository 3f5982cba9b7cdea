//! Run phases, in execution order.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Detecting,
    CapturingScreenshots,
    GeneratingVariants,
    Saving,
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Initializing,
        Phase::Detecting,
        Phase::CapturingScreenshots,
        Phase::GeneratingVariants,
        Phase::Saving,
        Phase::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Detecting => "detecting",
            Phase::CapturingScreenshots => "capturing_screenshots",
            Phase::GeneratingVariants => "generating_variants",
            Phase::Saving => "saving",
            Phase::Complete => "complete",
        }
    }

    /// Progress percentage reported when the phase starts.
    pub fn start_percent(&self) -> u8 {
        match self {
            Phase::Initializing => 0,
            Phase::Detecting => 5,
            Phase::CapturingScreenshots => 25,
            Phase::GeneratingVariants => 40,
            Phase::Saving => 85,
            Phase::Complete => 100,
        }
    }

    /// Percentage at which the phase hands over to the next one.
    pub fn end_percent(&self) -> u8 {
        match self {
            Phase::Initializing => 5,
            Phase::Detecting => 25,
            Phase::CapturingScreenshots => 40,
            Phase::GeneratingVariants => 85,
            Phase::Saving => 100,
            Phase::Complete => 100,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
