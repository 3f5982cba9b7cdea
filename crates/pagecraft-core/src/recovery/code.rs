//! Error codes and their static severity / retry table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::StrategyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of failure codes recorded by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    DetectionFailed,
    DetectionTimeout,
    DetectionNoElements,
    GenerationFailed,
    GenerationTimeout,
    GenerationInvalidMarkup,
    PixelFaithfulFailed,
    SemanticFailed,
    AccessibleFailed,
    AllStrategiesFailed,
    ScreenshotFailed,
    StorageFailed,
    DatabaseFailed,
    Unknown,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 14] = [
        ErrorCode::DetectionFailed,
        ErrorCode::DetectionTimeout,
        ErrorCode::DetectionNoElements,
        ErrorCode::GenerationFailed,
        ErrorCode::GenerationTimeout,
        ErrorCode::GenerationInvalidMarkup,
        ErrorCode::PixelFaithfulFailed,
        ErrorCode::SemanticFailed,
        ErrorCode::AccessibleFailed,
        ErrorCode::AllStrategiesFailed,
        ErrorCode::ScreenshotFailed,
        ErrorCode::StorageFailed,
        ErrorCode::DatabaseFailed,
        ErrorCode::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DetectionFailed => "detection_failed",
            ErrorCode::DetectionTimeout => "detection_timeout",
            ErrorCode::DetectionNoElements => "detection_no_elements",
            ErrorCode::GenerationFailed => "generation_failed",
            ErrorCode::GenerationTimeout => "generation_timeout",
            ErrorCode::GenerationInvalidMarkup => "generation_invalid_markup",
            ErrorCode::PixelFaithfulFailed => "pixel_faithful_failed",
            ErrorCode::SemanticFailed => "semantic_failed",
            ErrorCode::AccessibleFailed => "accessible_failed",
            ErrorCode::AllStrategiesFailed => "all_strategies_failed",
            ErrorCode::ScreenshotFailed => "screenshot_failed",
            ErrorCode::StorageFailed => "storage_failed",
            ErrorCode::DatabaseFailed => "database_failed",
            ErrorCode::Unknown => "unknown",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::DetectionFailed
            | ErrorCode::GenerationFailed
            | ErrorCode::AllStrategiesFailed
            | ErrorCode::StorageFailed => Severity::High,
            ErrorCode::DetectionTimeout
            | ErrorCode::DetectionNoElements
            | ErrorCode::GenerationTimeout
            | ErrorCode::GenerationInvalidMarkup
            | ErrorCode::Unknown => Severity::Medium,
            ErrorCode::PixelFaithfulFailed
            | ErrorCode::SemanticFailed
            | ErrorCode::AccessibleFailed
            | ErrorCode::ScreenshotFailed => Severity::Low,
            ErrorCode::DatabaseFailed => Severity::Critical,
        }
    }

    pub fn recoverable(&self) -> bool {
        !matches!(
            self,
            ErrorCode::GenerationInvalidMarkup | ErrorCode::DatabaseFailed
        )
    }

    pub fn max_retries(&self) -> u32 {
        match self {
            ErrorCode::GenerationInvalidMarkup | ErrorCode::DatabaseFailed => 0,
            ErrorCode::Unknown => 1,
            ErrorCode::DetectionNoElements
            | ErrorCode::PixelFaithfulFailed
            | ErrorCode::SemanticFailed
            | ErrorCode::AccessibleFailed
            | ErrorCode::AllStrategiesFailed => 2,
            _ => 3,
        }
    }

    /// Code recorded when a single strategy fails.
    pub fn for_strategy(strategy: StrategyKind) -> Self {
        match strategy {
            StrategyKind::PixelFaithful => ErrorCode::PixelFaithfulFailed,
            StrategyKind::Semantic => ErrorCode::SemanticFailed,
            StrategyKind::Accessible => ErrorCode::AccessibleFailed,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown error code: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecoverable_codes_have_no_retries() {
        for code in ErrorCode::ALL {
            if !code.recoverable() {
                assert_eq!(code.max_retries(), 0, "{code}");
            } else {
                assert!(code.max_retries() > 0, "{code}");
            }
        }
    }

    #[test]
    fn database_failure_is_critical() {
        assert_eq!(ErrorCode::DatabaseFailed.severity(), Severity::Critical);
        assert!(!ErrorCode::DatabaseFailed.recoverable());
    }

    #[test]
    fn parses_names() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), code);
        }
        assert_eq!("Storage-Failed".parse::<ErrorCode>().unwrap(), ErrorCode::StorageFailed);
        assert!("nope".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn severity_orders_by_impact() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }
}
