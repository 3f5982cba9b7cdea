//! Pipeline run outcome.

use pagecraft_core::{DetectionReport, GeneratedComponent, PipelineError, Region};
use serde::Serialize;

/// Result of one complete run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: String,

    /// `errors.is_empty() || generated_count > 0`.
    pub success: bool,

    pub detected_count: usize,
    pub generated_count: usize,
    pub failed_count: usize,

    /// One per detected region, in page order, failed ones included.
    pub components: Vec<GeneratedComponent>,

    /// Regions as synthesized, with screenshot paths where capture worked.
    pub regions: Vec<Region>,

    pub errors: Vec<PipelineError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionReport>,

    pub duration_ms: u64,
}

impl PipelineResult {
    /// The run-level success predicate.
    pub fn success_of(errors: &[PipelineError], generated_count: usize) -> bool {
        errors.is_empty() || generated_count > 0
    }

    pub fn recoverable_errors(&self) -> impl Iterator<Item = &PipelineError> {
        self.errors.iter().filter(|e| e.can_retry())
    }

    /// Index of `region_id` among regions of the same kind.
    pub fn kind_index(&self, region_id: &str) -> Option<usize> {
        let region = self.regions.iter().find(|r| r.id == region_id)?;
        Some(
            self.regions
                .iter()
                .take_while(|r| r.id != region_id)
                .filter(|r| r.kind == region.kind)
                .count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::{BoundingBox, ErrorCode, Phase, SemanticType};

    #[test]
    fn success_is_lenient() {
        let err = PipelineError::new(ErrorCode::ScreenshotFailed, Phase::CapturingScreenshots, "x");
        assert!(PipelineResult::success_of(&[], 0));
        assert!(PipelineResult::success_of(&[err.clone()], 1));
        assert!(!PipelineResult::success_of(&[err], 0));
    }

    #[test]
    fn kind_index_counts_same_kind_predecessors() {
        let region = |kind, order| {
            Region::new(kind, order, BoundingBox::new(0.0, order as f64 * 100.0, 10.0, 90.0), String::new())
        };
        let result = PipelineResult {
            run_id: "r".into(),
            success: true,
            detected_count: 4,
            generated_count: 0,
            failed_count: 0,
            components: vec![],
            regions: vec![
                region(SemanticType::Header, 0),
                region(SemanticType::Features, 1),
                region(SemanticType::Stats, 2),
                region(SemanticType::Features, 3),
            ],
            errors: vec![],
            detection: None,
            duration_ms: 0,
        };
        assert_eq!(result.kind_index("features-3"), Some(1));
        assert_eq!(result.kind_index("header-0"), Some(0));
        assert_eq!(result.kind_index("nope"), None);
    }
}
