//! Human- and machine-readable error reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::code::{ErrorCode, Severity};
use super::error::PipelineError;

/// Counts grouped by code, severity and owning section type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total: usize,
    pub recoverable: usize,
    pub by_code: BTreeMap<ErrorCode, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Keyed by semantic type name; `unowned` for run-level errors.
    pub by_owner: BTreeMap<String, usize>,
}

impl ErrorSummary {
    pub fn from_errors<'a>(errors: impl IntoIterator<Item = &'a PipelineError>) -> Self {
        let mut summary = ErrorSummary::default();
        for error in errors {
            summary.total += 1;
            if error.can_retry() {
                summary.recoverable += 1;
            }
            *summary.by_code.entry(error.code).or_default() += 1;
            *summary.by_severity.entry(error.severity).or_default() += 1;
            let owner = error
                .owner
                .map(|o| o.as_str().to_string())
                .unwrap_or_else(|| "unowned".to_string());
            *summary.by_owner.entry(owner).or_default() += 1;
        }
        summary
    }

    /// Most severe level present, if any.
    pub fn worst(&self) -> Option<Severity> {
        self.by_severity.keys().next_back().copied()
    }
}

/// One-line rendering: `[HIGH] generation_failed hero: msg (retry 1/3)`.
pub fn format_error_line(error: &PipelineError) -> String {
    let mut line = format!(
        "[{}] {}",
        error.severity.as_str().to_ascii_uppercase(),
        error.code
    );
    if let Some(owner) = error.owner {
        line.push(' ');
        line.push_str(owner.as_str());
    }
    line.push_str(": ");
    line.push_str(&error.message);
    if error.max_retries > 0 {
        line.push_str(&format!(
            " (retry {}/{})",
            error.retry_count, error.max_retries
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, SemanticType};

    #[test]
    fn formats_line() {
        let mut error = PipelineError::new(ErrorCode::GenerationFailed, Phase::GeneratingVariants, "msg")
            .with_owner(SemanticType::Hero);
        error.record_retry();
        assert_eq!(
            format_error_line(&error),
            "[HIGH] generation_failed hero: msg (retry 1/3)"
        );
    }

    #[test]
    fn unretryable_line_has_no_counter() {
        let error = PipelineError::new(ErrorCode::DatabaseFailed, Phase::Saving, "insert failed");
        assert_eq!(format_error_line(&error), "[CRITICAL] database_failed: insert failed");
    }

    #[test]
    fn summary_groups() {
        let errors = vec![
            PipelineError::new(ErrorCode::SemanticFailed, Phase::GeneratingVariants, "a")
                .with_owner(SemanticType::Faq),
            PipelineError::new(ErrorCode::SemanticFailed, Phase::GeneratingVariants, "b")
                .with_owner(SemanticType::Faq),
            PipelineError::new(ErrorCode::DatabaseFailed, Phase::Saving, "c"),
        ];
        let summary = ErrorSummary::from_errors(&errors);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.recoverable, 2);
        assert_eq!(summary.by_code[&ErrorCode::SemanticFailed], 2);
        assert_eq!(summary.by_owner["faq"], 2);
        assert_eq!(summary.by_owner["unowned"], 1);
        assert_eq!(summary.worst(), Some(Severity::Critical));
    }
}
