//! Keyword classification of raw fault messages into error codes.

use super::code::ErrorCode;
use crate::domain::Phase;

const TIMEOUT_KEYWORDS: [&str; 3] = ["timeout", "timed out", "deadline exceeded"];
const INVALID_KEYWORDS: [&str; 4] = ["invalid", "malformed", "parse", "syntax"];
const EMPTY_KEYWORDS: [&str; 4] = ["no elements", "no regions", "nothing found", "not found"];

const DATABASE_KEYWORDS: [&str; 4] = ["database", "metadata store", "sql", "db error"];
const STORAGE_KEYWORDS: [&str; 4] = ["storage", "output store", "upload", "disk"];
const SCREENSHOT_KEYWORDS: [&str; 2] = ["screenshot", "capture"];
const DETECTION_KEYWORDS: [&str; 3] = ["detect", "selector", "region"];
const GENERATION_KEYWORDS: [&str; 5] = ["generat", "synthes", "variant", "component", "vision"];

fn any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn detection_code(msg: &str) -> ErrorCode {
    if any(msg, &TIMEOUT_KEYWORDS) {
        ErrorCode::DetectionTimeout
    } else if any(msg, &EMPTY_KEYWORDS) {
        ErrorCode::DetectionNoElements
    } else {
        ErrorCode::DetectionFailed
    }
}

fn generation_code(msg: &str) -> ErrorCode {
    if any(msg, &TIMEOUT_KEYWORDS) {
        ErrorCode::GenerationTimeout
    } else if any(msg, &INVALID_KEYWORDS) {
        ErrorCode::GenerationInvalidMarkup
    } else {
        ErrorCode::GenerationFailed
    }
}

/// Classify a fault message. Keywords win over the phase hint, except that
/// a message matching both the detection and generation families follows
/// the hint. With no keyword match the hint alone decides.
pub fn classify(message: &str, phase: Option<Phase>) -> ErrorCode {
    let msg = message.to_lowercase();

    if any(&msg, &DATABASE_KEYWORDS) {
        return ErrorCode::DatabaseFailed;
    }
    if any(&msg, &STORAGE_KEYWORDS) {
        return ErrorCode::StorageFailed;
    }
    if any(&msg, &SCREENSHOT_KEYWORDS) {
        return ErrorCode::ScreenshotFailed;
    }
    if msg.contains("all strategies") {
        return ErrorCode::AllStrategiesFailed;
    }
    if msg.contains("pixel") {
        return ErrorCode::PixelFaithfulFailed;
    }
    if msg.contains("accessib") {
        return ErrorCode::AccessibleFailed;
    }
    if msg.contains("semantic") {
        return ErrorCode::SemanticFailed;
    }
    match (
        any(&msg, &DETECTION_KEYWORDS),
        any(&msg, &GENERATION_KEYWORDS),
    ) {
        (true, true) if phase == Some(Phase::GeneratingVariants) => {
            return generation_code(&msg)
        }
        (true, _) => return detection_code(&msg),
        (false, true) => return generation_code(&msg),
        (false, false) => {}
    }

    match phase {
        Some(Phase::Detecting) => detection_code(&msg),
        Some(Phase::GeneratingVariants) => generation_code(&msg),
        Some(Phase::CapturingScreenshots) => ErrorCode::ScreenshotFailed,
        Some(Phase::Saving) => ErrorCode::StorageFailed,
        _ => ErrorCode::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_timeout() {
        assert_eq!(
            classify("Generation timeout after 30s", None),
            ErrorCode::GenerationTimeout
        );
        assert_eq!(
            classify("vision request timed out", None),
            ErrorCode::GenerationTimeout
        );
    }

    #[test]
    fn detection_family() {
        assert_eq!(classify("region detection crashed", None), ErrorCode::DetectionFailed);
        assert_eq!(classify("Detection TIMEOUT", None), ErrorCode::DetectionTimeout);
        assert_eq!(
            classify("detector found no elements", None),
            ErrorCode::DetectionNoElements
        );
    }

    #[test]
    fn invalid_markup_is_generation() {
        assert_eq!(
            classify("generated source is invalid: <div> left open", None),
            ErrorCode::GenerationInvalidMarkup
        );
        assert_eq!(
            classify("malformed output", Some(Phase::GeneratingVariants)),
            ErrorCode::GenerationInvalidMarkup
        );
    }

    #[test]
    fn infrastructure_codes() {
        assert_eq!(classify("Database connection refused", None), ErrorCode::DatabaseFailed);
        assert_eq!(classify("upload rejected", None), ErrorCode::StorageFailed);
        assert_eq!(classify("screenshot failed: clip", None), ErrorCode::ScreenshotFailed);
    }

    #[test]
    fn strategy_codes() {
        assert_eq!(classify("pixel strategy blew up", None), ErrorCode::PixelFaithfulFailed);
        assert_eq!(classify("semantic failed", None), ErrorCode::SemanticFailed);
        assert_eq!(classify("accessible failed", None), ErrorCode::AccessibleFailed);
        assert_eq!(
            classify("all strategies failed for hero-1", None),
            ErrorCode::AllStrategiesFailed
        );
    }

    #[test]
    fn generation_phase_wins_over_region_wording() {
        assert_eq!(
            classify(
                "variant generation timeout for region hero-1",
                Some(Phase::GeneratingVariants)
            ),
            ErrorCode::GenerationTimeout
        );
        assert_eq!(
            classify("component for region hero-1 is malformed", Some(Phase::GeneratingVariants)),
            ErrorCode::GenerationInvalidMarkup
        );
        assert_eq!(
            classify("region generation timeout", Some(Phase::Detecting)),
            ErrorCode::DetectionTimeout
        );
    }

    #[test]
    fn phase_hint_breaks_ties() {
        assert_eq!(classify("boom", Some(Phase::Detecting)), ErrorCode::DetectionFailed);
        assert_eq!(classify("boom", Some(Phase::Saving)), ErrorCode::StorageFailed);
        assert_eq!(classify("boom", None), ErrorCode::Unknown);
        assert_eq!(classify("boom", Some(Phase::Initializing)), ErrorCode::Unknown);
    }
}
