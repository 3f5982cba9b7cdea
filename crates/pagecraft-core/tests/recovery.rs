use std::time::Duration;

use pagecraft_core::recovery::backoff_delay;
use pagecraft_core::{
    classify, format_error_line, ErrorCode, ErrorQueue, ErrorSummary, FailedErrorStore, Phase,
    PipelineError, RecoveryScheduler, RetryPolicy, SemanticType, Severity,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

#[test]
fn generation_message_with_timeout_classifies_as_generation_timeout() {
    for message in [
        "Generation timeout after 30000ms",
        "variant generation TIMED OUT",
        "component generation: timeout",
    ] {
        assert_eq!(classify(message, None), ErrorCode::GenerationTimeout, "{message}");
    }
    assert_eq!(
        classify("upstream timed out", Some(Phase::GeneratingVariants)),
        ErrorCode::GenerationTimeout
    );
}

#[test]
fn database_failures_can_never_be_retried() {
    let mut error = PipelineError::new(ErrorCode::DatabaseFailed, Phase::Saving, "write failed");
    for _ in 0..10 {
        assert!(!error.can_retry());
        error.record_retry();
    }
    assert_eq!(error.severity, Severity::Critical);
}

#[test]
fn backoff_is_non_decreasing_below_cap_and_never_exceeds_it() {
    let cap = Duration::from_millis(8_000);
    let policy = RetryPolicy::exponential(12, Duration::from_millis(250), cap).with_jitter(0.0);
    let mut rng = StdRng::seed_from_u64(99);
    let delays: Vec<_> = (1..=12).map(|n| backoff_delay(&policy, n, &mut rng)).collect();
    for pair in delays.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert!(delays.iter().all(|d| *d <= cap));

    let jittered = RetryPolicy::exponential(12, Duration::from_millis(250), cap);
    for n in 1..=12 {
        assert!(backoff_delay(&jittered, n, &mut rng) <= cap);
    }
}

#[tokio::test(start_paused = true)]
async fn queue_scheduler_and_store_work_together() {
    let dir = tempdir().unwrap();
    let store = FailedErrorStore::new(dir.path()).unwrap();
    let queue = ErrorQueue::new();

    let errors = vec![
        PipelineError::new(ErrorCode::SemanticFailed, Phase::GeneratingVariants, "template")
            .with_owner(SemanticType::Faq),
        PipelineError::new(ErrorCode::ScreenshotFailed, Phase::CapturingScreenshots, "clip")
            .with_owner(SemanticType::Hero),
        PipelineError::new(ErrorCode::DatabaseFailed, Phase::Saving, "insert"),
    ];
    for error in &errors {
        store.record("run-a", error).unwrap();
    }
    queue.extend(errors);

    let faq_id = queue.by_owner(SemanticType::Faq)[0].id;
    let report = RecoveryScheduler::new(RetryPolicy::linear(3, Duration::from_millis(5)))
        .run_pending(&queue, |error| async move {
            if error.owner == Some(SemanticType::Faq) {
                Ok(())
            } else {
                Err("still failing")
            }
        })
        .await;

    assert_eq!(report.attempted, 2);
    assert_eq!(report.recovered, 1);
    assert_eq!(report.failed, 1);
    assert!(queue.get(faq_id).is_none());
    assert_eq!(queue.summary().retried, 1);

    let persisted = store.load_run("run-a").unwrap();
    assert_eq!(persisted.len(), 3);
    let summary = ErrorSummary::from_errors(&persisted);
    assert_eq!(summary.by_code.len(), 3);
    assert_eq!(summary.worst(), Some(Severity::Critical));

    let lines: Vec<String> = queue.all().iter().map(format_error_line).collect();
    assert!(lines.iter().any(|l| l == "[LOW] screenshot_failed hero: clip (retry 1/3)"));
    assert!(lines.iter().any(|l| l == "[CRITICAL] database_failed: insert"));
}
