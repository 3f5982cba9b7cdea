//! Background-style retry of queued recoverable errors.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::PipelineError;
use super::policy::RetryPolicy;
use super::queue::ErrorQueue;
use crate::metrics::METRICS;

/// Outcome of one [`RecoveryScheduler::run_pending`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub attempted: usize,
    pub recovered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RecoveryScheduler {
    policy: RetryPolicy,
}

impl Default for RecoveryScheduler {
    fn default() -> Self {
        Self::new(RetryPolicy::exponential(
            3,
            Duration::from_millis(1_000),
            Duration::from_millis(30_000),
        ))
    }
}

impl RecoveryScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retry every error that can still be retried, once each.
    ///
    /// Successes leave the queue. Failures stay queued with `retry_count`
    /// bumped, so an error drops out of later sweeps once its budget is spent.
    pub async fn run_pending<F, Fut, E>(&self, queue: &ErrorQueue, handler: F) -> RecoveryReport
    where
        F: FnMut(PipelineError) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut handler = handler;
        self.run_pending_grouped(
            queue,
            |_| None::<()>,
            move |mut batch: Vec<PipelineError>| handler(batch.swap_remove(0)),
        )
        .await
    }

    /// Like [`run_pending`](Self::run_pending), but errors sharing a key are
    /// retried together with one handler call. Errors without a key form a
    /// group of their own.
    ///
    /// A successful call removes every error of the group; a failed one
    /// bumps `retry_count` on each of them. The report counts groups.
    pub async fn run_pending_grouped<K, G, F, Fut, E>(
        &self,
        queue: &ErrorQueue,
        mut key: G,
        mut handler: F,
    ) -> RecoveryReport
    where
        K: Ord,
        G: FnMut(&PipelineError) -> Option<K>,
        F: FnMut(Vec<PipelineError>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut groups: Vec<Vec<PipelineError>> = Vec::new();
        let mut slots: BTreeMap<K, usize> = BTreeMap::new();
        for error in queue.recoverable() {
            match key(&error) {
                Some(k) => match slots.entry(k) {
                    Entry::Occupied(slot) => groups[*slot.get()].push(error),
                    Entry::Vacant(slot) => {
                        slot.insert(groups.len());
                        groups.push(vec![error]);
                    }
                },
                None => groups.push(vec![error]),
            }
        }

        let mut report = RecoveryReport::default();
        for group in groups {
            let retry_count = group.iter().map(|e| e.retry_count).max().unwrap_or(0);
            let delay = self.policy.delay_for(retry_count + 1);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            report.attempted += 1;
            METRICS.inc_retries();

            let ids: Vec<Uuid> = group.iter().map(|e| e.id).collect();
            let codes: Vec<&'static str> = group.iter().map(|e| e.code.as_str()).collect();
            match handler(group).await {
                Ok(()) => {
                    for id in &ids {
                        queue.remove(*id);
                    }
                    report.recovered += 1;
                    info!(errors = ids.len(), codes = ?codes, "errors recovered");
                }
                Err(e) => {
                    for id in &ids {
                        queue.update(*id, |err| {
                            err.record_retry();
                        });
                    }
                    report.failed += 1;
                    warn!(errors = ids.len(), codes = ?codes, error = %e, "recovery attempt failed");
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Phase;
    use crate::recovery::code::ErrorCode;

    fn queue_with(codes: &[ErrorCode]) -> ErrorQueue {
        let queue = ErrorQueue::new();
        for code in codes {
            queue.push(PipelineError::new(*code, Phase::GeneratingVariants, "x"));
        }
        queue
    }

    #[tokio::test(start_paused = true)]
    async fn successes_leave_the_queue() {
        let queue = queue_with(&[ErrorCode::GenerationFailed, ErrorCode::DatabaseFailed]);
        let report = RecoveryScheduler::default()
            .run_pending(&queue, |_| async { Ok::<(), String>(()) })
            .await;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.recovered, 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.all()[0].code, ErrorCode::DatabaseFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn grouped_errors_share_one_attempt() {
        let queue = ErrorQueue::new();
        for code in [
            ErrorCode::PixelFaithfulFailed,
            ErrorCode::SemanticFailed,
            ErrorCode::AllStrategiesFailed,
        ] {
            queue.push(
                PipelineError::new(code, Phase::GeneratingVariants, "x").with_component("hero-1"),
            );
        }
        queue.push(
            PipelineError::new(ErrorCode::StorageFailed, Phase::Saving, "x").with_component("cta-2"),
        );
        queue.push(PipelineError::new(ErrorCode::Unknown, Phase::Saving, "x"));

        let mut sizes = Vec::new();
        let report = RecoveryScheduler::new(RetryPolicy::none())
            .run_pending_grouped(
                &queue,
                |e| e.component_id.clone(),
                |batch| {
                    sizes.push(batch.len());
                    let fail = batch[0].component_id.as_deref() == Some("cta-2");
                    async move {
                        if fail {
                            Err("still broken")
                        } else {
                            Ok(())
                        }
                    }
                },
            )
            .await;

        assert_eq!(sizes, vec![3, 1, 1]);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.recovered, 2);
        assert_eq!(report.failed, 1);
        let left = queue.all();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].component_id.as_deref(), Some("cta-2"));
        assert_eq!(left[0].retry_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_spend_the_budget_and_stop() {
        let queue = queue_with(&[ErrorCode::AllStrategiesFailed]);
        let scheduler = RecoveryScheduler::default();
        for _ in 0..5 {
            scheduler
                .run_pending(&queue, |_| async { Err::<(), _>("still broken") })
                .await;
        }
        let error = &queue.all()[0];
        assert_eq!(error.retry_count, error.max_retries);
        assert!(!error.can_retry());

        let report = scheduler
            .run_pending(&queue, |_| async { Ok::<(), String>(()) })
            .await;
        assert_eq!(report.attempted, 0);
    }
}
