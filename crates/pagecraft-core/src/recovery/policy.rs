//! Retry policy shared by the detector, capture and the recovery scheduler.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::RecoveryError;
use crate::metrics::METRICS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    None,
    Linear,
    Exponential,
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub kind: BackoffKind,
    /// Milliseconds.
    pub base_delay_ms: u64,
    /// Milliseconds; no computed delay exceeds it.
    pub max_delay_ms: u64,
    /// Random extra fraction of the exponential delay, in `[0, 1]`.
    pub jitter: f64,
    /// Total attempts including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(3, Duration::from_millis(1_000))
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            kind: BackoffKind::None,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: 0.0,
            max_attempts: 1,
        }
    }

    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self {
            kind: BackoffKind::Linear,
            base_delay_ms: base.as_millis() as u64,
            max_delay_ms: 30_000,
            jitter: 0.0,
            max_attempts,
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            kind: BackoffKind::Exponential,
            base_delay_ms: base.as_millis() as u64,
            max_delay_ms: max.as_millis() as u64,
            jitter: 0.3,
            max_attempts,
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(self, attempt, &mut rand::thread_rng())
    }
}

/// Compute the delay before retry `attempt` (1-based) with an explicit RNG.
///
/// Linear: `attempt * base`. Exponential: `base * 2^(attempt - 1)` plus up
/// to `jitter` of that, capped at `max_delay`.
pub fn backoff_delay<R: Rng + ?Sized>(policy: &RetryPolicy, attempt: u32, rng: &mut R) -> Duration {
    let attempt = attempt.max(1);
    let millis = match policy.kind {
        BackoffKind::None => 0,
        BackoffKind::Linear => policy.base_delay_ms.saturating_mul(u64::from(attempt)),
        BackoffKind::Exponential => {
            let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
            let base = policy.base_delay_ms.saturating_mul(factor);
            let jitter = if policy.jitter > 0.0 {
                (base as f64 * policy.jitter * rng.gen::<f64>()) as u64
            } else {
                0
            };
            base.saturating_add(jitter)
        }
    };
    Duration::from_millis(millis.min(policy.max_delay_ms))
}

/// Run `op` until it succeeds or `policy.max_attempts` is spent, sleeping
/// between attempts. The final error names the attempt count and the last
/// failure.
pub async fn retry_with_policy<T, E, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RecoveryError>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt == max_attempts {
                    break;
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "attempt failed; retrying"
                );
                METRICS.inc_retries();
                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(RecoveryError::Exhausted {
        operation: operation.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn linear_grows_by_base() {
        let policy = RetryPolicy::linear(5, Duration::from_millis(100));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(backoff_delay(&policy, 1, &mut rng), Duration::from_millis(100));
        assert_eq!(backoff_delay(&policy, 3, &mut rng), Duration::from_millis(300));
    }

    #[test]
    fn exponential_is_monotonic_below_cap_and_never_above() {
        let policy =
            RetryPolicy::exponential(20, Duration::from_millis(100), Duration::from_millis(5_000))
                .with_jitter(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut previous = Duration::ZERO;
        for attempt in 1..=20 {
            let delay = backoff_delay(&policy, attempt, &mut rng);
            assert!(delay >= previous);
            assert!(delay <= Duration::from_millis(5_000));
            previous = delay;
        }
        assert_eq!(backoff_delay(&policy, 64, &mut rng), Duration::from_millis(5_000));
    }

    #[test]
    fn jitter_stays_within_fraction_and_cap() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_millis(1_000), Duration::from_millis(60_000));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let delay = backoff_delay(&policy, 2, &mut rng).as_millis() as u64;
            assert!((2_000..=2_600).contains(&delay), "{delay}");
        }
    }

    #[test]
    fn none_never_waits() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(backoff_delay(&RetryPolicy::none(), 3, &mut rng), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::linear(3, Duration::from_millis(10));
        let value = retry_with_policy("detect", &policy, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err("flaky")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_error_carries_attempts_and_last_message() {
        let policy = RetryPolicy::linear(2, Duration::from_millis(10));
        let err = retry_with_policy("capture", &policy, |attempt| async move {
            Err::<(), _>(format!("failure {attempt}"))
        })
        .await
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("2 attempt(s)"));
        assert!(text.contains("failure 2"));
    }
}
