//! Global atomic counters for PageCraft observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters. No allocations, no locking.
pub struct Metrics {
    regions_detected: AtomicU64,
    variants_generated: AtomicU64,
    strategy_failures: AtomicU64,
    errors_recorded: AtomicU64,
    retries_attempted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            regions_detected: AtomicU64::new(0),
            variants_generated: AtomicU64::new(0),
            strategy_failures: AtomicU64::new(0),
            errors_recorded: AtomicU64::new(0),
            retries_attempted: AtomicU64::new(0),
        }
    }

    /// Add `n` to the regions-detected counter.
    pub fn add_regions_detected(&self, n: u64) {
        self.regions_detected.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "regions_detected", n, "counter incremented");
    }

    pub fn inc_variants_generated(&self) {
        self.variants_generated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "variants_generated", "counter incremented");
    }

    pub fn inc_strategy_failures(&self) {
        self.strategy_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "strategy_failures", "counter incremented");
    }

    pub fn inc_errors_recorded(&self) {
        self.errors_recorded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "errors_recorded", "counter incremented");
    }

    pub fn inc_retries(&self) {
        self.retries_attempted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "retries_attempted", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a run, CLI exit)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            regions_detected = self.regions_detected(),
            variants_generated = self.variants_generated(),
            strategy_failures = self.strategy_failures(),
            errors_recorded = self.errors_recorded(),
            retries_attempted = self.retries_attempted(),
        );
    }

    pub fn regions_detected(&self) -> u64 {
        self.regions_detected.load(Ordering::Relaxed)
    }

    pub fn variants_generated(&self) -> u64 {
        self.variants_generated.load(Ordering::Relaxed)
    }

    pub fn strategy_failures(&self) -> u64 {
        self.strategy_failures.load(Ordering::Relaxed)
    }

    pub fn errors_recorded(&self) -> u64 {
        self.errors_recorded.load(Ordering::Relaxed)
    }

    pub fn retries_attempted(&self) -> u64 {
        self.retries_attempted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.regions_detected.store(0, Ordering::Relaxed);
        self.variants_generated.store(0, Ordering::Relaxed);
        self.strategy_failures.store(0, Ordering::Relaxed);
        self.errors_recorded.store(0, Ordering::Relaxed);
        self.retries_attempted.store(0, Ordering::Relaxed);
    }
}
