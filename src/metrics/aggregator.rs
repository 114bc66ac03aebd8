use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::percentiles::{LatencyDistribution, LatencyPercentiles};
use super::window::{BucketedWindow, LatencyBucket};
use crate::config::MetricsSection;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe error/latency engine.
///
/// Request plumbing calls `record_server_error()` and
/// `record_request_latency()`; the metrics and health endpoints call the
/// query methods. Construct one per process and share it behind an `Arc`.
pub struct MetricsAggregator {
    errors: BucketedWindow<u64>,
    latency: BucketedWindow<LatencyBucket>,
    /// Every latency since the last reset, for percentiles only.
    distribution: LatencyDistribution,
    limits: MetricsSection,
    clock: Arc<dyn Clock>,
}

/// Overall verdict derived from the two breach checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    /// Exactly one of the error or latency thresholds is breached.
    Degraded,
    /// Both thresholds are breached.
    Critical,
}

impl HealthStatus {
    pub fn from_breaches(errors: bool, latency: bool) -> Self {
        match (errors, latency) {
            (false, false) => Self::Healthy,
            (true, true) => Self::Critical,
            _ => Self::Degraded,
        }
    }

    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }
}

/// Point-in-time read of every query the aggregator answers.
///
/// Each window is read once, so the breach flags and `status` always agree
/// with the counts next to them.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub generated_at: DateTime<Utc>,

    // Error window
    pub error_count_in_window: u64,
    pub total_error_count: u64,
    pub error_threshold_breached: bool,

    // Latency window
    pub requests_in_window: u64,
    pub total_requests: u64,
    pub average_latency_ms: f64,
    pub latency_threshold_breached: bool,

    pub status: HealthStatus,
    pub latency_percentiles: LatencyPercentiles,
    pub limits: MetricsSection,
}

// ─── MetricsAggregator impl ──────────────────────────────────────

impl MetricsAggregator {
    /// Aggregator on the wall clock.
    pub fn new(limits: MetricsSection) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// Aggregator on a caller-supplied clock.
    ///
    /// Window sizes must be non-zero; `MetricsSection::validate` guarantees
    /// that for loaded configs.
    pub fn with_clock(limits: MetricsSection, clock: Arc<dyn Clock>) -> Self {
        Self {
            errors: BucketedWindow::new(limits.error_window_secs as usize),
            latency: BucketedWindow::new(limits.latency_window_secs as usize),
            distribution: LatencyDistribution::new(),
            limits,
            clock,
        }
    }

    // ── Writes ──────────────────────────────────────────────────

    /// Count one server-side (5xx) failure.
    pub fn record_server_error(&self) {
        let now = self.clock.now_secs();
        self.errors.record(now, |count| *count += 1);
    }

    /// Count one completed request that took `millis` milliseconds.
    ///
    /// Any value is accepted: negatives are folded into the average as-is and
    /// the per-second sum wraps rather than overflowing.
    pub fn record_request_latency(&self, millis: i64) {
        let now = self.clock.now_secs();
        self.latency.record(now, |b| {
            b.sum_ms = b.sum_ms.wrapping_add(millis);
            b.count += 1;
        });
        self.distribution.record(millis);
    }

    // ── Error queries ───────────────────────────────────────────

    pub fn error_count_in_window(&self) -> u64 {
        self.errors.fold(self.clock.now_secs(), 0, |acc, n| acc + n)
    }

    pub fn total_error_count(&self) -> u64 {
        self.errors.lifetime_total()
    }

    /// Error breach check against the configured `error_threshold`.
    pub fn is_error_threshold_breached(&self) -> bool {
        self.is_error_threshold_breached_at(self.limits.error_threshold)
    }

    /// Adaptive error breach check.
    ///
    /// Request volume comes from the latency window. Under
    /// `min_error_samples` requests nothing breaches; from
    /// `high_traffic_requests` on the error rate must exceed
    /// `max_error_rate`; in between the error count must exceed `threshold`
    /// capped at half the requests seen.
    pub fn is_error_threshold_breached_at(&self, threshold: u64) -> bool {
        let errors = self.error_count_in_window();
        let requests = self.total_request_count_in_window();
        self.errors_breach(errors, requests, threshold)
    }

    fn errors_breach(&self, errors: u64, requests: u64, threshold: u64) -> bool {
        if requests < self.limits.min_error_samples {
            return false;
        }
        if requests >= self.limits.high_traffic_requests {
            let rate = errors as f64 / requests as f64;
            return rate > self.limits.max_error_rate;
        }
        errors > threshold.min(requests / 2)
    }

    // ── Latency queries ─────────────────────────────────────────

    /// Mean latency over the window in ms; 0.0 without samples.
    pub fn average_latency_in_window(&self) -> f64 {
        let (sum, count) = self.latency_totals();
        mean(sum, count)
    }

    pub fn total_request_count_in_window(&self) -> u64 {
        self.latency_totals().1
    }

    /// Requests observed since construction or the last reset.
    pub fn total_request_count(&self) -> u64 {
        self.latency.lifetime_total()
    }

    /// Latency breach check against the configured `latency_threshold_ms`.
    pub fn is_latency_threshold_breached(&self) -> bool {
        self.is_latency_threshold_breached_at(self.limits.latency_threshold_ms)
    }

    /// True when the window has at least `min_latency_samples` requests and
    /// their mean is strictly above `threshold_ms`.
    pub fn is_latency_threshold_breached_at(&self, threshold_ms: f64) -> bool {
        let (sum, count) = self.latency_totals();
        self.latency_breach(count, mean(sum, count), threshold_ms)
    }

    fn latency_breach(&self, requests: u64, average_ms: f64, threshold_ms: f64) -> bool {
        requests >= self.limits.min_latency_samples && average_ms > threshold_ms
    }

    fn latency_totals(&self) -> (i64, u64) {
        self.latency
            .fold(self.clock.now_secs(), (0i64, 0u64), |(sum, count), b| {
                (sum.wrapping_add(b.sum_ms), count + b.count)
            })
    }

    // ── Aggregate ───────────────────────────────────────────────

    /// Unhealthy iff either threshold is breached.
    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_breaches(
            self.is_error_threshold_breached(),
            self.is_latency_threshold_breached(),
        )
    }

    /// Produce a read-only snapshot for the metrics and health endpoints.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let errors = self.error_count_in_window();
        let (sum, requests) = self.latency_totals();
        let average_latency_ms = mean(sum, requests);

        let error_threshold_breached =
            self.errors_breach(errors, requests, self.limits.error_threshold);
        let latency_threshold_breached = self.latency_breach(
            requests,
            average_latency_ms,
            self.limits.latency_threshold_ms,
        );

        MetricsSnapshot {
            generated_at: Utc::now(),
            error_count_in_window: errors,
            total_error_count: self.total_error_count(),
            error_threshold_breached,
            requests_in_window: requests,
            total_requests: self.total_request_count(),
            average_latency_ms,
            latency_threshold_breached,
            status: HealthStatus::from_breaches(
                error_threshold_breached,
                latency_threshold_breached,
            ),
            latency_percentiles: self.distribution.percentiles(),
            limits: self.limits.clone(),
        }
    }

    /// Wipe all windows, lifetime totals and the latency distribution.
    pub fn reset(&self) {
        self.errors.reset();
        self.latency.reset();
        self.distribution.reset();
        tracing::info!("metrics reset");
    }
}

fn mean(sum: i64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::clock::ManualClock;

    const T0: i64 = 1_700_000_000;

    fn fixture() -> (MetricsAggregator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let agg = MetricsAggregator::with_clock(MetricsSection::default(), clock.clone());
        (agg, clock)
    }

    fn record_requests(agg: &MetricsAggregator, n: u64, millis: i64) {
        for _ in 0..n {
            agg.record_request_latency(millis);
        }
    }

    fn record_errors(agg: &MetricsAggregator, n: u64) {
        for _ in 0..n {
            agg.record_server_error();
        }
    }

    #[test]
    fn errors_accumulate_within_one_second() {
        let (agg, _) = fixture();
        record_errors(&agg, 7);
        assert_eq!(agg.error_count_in_window(), 7);
        assert_eq!(agg.total_error_count(), 7);
    }

    #[test]
    fn errors_older_than_window_are_dropped() {
        let (agg, clock) = fixture();
        record_errors(&agg, 3);
        clock.advance(30);
        record_errors(&agg, 2);

        clock.set(T0 + 59);
        assert_eq!(agg.error_count_in_window(), 5);

        clock.set(T0 + 60);
        assert_eq!(agg.error_count_in_window(), 2);
        assert_eq!(agg.total_error_count(), 5);
    }

    #[test]
    fn jump_past_window_keeps_only_new_write() {
        let (agg, clock) = fixture();
        record_errors(&agg, 4);
        record_requests(&agg, 4, 50);

        clock.advance(61);
        agg.record_server_error();
        agg.record_request_latency(10);

        assert_eq!(agg.error_count_in_window(), 1);
        assert_eq!(agg.total_request_count_in_window(), 1);
        assert_eq!(agg.average_latency_in_window(), 10.0);
        assert_eq!(agg.total_error_count(), 5);
        assert_eq!(agg.total_request_count(), 5);
    }

    #[test]
    fn high_traffic_error_rate_cutoff_is_strict() {
        let (agg, _) = fixture();
        record_requests(&agg, 105, 20);
        record_errors(&agg, 10);
        assert!(!agg.is_error_threshold_breached());

        agg.record_server_error();
        assert!(agg.is_error_threshold_breached());
    }

    #[test]
    fn too_few_requests_never_breach_errors() {
        let (agg, _) = fixture();
        record_requests(&agg, 9, 20);
        record_errors(&agg, 9);
        assert!(!agg.is_error_threshold_breached());
        assert!(!agg.is_error_threshold_breached_at(0));
    }

    #[test]
    fn moderate_traffic_caps_threshold_at_half_the_requests() {
        let (agg, _) = fixture();
        record_requests(&agg, 20, 20);
        record_errors(&agg, 10);
        // min(100, 20 / 2) = 10
        assert!(!agg.is_error_threshold_breached());
        agg.record_server_error();
        assert!(agg.is_error_threshold_breached());

        // an explicit threshold below the cap wins
        assert!(agg.is_error_threshold_breached_at(5));
    }

    #[test]
    fn error_breach_uses_latency_window_volume() {
        let (agg, clock) = fixture();
        record_requests(&agg, 20, 20);
        clock.advance(60);
        // the requests aged out, the errors are fresh
        record_errors(&agg, 15);
        assert_eq!(agg.total_request_count_in_window(), 0);
        assert!(!agg.is_error_threshold_breached());
    }

    #[test]
    fn latency_average_and_strict_threshold() {
        let (agg, _) = fixture();
        for ms in [100, 200, 300, 100, 200, 300] {
            agg.record_request_latency(ms);
        }
        assert_eq!(agg.average_latency_in_window(), 200.0);
        assert!(!agg.is_latency_threshold_breached_at(200.0));
        assert!(agg.is_latency_threshold_breached_at(199.9));
        // default threshold is 100 ms
        assert!(agg.is_latency_threshold_breached());
    }

    #[test]
    fn latency_needs_minimum_samples() {
        let (agg, _) = fixture();
        record_requests(&agg, 4, 5_000);
        assert!(!agg.is_latency_threshold_breached());
        agg.record_request_latency(5_000);
        assert!(agg.is_latency_threshold_breached());
    }

    #[test]
    fn negative_latency_skews_average() {
        let (agg, _) = fixture();
        agg.record_request_latency(-300);
        agg.record_request_latency(100);
        assert_eq!(agg.average_latency_in_window(), -100.0);
    }

    #[test]
    fn huge_latency_wraps_instead_of_panicking() {
        let (agg, _) = fixture();
        agg.record_request_latency(i64::MAX);
        agg.record_request_latency(1);
        assert_eq!(agg.total_request_count_in_window(), 2);
        assert_eq!(agg.average_latency_in_window(), i64::MIN as f64 / 2.0);
    }

    #[test]
    fn reset_returns_to_zero_state_and_is_repeatable() {
        let (agg, _) = fixture();
        record_requests(&agg, 50, 500);
        record_errors(&agg, 40);
        assert!(agg.is_error_threshold_breached());
        assert!(agg.is_latency_threshold_breached());

        for _ in 0..2 {
            agg.reset();
            assert_eq!(agg.error_count_in_window(), 0);
            assert_eq!(agg.total_error_count(), 0);
            assert_eq!(agg.average_latency_in_window(), 0.0);
            assert!(!agg.is_error_threshold_breached());
            assert!(!agg.is_latency_threshold_breached());
            assert_eq!(agg.total_request_count(), 0);
            assert_eq!(agg.snapshot().latency_percentiles.samples, 0);
        }
    }

    #[test]
    fn health_combines_both_checks() {
        let (agg, _) = fixture();
        assert_eq!(agg.health(), HealthStatus::Healthy);

        record_requests(&agg, 10, 500);
        assert_eq!(agg.health(), HealthStatus::Degraded);

        record_errors(&agg, 6);
        assert_eq!(agg.health(), HealthStatus::Critical);
        assert!(!agg.health().is_healthy());
    }

    #[test]
    fn snapshot_reflects_queries() {
        let (agg, _) = fixture();
        record_requests(&agg, 3, 40);
        agg.record_server_error();

        let snap = agg.snapshot();
        assert_eq!(snap.error_count_in_window, 1);
        assert_eq!(snap.total_error_count, 1);
        assert_eq!(snap.requests_in_window, 3);
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.average_latency_ms, 40.0);
        assert_eq!(snap.status, HealthStatus::Healthy);
        assert_eq!(snap.latency_percentiles.samples, 3);
        assert_eq!(snap.latency_percentiles.p50_ms, 40);
    }

    #[test]
    fn snapshot_breaches_match_individual_checks() {
        let (agg, _) = fixture();
        record_requests(&agg, 20, 150);
        record_errors(&agg, 11);

        let snap = agg.snapshot();
        assert_eq!(snap.error_count_in_window, 11);
        assert_eq!(snap.requests_in_window, 20);
        assert_eq!(snap.error_threshold_breached, agg.is_error_threshold_breached());
        assert_eq!(snap.latency_threshold_breached, agg.is_latency_threshold_breached());
        assert_eq!(snap.status, agg.health());
        assert_eq!(snap.status, HealthStatus::Critical);
    }

    #[test]
    fn instances_are_isolated() {
        let (a, _) = fixture();
        let (b, _) = fixture();
        a.record_server_error();
        assert_eq!(a.total_error_count(), 1);
        assert_eq!(b.total_error_count(), 0);
    }
}
