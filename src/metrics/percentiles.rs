//! Request-latency distribution since the last reset.
//!
//! The sliding windows only keep a sum and a count per second, which is
//! enough for the average but not for tail latency. This keeps every sample
//! in an HdrHistogram so the metrics endpoints can report percentiles too.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

/// Histogram range: 1 ms → 1 h, 3 significant figures
const LOWEST_MS: u64 = 1;
const HIGHEST_MS: u64 = 3_600_000;
const SIGFIG: u8 = 3;

/// Thread-safe latency histogram in milliseconds.
pub struct LatencyDistribution {
    hist: Mutex<Histogram<u64>>,
}

/// Tail-latency view served alongside the windowed average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyPercentiles {
    pub samples: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
}

impl LatencyDistribution {
    pub fn new() -> Self {
        let hist = Histogram::<u64>::new_with_bounds(LOWEST_MS, HIGHEST_MS, SIGFIG)
            .expect("histogram creation");
        Self {
            hist: Mutex::new(hist),
        }
    }

    /// Record one request. Out-of-range values (including negatives) are
    /// pinned to the histogram bounds.
    pub fn record(&self, millis: i64) {
        let ms = millis.clamp(LOWEST_MS as i64, HIGHEST_MS as i64) as u64;
        let _ = self.hist.lock().record(ms);
    }

    pub fn reset(&self) {
        self.hist.lock().reset();
    }

    /// All zeroes until the first sample.
    pub fn percentiles(&self) -> LatencyPercentiles {
        let hist = self.hist.lock();
        if hist.len() == 0 {
            return LatencyPercentiles::default();
        }

        LatencyPercentiles {
            samples: hist.len(),
            min_ms: hist.min(),
            max_ms: hist.max(),
            mean_ms: hist.mean(),
            p50_ms: hist.value_at_percentile(50.0),
            p90_ms: hist.value_at_percentile(90.0),
            p99_ms: hist.value_at_percentile(99.0),
        }
    }
}

impl Default for LatencyDistribution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_distribution_reports_zeroes() {
        let dist = LatencyDistribution::new();
        assert_eq!(dist.percentiles(), LatencyPercentiles::default());
    }

    #[test]
    fn percentiles_follow_recorded_latencies() {
        let dist = LatencyDistribution::new();
        for ms in 1..=100 {
            dist.record(ms);
        }
        let p = dist.percentiles();
        assert_eq!(p.samples, 100);
        assert_eq!((p.min_ms, p.max_ms), (1, 100));
        assert_eq!(p.p50_ms, 50);
        assert_eq!(p.p90_ms, 90);
        assert_eq!(p.p99_ms, 99);
    }

    #[test]
    fn out_of_range_latencies_are_pinned() {
        let dist = LatencyDistribution::new();
        dist.record(-40);
        dist.record(0);
        let p = dist.percentiles();
        assert_eq!(p.samples, 2);
        assert_eq!(p.max_ms, 1);

        dist.record(i64::MAX);
        assert!(dist.percentiles().max_ms >= HIGHEST_MS);
    }

    #[test]
    fn reset_empties_the_distribution() {
        let dist = LatencyDistribution::new();
        dist.record(25);
        dist.reset();
        assert_eq!(dist.percentiles().samples, 0);
    }
}
