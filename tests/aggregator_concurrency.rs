#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use health_window::config::MetricsSection;
use health_window::metrics::{ManualClock, MetricsAggregator};

const THREADS: usize = 8;
const PER_THREAD: u64 = 1_000;

#[test]
fn concurrent_errors_are_never_lost() {
    let agg = MetricsAggregator::new(MetricsSection::default());

    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    agg.record_server_error();
                }
            });
        }
    });

    assert_eq!(agg.total_error_count(), THREADS as u64 * PER_THREAD);
}

#[test]
fn concurrent_writers_and_readers_agree_on_a_frozen_clock() {
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let agg = MetricsAggregator::with_clock(MetricsSection::default(), clock);

    std::thread::scope(|s| {
        for t in 0..THREADS {
            let agg = &agg;
            s.spawn(move || {
                for _ in 0..PER_THREAD {
                    if t % 2 == 0 {
                        agg.record_server_error();
                    } else {
                        agg.record_request_latency(10);
                    }
                }
            });
        }
        s.spawn(|| {
            for _ in 0..200 {
                let _ = agg.snapshot();
                let _ = agg.is_error_threshold_breached();
            }
        });
    });

    let half = (THREADS as u64 / 2) * PER_THREAD;
    assert_eq!(agg.error_count_in_window(), half);
    assert_eq!(agg.total_error_count(), half);
    assert_eq!(agg.total_request_count_in_window(), half);
    assert_eq!(agg.average_latency_in_window(), 10.0);
}
