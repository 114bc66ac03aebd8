//! Demo HTTP service around a sliding-window error and latency aggregator.
//!
//! The aggregator lives in [`metrics`]; everything else is the HTTP surface
//! that feeds it (the timing middleware) and reads it (metrics and health
//! endpoints). `main.rs` is the composition root.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Central metrics engine — middleware pushes samples, endpoints read.
    pub metrics: Arc<metrics::MetricsAggregator>,

    /// Bounds for the artificial-latency endpoint.
    pub demo: config::DemoSection,
}

impl AppState {
    pub fn new(cfg: &config::AppConfig) -> Arc<Self> {
        Self::with_metrics(
            cfg,
            Arc::new(metrics::MetricsAggregator::new(cfg.metrics.clone())),
        )
    }

    /// State around an existing aggregator (e.g. one on a manual clock).
    pub fn with_metrics(
        cfg: &config::AppConfig,
        metrics: Arc<metrics::MetricsAggregator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            metrics,
            demo: cfg.demo.clone(),
        })
    }
}
