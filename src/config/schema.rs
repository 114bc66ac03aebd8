use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub demo: DemoSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
            demo: DemoSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AppError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.metrics.validate()?;
        self.demo.validate()?;
        Ok(())
    }
}

// ─── server ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            AppError::Config(format!(
                "server.listen must be a socket address, got {:?}",
                self.listen
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }
}

// ─── metrics ─────────────────────────────────────────────────────

/// Window sizes and health thresholds for the metrics aggregator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Length of the error window, in seconds.
    #[serde(default = "default_window_secs")]
    pub error_window_secs: u32,

    /// Length of the latency window, in seconds.
    #[serde(default = "default_window_secs")]
    pub latency_window_secs: u32,

    /// Default absolute error count for moderate traffic.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u64,

    /// Default average-latency ceiling, in milliseconds.
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: f64,

    /// Below this many requests in the window, errors never breach.
    #[serde(default = "default_min_error_samples")]
    pub min_error_samples: u64,

    /// Below this many requests in the window, latency never breaches.
    #[serde(default = "default_min_latency_samples")]
    pub min_latency_samples: u64,

    /// From this many requests on, errors are judged as a rate.
    #[serde(default = "default_high_traffic_requests")]
    pub high_traffic_requests: u64,

    /// Error-rate ceiling under high traffic (exclusive).
    #[serde(default = "default_max_error_rate")]
    pub max_error_rate: f64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            error_window_secs: default_window_secs(),
            latency_window_secs: default_window_secs(),
            error_threshold: default_error_threshold(),
            latency_threshold_ms: default_latency_threshold_ms(),
            min_error_samples: default_min_error_samples(),
            min_latency_samples: default_min_latency_samples(),
            high_traffic_requests: default_high_traffic_requests(),
            max_error_rate: default_max_error_rate(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("metrics.error_window_secs", self.error_window_secs),
            ("metrics.latency_window_secs", self.latency_window_secs),
        ] {
            if !(1..=3600).contains(&secs) {
                return Err(AppError::Config(format!(
                    "{name} must be between 1 and 3600"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.max_error_rate) {
            return Err(AppError::Config(
                "metrics.max_error_rate must be between 0.0 and 1.0".into(),
            ));
        }
        if self.high_traffic_requests < self.min_error_samples {
            return Err(AppError::Config(
                "metrics.high_traffic_requests must not be below min_error_samples".into(),
            ));
        }
        Ok(())
    }
}

// ─── demo endpoints ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoSection {
    /// Lower bound of the random delay used by `/api/slow`.
    #[serde(default = "default_slow_min_ms")]
    pub slow_min_ms: u64,

    /// Upper bound for `/api/slow`, random or requested.
    #[serde(default = "default_slow_max_ms")]
    pub slow_max_ms: u64,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            slow_min_ms: default_slow_min_ms(),
            slow_max_ms: default_slow_max_ms(),
        }
    }
}

impl DemoSection {
    fn validate(&self) -> Result<()> {
        if self.slow_min_ms > self.slow_max_ms {
            return Err(AppError::Config(
                "demo.slow_min_ms must not exceed demo.slow_max_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_version() -> u32 {
    1
}
fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_window_secs() -> u32 {
    60
}
fn default_error_threshold() -> u64 {
    100
}
fn default_latency_threshold_ms() -> f64 {
    100.0
}
fn default_min_error_samples() -> u64 {
    10
}
fn default_min_latency_samples() -> u64 {
    5
}
fn default_high_traffic_requests() -> u64 {
    100
}
fn default_max_error_rate() -> f64 {
    0.10
}
fn default_slow_min_ms() -> u64 {
    50
}
fn default_slow_max_ms() -> u64 {
    2000
}
