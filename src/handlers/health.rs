use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{HealthStatus, MetricsSnapshot};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// "UP" or "DOWN".
    pub status: &'static str,
    pub detail: HealthStatus,
    pub message: &'static str,
    pub error_count_in_window: u64,
    pub total_error_count: u64,
    pub average_latency_ms: f64,
    pub error_threshold_breached: bool,
    pub latency_threshold_breached: bool,
}

impl From<&MetricsSnapshot> for HealthReport {
    fn from(snap: &MetricsSnapshot) -> Self {
        let message = match (snap.error_threshold_breached, snap.latency_threshold_breached) {
            (false, false) => "all systems operational",
            (true, false) => "error threshold breached",
            (false, true) => "latency threshold breached",
            (true, true) => "critical: error and latency thresholds breached",
        };

        Self {
            status: if snap.status.is_healthy() { "UP" } else { "DOWN" },
            detail: snap.status,
            message,
            error_count_in_window: snap.error_count_in_window,
            total_error_count: snap.total_error_count,
            average_latency_ms: snap.average_latency_ms,
            error_threshold_breached: snap.error_threshold_breached,
            latency_threshold_breached: snap.latency_threshold_breached,
        }
    }
}

// ─── GET /api/health ─────────────────────────────────────────────
/// 200 when healthy, 503 when either threshold is breached.

pub async fn health(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = HealthReport::from(&state.metrics.snapshot());

    let code = if report.detail.is_healthy() {
        StatusCode::OK
    } else {
        tracing::warn!(detail = ?report.detail, reason = report.message, "health check failing");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(report))
}
