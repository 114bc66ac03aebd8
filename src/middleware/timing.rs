use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Feeds every request into the metrics aggregator.
///
/// Records the elapsed wall time for every response and, for 5xx responses,
/// one server error. Adds two response headers:
///
///   X-Response-Time-Ms  — total handler wall time in milliseconds
///   Server-Timing       — same value in the standard Server-Timing format
pub async fn timing_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let elapsed_ms = elapsed.as_millis() as i64;

    // ── Feed the aggregator ─────────────────────────────────────
    let status = response.status();
    if status.is_server_error() {
        state.metrics.record_server_error();
    }
    state.metrics.record_request_latency(elapsed_ms);

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = elapsed_ms.to_string().parse() {
        response.headers_mut().insert("x-response-time-ms", val);
    }

    let server_timing =
        format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("server-timing", val);
    }

    // Skip the SSE stream, it stays open
    if path.starts_with("/api/") && !path.ends_with("/stream") {
        let status = status.as_u16();
        match status {
            500..=599 => tracing::error!(status, %method, %path, elapsed_ms, "request failed"),
            400..=499 => tracing::warn!(status, %method, %path, elapsed_ms, "request rejected"),
            _ => tracing::info!(status, %method, %path, elapsed_ms, "request"),
        }
    }

    response
}
