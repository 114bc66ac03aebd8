use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Demo endpoints ──────────────────────────────────────
        .route("/api/hello", get(handlers::hello::hello))
        .route("/api/error", get(handlers::faults::trigger_error))
        .route("/api/error/:status", get(handlers::faults::trigger_status))
        .route("/api/slow", get(handlers::latency::slow))
        // ── Health ──────────────────────────────────────────────
        .route("/api/health", get(handlers::health::health))
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        .route("/api/metrics/reset", post(stream::reset_metrics))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            timing::timing_middleware,
        ))
        .layer(CorsLayer::permissive())
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
}
