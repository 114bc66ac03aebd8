//! HTTP read side of the aggregator: JSON snapshot, live SSE feed, reset.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

use super::aggregator::{MetricsAggregator, MetricsSnapshot};
use crate::AppState;

/// Gap between two snapshots on the live feed.
const PUSH_INTERVAL: Duration = Duration::from_millis(500);
const KEEP_ALIVE: Duration = Duration::from_secs(15);

// ─── GET /api/metrics ────────────────────────────────────────────

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// One `snapshot` event per tick until the client disconnects.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let ticks = IntervalStream::new(tokio::time::interval(PUSH_INTERVAL));
    let stream = ticks.map(move |_| Ok(snapshot_event(&state.metrics)));

    Sse::new(stream).keep_alive(
        KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"),
    )
}

fn snapshot_event(metrics: &MetricsAggregator) -> Event {
    let json = serde_json::to_string(&metrics.snapshot()).unwrap_or_default();
    Event::default().event("snapshot").data(json)
}

// ─── POST /api/metrics/reset ─────────────────────────────────────
/// Operator reset. Answers with the post-reset (all-zero) snapshot.

pub async fn reset_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<MetricsSnapshot> {
    state.metrics.reset();
    Json(state.metrics.snapshot())
}
