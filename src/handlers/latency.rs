use axum::{
    extract::{Query, State},
    Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SlowQuery {
    /// Requested delay; a random one is picked when absent.
    pub ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SlowResponse {
    pub slept_ms: u64,
    pub randomized: bool,
}

// ─── GET /api/slow ───────────────────────────────────────────────

pub async fn slow(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlowQuery>,
) -> Result<Json<SlowResponse>> {
    let demo = &state.demo;

    let (delay, randomized) = match query.ms {
        Some(ms) if ms > demo.slow_max_ms => {
            return Err(AppError::BadRequest(format!(
                "ms must be at most {}",
                demo.slow_max_ms
            )));
        }
        Some(ms) => (ms, false),
        None => (
            rand::thread_rng().gen_range(demo.slow_min_ms..=demo.slow_max_ms),
            true,
        ),
    };

    tokio::time::sleep(Duration::from_millis(delay)).await;

    Ok(Json(SlowResponse {
        slept_ms: delay,
        randomized,
    }))
}
