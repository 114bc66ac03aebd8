use axum::{extract::Path, http::StatusCode};

use crate::error::AppError;

// ─── GET /api/error ──────────────────────────────────────────────
/// Always fails with 500, so it is counted as a server error.

pub async fn trigger_error() -> AppError {
    AppError::Internal("deliberate failure".into())
}

// ─── GET /api/error/:status ──────────────────────────────────────
/// Fails with any requested 4xx or 5xx status. Only 5xx responses count
/// towards the error window.

pub async fn trigger_status(Path(code): Path<u16>) -> AppError {
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_client_error() || status.is_server_error() => {
            AppError::Simulated(status)
        }
        _ => AppError::BadRequest(format!(
            "status must be between 400 and 599, got {code}"
        )),
    }
}
