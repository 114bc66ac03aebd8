use axum::{extract::Query, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct HelloQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: String,
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

// ─── GET /api/hello ──────────────────────────────────────────────

pub async fn hello(Query(query): Query<HelloQuery>) -> Result<Json<Greeting>> {
    let name = query.name.as_deref().map(str::trim).unwrap_or("");
    let name = if name.is_empty() { "World" } else { name };

    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    Ok(Json(Greeting {
        message: format!("Hello, {name}!"),
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    }))
}
