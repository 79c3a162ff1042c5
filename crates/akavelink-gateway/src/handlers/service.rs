//! Service-level handlers (health, ListBuckets)

use crate::response::success;
use crate::{ApiError, AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /buckets - List bucket names
pub async fn list_buckets(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let names: Vec<String> = state
        .lifecycle
        .list_buckets()
        .await?
        .into_iter()
        .map(|bucket| bucket.name)
        .collect();

    Ok(success(StatusCode::OK, names))
}

/// GET /health - Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
