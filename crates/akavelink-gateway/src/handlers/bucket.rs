//! Bucket operation handlers

use crate::response::{success, BucketCreated, BucketDeleted};
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;
use tracing::info;

/// POST /buckets/{bucket} - Create bucket
pub async fn create_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Response, ApiError> {
    state.lifecycle.create_bucket(&bucket).await?;

    Ok(success(
        StatusCode::CREATED,
        BucketCreated {
            message: "Bucket created successfully".to_string(),
            bucket_name: bucket,
        },
    ))
}

/// DELETE /buckets/{bucket} - Delete every file, then the bucket
///
/// Runs until the drain finishes. Server shutdown cancels it between
/// deletions; a dropped connection drops the drain with it.
pub async fn delete_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Response, ApiError> {
    let cancel = state.shutdown.child_token();
    let report = state
        .lifecycle
        .delete_bucket_and_contents(&bucket, &cancel)
        .await?;

    info!(bucket = %report.bucket, files = report.files_deleted, "Bucket and contents deleted");
    Ok(success(
        StatusCode::OK,
        BucketDeleted {
            message: "Bucket and all its contents deleted successfully".to_string(),
            bucket_name: report.bucket,
            files_deleted: report.files_deleted,
            already_gone: report.already_gone,
        },
    ))
}

/// GET /buckets/{bucket}/files - List files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Response, ApiError> {
    let files = state.lifecycle.list_files(&bucket).await?;
    Ok(success(StatusCode::OK, files))
}
