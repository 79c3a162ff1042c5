//! File operation handlers

use crate::response::{success, Message, UploadSummary};
use crate::{ApiError, AppState, ErrorCode};
use akavelink_core::{validate_bucket_name, CoreError, TransferRequest, STREAM_CHUNK_SIZE};
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::{future, stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info};

/// Form field holding the uploaded file
pub const FILE_FIELD: &str = "file";

/// Query parameters for uploads
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Replace an existing file of the same name
    #[serde(default)]
    pub overwrite: bool,
}

/// POST /buckets/{bucket}/files - Upload the `file` form field
///
/// The field is piped into the backend as it arrives. The stored name is the
/// filename the client gave the part.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    validate_bucket_name(&bucket)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart form: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Skipping form field");
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::new(ErrorCode::MissingFile, "file part has no filename"))?;

        info!(bucket = %bucket, file = %file_name, overwrite = params.overwrite, "Initiating upload");
        let request = TransferRequest::upload(bucket.clone(), file_name, params.overwrite);
        let reader = StreamReader::new(field.map_err(io::Error::other));
        let outcome = state.transfer.upload(&request, reader).await?;

        return Ok(success(StatusCode::CREATED, UploadSummary::from(outcome)));
    }

    Err(ApiError::new(
        ErrorCode::MissingFile,
        format!("Failed to retrieve file from form: no `{FILE_FIELD}` field"),
    ))
}

/// GET /buckets/{bucket}/files/{file} - File metadata
pub async fn file_info(
    State(state): State<Arc<AppState>>,
    Path((bucket, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let record = state.transfer.file_info(&bucket, &file).await?;
    Ok(success(StatusCode::OK, record))
}

/// DELETE /buckets/{bucket}/files/{file} - Delete one file
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((bucket, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    state.transfer.delete_file(&bucket, &file).await?;
    Ok(success(StatusCode::OK, Message::new("File deleted successfully")))
}

/// GET /buckets/{bucket}/files/{file}/download - Stream file content
///
/// Missing files are reported before any header is sent. Once streaming has
/// begun, a backend failure can only abort the body: the error is logged and
/// the body ends with an error instead of a clean end-of-stream.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((bucket, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={file}"))
        .map_err(|_| ApiError::bad_request(format!("invalid fileName: {file}")))?;

    info!(bucket = %bucket, file = %file, "Initiating download");
    let session = state.transfer.open_download(&bucket, &file).await?;
    let size = session.size;

    let (writer, reader) = tokio::io::duplex(STREAM_CHUNK_SIZE);
    let (done_tx, done_rx) = oneshot::channel();
    let transfer = state.transfer.clone();
    tokio::spawn(async move {
        let result = transfer.stream_download(session, writer).await;
        if let Ok(bytes) = &result {
            info!(bucket = %bucket, file = %file, bytes, "Download streamed");
        }
        // Receiver is gone when the client hung up
        let _ = done_tx.send(result);
    });

    let body = ReaderStream::with_capacity(reader, STREAM_CHUNK_SIZE)
        .chain(stream::once(stream_outcome(done_rx)).filter_map(future::ready));

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, disposition);
    if let Some(size) = size {
        response = response.header(header::CONTENT_LENGTH, size);
    }

    response
        .body(Body::from_stream(body))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

// Trailing item of a download body: nothing on success, an error otherwise
async fn stream_outcome(
    done: oneshot::Receiver<Result<u64, CoreError>>,
) -> Option<io::Result<Bytes>> {
    match done.await {
        Ok(Ok(_)) => None,
        Ok(Err(err)) => Some(Err(io::Error::other(err))),
        Err(_) => Some(Err(io::Error::other("download task ended without a result"))),
    }
}
