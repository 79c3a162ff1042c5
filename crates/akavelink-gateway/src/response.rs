//! JSON response envelope and payloads

use akavelink_core::UploadOutcome;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `{"success": bool, "data"?: .., "error"?: .., "code"?: ..}`
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            code: Some(code.into()),
        }
    }
}

/// Wrap `data` in a success envelope
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(Envelope::ok(data))).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCreated {
    pub message: String,
    pub bucket_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDeleted {
    pub message: String,
    pub bucket_name: String,
    pub files_deleted: usize,
    pub already_gone: usize,
}

/// Summary returned by a successful upload
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub message: String,
    #[serde(rename = "rootCID")]
    pub root_cid: String,
    pub bucket_name: String,
    pub file_name: String,
    pub size: u64,
    pub encoded_size: u64,
    pub created_at: DateTime<Utc>,
    pub committed_at: DateTime<Utc>,
    pub bucket_created: bool,
    pub replaced: bool,
}

impl From<UploadOutcome> for UploadSummary {
    fn from(outcome: UploadOutcome) -> Self {
        let record = outcome.record;
        Self {
            message: "File uploaded successfully".to_string(),
            root_cid: record.root_cid,
            bucket_name: record.bucket_name,
            file_name: record.name,
            size: record.size,
            encoded_size: record.encoded_size,
            created_at: record.created_at,
            committed_at: record.committed_at,
            bucket_created: outcome.bucket_created,
            replaced: outcome.replaced_existing,
        }
    }
}
