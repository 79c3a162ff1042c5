//! Bucket, file and session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provisioned bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata of a committed file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Bucket holding the file
    pub bucket_name: String,
    /// File name, unique per bucket
    pub name: String,
    /// Size in bytes as uploaded
    pub size: u64,
    /// Size after backend encoding
    pub encoded_size: u64,
    /// Root content identifier
    #[serde(rename = "rootCID")]
    pub root_cid: String,
    /// When the upload session was opened
    pub created_at: DateTime<Utc>,
    /// When the upload was committed
    pub committed_at: DateTime<Utc>,
}

/// Handle for writing one file.
///
/// Not `Clone`: committing consumes the session, so a handle cannot outlive
/// its upload or be shared between requests.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadSession {
    pub id: Uuid,
    pub bucket_name: String,
    pub file_name: String,
    pub opened_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(bucket_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bucket_name: bucket_name.into(),
            file_name: file_name.into(),
            opened_at: Utc::now(),
        }
    }
}

/// Handle for reading one file
#[derive(Debug, PartialEq, Eq)]
pub struct DownloadSession {
    pub id: Uuid,
    pub bucket_name: String,
    pub file_name: String,
    /// Total size in bytes, when the backend reports it up front
    pub size: Option<u64>,
}

impl DownloadSession {
    pub fn new(bucket_name: impl Into<String>, file_name: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bucket_name: bucket_name.into(),
            file_name: file_name.into(),
            size,
        }
    }
}
