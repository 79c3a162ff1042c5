//! Error types for the akavelink-core crate

use akavelink_storage::{StorageError, StorageErrorKind};
use std::fmt;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// The backend call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateBucket,
    ListBuckets,
    ListFiles,
    FileInfo,
    DeleteFile,
    /// Delete of the previous file during an overwrite
    ClearExisting,
    OpenUpload,
    /// Bucket creation on the upload path
    CreateMissingBucket,
    OpenDownload,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateBucket => "create bucket",
            Self::ListBuckets => "list buckets",
            Self::ListFiles => "list files",
            Self::FileInfo => "file info",
            Self::DeleteFile => "delete file",
            Self::ClearExisting => "delete existing file for overwrite",
            Self::OpenUpload => "open upload",
            Self::CreateMissingBucket => "create missing bucket",
            Self::OpenDownload => "open download",
        };
        f.write_str(name)
    }
}

/// Errors returned by the orchestrators
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed bucket or file name, wrong request direction
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A single backend call failed
    #[error("{operation} failed for {target}: {source}")]
    Backend {
        operation: Operation,
        target: String,
        source: StorageError,
    },

    /// File exists and overwrite was not requested
    #[error("file already exists: {bucket}/{file} (retry with overwrite=true to replace it)")]
    Conflict { bucket: String, file: String },

    /// Streaming into an open upload session failed; nothing was committed
    #[error("upload of {bucket}/{file} failed: {source}")]
    Upload {
        bucket: String,
        file: String,
        source: StorageError,
    },

    /// Streaming out of a download session failed
    #[error("download of {bucket}/{file} failed: {source}")]
    Download {
        bucket: String,
        file: String,
        source: StorageError,
    },

    /// Listing a bucket before draining it failed; nothing was deleted
    #[error("failed to list files in bucket {bucket}: {source}")]
    ListFailed { bucket: String, source: StorageError },

    /// A file delete failed while draining; earlier deletions stand
    #[error(
        "bucket {bucket} partially drained: {deleted} deleted, {remaining} remaining, failed on {file}: {source}"
    )]
    PartialDrain {
        bucket: String,
        file: String,
        /// Files this call removed; ones found already gone are not counted
        deleted: usize,
        /// Files not yet handled, the failed one included
        remaining: usize,
        source: StorageError,
    },

    /// Every file is gone but the bucket delete failed
    #[error("bucket {bucket} is empty but could not be deleted: {source}")]
    BucketDeleteFailed { bucket: String, source: StorageError },

    /// Caller cancelled; deletions already performed stand
    #[error("drain of bucket {bucket} cancelled after {deleted} deletions")]
    Cancelled { bucket: String, deleted: usize },
}

/// Classification the HTTP layer maps to status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    NotFound,
    Conflict,
    PartialFailure,
    BackendUnavailable,
    Cancelled,
    Unknown,
}

impl ErrorClass {
    fn from_storage(err: &StorageError) -> Self {
        match err.kind() {
            StorageErrorKind::NotFound => Self::NotFound,
            StorageErrorKind::AlreadyExists => Self::Conflict,
            StorageErrorKind::BackendUnavailable | StorageErrorKind::InvalidCredential => {
                Self::BackendUnavailable
            }
            StorageErrorKind::Unknown => Self::Unknown,
        }
    }
}

impl CoreError {
    pub(crate) fn backend(operation: Operation, target: impl Into<String>, source: StorageError) -> Self {
        Self::Backend {
            operation,
            target: target.into(),
            source,
        }
    }

    /// Classify the error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidRequest(_) => ErrorClass::BadRequest,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::PartialDrain { .. } => ErrorClass::PartialFailure,
            Self::Cancelled { .. } => ErrorClass::Cancelled,
            Self::Backend { source, .. }
            | Self::Upload { source, .. }
            | Self::Download { source, .. }
            | Self::ListFailed { source, .. }
            | Self::BucketDeleteFailed { source, .. } => ErrorClass::from_storage(source),
        }
    }

    /// The underlying backend error, if any
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Backend { source, .. }
            | Self::Upload { source, .. }
            | Self::Download { source, .. }
            | Self::ListFailed { source, .. }
            | Self::PartialDrain { source, .. }
            | Self::BucketDeleteFailed { source, .. } => Some(source),
            Self::InvalidRequest(_) | Self::Conflict { .. } | Self::Cancelled { .. } => None,
        }
    }
}
