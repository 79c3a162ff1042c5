//! Error types for the akavelink-storage crate

use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors reported by a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Bucket does not exist
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// File does not exist in the bucket
    #[error("file not found: {bucket}/{file}")]
    FileNotFound { bucket: String, file: String },

    /// Bucket name already taken
    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),

    /// File name already committed in the bucket
    #[error("file already exists: {bucket}/{file}")]
    FileAlreadyExists { bucket: String, file: String },

    /// Bucket still holds files
    #[error("bucket not empty: {0}")]
    BucketNotEmpty(String),

    /// Backend could not be reached or refused to serve the call for now
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Signing key rejected
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// IO error while streaming
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything the backend reported that does not fit above
    #[error("backend error: {0}")]
    Unknown(String),
}

/// Coarse classification of backend failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    NotFound,
    AlreadyExists,
    BackendUnavailable,
    InvalidCredential,
    Unknown,
}

impl StorageError {
    /// Fold the error into one of the backend failure kinds
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            Self::BucketNotFound(_) | Self::FileNotFound { .. } => StorageErrorKind::NotFound,
            Self::BucketAlreadyExists(_) | Self::FileAlreadyExists { .. } => {
                StorageErrorKind::AlreadyExists
            }
            Self::Unavailable(_) => StorageErrorKind::BackendUnavailable,
            Self::InvalidCredential(_) => StorageErrorKind::InvalidCredential,
            Self::Io(e) => match e.kind() {
                std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::TimedOut => StorageErrorKind::BackendUnavailable,
                _ => StorageErrorKind::Unknown,
            },
            Self::BucketNotEmpty(_) | Self::Unknown(_) => StorageErrorKind::Unknown,
        }
    }

    pub fn is_bucket_not_found(&self) -> bool {
        matches!(self, Self::BucketNotFound(_))
    }

    pub fn is_file_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == StorageErrorKind::NotFound
    }

    pub fn is_file_already_exists(&self) -> bool {
        matches!(self, Self::FileAlreadyExists { .. })
    }

    pub fn is_bucket_already_exists(&self) -> bool {
        matches!(self, Self::BucketAlreadyExists(_))
    }

    /// Classify a raw error message returned by a backend SDK.
    ///
    /// Akave contracts revert with named errors (`BucketNonexists`,
    /// `FileAlreadyExists`, ...) that reach the caller embedded in a longer
    /// transport message. `file` is `None` for bucket-level calls.
    pub fn from_backend_message(bucket: &str, file: Option<&str>, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        let file_name = || file.unwrap_or_default().to_string();

        if message.contains("BucketNonexists") || lower.contains("bucket not found") {
            Self::BucketNotFound(bucket.to_string())
        } else if message.contains("BucketExists") || message.contains("BucketAlreadyExists") {
            Self::BucketAlreadyExists(bucket.to_string())
        } else if message.contains("BucketNonempty") || lower.contains("bucket not empty") {
            Self::BucketNotEmpty(bucket.to_string())
        } else if message.contains("FileAlreadyExists") || lower.contains("file already exists") {
            Self::FileAlreadyExists {
                bucket: bucket.to_string(),
                file: file_name(),
            }
        } else if message.contains("FileNonexists")
            || message.contains("FileDoesNotExist")
            || lower.contains("file not found")
        {
            Self::FileNotFound {
                bucket: bucket.to_string(),
                file: file_name(),
            }
        } else if lower.contains("invalid private key")
            || lower.contains("invalid signature")
            || lower.contains("unauthenticated")
        {
            Self::InvalidCredential(message.to_string())
        } else if lower.contains("connection refused")
            || lower.contains("deadline exceeded")
            || lower.contains("unavailable")
            || lower.contains("transport is closing")
        {
            Self::Unavailable(message.to_string())
        } else {
            Self::Unknown(message.to_string())
        }
    }
}
