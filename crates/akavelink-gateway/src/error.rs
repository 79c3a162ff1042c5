//! API error type and error codes

use crate::response::Envelope;
use akavelink_core::{CoreError, ErrorClass};
use akavelink_storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Error codes reported in the `code` field of error envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    MissingFile,
    NoSuchBucket,
    NoSuchFile,
    BucketAlreadyExists,
    FileAlreadyExists,
    PartialFailure,
    BackendUnavailable,
    OperationCancelled,
    SlowDown,
    InternalError,
}

impl ErrorCode {
    /// Get the error code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::MissingFile => "MissingFile",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchFile => "NoSuchFile",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::FileAlreadyExists => "FileAlreadyExists",
            Self::PartialFailure => "PartialFailure",
            Self::BackendUnavailable => "BackendUnavailable",
            Self::OperationCancelled => "OperationCancelled",
            Self::SlowDown => "SlowDown",
            Self::InternalError => "InternalError",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::NoSuchBucket | Self::NoSuchFile => StatusCode::NOT_FOUND,
            Self::BucketAlreadyExists | Self::FileAlreadyExists => StatusCode::CONFLICT,
            Self::PartialFailure | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendUnavailable | Self::OperationCancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::SlowDown => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn for_core(err: &CoreError) -> Self {
        match err.class() {
            ErrorClass::BadRequest => Self::InvalidRequest,
            ErrorClass::NotFound => match err.storage_error() {
                Some(StorageError::BucketNotFound(_)) => Self::NoSuchBucket,
                _ => Self::NoSuchFile,
            },
            ErrorClass::Conflict => match err.storage_error() {
                Some(StorageError::BucketAlreadyExists(_)) => Self::BucketAlreadyExists,
                _ => Self::FileAlreadyExists,
            },
            ErrorClass::PartialFailure => Self::PartialFailure,
            ErrorClass::BackendUnavailable => Self::BackendUnavailable,
            ErrorClass::Cancelled => Self::OperationCancelled,
            ErrorClass::Unknown => Self::InternalError,
        }
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Api { code: ErrorCode, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Get the error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Api { code, .. } => *code,
            Self::Core(e) => ErrorCode::for_core(e),
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let status = code.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = code.as_str(), error = %message, "Request failed");
        } else {
            tracing::debug!(code = code.as_str(), error = %message, "Request rejected");
        }

        (status, Json(Envelope::failure(message, code.as_str()))).into_response()
    }
}
