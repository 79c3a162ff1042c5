//! Transfer requests and name validation

use crate::{CoreError, Result};

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// One transfer, alive for the duration of a single HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub bucket: String,
    pub file_name: String,
    /// Replace an existing file of the same name (uploads only)
    pub overwrite: bool,
    pub direction: Direction,
}

impl TransferRequest {
    pub fn upload(bucket: impl Into<String>, file_name: impl Into<String>, overwrite: bool) -> Self {
        Self {
            bucket: bucket.into(),
            file_name: file_name.into(),
            overwrite,
            direction: Direction::Upload,
        }
    }

    pub fn download(bucket: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            file_name: file_name.into(),
            overwrite: false,
            direction: Direction::Download,
        }
    }

    pub(crate) fn expect_direction(&self, direction: Direction) -> Result<()> {
        if self.direction != direction {
            return Err(CoreError::InvalidRequest(format!(
                "expected a {direction:?} request, got {:?}",
                self.direction
            )));
        }
        validate_bucket_name(&self.bucket)?;
        validate_file_name(&self.file_name)
    }

    /// `bucket/file`, used in logs and error context
    pub fn target(&self) -> String {
        format!("{}/{}", self.bucket, self.file_name)
    }
}

/// Bucket names are opaque to the gateway beyond being non-empty path segments
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidRequest("bucketName cannot be empty".to_string()));
    }
    if name.contains('/') {
        return Err(CoreError::InvalidRequest(format!(
            "bucketName cannot contain '/': {name}"
        )));
    }
    Ok(())
}

/// File names are single path segments
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidRequest("fileName cannot be empty".to_string()));
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(CoreError::InvalidRequest(format!("invalid fileName: {name}")));
    }
    Ok(())
}
