//! Streamed uploads and downloads
//!
//! An upload walks a small state machine before any payload byte moves:
//!
//! ```text
//!  overwrite? ──yes──> ClearExisting ──┐
//!      │no                             v
//!      └──────────────────────────> Open ──BucketNotFound──> CreateBucket ──> Open (once)
//!                                    │
//!                                    └──session──> Stream ──> committed FileRecord
//! ```
//!
//! The source is consumed only in `Stream`, so any failure earlier leaves the
//! request body untouched.

use crate::request::{validate_bucket_name, validate_file_name, Direction, TransferRequest};
use crate::{CoreError, Operation, Result};
use akavelink_storage::{DownloadSession, FileRecord, StorageClient, StorageError, UploadSession};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, instrument, warn};

/// Upload behaviour knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    /// Create the target bucket when an upload finds it missing
    pub auto_create_bucket: bool,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            auto_create_bucket: true,
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub record: FileRecord,
    /// The bucket was created on this request
    pub bucket_created: bool,
    /// A previous file of the same name was deleted first
    pub replaced_existing: bool,
}

enum UploadStep {
    ClearExisting,
    Open,
    CreateBucket,
    Stream(UploadSession),
}

/// Runs uploads and downloads against a storage client
#[derive(Clone)]
pub struct TransferOrchestrator {
    client: Arc<dyn StorageClient>,
    policy: TransferPolicy,
}

impl TransferOrchestrator {
    pub fn new(client: Arc<dyn StorageClient>, policy: TransferPolicy) -> Self {
        Self { client, policy }
    }

    /// Upload `source` as `request.file_name` in `request.bucket`.
    ///
    /// A missing bucket is created (when the policy allows) and the open is
    /// retried exactly once. With `overwrite`, an existing file is deleted
    /// first; without it, an existing file is a [`CoreError::Conflict`].
    #[instrument(skip(self, source), fields(bucket = %request.bucket, file = %request.file_name))]
    pub async fn upload<R>(&self, request: &TransferRequest, mut source: R) -> Result<UploadOutcome>
    where
        R: AsyncRead + Send + Unpin,
    {
        request.expect_direction(Direction::Upload)?;
        let bucket = request.bucket.as_str();
        let file = request.file_name.as_str();

        let mut bucket_created = false;
        let mut create_attempted = false;
        let mut replaced_existing = false;
        let mut step = if request.overwrite {
            UploadStep::ClearExisting
        } else {
            UploadStep::Open
        };

        loop {
            step = match step {
                UploadStep::ClearExisting => match self.client.delete_file(bucket, file).await {
                    Ok(()) => {
                        info!("Deleted existing file before overwrite");
                        replaced_existing = true;
                        UploadStep::Open
                    }
                    Err(e) if e.is_not_found() => {
                        debug!("Nothing to overwrite");
                        UploadStep::Open
                    }
                    Err(source) => {
                        return Err(CoreError::backend(
                            Operation::ClearExisting,
                            request.target(),
                            source,
                        ))
                    }
                },

                UploadStep::Open => match self.client.open_upload(bucket, file).await {
                    Ok(session) => UploadStep::Stream(session),
                    Err(e)
                        if e.is_bucket_not_found()
                            && self.policy.auto_create_bucket
                            && !create_attempted =>
                    {
                        UploadStep::CreateBucket
                    }
                    Err(e) if e.is_file_already_exists() => {
                        if request.overwrite {
                            warn!("File reappeared after overwrite delete");
                        }
                        return Err(CoreError::Conflict {
                            bucket: bucket.to_string(),
                            file: file.to_string(),
                        });
                    }
                    Err(source) => {
                        return Err(CoreError::backend(
                            Operation::OpenUpload,
                            request.target(),
                            source,
                        ))
                    }
                },

                UploadStep::CreateBucket => {
                    create_attempted = true;
                    match self.client.create_bucket(bucket).await {
                        Ok(_) => {
                            info!("Created missing bucket for upload");
                            bucket_created = true;
                        }
                        Err(e) if e.is_bucket_already_exists() => {
                            debug!("Bucket created concurrently");
                        }
                        Err(source) => {
                            return Err(CoreError::backend(
                                Operation::CreateMissingBucket,
                                bucket,
                                source,
                            ))
                        }
                    }
                    UploadStep::Open
                }

                UploadStep::Stream(session) => {
                    debug!(session = %session.id, "Streaming upload");
                    let record = self
                        .client
                        .write_and_commit(session, &mut source)
                        .await
                        .map_err(|source| {
                            error!(error = %source, "Upload stream failed");
                            CoreError::Upload {
                                bucket: bucket.to_string(),
                                file: file.to_string(),
                                source,
                            }
                        })?;

                    info!(
                        size = record.size,
                        root_cid = %record.root_cid,
                        "Upload committed"
                    );
                    return Ok(UploadOutcome {
                        record,
                        bucket_created,
                        replaced_existing,
                    });
                }
            };
        }
    }

    /// Open a download session; a missing bucket or file surfaces here,
    /// before any byte is written anywhere.
    #[instrument(skip(self))]
    pub async fn open_download(&self, bucket: &str, file: &str) -> Result<DownloadSession> {
        validate_bucket_name(bucket)?;
        validate_file_name(file)?;
        self.client
            .open_download(bucket, file)
            .await
            .map_err(|source| CoreError::backend(Operation::OpenDownload, format!("{bucket}/{file}"), source))
    }

    /// Stream an opened session into `sink`, then shut the sink down.
    ///
    /// Returns the byte count. A backend that reports a size up front must
    /// deliver exactly that many bytes.
    pub async fn stream_download<W>(&self, session: DownloadSession, mut sink: W) -> Result<u64>
    where
        W: AsyncWrite + Send + Unpin,
    {
        let bucket = session.bucket_name.clone();
        let file = session.file_name.clone();
        let expected = session.size;
        let failed = |source: StorageError| {
            error!(bucket = %bucket, file = %file, error = %source, "Download stream failed");
            CoreError::Download {
                bucket: bucket.clone(),
                file: file.clone(),
                source,
            }
        };

        let written = self
            .client
            .read_into(session, &mut sink)
            .await
            .map_err(&failed)?;

        if let Some(expected) = expected {
            if written != expected {
                return Err(failed(StorageError::Unknown(format!(
                    "short read: expected {expected} bytes, got {written}"
                ))));
            }
        }

        sink.shutdown()
            .await
            .map_err(|e| failed(StorageError::Io(e)))?;

        debug!(bucket = %bucket, file = %file, bytes = written, "Download complete");
        Ok(written)
    }

    /// Open and stream in one call
    pub async fn download<W>(&self, request: &TransferRequest, sink: W) -> Result<u64>
    where
        W: AsyncWrite + Send + Unpin,
    {
        request.expect_direction(Direction::Download)?;
        let session = self.open_download(&request.bucket, &request.file_name).await?;
        self.stream_download(session, sink).await
    }

    #[instrument(skip(self))]
    pub async fn file_info(&self, bucket: &str, file: &str) -> Result<FileRecord> {
        validate_bucket_name(bucket)?;
        validate_file_name(file)?;
        self.client
            .file_info(bucket, file)
            .await
            .map_err(|source| CoreError::backend(Operation::FileInfo, format!("{bucket}/{file}"), source))
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, bucket: &str, file: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        validate_file_name(file)?;
        self.client
            .delete_file(bucket, file)
            .await
            .map_err(|source| CoreError::backend(Operation::DeleteFile, format!("{bucket}/{file}"), source))?;
        info!(bucket, file, "File deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorClass;
    use akavelink_storage::MemoryStorageClient;

    fn orchestrator(policy: TransferPolicy) -> (Arc<MemoryStorageClient>, TransferOrchestrator) {
        let client = Arc::new(MemoryStorageClient::new());
        let orchestrator = TransferOrchestrator::new(client.clone(), policy);
        (client, orchestrator)
    }

    #[tokio::test]
    async fn test_upload_creates_missing_bucket() {
        let (client, orchestrator) = orchestrator(TransferPolicy::default());

        let request = TransferRequest::upload("fresh", "a.txt", false);
        let outcome = orchestrator.upload(&request, &b"hello"[..]).await.unwrap();

        assert!(outcome.bucket_created);
        assert!(!outcome.replaced_existing);
        assert_eq!(outcome.record.size, 5);
        assert_eq!(client.file_count("fresh"), Some(1));
    }

    #[tokio::test]
    async fn test_upload_without_auto_create() {
        let (client, orchestrator) = orchestrator(TransferPolicy {
            auto_create_bucket: false,
        });

        let request = TransferRequest::upload("fresh", "a.txt", false);
        let err = orchestrator.upload(&request, &b"hello"[..]).await.unwrap_err();

        assert_eq!(err.class(), ErrorClass::NotFound);
        assert_eq!(client.bucket_count(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_is_conflict() {
        let (_client, orchestrator) = orchestrator(TransferPolicy::default());
        let request = TransferRequest::upload("b", "a.txt", false);
        orchestrator.upload(&request, &b"one"[..]).await.unwrap();

        let err = orchestrator.upload(&request, &b"two"[..]).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));

        let mut out = Vec::new();
        orchestrator
            .download(&TransferRequest::download("b", "a.txt"), &mut out)
            .await
            .unwrap();
        assert_eq!(out, b"one");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let (_client, orchestrator) = orchestrator(TransferPolicy::default());
        orchestrator
            .upload(&TransferRequest::upload("b", "a.txt", false), &b"one"[..])
            .await
            .unwrap();

        let outcome = orchestrator
            .upload(&TransferRequest::upload("b", "a.txt", true), &b"second"[..])
            .await
            .unwrap();
        assert!(outcome.replaced_existing);

        let mut out = Vec::new();
        let n = orchestrator
            .download(&TransferRequest::download("b", "a.txt"), &mut out)
            .await
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(out, b"second");
    }

    #[tokio::test]
    async fn test_overwrite_of_absent_file_is_plain_upload() {
        let (_client, orchestrator) = orchestrator(TransferPolicy::default());

        let outcome = orchestrator
            .upload(&TransferRequest::upload("b", "new.txt", true), &b"x"[..])
            .await
            .unwrap();
        assert!(!outcome.replaced_existing);
        assert!(outcome.bucket_created);
    }

    #[tokio::test]
    async fn test_download_missing_file_is_not_found() {
        let (client, orchestrator) = orchestrator(TransferPolicy::default());
        client.create_bucket("b").await.unwrap();

        let err = orchestrator.open_download("b", "nope").await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert!(matches!(
            err.storage_error(),
            Some(StorageError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_names_rejected_before_backend() {
        let (client, orchestrator) = orchestrator(TransferPolicy::default());

        let err = orchestrator
            .upload(&TransferRequest::upload("", "a.txt", false), &b"x"[..])
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::BadRequest);
        assert_eq!(client.bucket_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_direction_rejected() {
        let (_client, orchestrator) = orchestrator(TransferPolicy::default());
        let err = orchestrator
            .upload(&TransferRequest::download("b", "a.txt"), &b"x"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }
}
