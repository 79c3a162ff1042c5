//! Bucket lifecycle: create, list, and the paced empty-then-delete procedure
//!
//! The backend refuses to delete a bucket that still holds files, and
//! rapid-fire deletions against one bucket are rejected until its ledger
//! settles. Deleting a bucket therefore walks:
//!
//! ```text
//! Listing ──> Draining (delete, pause, delete, pause, ...) ──> Removing ──> Done
//! ```
//!
//! Deletions are strictly sequential. The first failure stops the drain;
//! files already deleted stay deleted, so calling again resumes from a
//! fresh listing.

use crate::request::validate_bucket_name;
use crate::{CoreError, Operation, Result, DEFAULT_DELETE_PAUSE};
use akavelink_storage::{BucketRecord, FileRecord, StorageClient};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Pacing for bucket drains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    /// Pause after every file deletion, before the next step
    pub pause: Duration,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self {
            pause: DEFAULT_DELETE_PAUSE,
        }
    }
}

/// A completed drain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub bucket: String,
    /// Files this call removed
    pub files_deleted: usize,
    /// Listed files that were gone by the time their delete ran
    pub already_gone: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    deleted: usize,
    already_gone: usize,
}

/// Where a drain is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Listing,
    Draining,
    Removing,
    Done,
}

enum Drain {
    Listing,
    Draining {
        pending: VecDeque<FileRecord>,
        tally: Tally,
    },
    Removing {
        tally: Tally,
    },
}

impl Drain {
    fn state(&self) -> DrainState {
        match self {
            Self::Listing => DrainState::Listing,
            Self::Draining { .. } => DrainState::Draining,
            Self::Removing { .. } => DrainState::Removing,
        }
    }
}

/// Bucket-level operations against a storage client
#[derive(Clone)]
pub struct BucketLifecycleOrchestrator {
    client: Arc<dyn StorageClient>,
    policy: DrainPolicy,
}

impl BucketLifecycleOrchestrator {
    pub fn new(client: Arc<dyn StorageClient>, policy: DrainPolicy) -> Self {
        Self { client, policy }
    }

    #[instrument(skip(self))]
    pub async fn create_bucket(&self, bucket: &str) -> Result<BucketRecord> {
        validate_bucket_name(bucket)?;
        let record = self
            .client
            .create_bucket(bucket)
            .await
            .map_err(|source| CoreError::backend(Operation::CreateBucket, bucket, source))?;
        info!(bucket, "Bucket created");
        Ok(record)
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketRecord>> {
        self.client
            .list_buckets()
            .await
            .map_err(|source| CoreError::backend(Operation::ListBuckets, "*", source))
    }

    pub async fn list_files(&self, bucket: &str) -> Result<Vec<FileRecord>> {
        validate_bucket_name(bucket)?;
        self.client
            .list_files(bucket)
            .await
            .map_err(|source| CoreError::backend(Operation::ListFiles, bucket, source))
    }

    /// Delete every file in `bucket`, then the bucket itself.
    ///
    /// Each file delete is followed by the policy pause, including the last
    /// one, so the bucket delete also lands on a settled ledger. `cancel` is
    /// checked before each delete and raced against each pause; cancelling
    /// never undoes deletions already made.
    #[instrument(skip(self, cancel))]
    pub async fn delete_bucket_and_contents(
        &self,
        bucket: &str,
        cancel: &CancellationToken,
    ) -> Result<DrainReport> {
        validate_bucket_name(bucket)?;
        let mut drain = Drain::Listing;

        loop {
            debug!(state = ?drain.state(), "Drain step");
            drain = match drain {
                Drain::Listing => {
                    let files = self.client.list_files(bucket).await.map_err(|source| {
                        error!(error = %source, "Failed to list files for deletion");
                        CoreError::ListFailed {
                            bucket: bucket.to_string(),
                            source,
                        }
                    })?;
                    info!(count = files.len(), "Deleting bucket contents");
                    Drain::Draining {
                        pending: files.into(),
                        tally: Tally::default(),
                    }
                }

                Drain::Draining {
                    mut pending,
                    mut tally,
                } => match pending.pop_front() {
                    None => Drain::Removing { tally },
                    Some(file) => {
                        if cancel.is_cancelled() {
                            return Err(self.cancelled(bucket, tally.deleted));
                        }

                        match self.client.delete_file(bucket, &file.name).await {
                            Ok(()) => {
                                debug!(file = %file.name, "Deleted file");
                                tally.deleted += 1;
                            }
                            Err(e) if e.is_file_not_found() => {
                                debug!(file = %file.name, "File already gone");
                                tally.already_gone += 1;
                            }
                            Err(source) => {
                                error!(file = %file.name, deleted = tally.deleted, error = %source, "Bucket drain stopped");
                                return Err(CoreError::PartialDrain {
                                    bucket: bucket.to_string(),
                                    file: file.name,
                                    deleted: tally.deleted,
                                    remaining: pending.len() + 1,
                                    source,
                                });
                            }
                        }

                        if !self.policy.pause.is_zero() {
                            tokio::select! {
                                _ = tokio::time::sleep(self.policy.pause) => {}
                                _ = cancel.cancelled() => return Err(self.cancelled(bucket, tally.deleted)),
                            }
                        }
                        Drain::Draining { pending, tally }
                    }
                },

                Drain::Removing { tally } => {
                    self.client.delete_bucket(bucket).await.map_err(|source| {
                        error!(deleted = tally.deleted, error = %source, "Bucket emptied but delete failed");
                        CoreError::BucketDeleteFailed {
                            bucket: bucket.to_string(),
                            source,
                        }
                    })?;
                    info!(
                        files_deleted = tally.deleted,
                        already_gone = tally.already_gone,
                        state = ?DrainState::Done,
                        "Bucket deleted"
                    );
                    return Ok(DrainReport {
                        bucket: bucket.to_string(),
                        files_deleted: tally.deleted,
                        already_gone: tally.already_gone,
                    });
                }
            };
        }
    }

    fn cancelled(&self, bucket: &str, deleted: usize) -> CoreError {
        info!(deleted, "Bucket drain cancelled");
        CoreError::Cancelled {
            bucket: bucket.to_string(),
            deleted,
        }
    }
}
