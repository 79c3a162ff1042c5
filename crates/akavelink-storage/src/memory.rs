//! In-memory storage backend for development and testing

use crate::cid_utils::{create_cid, root_cid, CidCodec};
use crate::{
    BucketRecord, DownloadSession, FileRecord, Result, StorageClient, StorageError, UploadSession,
    DEFAULT_BLOCK_PART_SIZE,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Configuration for the in-memory backend
#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Size of the pieces uploads are read and stored in
    pub block_part_size: usize,
    /// Minimum spacing between deletions against the same bucket.
    /// Zero disables the check.
    pub settle_time: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            block_part_size: DEFAULT_BLOCK_PART_SIZE,
            settle_time: Duration::ZERO,
        }
    }
}

struct StoredFile {
    record: FileRecord,
    blocks: Vec<Bytes>,
}

struct BucketEntry {
    record: BucketRecord,
    // BTreeMap keeps listings in name order
    files: BTreeMap<String, StoredFile>,
    last_delete: Option<Instant>,
}

/// An in-memory storage backend.
///
/// Clones share the same buckets.
#[derive(Clone, Default)]
pub struct MemoryStorageClient {
    buckets: Arc<DashMap<String, BucketEntry>>,
    config: StorageConfig,
}

impl MemoryStorageClient {
    /// Create a new empty backend with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty backend
    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Number of committed files in a bucket, `None` if the bucket is absent
    pub fn file_count(&self, bucket: &str) -> Option<usize> {
        self.buckets.get(bucket).map(|entry| entry.files.len())
    }

    fn block_part_size(&self) -> usize {
        self.config.block_part_size.max(1)
    }

    // Deletions against one bucket must be spaced by the settle time.
    fn check_settled(&self, entry: &mut BucketEntry) -> Result<()> {
        if self.config.settle_time.is_zero() {
            return Ok(());
        }
        let now = Instant::now();
        if let Some(last) = entry.last_delete {
            if now.duration_since(last) < self.config.settle_time {
                return Err(StorageError::Unavailable(format!(
                    "bucket ledger has not settled: {}",
                    entry.record.name
                )));
            }
        }
        entry.last_delete = Some(now);
        Ok(())
    }

    async fn read_block(
        &self,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> std::io::Result<Option<Bytes>> {
        let mut buf = vec![0u8; self.block_part_size()];
        let mut filled = 0;
        while filled < buf.len() {
            let n = source.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(Bytes::from(buf)))
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    #[instrument(skip(self))]
    async fn create_bucket(&self, name: &str) -> Result<BucketRecord> {
        use dashmap::mapref::entry::Entry;

        match self.buckets.entry(name.to_string()) {
            Entry::Occupied(_) => Err(StorageError::BucketAlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                let record = BucketRecord {
                    name: name.to_string(),
                    created_at: Utc::now(),
                };
                slot.insert(BucketEntry {
                    record: record.clone(),
                    files: BTreeMap::new(),
                    last_delete: None,
                });
                Ok(record)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_bucket(&self, name: &str) -> Result<()> {
        let mut entry = self
            .buckets
            .get_mut(name)
            .ok_or_else(|| StorageError::BucketNotFound(name.to_string()))?;
        if !entry.files.is_empty() {
            return Err(StorageError::BucketNotEmpty(name.to_string()));
        }
        self.check_settled(&mut entry)?;
        drop(entry);

        self.buckets.remove(name);
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketRecord>> {
        let mut buckets: Vec<_> = self.buckets.iter().map(|e| e.record.clone()).collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn list_files(&self, bucket: &str) -> Result<Vec<FileRecord>> {
        let entry = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        Ok(entry.files.values().map(|f| f.record.clone()).collect())
    }

    async fn file_info(&self, bucket: &str, file: &str) -> Result<FileRecord> {
        let entry = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        entry
            .files
            .get(file)
            .map(|f| f.record.clone())
            .ok_or_else(|| StorageError::FileNotFound {
                bucket: bucket.to_string(),
                file: file.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn open_upload(&self, bucket: &str, file: &str) -> Result<UploadSession> {
        let entry = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        if entry.files.contains_key(file) {
            return Err(StorageError::FileAlreadyExists {
                bucket: bucket.to_string(),
                file: file.to_string(),
            });
        }
        Ok(UploadSession::new(bucket, file))
    }

    #[instrument(skip(self, source), fields(bucket = %session.bucket_name, file = %session.file_name))]
    async fn write_and_commit(
        &self,
        session: UploadSession,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRecord> {
        let mut blocks = Vec::new();
        let mut block_cids = Vec::new();
        let mut size = 0u64;
        let mut encoded_size = 0u64;

        while let Some(block) = self.read_block(source).await? {
            let cid = create_cid(&block, CidCodec::Raw);
            size += block.len() as u64;
            encoded_size += (block.len() + cid.to_bytes().len()) as u64;
            block_cids.push(cid);
            blocks.push(block);
        }
        debug!(size, blocks = blocks.len(), "Upload stream drained");

        let record = FileRecord {
            bucket_name: session.bucket_name.clone(),
            name: session.file_name.clone(),
            size,
            encoded_size,
            root_cid: root_cid(&block_cids).to_string(),
            created_at: session.opened_at,
            committed_at: Utc::now(),
        };

        let mut entry = self
            .buckets
            .get_mut(&session.bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound(session.bucket_name.clone()))?;
        if entry.files.contains_key(&session.file_name) {
            // Another session committed the same name first
            return Err(StorageError::FileAlreadyExists {
                bucket: session.bucket_name,
                file: session.file_name,
            });
        }
        entry.files.insert(
            session.file_name,
            StoredFile {
                record: record.clone(),
                blocks,
            },
        );

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn open_download(&self, bucket: &str, file: &str) -> Result<DownloadSession> {
        let record = self.file_info(bucket, file).await?;
        Ok(DownloadSession::new(bucket, file, Some(record.size)))
    }

    #[instrument(skip(self, sink), fields(bucket = %session.bucket_name, file = %session.file_name))]
    async fn read_into(
        &self,
        session: DownloadSession,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        // Clone the block handles so no map guard is held across writes
        let blocks = {
            let entry = self
                .buckets
                .get(&session.bucket_name)
                .ok_or_else(|| StorageError::BucketNotFound(session.bucket_name.clone()))?;
            let stored = entry
                .files
                .get(&session.file_name)
                .ok_or_else(|| StorageError::FileNotFound {
                    bucket: session.bucket_name.clone(),
                    file: session.file_name.clone(),
                })?;
            stored.blocks.clone()
        };

        let mut written = 0u64;
        for block in blocks {
            sink.write_all(&block).await?;
            written += block.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, bucket: &str, file: &str) -> Result<()> {
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        if !entry.files.contains_key(file) {
            return Err(StorageError::FileNotFound {
                bucket: bucket.to_string(),
                file: file.to_string(),
            });
        }
        self.check_settled(&mut entry)?;
        entry.files.remove(file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_blocks() -> MemoryStorageClient {
        MemoryStorageClient::with_config(StorageConfig {
            block_part_size: 4,
            ..Default::default()
        })
    }

    async fn put(client: &MemoryStorageClient, bucket: &str, file: &str, data: &[u8]) -> FileRecord {
        let session = client.open_upload(bucket, file).await.unwrap();
        let mut source = data;
        client.write_and_commit(session, &mut source).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let client = small_blocks();
        client.create_bucket("b").await.unwrap();

        let data = b"hello block world";
        let record = put(&client, "b", "f.txt", data).await;
        assert_eq!(record.size, data.len() as u64);
        assert!(record.encoded_size > record.size);

        let session = client.open_download("b", "f.txt").await.unwrap();
        assert_eq!(session.size, Some(data.len() as u64));

        let mut out = Vec::new();
        let n = client.read_into(session, &mut out).await.unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_root_cid_follows_content() {
        let client = small_blocks();
        client.create_bucket("b").await.unwrap();

        let a = put(&client, "b", "a", b"same bytes").await;
        let b = put(&client, "b", "b", b"same bytes").await;
        let c = put(&client, "b", "c", b"other bytes").await;

        assert_eq!(a.root_cid, b.root_cid);
        assert_ne!(a.root_cid, c.root_cid);
    }

    #[tokio::test]
    async fn test_upload_requires_bucket() {
        let client = MemoryStorageClient::new();
        let err = client.open_upload("missing", "f").await.unwrap_err();
        assert!(err.is_bucket_not_found());
    }

    #[tokio::test]
    async fn test_existing_file_rejected() {
        let client = MemoryStorageClient::new();
        client.create_bucket("b").await.unwrap();
        put(&client, "b", "f", b"one").await;

        let err = client.open_upload("b", "f").await.unwrap_err();
        assert!(err.is_file_already_exists());
    }

    #[tokio::test]
    async fn test_second_commit_of_same_name_rejected() {
        let client = MemoryStorageClient::new();
        client.create_bucket("b").await.unwrap();

        let first = client.open_upload("b", "f").await.unwrap();
        let second = client.open_upload("b", "f").await.unwrap();

        let mut one: &[u8] = b"one";
        client.write_and_commit(first, &mut one).await.unwrap();

        let mut two: &[u8] = b"two";
        let err = client.write_and_commit(second, &mut two).await.unwrap_err();
        assert!(err.is_file_already_exists());
        assert_eq!(client.file_count("b"), Some(1));
    }

    #[tokio::test]
    async fn test_delete_bucket_requires_empty() {
        let client = MemoryStorageClient::new();
        client.create_bucket("b").await.unwrap();
        put(&client, "b", "f", b"x").await;

        let err = client.delete_bucket("b").await.unwrap_err();
        assert!(matches!(err, StorageError::BucketNotEmpty(_)));

        client.delete_file("b", "f").await.unwrap();
        client.delete_bucket("b").await.unwrap();
        assert_eq!(client.bucket_count(), 0);
    }

    #[tokio::test]
    async fn test_create_bucket_twice() {
        let client = MemoryStorageClient::new();
        client.create_bucket("b").await.unwrap();
        let err = client.create_bucket("b").await.unwrap_err();
        assert!(err.is_bucket_already_exists());
    }

    #[tokio::test]
    async fn test_list_files_in_name_order() {
        let client = MemoryStorageClient::new();
        client.create_bucket("b").await.unwrap();
        put(&client, "b", "c.txt", b"c").await;
        put(&client, "b", "a.txt", b"a").await;
        put(&client, "b", "b.txt", b"b").await;

        let names: Vec<_> = client
            .list_files("b")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_time_paces_deletes() {
        let client = MemoryStorageClient::with_config(StorageConfig {
            settle_time: Duration::from_secs(1),
            ..Default::default()
        });
        client.create_bucket("b").await.unwrap();
        put(&client, "b", "a", b"a").await;
        put(&client, "b", "b", b"b").await;

        client.delete_file("b", "a").await.unwrap();
        let err = client.delete_file("b", "b").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));

        tokio::time::advance(Duration::from_secs(1)).await;
        client.delete_file("b", "b").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_file() {
        let client = MemoryStorageClient::new();
        client.create_bucket("b").await.unwrap();
        let record = put(&client, "b", "empty", b"").await;
        assert_eq!(record.size, 0);

        let session = client.open_download("b", "empty").await.unwrap();
        let mut out = Vec::new();
        assert_eq!(client.read_into(session, &mut out).await.unwrap(), 0);
        assert!(out.is_empty());
    }
}
