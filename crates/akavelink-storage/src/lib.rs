//! # AkaveLink Storage
//!
//! Backend contract for the AkaveLink gateway.
//!
//! The storage backend owns signing, chunking, erasure coding and on-chain
//! bucket/file bookkeeping. This crate only describes what the gateway needs
//! from it:
//! - **StorageClient trait**: bucket and file operations plus upload/download sessions
//! - **Errors**: backend failures folded into a small set of kinds
//! - **Content identifiers**: CID helpers for root identifiers
//! - **Memory backend**: a complete in-process implementation for development and tests
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Transfer / Lifecycle layer       │
//! ├─────────────────────────────────────────┤
//! │          StorageClient Trait            │
//! ├──────────────────────┬──────────────────┤
//! │   networked client   │ MemoryStorage    │
//! ├──────────────────────┴──────────────────┤
//! │      Akave node / contracts / blocks    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use akavelink_storage::{MemoryStorageClient, StorageClient};
//!
//! let client = MemoryStorageClient::new();
//! client.create_bucket("photos").await?;
//! let session = client.open_upload("photos", "cat.jpg").await?;
//! let record = client.write_and_commit(session, &mut file).await?;
//! ```

pub mod cid_utils;
pub mod error;
pub mod memory;
pub mod types;

pub use cid_utils::{create_cid, parse_cid, root_cid, CidCodec};
pub use error::{Result, StorageError, StorageErrorKind};
pub use memory::{MemoryStorageClient, StorageConfig};
pub use types::{BucketRecord, DownloadSession, FileRecord, UploadSession};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Default block part size (1 MiB)
pub const DEFAULT_BLOCK_PART_SIZE: usize = 1024 * 1024;

/// Operations the gateway consumes from the storage backend.
///
/// Every call is independent; implementations are shared across concurrent
/// requests and must not rely on call ordering between them. Sessions are
/// consumed by the call that uses them.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Provision a new bucket
    async fn create_bucket(&self, name: &str) -> Result<BucketRecord>;

    /// Remove an empty bucket
    async fn delete_bucket(&self, name: &str) -> Result<()>;

    /// List all buckets visible to the caller's credentials
    async fn list_buckets(&self) -> Result<Vec<BucketRecord>>;

    /// List committed files in a bucket
    async fn list_files(&self, bucket: &str) -> Result<Vec<FileRecord>>;

    /// Metadata of one committed file
    async fn file_info(&self, bucket: &str, file: &str) -> Result<FileRecord>;

    /// Open an upload session bound to `(bucket, file)`
    async fn open_upload(&self, bucket: &str, file: &str) -> Result<UploadSession>;

    /// Stream `source` into the session until end-of-data and commit it
    async fn write_and_commit(
        &self,
        session: UploadSession,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRecord>;

    /// Open a download session bound to `(bucket, file)`
    async fn open_download(&self, bucket: &str, file: &str) -> Result<DownloadSession>;

    /// Write every byte of the session into `sink`, returning the byte count
    async fn read_into(
        &self,
        session: DownloadSession,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64>;

    /// Delete a committed file
    async fn delete_file(&self, bucket: &str, file: &str) -> Result<()>;
}
