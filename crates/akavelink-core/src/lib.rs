//! # AkaveLink Core
//!
//! Transfer and lifecycle orchestration for the AkaveLink gateway.
//!
//! This crate provides:
//! - **TransferOrchestrator**: streamed uploads and downloads, with bucket
//!   auto-creation and overwrite handled before the data moves
//! - **BucketLifecycleOrchestrator**: the paced "empty and delete a bucket" procedure
//! - **Error taxonomy**: backend failures wrapped with the step that failed and
//!   classified for the HTTP layer
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           HTTP gateway surface          │
//! ├────────────────────┬────────────────────┤
//! │ TransferOrchestr.  │ BucketLifecycle    │
//! │ open/retry/stream  │ list/drain/remove  │
//! ├────────────────────┴────────────────────┤
//! │        Arc<dyn StorageClient>           │
//! └─────────────────────────────────────────┘
//! ```

pub mod error;
pub mod lifecycle;
pub mod request;
pub mod transfer;

pub use error::{CoreError, ErrorClass, Operation, Result};
pub use lifecycle::{BucketLifecycleOrchestrator, DrainPolicy, DrainReport, DrainState};
pub use request::{validate_bucket_name, validate_file_name, Direction, TransferRequest};
pub use transfer::{TransferOrchestrator, TransferPolicy, UploadOutcome};

/// Chunk size used when piping streamed bytes between tasks (64 KiB)
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Default pause between file deletions while draining a bucket
pub const DEFAULT_DELETE_PAUSE: std::time::Duration = std::time::Duration::from_secs(1);
