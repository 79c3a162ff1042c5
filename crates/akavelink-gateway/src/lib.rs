//! # AkaveLink Gateway
//!
//! HTTP gateway exposing AkaveLink buckets and files as a JSON REST API.
//!
//! This crate provides:
//! - **REST API**: bucket and file routes with a uniform JSON envelope
//! - **Streaming**: multipart uploads and file downloads are never buffered whole
//! - **Rate Limiting**: global request throttling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! │             (curl, browsers, SDKs)                  │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                 AkaveLink Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Request Id │ Rate Limiter │ Multipart Parser       │
//! ├─────────────────────────────────────────────────────┤
//! │         Bucket / File Handlers (JSON envelope)      │
//! ├─────────────────────────────────────────────────────┤
//! │                  akavelink-core                     │
//! │       (TransferOrchestrator, BucketLifecycle)       │
//! ├─────────────────────────────────────────────────────┤
//! │                akavelink-storage                    │
//! │                 (StorageClient)                     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{body_limit, GatewayConfig, DEFAULT_MAX_BODY_SIZE};
pub use error::{ApiError, ErrorCode};
pub use response::Envelope;
pub use routes::create_router;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
