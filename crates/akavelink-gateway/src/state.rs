//! Application state

use crate::config::GatewayConfig;
use akavelink_core::{BucketLifecycleOrchestrator, TransferOrchestrator};
use akavelink_storage::StorageClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Uploads, downloads and single-file operations
    pub transfer: TransferOrchestrator,
    /// Bucket creation, listing and draining
    pub lifecycle: BucketLifecycleOrchestrator,
    /// Cancelled when the server begins shutting down
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the orchestrators over a shared storage client
    pub fn new(config: GatewayConfig, client: Arc<dyn StorageClient>) -> Self {
        let transfer = TransferOrchestrator::new(Arc::clone(&client), config.transfer_policy());
        let lifecycle = BucketLifecycleOrchestrator::new(client, config.drain_policy());

        Self {
            config,
            transfer,
            lifecycle,
            shutdown: CancellationToken::new(),
        }
    }
}
