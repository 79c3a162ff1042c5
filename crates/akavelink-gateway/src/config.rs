//! Gateway configuration

use akavelink_core::{DrainPolicy, TransferPolicy};
use akavelink_storage::{StorageConfig, DEFAULT_BLOCK_PART_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request body limit (5 GiB)
pub const DEFAULT_MAX_BODY_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Body limit in bytes, capped at what the platform can address
pub fn body_limit(bytes: u64) -> usize {
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Size of the pieces uploads are cut into by the backend
    pub block_part_size: usize,
    /// Pause after each file delete while emptying a bucket (milliseconds)
    pub delete_pause_ms: u64,
    /// Create a missing bucket on upload
    pub auto_create_bucket: bool,
    /// Backend settle window between deletions on one bucket (milliseconds, in-memory backend)
    pub settle_time_ms: u64,
    /// Rate limit (requests per second, whole gateway). 0 disables
    pub rate_limit_rps: u32,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            block_part_size: DEFAULT_BLOCK_PART_SIZE,
            delete_pause_ms: 1000,
            auto_create_bucket: true,
            settle_time_ms: 0,
            rate_limit_rps: 100,
            max_body_size: body_limit(DEFAULT_MAX_BODY_SIZE),
            cors_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn transfer_policy(&self) -> TransferPolicy {
        TransferPolicy {
            auto_create_bucket: self.auto_create_bucket,
        }
    }

    pub fn drain_policy(&self) -> DrainPolicy {
        DrainPolicy {
            pause: Duration::from_millis(self.delete_pause_ms),
        }
    }

    /// Settings for the in-memory backend
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            block_part_size: self.block_part_size,
            settle_time: Duration::from_millis(self.settle_time_ms),
        }
    }
}
