//! Gateway configuration

use crate::limits::DEFAULT_MAX_UPLOAD_BYTES;
use pinbox_store::S3Config;
use serde::{Deserialize, Serialize};

/// Default public IPFS gateway prefix
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.4everland.io/ipfs";

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// S3 backend settings, `None` when credentials or bucket are missing
    pub s3: Option<S3Config>,
    /// Use in-memory storage (for testing/development)
    pub use_memory_store: bool,
    /// Delay before the in-memory store assigns a CID (milliseconds)
    pub simulate_pin_ms: Option<u64>,
    /// Maximum file payload size (bytes)
    pub max_upload_bytes: u64,
    /// Maximum concurrent metadata reads while listing
    pub list_concurrency: usize,
    /// Public IPFS gateway prefix, CIDs are appended after a `/`
    pub ipfs_gateway_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            s3: None,
            use_memory_store: false,
            simulate_pin_ms: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            list_concurrency: 16,
            ipfs_gateway_url: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
