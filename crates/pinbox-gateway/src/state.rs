//! Application state

use crate::config::GatewayConfig;
use crate::ApiError;
use pinbox_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application state shared across handlers.
///
/// Read-only after construction.
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Object store, `None` when credentials or bucket are not configured
    store: Option<Arc<dyn ObjectStore>>,
}

impl AppState {
    /// Create application state from configuration
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let store: Option<Arc<dyn ObjectStore>> = if config.use_memory_store {
            let mut memory = MemoryObjectStore::new();
            if let Some(ms) = config.simulate_pin_ms {
                info!(delay_ms = ms, "Simulating IPFS pinning in the in-memory store");
                memory = memory.with_simulated_pinning(Duration::from_millis(ms));
            }
            Some(Arc::new(memory))
        } else if let Some(s3) = config.s3.clone() {
            info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "Using S3 object store");
            Some(Arc::new(S3ObjectStore::new(s3)?))
        } else {
            warn!("S3 credentials or FOUR_BUCKET not set, every storage request will fail");
            None
        };

        if let Some(ref store) = store {
            info!("✓ Storage backend: {}", store.backend_name());
        }

        Ok(Self { config, store })
    }

    /// Create application state around an existing store
    pub fn with_store(config: GatewayConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config,
            store: Some(store),
        }
    }

    /// The configured store
    pub fn store(&self) -> Result<Arc<dyn ObjectStore>, ApiError> {
        self.store.clone().ok_or(ApiError::ConfigurationMissing)
    }

    /// Check whether a store is configured
    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinbox_store::S3Config;

    #[test]
    fn test_unconfigured_state() {
        let state = AppState::new(GatewayConfig::default()).unwrap();
        assert!(!state.is_configured());
        assert!(matches!(state.store(), Err(ApiError::ConfigurationMissing)));
    }

    #[test]
    fn test_memory_store_state() {
        let config = GatewayConfig {
            use_memory_store: true,
            ..Default::default()
        };
        let state = AppState::new(config).unwrap();
        assert_eq!(state.store().unwrap().backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_s3_store_state() {
        let config = GatewayConfig {
            s3: Some(S3Config::new("key", "secret", "photos")),
            ..Default::default()
        };
        let state = AppState::new(config).unwrap();
        assert_eq!(state.store().unwrap().backend_name(), "s3");
    }
}
