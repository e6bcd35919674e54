//! S3 backend configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default S3 endpoint (4EVERLAND bucket service)
pub const DEFAULT_ENDPOINT: &str = "https://endpoint.4everland.co";

/// Default signing region
pub const DEFAULT_REGION: &str = "4everland";

/// Connection settings for an S3-compatible backend
#[derive(Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Endpoint URL
    pub endpoint: String,
    /// Signing region
    pub region: String,
    /// Bucket name
    pub bucket: String,
}

impl S3Config {
    /// Create a config for the default endpoint
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            bucket: bucket.into(),
        }
    }

    /// Build a config from optional parts, `None` if any credential or the
    /// bucket is missing or blank
    pub fn from_parts(
        access_key: Option<String>,
        secret_key: Option<String>,
        bucket: Option<String>,
    ) -> Option<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(Self::new(
            present(access_key)?,
            present(secret_key)?,
            present(bucket)?,
        ))
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_every_value() {
        let some = |s: &str| Some(s.to_string());
        assert!(S3Config::from_parts(some("k"), some("s"), some("b")).is_some());
        assert!(S3Config::from_parts(None, some("s"), some("b")).is_none());
        assert!(S3Config::from_parts(some("k"), None, some("b")).is_none());
        assert!(S3Config::from_parts(some("k"), some("s"), some("  ")).is_none());
    }

    #[test]
    fn test_defaults() {
        let config = S3Config::new("k", "s", "photos");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.region, DEFAULT_REGION);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = S3Config::new("k", "super-secret", "b");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
    }
}
