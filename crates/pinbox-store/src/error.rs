//! Error types for the pinbox-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during object storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network, credential or backend failure
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request (bucket full, invalid key, ...)
    #[error("storage rejected request: {0}")]
    Rejected(String),

    /// The key does not exist
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The adapter could not be built from the given configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Create a not-found error for `key`
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
