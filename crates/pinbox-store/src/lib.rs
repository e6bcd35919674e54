//! # Pinbox Store
//!
//! Object storage layer for the Pinbox upload gateway.
//!
//! The gateway consumes storage only through the three operations of the
//! [`ObjectStore`] trait. Objects land in an S3-compatible bucket whose backend
//! pins them to IPFS on its own schedule and records the resulting CID in the
//! object's custom metadata (`ipfs-hash`).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          pinbox-gateway handlers        │
//! ├─────────────────────────────────────────┤
//! │            ObjectStore Trait            │
//! ├────────────────────┬────────────────────┤
//! │   S3ObjectStore    │ MemoryObjectStore  │
//! ├────────────────────┴────────────────────┤
//! │  S3 endpoint (4EVERLAND) → IPFS pinning │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pinbox_store::{ObjectStore, PageSize, S3Config, S3ObjectStore};
//!
//! let store = S3ObjectStore::new(S3Config::new("key", "secret", "photos"))?;
//! let page = store.list_objects(PageSize::clamped(20), None).await?;
//! for object in page.objects {
//!     let head = store.head_object(&object.key).await?;
//!     println!("{} {:?}", object.key, head.metadata.get("ipfs-hash"));
//! }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod s3;
pub mod types;

pub use config::S3Config;
pub use error::{Result, StoreError};
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use types::{ListPage, Metadata, ObjectHead, ObjectSummary, PageSize};

use async_trait::async_trait;
use bytes::Bytes;

/// Capability set of an object storage backend.
///
/// Every operation is a single round trip. Nothing is retried internally and
/// nothing is transactional across calls: a `head_object` issued right after
/// `put_object` may observe metadata from before the backend assigned a CID.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `payload` under `key` together with its custom metadata.
    ///
    /// The object and its metadata become visible atomically.
    async fn put_object(
        &self,
        key: &str,
        payload: Bytes,
        media_type: &str,
        metadata: Metadata,
    ) -> Result<()>;

    /// Fetch custom metadata, size and modification time for `key`.
    ///
    /// Returns [`StoreError::NotFound`] if the key does not exist.
    async fn head_object(&self, key: &str) -> Result<ObjectHead>;

    /// List one page of objects, resuming after `cursor` when given.
    async fn list_objects(&self, page_size: PageSize, cursor: Option<&str>) -> Result<ListPage>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
