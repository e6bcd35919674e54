//! In-memory object store for testing and local development

use crate::{ListPage, Metadata, ObjectHead, ObjectStore, ObjectSummary, PageSize, Result, StoreError};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use cid::Cid;
use dashmap::DashMap;
use multihash_codetable::{Code, MultihashDigest};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Metadata key under which pinning backends publish the CID
pub const CID_METADATA_KEY: &str = "ipfs-hash";

/// Raw binary multicodec
const RAW_CODEC: u64 = 0x55;

#[derive(Clone, Debug)]
struct StoredObject {
    payload: Bytes,
    media_type: String,
    metadata: Metadata,
    last_modified: DateTime<Utc>,
}

/// An in-memory object store.
///
/// Keys are listed in lexicographic order like S3. Cursors are the URL-safe
/// base64 encoding of the last key on the previous page.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<DashMap<String, StoredObject>>,
    pin_delay: Option<Duration>,
}

impl MemoryObjectStore {
    /// Create a new empty store that never assigns CIDs on its own
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a CID to every object `delay` after it is stored, the way an
    /// IPFS-backed bucket does.
    pub fn with_simulated_pinning(mut self, delay: Duration) -> Self {
        self.pin_delay = Some(delay);
        self
    }

    /// Insert an object directly with a chosen modification time
    pub fn insert_object(
        &self,
        key: impl Into<String>,
        payload: impl Into<Bytes>,
        metadata: Metadata,
        last_modified: DateTime<Utc>,
    ) {
        self.objects.insert(
            key.into(),
            StoredObject {
                payload: payload.into(),
                media_type: "application/octet-stream".to_string(),
                metadata,
                last_modified,
            },
        );
    }

    /// Record a CID for `key` as the backend would. Returns false if the key
    /// does not exist.
    pub fn assign_cid(&self, key: &str, cid: impl Into<String>) -> bool {
        match self.objects.get_mut(key) {
            Some(mut object) => {
                object.metadata.insert(CID_METADATA_KEY.to_string(), cid.into());
                true
            }
            None => false,
        }
    }

    /// Remove an object
    pub fn remove(&self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    /// Stored payload for `key`
    pub fn payload(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|o| o.payload.clone())
    }

    /// Declared media type for `key`
    pub fn media_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|o| o.media_type.clone())
    }

    /// Get the number of objects stored
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// CIDv1 (raw codec, sha2-256) of `data`
pub fn compute_cid(data: &[u8]) -> Cid {
    Cid::new_v1(RAW_CODEC, Code::Sha2_256.digest(data))
}

fn encode_cursor(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

fn decode_cursor(cursor: &str) -> Result<String> {
    URL_SAFE_NO_PAD
        .decode(cursor)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| StoreError::Rejected("invalid continuation token".to_string()))
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        payload: Bytes,
        media_type: &str,
        metadata: Metadata,
    ) -> Result<()> {
        let metadata = metadata
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        self.objects.insert(
            key.to_string(),
            StoredObject {
                payload: payload.clone(),
                media_type: media_type.to_string(),
                metadata,
                last_modified: Utc::now(),
            },
        );

        if let Some(delay) = self.pin_delay {
            let objects = Arc::clone(&self.objects);
            let key = key.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let cid = compute_cid(&payload).to_string();
                if let Some(mut object) = objects.get_mut(&key) {
                    debug!(key = %key, cid = %cid, "Simulated pin complete");
                    object.metadata.insert(CID_METADATA_KEY.to_string(), cid);
                }
            });
        }

        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectHead> {
        self.objects
            .get(key)
            .map(|object| ObjectHead {
                metadata: object.metadata.clone(),
                size: object.payload.len() as u64,
                last_modified: object.last_modified,
            })
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn list_objects(&self, page_size: PageSize, cursor: Option<&str>) -> Result<ListPage> {
        let after = cursor.map(decode_cursor).transpose()?;

        let mut keys: Vec<String> = self
            .objects
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|key| after.as_ref().is_none_or(|a| key > a))
            .collect();
        keys.sort();

        let limit = page_size.get() as usize;
        let truncated = keys.len() > limit;
        keys.truncate(limit);

        let objects: Vec<ObjectSummary> = keys
            .iter()
            .filter_map(|key| {
                self.objects.get(key).map(|object| ObjectSummary {
                    key: key.clone(),
                    size: object.payload.len() as u64,
                    last_modified: object.last_modified,
                })
            })
            .collect();

        let next_cursor = if truncated {
            objects.last().map(|o| encode_cursor(&o.key))
        } else {
            None
        };

        Ok(ListPage { objects, next_cursor })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
