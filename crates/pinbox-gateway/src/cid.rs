//! CID reconciliation
//!
//! The bucket backend pins each object to IPFS after it is written and writes
//! the resulting CID into the object's metadata. Different backend versions
//! have used different key spellings; they are checked in a fixed order.

use chrono::{DateTime, Utc};
use pinbox_store::{Metadata, ObjectStore};
use tracing::warn;

/// Metadata keys that may carry the CID, highest priority first
pub const CID_METADATA_KEYS: [&str; 3] = ["ipfs-hash", "ipfs_hash", "ipfs"];

/// Find the CID in object metadata
pub fn extract_cid(metadata: &Metadata) -> Option<String> {
    CID_METADATA_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Public gateway URL for a CID
pub fn gateway_url(gateway_base: &str, cid: &str) -> String {
    format!("{}/{}", gateway_base.trim_end_matches('/'), cid)
}

/// What a post-upload metadata read found
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciled {
    /// CID, if the backend already assigned one
    pub cid: Option<String>,
    /// Object size as the backend reports it
    pub size: u64,
    /// Object modification time as the backend reports it
    pub last_modified: DateTime<Utc>,
}

/// Read the object's metadata once and pick up its CID.
///
/// Never waits for pinning. If the read fails the upload has still succeeded,
/// so the caller's own view of size and time is returned with no CID.
pub async fn reconcile(
    store: &dyn ObjectStore,
    key: &str,
    uploaded_size: u64,
    uploaded_at: DateTime<Utc>,
) -> Reconciled {
    match store.head_object(key).await {
        Ok(head) => Reconciled {
            cid: extract_cid(&head.metadata),
            size: head.size,
            last_modified: head.last_modified,
        },
        Err(e) => {
            warn!(key = %key, error = %e, "Metadata read after upload failed");
            Reconciled {
                cid: None,
                size: uploaded_size,
                last_modified: uploaded_at,
            }
        }
    }
}
