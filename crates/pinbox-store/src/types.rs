//! Common types for object storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Custom (user/system) metadata attached to an object
pub type Metadata = BTreeMap<String, String>;

/// Upper bound on a single list page
pub const MAX_PAGE_SIZE: u32 = 50;

/// Number of objects to request in one list call.
///
/// Always within `1..=MAX_PAGE_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize(u32);

impl PageSize {
    /// Clamp a caller-requested size into the supported range
    pub fn clamped(requested: i64) -> Self {
        Self(requested.clamp(1, MAX_PAGE_SIZE as i64) as u32)
    }

    /// Get the page size
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(20)
    }
}

/// An object as returned by a list call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified time
    pub last_modified: DateTime<Utc>,
}

/// Result of a head call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    /// Custom metadata, keys lowercased
    pub metadata: Metadata,
    /// Size in bytes
    pub size: u64,
    /// Last modified time
    pub last_modified: DateTime<Utc>,
}

/// One page of a listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Objects in backend order
    pub objects: Vec<ObjectSummary>,
    /// Opaque token for the next page, `None` on the last page
    pub next_cursor: Option<String>,
}
