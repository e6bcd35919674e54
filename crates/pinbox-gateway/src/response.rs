//! JSON response bodies

use crate::cid::{extract_cid, gateway_url};
use chrono::{DateTime, SecondsFormat, Utc};
use pinbox_store::ObjectHead;
use serde::Serialize;

/// Render a timestamp as RFC 3339 UTC with millisecond precision
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of a successful upload
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    pub key: String,
    pub cid: Option<String>,
    pub name: String,
    pub location: String,
    pub thoughts: String,
    pub gateway: Option<String>,
    pub size: u64,
    pub last_modified: String,
}

/// A listed object with its metadata resolved
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
    pub cid: Option<String>,
    pub name: String,
    pub location: String,
    pub thoughts: String,
    #[serde(rename = "uploaded_at")]
    pub uploaded_at: Option<String>,
    pub gateway: Option<String>,
}

impl ListItem {
    /// Build an item from a head result
    pub fn from_head(key: String, head: &ObjectHead, gateway_base: &str) -> Self {
        let text = |name: &str| head.metadata.get(name).cloned().unwrap_or_default();
        let cid = extract_cid(&head.metadata);
        Self {
            gateway: cid.as_deref().map(|c| gateway_url(gateway_base, c)),
            cid,
            key,
            size: head.size,
            last_modified: timestamp(head.last_modified),
            name: text("name"),
            location: text("location"),
            thoughts: text("thoughts"),
            uploaded_at: head.metadata.get("uploaded_at").cloned(),
        }
    }
}

/// One entry of a list page
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListEntry {
    /// Metadata was read
    Item(ListItem),
    /// Metadata could not be read for this key
    Failed { key: String, error: String },
}

impl ListEntry {
    /// Object key of this entry
    pub fn key(&self) -> &str {
        match self {
            ListEntry::Item(item) => &item.key,
            ListEntry::Failed { key, .. } => key,
        }
    }
}

/// Body of a successful list
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub items: Vec<ListEntry>,
    pub next_token: Option<String>,
}

/// Body of every error response
#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
