//! List handler

use crate::response::{ListEntry, ListItem, ListResponse};
use crate::{ApiError, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use futures::stream::{self, StreamExt};
use pinbox_store::{ObjectStore, ObjectSummary, PageSize};
use serde::Deserialize;
use std::cmp::Reverse;
use std::sync::Arc;

/// Page size used when `limit` is absent or unparsable
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Query parameters for GET /list
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub token: Option<String>,
}

impl ListParams {
    /// Requested page size, clamped
    pub fn page_size(&self) -> PageSize {
        let requested = self
            .limit
            .as_deref()
            .and_then(leading_integer)
            .unwrap_or(DEFAULT_LIST_LIMIT);
        PageSize::clamped(requested)
    }

    /// Continuation token, empty counts as absent
    pub fn cursor(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Parse the integer at the start of `value`, ignoring anything after it.
///
/// `"10abc"` is 10 and `"5.5"` is 5; a value with no leading digits is `None`.
fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let digits = &digits[..digits.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    Some(if negative { -magnitude } else { magnitude })
}

/// GET /list - One page of objects with their metadata
pub async fn list_objects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let store = state.store()?;
    let page_size = params.page_size();

    let page = store
        .list_objects(page_size, params.cursor())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list objects");
            e
        })?;

    let items = enrich(
        store.as_ref(),
        page.objects,
        state.config.list_concurrency,
        &state.config.ipfs_gateway_url,
    )
    .await;

    tracing::debug!(
        limit = page_size.get(),
        returned = items.len(),
        truncated = page.next_cursor.is_some(),
        "Listed objects"
    );

    Ok(Json(ListResponse {
        items,
        next_token: page.next_cursor,
    }))
}

/// Read every object's metadata with at most `concurrency` requests in flight.
///
/// An object whose metadata cannot be read becomes a `Failed` entry. The result
/// is ordered newest first; ties keep the listing order.
pub async fn enrich(
    store: &dyn ObjectStore,
    objects: Vec<ObjectSummary>,
    concurrency: usize,
    gateway_base: &str,
) -> Vec<ListEntry> {
    let mut entries: Vec<_> = stream::iter(objects)
        .map(|summary| async move {
            match store.head_object(&summary.key).await {
                Ok(head) => {
                    let modified = head.last_modified;
                    (modified, ListEntry::Item(ListItem::from_head(summary.key, &head, gateway_base)))
                }
                Err(e) => {
                    tracing::warn!(key = %summary.key, error = %e, "Metadata read failed");
                    (
                        summary.last_modified,
                        ListEntry::Failed {
                            key: summary.key,
                            error: e.to_string(),
                        },
                    )
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    entries.sort_by_key(|(modified, _)| Reverse(*modified));
    entries.into_iter().map(|(_, entry)| entry).collect()
}
