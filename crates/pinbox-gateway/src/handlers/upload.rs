//! Upload handler

use crate::cid::{gateway_url, reconcile};
use crate::limits::SizeGuard;
use crate::response::{timestamp, UploadResponse};
use crate::{keys, multipart, ApiError, AppState};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use pinbox_store::Metadata;
use std::sync::Arc;

/// Form fields copied into object metadata
pub const METADATA_FIELDS: [&str; 3] = ["name", "location", "thoughts"];

/// POST /upload - Store a multipart file with its form fields
pub async fn upload_object(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, ApiError> {
    let store = state.store()?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let boundary = multipart::parse_boundary(content_type)?;

    let request = multipart::decode(
        body.into_data_stream(),
        boundary,
        SizeGuard::new(state.config.max_upload_bytes),
    )
    .await?;

    let uploaded_at = Utc::now();
    let key = keys::generate(uploaded_at.timestamp_millis(), &request.file.name);

    let mut metadata = Metadata::new();
    for field in METADATA_FIELDS {
        metadata.insert(field.to_string(), request.field(field).to_string());
    }
    metadata.insert("uploaded_at".to_string(), timestamp(uploaded_at));

    let size = request.file.payload.len() as u64;
    tracing::debug!(key = %key, size, media_type = %request.file.media_type, "Storing upload");
    store
        .put_object(&key, request.file.payload.clone(), &request.file.media_type, metadata)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %key, "Failed to store upload");
            e
        })?;

    let reconciled = reconcile(store.as_ref(), &key, size, uploaded_at).await;
    tracing::info!(key = %key, size, cid = ?reconciled.cid, "Upload stored");

    Ok(Json(UploadResponse {
        ok: true,
        gateway: reconciled
            .cid
            .as_deref()
            .map(|cid| gateway_url(&state.config.ipfs_gateway_url, cid)),
        cid: reconciled.cid,
        key,
        name: request.field("name").to_string(),
        location: request.field("location").to_string(),
        thoughts: request.field("thoughts").to_string(),
        size: reconciled.size,
        last_modified: timestamp(reconciled.last_modified),
    }))
}
