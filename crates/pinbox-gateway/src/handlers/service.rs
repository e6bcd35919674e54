//! Service-level handlers

use crate::{ApiError, AppState};
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Body of GET /healthz
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

/// GET /healthz - Liveness and storage configuration
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: if state.is_configured() {
            "configured"
        } else {
            "unconfigured"
        },
    })
}

/// Any method a route does not serve
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Any path the router does not serve
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
