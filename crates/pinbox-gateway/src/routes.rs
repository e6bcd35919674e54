//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Upload endpoint
pub const UPLOAD_PATH: &str = "/upload";
/// List endpoint
pub const LIST_PATH: &str = "/list";
/// Health endpoint
pub const HEALTH_PATH: &str = "/healthz";

/// Create the main router.
///
/// `get` also answers HEAD, so GET routes register HEAD as not allowed.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            UPLOAD_PATH,
            post(handlers::upload_object).fallback(handlers::method_not_allowed),
        )
        .route(
            LIST_PATH,
            get(handlers::list_objects)
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            HEALTH_PATH,
            get(handlers::health_check)
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        // Apply middleware, innermost first
        .layer(axum_middleware::from_fn(middleware::cors_middleware))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayConfig;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use pinbox_store::MemoryObjectStore;
    use tower::ServiceExt;

    fn router(configured: bool) -> Router {
        let state = if configured {
            AppState::with_store(GatewayConfig::default(), Arc::new(MemoryObjectStore::new()))
        } else {
            AppState::new(GatewayConfig::default()).unwrap()
        };
        create_router(Arc::new(state))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(UPLOAD_PATH)
            .body(Body::empty())
            .unwrap();
        let response = router(true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["access-control-allow-methods"], "POST,OPTIONS");
        assert_eq!(json_body(response).await["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_head_is_not_served_on_get_routes() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert_object("1_a.txt", b"x".to_vec(), pinbox_store::Metadata::new(), chrono::Utc::now());
        let app = create_router(Arc::new(AppState::with_store(GatewayConfig::default(), store)));

        for path in [LIST_PATH, HEALTH_PATH] {
            let request = Request::builder()
                .method(Method::HEAD)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "HEAD {path}");
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let response = router(true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(json_body(response).await["error"], "Not found");
    }

    #[tokio::test]
    async fn test_healthz_reports_storage() {
        let request = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();
        let json = json_body(router(false).oneshot(request).await.unwrap()).await;
        assert_eq!(json, serde_json::json!({"status": "ok", "storage": "unconfigured"}));

        let request = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();
        let json = json_body(router(true).oneshot(request).await.unwrap()).await;
        assert_eq!(json["storage"], "configured");
    }

    #[tokio::test]
    async fn test_unconfigured_list_is_500() {
        let request = Request::builder().uri(LIST_PATH).body(Body::empty()).unwrap();
        let response = router(false).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(json_body(response).await["error"], "S3 credentials or FOUR_BUCKET not set");
    }
}
