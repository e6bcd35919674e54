//! HTTP middleware for CORS, request IDs and request logging

use crate::routes::{LIST_PATH, UPLOAD_PATH};
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Response header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const DEFAULT_ALLOW_HEADERS: &str = "content-type,accept";
const NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Methods served on `path`, as sent in `Access-Control-Allow-Methods`
pub fn allowed_methods(path: &str) -> &'static str {
    match path {
        UPLOAD_PATH => "POST,OPTIONS",
        LIST_PATH => "GET,OPTIONS",
        _ => "GET,POST,OPTIONS",
    }
}

/// CORS middleware.
///
/// Answers every `OPTIONS` request with 204 and decorates every other response,
/// errors included.
pub async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    let methods = allowed_methods(request.uri().path());
    let origin = request.headers().get(header::ORIGIN).cloned();
    let requested_headers = request
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    apply_cors_headers(headers, origin, requested_headers, methods);
    response
}

fn apply_cors_headers(
    headers: &mut HeaderMap,
    origin: Option<HeaderValue>,
    requested_headers: Option<HeaderValue>,
    methods: &'static str,
) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        origin.unwrap_or(HeaderValue::from_static("*")),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(methods),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        requested_headers.unwrap_or(HeaderValue::from_static(DEFAULT_ALLOW_HEADERS)),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
}

/// Request ID middleware - adds x-request-id header
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request ID extension
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn, routing::get, Router};
    use rstest::rstest;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(LIST_PATH, get(|| async { "listed" }))
            .layer(from_fn(cors_middleware))
            .layer(from_fn(request_id_middleware))
    }

    #[rstest]
    #[case(UPLOAD_PATH, "POST,OPTIONS")]
    #[case(LIST_PATH, "GET,OPTIONS")]
    #[case("/healthz", "GET,POST,OPTIONS")]
    fn test_allowed_methods(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(allowed_methods(path), expected);
    }

    #[tokio::test]
    async fn test_preflight_is_no_content() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(LIST_PATH)
            .header(header::ORIGIN, "https://photos.example")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://photos.example");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET,OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-custom");
        assert_eq!(headers[header::VARY], "Origin");
        assert!(headers.contains_key(REQUEST_ID_HEADER));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_plain_request_gets_defaults() {
        let request = Request::builder().uri(LIST_PATH).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], DEFAULT_ALLOW_HEADERS);
        assert_eq!(headers[header::CACHE_CONTROL], NO_STORE);
    }

    #[tokio::test]
    async fn test_request_ids_are_unique() {
        let first = app()
            .oneshot(Request::builder().uri(LIST_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = app()
            .oneshot(Request::builder().uri(LIST_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let a = first.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        let b = second.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
