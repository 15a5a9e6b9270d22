use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use console_proxy::app::server::build_router;
use console_proxy::{BaseUrlResolver, ConsoleConfig, MemoryStore};
use httpmock::prelude::*;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with_origin(origin: &str) -> (Arc<BaseUrlResolver>, Router) {
    let resolver = Arc::new(BaseUrlResolver::new(Arc::new(MemoryStore::new()), None));
    resolver.set_override(origin).unwrap();
    let router = build_router(&ConsoleConfig::default(), Arc::clone(&resolver));
    (resolver, router)
}

fn app_with_body_limit(origin: &str, max_body_bytes: usize) -> Router {
    let resolver = Arc::new(BaseUrlResolver::new(Arc::new(MemoryStore::new()), None));
    resolver.set_override(origin).unwrap();
    let mut config = ConsoleConfig::default();
    config.server.max_body_bytes = max_body_bytes;
    build_router(&config, resolver)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_prefix_is_stripped_and_query_kept() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(GET).path("/widgets/42").query_param("x", "1");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"id": 42}));
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/widgets/42?x=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"id": 42}));
}

#[tokio::test]
async fn test_custom_headers_forwarded_with_forced_json_content_type() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/projects")
                .header("x-custom", "abc")
                .header("content-type", "application/json");
            then.status(200).body("[]");
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/projects")
                .header("Host", "console.local")
                .header("Connection", "keep-alive")
                .header("X-Custom", "abc")
                .header("Content-Type", "text/plain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_post_body_is_forwarded_as_json() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/projects")
                .json_body(serde_json::json!({"name": "a"}));
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"code": 201, "message": "created", "data": {"id": "p-9"}}));
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/projects")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name":"a"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["id"], "p-9");
}

#[tokio::test]
async fn test_post_without_body_does_not_crash() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(POST).path("/projects/recalculate");
            then.status(204);
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/projects/recalculate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(GET).path("/projects/unknown");
            then.status(404)
                .header("Content-Type", "application/json")
                .body(r#"{"error":"not found"}"#);
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/projects/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], br#"{"error":"not found"}"#);
}

#[tokio::test]
async fn test_upstream_content_type_relayed_or_defaulted() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/export.csv");
            then.status(200)
                .header("Content-Type", "text/csv")
                .body("id,name\n1,Alpha\n");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/bare");
            then.status(200).body("{}");
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/proxy/export.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["content-type"], "text/csv");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/bare")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn test_transport_failure_returns_generic_500() {
    // Nothing listens on port 1.
    let (_, app) = app_with_origin("http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "proxy request failed"})
    );
}

#[tokio::test]
async fn test_override_change_applies_to_next_request() {
    let first = MockServer::start_async().await;
    let second = MockServer::start_async().await;
    let first_mock = first
        .mock_async(|when, then| {
            when.method(GET).path("/ping");
            then.status(200).body("first");
        })
        .await;
    let second_mock = second
        .mock_async(|when, then| {
            when.method(GET).path("/ping");
            then.status(200).body("second");
        })
        .await;

    let (resolver, app) = app_with_origin(&first.base_url());
    let ping = || {
        Request::builder()
            .uri("/api/proxy/ping")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(ping()).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"first");

    resolver.set_override(&second.base_url()).unwrap();

    let response = app.oneshot(ping()).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"second");

    first_mock.assert_hits_async(1).await;
    second_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_browser_accept_encoding_still_gets_readable_json() {
    let server = MockServer::start_async().await;
    // Answers compressed bytes whenever the caller advertises an encoding.
    let compressed = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/projects")
                .header_exists("accept-encoding");
            then.status(200)
                .header("Content-Type", "application/json")
                .header("Content-Encoding", "gzip")
                .body(vec![0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03]);
        })
        .await;
    let plain = server
        .mock_async(|when, then| {
            when.method(GET).path("/projects");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"list": [], "total": 0}));
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/projects")
                .header("Accept-Encoding", "gzip, deflate, br")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    compressed.assert_hits_async(0).await;
    plain.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("content-encoding").is_none());
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"list": [], "total": 0})
    );
}

#[tokio::test]
async fn test_prefix_with_trailing_slash_reaches_upstream_root() {
    let server = MockServer::start_async().await;
    let root = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"service": "backend"}));
        })
        .await;

    let (_, app) = app_with_origin(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    root.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"service": "backend"})
    );
}

#[tokio::test]
async fn test_oversized_body_is_refused_without_upstream_call() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(POST).path("/projects");
            then.status(201);
        })
        .await;

    let app = app_with_body_limit(&server.base_url(), 16);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/projects")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name":"a name well past sixteen bytes"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    upstream.assert_hits_async(0).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "proxy request failed"})
    );
}
