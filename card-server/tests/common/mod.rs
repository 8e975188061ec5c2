//! Shared helpers for card-server integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use card_server::{build_router, AppState, ServerConfig};

/// An in-memory application plus its router.
pub struct TestApp {
    /// Shared state, for asserting directly against the stores.
    pub state: AppState,
    /// The API router under test.
    pub router: Router,
}

/// Build an app backed entirely by in-memory stores.
pub fn test_app() -> TestApp {
    let state = AppState::in_memory(ServerConfig::default());
    let router = build_router(state.clone());
    TestApp { state, router }
}

/// Build a JSON request with the optional authenticated user header.
pub fn json_request(method: &str, uri: &str, user: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Build a raw-body request (asset uploads).
pub fn raw_request(method: &str, uri: &str, user: Option<&str>, bytes: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(bytes)).expect("request")
}

/// Build a bodyless request.
pub fn empty_request(method: &str, uri: &str, user: Option<&str>) -> Request<Body> {
    raw_request(method, uri, user, Vec::new())
}

/// Send a request through the router, returning status and parsed body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// A small valid PNG (rendered blank face) for use as asset bytes.
pub fn tiny_png() -> Vec<u8> {
    card_renderer::FaceRasterizer::with_size(2, 2)
        .render_png(
            &card_core::Face::default(),
            &card_renderer::PixelSource::new(),
        )
        .expect("tiny png")
}

/// Create a card over HTTP and return its id as a string.
pub async fn create_card(app: &TestApp, user: &str, title: &str) -> String {
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/cards",
            Some(user),
            &serde_json::json!({ "title": title }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create card failed: {body}");
    body["id"].as_str().expect("card id").to_string()
}
