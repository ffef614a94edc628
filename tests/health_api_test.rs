//! Health and cross-cutting middleware tests

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{domains_path, TestApp};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_check() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/ready", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri(domains_path())
        .header("Authorization", "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
