//! API integration tests for the service routes.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{test_config, TestHarness};
use http_body_util::BodyExt;
use podstream::config::Config;
use tower::ServiceExt;

/// Helper to get response body as string
async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn harness() -> TestHarness {
    TestHarness::new(test_config(&[], &[]))
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = harness()
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ping_endpoint() {
    let response = harness()
        .router()
        .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value =
        serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
    assert_eq!(json, serde_json::json!({"status": "ok", "message": "pong"}));
}

#[tokio::test]
async fn test_status_reports_mirror_counts() {
    let harness = TestHarness::new(Config::default());
    let response = harness
        .router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value =
        serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
    assert_eq!(json["service"], "podstream");
    assert_eq!(json["mirrors"]["tierA"], 5);
    assert_eq!(json["mirrors"]["tierB"], 3);
    assert_eq!(json["localExtraction"], false);
    assert!(json["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "/resolve/{id}"));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = harness()
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/ping")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = harness()
        .router()
        .oneshot(Request::builder().uri("/api/search").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
