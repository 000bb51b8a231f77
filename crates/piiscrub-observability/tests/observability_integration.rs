//! Integration tests for observability
//!
//! Metrics recorded through `Metrics` show up on the `/metrics` route
//! served next to `/health`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use piiscrub_observability::{HealthState, Metrics, health_router};
use std::sync::Arc;
use tower::ServiceExt;

async fn scrape(metrics: Arc<Metrics>) -> String {
    let app = health_router(HealthState::new(metrics));
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_metrics_recording_workflow() {
    let metrics = Arc::new(Metrics::new().unwrap());

    metrics.record_request("mask", 200, 0.012);
    metrics.record_request("mask", 200, 0.020);
    metrics.record_request("detect", 413, 0.0);
    metrics.record_entities(["PERSON", "EMAIL_ADDRESS", "PERSON"]);
    metrics.record_auth_failure("missing_credentials");
    metrics.record_rate_limited("/mask");

    let text = scrape(metrics).await;

    assert!(text.contains(r#"piiscrub_requests_total{mode="mask",status="200"} 2"#));
    assert!(text.contains(r#"piiscrub_requests_total{mode="detect",status="413"} 1"#));
    assert!(text.contains(r#"piiscrub_entities_detected_total{entity_type="PERSON"} 2"#));
    assert!(text.contains(r#"piiscrub_auth_failures_total{reason="missing_credentials"} 1"#));
    assert!(text.contains(r#"piiscrub_rate_limited_total{path="/mask"} 1"#));
    assert!(text.contains("piiscrub_processing_duration_seconds_bucket"));
}

#[tokio::test]
async fn test_health_and_metrics_share_router() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let app = health_router(HealthState::new(metrics));

    for uri in ["/health", "/metrics"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_independent_registries() {
    let a = Metrics::new().unwrap();
    let b = Metrics::new().unwrap();
    a.record_rate_limited("/mask");

    assert_eq!(
        a.rate_limited_total.with_label_values(&["/mask"]).get(),
        1.0
    );
    assert_eq!(
        b.rate_limited_total.with_label_values(&["/mask"]).get(),
        0.0
    );
}
