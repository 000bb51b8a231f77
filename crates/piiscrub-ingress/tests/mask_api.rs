//! End-to-end tests for the `/mask` service
//!
//! The router is driven in-process with `oneshot`, using the bundled regex
//! analyzer unless a test needs a misbehaving one.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use piiscrub_core::config::AuthConfig;
use piiscrub_core::{MaskPipeline, ScrubConfig, WhatlangDetector};
use piiscrub_ingress::build_app;
use piiscrub_observability::Metrics;
use piiscrub_pii::{
    AnalyzerConfig, AnalyzerError, DetectedEntity, EntityAnalyzer, EntityType, RegexAnalyzer,
    StandardAnonymizer,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app_with(config: ScrubConfig, analyzer: Arc<dyn EntityAnalyzer>) -> (Router, Arc<Metrics>) {
    let detector = Arc::new(WhatlangDetector::new(&config.languages.supported));
    let pipeline = MaskPipeline::new(
        config,
        analyzer,
        Arc::new(StandardAnonymizer::new()),
        detector,
    );
    let metrics = Arc::new(Metrics::new().unwrap());
    (build_app(Arc::new(pipeline), metrics.clone()), metrics)
}

fn app(config: ScrubConfig) -> Router {
    let analyzer = RegexAnalyzer::new(AnalyzerConfig::default()).unwrap();
    app_with(config, Arc::new(analyzer)).0
}

fn default_app() -> Router {
    app(ScrubConfig::default())
}

fn mask_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn entity_types(body: &Value) -> Vec<String> {
    body["entities_found"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["entity_type"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_replace_mode_uses_type_placeholders() {
    let (status, body) = send(
        default_app(),
        mask_request(json!({
            "text": "John Doe lives at 123 Main St and email is john@example.com",
            "masking_mode": "replace",
            "language": "en"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let masked = body["masked_text"].as_str().unwrap();
    assert!(masked.contains("<PERSON>"), "{masked}");
    assert!(masked.contains("<EMAIL_ADDRESS>"), "{masked}");
    assert!(!masked.contains("john@example.com"));

    for entity_type in entity_types(&body) {
        assert!(masked.contains(&format!("<{entity_type}>")), "{entity_type}");
    }
    assert_eq!(body["detected_language"], "en");
    assert!(body["processing_time_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_redact_ssn_with_custom_char() {
    let (status, body) = send(
        default_app(),
        mask_request(json!({
            "text": "123-45-6789",
            "masking_mode": "redact",
            "masking_char": "*",
            "language": "en"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["masked_text"].as_str().unwrap().contains("******"));
    assert!(entity_types(&body).contains(&"US_SSN".to_string()));
}

#[tokio::test]
async fn test_detect_mode_returns_original_text() {
    let text = "Contact  john@example.com\\n now";
    let (status, body) = send(
        default_app(),
        mask_request(json!({ "text": text, "mode": "detect", "language": "en" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["masked_text"], text);
    assert_eq!(entity_types(&body), vec!["EMAIL_ADDRESS"]);
}

#[tokio::test]
async fn test_response_has_exactly_the_documented_fields() {
    let (_, body) = send(
        default_app(),
        mask_request(json!({ "text": "nothing here", "language": "en" })),
    )
    .await;

    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "detected_language",
            "entities_found",
            "masked_text",
            "processing_time_ms"
        ]
    );
}

#[tokio::test]
async fn test_unsupported_language_names_supported_set() {
    let (status, body) = send(
        default_app(),
        mask_request(json!({ "text": "hello", "language": "xx" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("en"), "{detail}");
    assert!(detail.contains("de"), "{detail}");
}

#[tokio::test]
async fn test_validation_errors_do_not_echo_input() {
    let cases = [
        json!({ "text": "" }),
        json!({ "mode": "detect" }),
        json!({ "text": "secret-value-42", "mode": "scan" }),
        json!({ "text": "secret-value-42", "masking_mode": "blur" }),
        json!({ "text": "secret-value-42", "masking_char": "**" }),
        json!({ "text": "secret-value-42", "entities": ["NOT_A_TYPE"] }),
    ];

    for case in cases {
        let (status, body) = send(default_app(), mask_request(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
        assert!(!body["detail"].as_str().unwrap().contains("secret-value-42"));
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/mask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "John Doe"#))
        .unwrap();

    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Malformed JSON body");
}

#[tokio::test]
async fn test_text_size_boundary() {
    let config = ScrubConfig {
        max_text_size: 10,
        ..ScrubConfig::default()
    };

    let (status, _) = send(
        app(config.clone()),
        mask_request(json!({ "text": "ääääääääää", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(config),
        mask_request(json!({ "text": "ääääääääääa", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["detail"], "Text too large. Maximum size is 10 characters");
}

#[tokio::test]
async fn test_request_body_limit() {
    let mut config = ScrubConfig::default();
    config.limits.max_request_body_bytes = 64;

    let (status, _) = send(
        app(config),
        mask_request(json!({ "text": "x".repeat(200) })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

fn auth_config(username: Option<&str>, password: Option<&str>) -> ScrubConfig {
    ScrubConfig {
        auth: AuthConfig {
            enabled: true,
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            min_password_length: 12,
        },
        ..ScrubConfig::default()
    }
}

fn authed_request(auth: Option<String>) -> Request<Body> {
    let mut request = mask_request(json!({ "text": "hello there", "language": "en" }));
    if let Some(auth) = auth {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, auth.parse().unwrap());
    }
    request
}

#[tokio::test]
async fn test_auth_disabled_accepts_anonymous() {
    let (status, _) = send(default_app(), authed_request(None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_rejections_are_identical() {
    let config = auth_config(Some("scrubber"), Some("a-long-enough-secret"));

    let missing = send(app(config.clone()), authed_request(None)).await;
    let wrong_user = send(
        app(config.clone()),
        authed_request(Some(basic("someone", "a-long-enough-secret"))),
    )
    .await;
    let wrong_pass = send(
        app(config.clone()),
        authed_request(Some(basic("scrubber", "not-the-secret"))),
    )
    .await;

    for (status, body) in [&missing, &wrong_user, &wrong_pass] {
        assert_eq!(*status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid authentication credentials");
    }

    let (status, _) = send(
        app(config),
        authed_request(Some(basic("scrubber", "a-long-enough-secret"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unauthorized_carries_basic_challenge() {
    let config = auth_config(Some("scrubber"), Some("a-long-enough-secret"));
    let response = app(config).oneshot(authed_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic"
    );
}

#[tokio::test]
async fn test_auth_without_credentials_is_server_error() {
    let (status, body) = send(
        app(auth_config(None, None)),
        authed_request(Some(basic("scrubber", "a-long-enough-secret"))),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().contains("scrubber"));
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let config = auth_config(Some("scrubber"), Some("a-long-enough-secret"));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(config), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "service": "pii-scrubber" }));
}

#[tokio::test]
async fn test_every_response_has_request_id_and_security_headers() {
    for request in [
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
        mask_request(json!({ "text": "" })),
    ] {
        let response = default_app().oneshot(request).await.unwrap();
        assert!(response.headers().get("x-request-id").is_some());
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let mut config = ScrubConfig::default();
    config.rate_limit.per_minute = 1;
    config.rate_limit.burst = 1;
    let analyzer = RegexAnalyzer::new(AnalyzerConfig::default()).unwrap();
    let (app, metrics) = app_with(config, Arc::new(analyzer));

    let request = || {
        let mut request = mask_request(json!({ "text": "hello", "language": "en" }));
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.5".parse().unwrap());
        request
    };

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().get(header::RETRY_AFTER).is_some());
    assert_eq!(
        metrics.rate_limited_total.with_label_values(&["/mask"]).get(),
        1.0
    );
}

#[tokio::test]
async fn test_metrics_count_requests_and_entities() {
    let analyzer = RegexAnalyzer::new(AnalyzerConfig::default()).unwrap();
    let (app, metrics) = app_with(ScrubConfig::default(), Arc::new(analyzer));

    let (status, _) = send(
        app,
        mask_request(json!({ "text": "mail john@example.com", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        metrics
            .requests_total
            .with_label_values(&["mask", "200"])
            .get(),
        1.0
    );
    assert_eq!(
        metrics
            .entities_detected_total
            .with_label_values(&["EMAIL_ADDRESS"])
            .get(),
        1.0
    );
}

/// Analyzer stand-in that misbehaves on demand
enum BrokenAnalyzer {
    Panics,
    Slow(Duration),
    Floods(usize),
}

impl EntityAnalyzer for BrokenAnalyzer {
    fn analyze(
        &self,
        _text: &str,
        _language: &str,
        _entities: Option<&[EntityType]>,
    ) -> Result<Vec<DetectedEntity>, AnalyzerError> {
        match self {
            BrokenAnalyzer::Panics => panic!("analyzer exploded on John Doe"),
            BrokenAnalyzer::Slow(delay) => {
                std::thread::sleep(*delay);
                Ok(Vec::new())
            }
            BrokenAnalyzer::Floods(count) => Ok((0..*count)
                .map(|i| DetectedEntity::new(EntityType::Person, i, i + 1, 0.9))
                .collect()),
        }
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["en".to_string(), "de".to_string()]
    }

    fn supported_entities(&self, _language: &str) -> Vec<EntityType> {
        EntityType::ALL.to_vec()
    }
}

#[tokio::test]
async fn test_analyzer_panic_is_generic_500() {
    let (app, _) = app_with(ScrubConfig::default(), Arc::new(BrokenAnalyzer::Panics));

    let (status, body) = send(
        app,
        mask_request(json!({ "text": "John Doe", "language": "en" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(!detail.contains("John"), "{detail}");
}

#[tokio::test]
async fn test_processing_budget_exceeded() {
    let mut config = ScrubConfig::default();
    config.limits.max_processing_time_ms = 20;
    let analyzer = BrokenAnalyzer::Slow(Duration::from_millis(500));
    let (app, _) = app_with(config, Arc::new(analyzer));

    let (status, _) = send(
        app,
        mask_request(json!({ "text": "hello", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_too_many_entities_is_rejected() {
    let mut config = ScrubConfig::default();
    config.limits.max_entities_per_request = 3;
    let (app, _) = app_with(config, Arc::new(BrokenAnalyzer::Floods(5)));

    let (status, _) = send(
        app,
        mask_request(json!({ "text": "abcdefgh", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
