//! Application router assembly

use crate::auth::{AuthState, auth_middleware};
use crate::mask::{MaskState, mask_handler};
use crate::middleware::{
    body_size_limit_middleware, cors_layer, request_context_middleware,
    security_headers_middleware,
};
use crate::rate_limit::{
    ClientRateLimiter, PRUNE_INTERVAL, RateLimitState, rate_limit_middleware,
};
use crate::types::{ErrorBody, PANIC_MESSAGE};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
};
use piiscrub_core::{AuthGate, MaskPipeline};
use piiscrub_observability::{HealthState, Metrics, health_router};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build the full service: `/mask`, `/health` and `/metrics`
///
/// Only `/mask` sits behind auth, rate limiting and the body cap. Request
/// IDs, security headers, CORS and the panic catcher wrap every route.
pub fn build_app(pipeline: Arc<MaskPipeline>, metrics: Arc<Metrics>) -> Router {
    let config = pipeline.config();
    let max_body = config.limits.max_request_body_bytes;

    let auth_state = AuthState {
        gate: Arc::new(AuthGate::from_config(&config.auth)),
        metrics: metrics.clone(),
    };

    let rate_limit_config = config.rate_limit.clone();
    let rate_limit = rate_limit_config.enabled.then(|| {
        let limiter = Arc::new(ClientRateLimiter::from_config(&rate_limit_config));
        if tokio::runtime::Handle::try_current().is_ok() {
            limiter.start_pruning(PRUNE_INTERVAL);
        } else {
            warn!("No async runtime; rate limiter entries will not be pruned");
        }
        RateLimitState {
            limiter,
            metrics: metrics.clone(),
        }
    });

    let cors = cors_layer(&config.cors.allowed_origins);

    if auth_state.gate.is_enabled() {
        info!("Basic authentication enabled for /mask");
    }

    let mut mask_router = Router::new()
        .route("/mask", post(mask_handler))
        .with_state(MaskState::new(pipeline, metrics.clone()))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(middleware::from_fn(move |req, next| {
            body_size_limit_middleware(req, next, max_body)
        }))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    if let Some(state) = rate_limit {
        info!(
            per_minute = rate_limit_config.per_minute,
            burst = rate_limit_config.burst,
            "Rate limiting enabled for /mask"
        );
        mask_router = mask_router.layer(middleware::from_fn_with_state(
            state,
            rate_limit_middleware,
        ));
    }

    mask_router
        .merge(health_router(HealthState::new(metrics)))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// The panic payload may contain request data, so it is never logged or returned
fn handle_panic(_payload: Box<dyn Any + Send + 'static>) -> Response {
    error!("Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            detail: PANIC_MESSAGE.to_string(),
        }),
    )
        .into_response()
}
