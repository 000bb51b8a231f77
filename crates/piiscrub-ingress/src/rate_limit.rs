//! Per-client rate limiting
//!
//! Clients are keyed by the first `X-Forwarded-For` address, then
//! `X-Real-IP`, then the peer address.

use crate::types::IngressError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use piiscrub_core::config::RateLimitConfig;
use piiscrub_observability::Metrics;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Weak};
use tokio::time::{Duration, interval};
use tracing::{debug, warn};

/// How often idle client entries are dropped
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Keyed token-bucket limiter
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl ClientRateLimiter {
    /// `per_minute` requests per minute with bursts up to `burst`.
    ///
    /// Zero values are clamped to one.
    pub fn new(per_minute: u32, burst: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);

        let quota = Quota::per_minute(per_minute).allow_burst(burst);

        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.per_minute, config.burst)
    }

    /// `Err(seconds)` until the client may retry
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
        })
    }

    /// Drop clients whose bucket has fully refilled
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of tracked clients
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }

    /// Start background pruning; the task stops once the limiter is dropped
    pub fn start_pruning(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                limiter.prune();
                debug!(clients = limiter.len(), "Pruned rate limiter");
            }
        })
    }
}

/// Identify the client for rate limiting
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded_for.to_str()
        && let Some(first) = value.split(',').next().map(str::trim)
        && !first.is_empty()
    {
        return first.to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && !value.trim().is_empty()
    {
        return value.trim().to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<ClientRateLimiter>,
    pub metrics: Arc<Metrics>,
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    match state.limiter.check(&key) {
        Ok(()) => next.run(req).await,
        Err(retry_after_secs) => {
            warn!(path = %req.uri().path(), retry_after_secs, "Rate limit exceeded");
            state.metrics.record_rate_limited(req.uri().path());
            IngressError::RateLimited { retry_after_secs }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    #[test]
    fn test_burst_then_reject() {
        let limiter = ClientRateLimiter::new(1, 2);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());

        let retry = limiter.check("10.0.0.1").unwrap_err();
        assert!((1..=60).contains(&retry));
    }

    #[test]
    fn test_clients_limited_independently() {
        let limiter = ClientRateLimiter::new(1, 1);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
        assert!(limiter.check("b").is_ok());
    }

    #[test]
    fn test_prune_drops_replenished_clients() {
        // One token per millisecond refills almost immediately
        let limiter = ClientRateLimiter::new(60_000, 1);
        for i in 0..100 {
            assert!(limiter.check(&format!("198.51.100.{i}")).is_ok());
        }
        assert_eq!(limiter.len(), 100);

        std::thread::sleep(std::time::Duration::from_millis(20));
        limiter.prune();
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_prune_keeps_limited_clients() {
        let limiter = ClientRateLimiter::new(1, 1);
        assert!(limiter.check("203.0.113.5").is_ok());

        limiter.prune();
        assert_eq!(limiter.len(), 1);
        assert!(limiter.check("203.0.113.5").is_err());
    }

    #[tokio::test]
    async fn test_background_pruning_stops_with_limiter() {
        let limiter = Arc::new(ClientRateLimiter::new(60_000, 1));
        assert!(limiter.check("192.0.2.1").is_ok());

        let handle = limiter.start_pruning(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.is_empty());

        drop(limiter);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_client_key_precedence() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, Some(peer)), "192.0.2.10");
        assert_eq!(client_key(&headers, None), "unknown");

        headers.insert("x-real-ip", "198.51.100.7".parse().unwrap());
        assert_eq!(client_key(&headers, Some(peer)), "198.51.100.7");

        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.1");
    }

    #[tokio::test]
    async fn test_middleware_returns_429() {
        let state = RateLimitState {
            limiter: Arc::new(ClientRateLimiter::new(1, 1)),
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        let app = Router::new()
            .route("/test", get(|| async { "OK" }))
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

        let request = || {
            Request::builder()
                .uri("/test")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().get(header::RETRY_AFTER).is_some());
        assert_eq!(
            state
                .metrics
                .rate_limited_total
                .with_label_values(&["/test"])
                .get(),
            1.0
        );
    }
}
