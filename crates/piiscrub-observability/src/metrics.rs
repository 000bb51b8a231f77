//! Metrics collection with Prometheus
//!
//! Label values are enumerations only (mode, status, entity type, reason),
//! never request content.

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for the scrubber
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Mask requests by mode and HTTP status
    pub requests_total: CounterVec,

    /// Detected entities by type
    pub entities_detected_total: CounterVec,

    /// Rejected authentication attempts by reason
    pub auth_failures_total: CounterVec,

    /// Requests refused by the rate limiter
    pub rate_limited_total: CounterVec,

    /// Pipeline duration by mode
    pub processing_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("piiscrub_requests_total", "Total number of mask requests"),
            &["mode", "status"],
        )?;

        let entities_detected_total = CounterVec::new(
            Opts::new(
                "piiscrub_entities_detected_total",
                "Total number of detected PII entities",
            ),
            &["entity_type"],
        )?;

        let auth_failures_total = CounterVec::new(
            Opts::new(
                "piiscrub_auth_failures_total",
                "Total number of rejected authentication attempts",
            ),
            &["reason"],
        )?;

        let rate_limited_total = CounterVec::new(
            Opts::new(
                "piiscrub_rate_limited_total",
                "Total number of rate limited requests",
            ),
            &["path"],
        )?;

        let processing_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "piiscrub_processing_duration_seconds",
                "Mask pipeline duration in seconds",
            )
            .buckets(vec![
                0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["mode"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(entities_detected_total.clone()))?;
        registry.register(Box::new(auth_failures_total.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(processing_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            entities_detected_total,
            auth_failures_total,
            rate_limited_total,
            processing_duration_seconds,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a finished mask request
    pub fn record_request(&self, mode: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[mode, status.as_str()])
            .inc();
        self.processing_duration_seconds
            .with_label_values(&[mode])
            .observe(duration_secs);
    }

    /// Record one detection per entry of `entity_types`
    pub fn record_entities<'a>(&self, entity_types: impl IntoIterator<Item = &'a str>) {
        for entity_type in entity_types {
            self.entities_detected_total
                .with_label_values(&[entity_type])
                .inc();
        }
    }

    pub fn record_auth_failure(&self, reason: &str) {
        self.auth_failures_total.with_label_values(&[reason]).inc();
    }

    pub fn record_rate_limited(&self, path: &str) {
        self.rate_limited_total.with_label_values(&[path]).inc();
    }
}
