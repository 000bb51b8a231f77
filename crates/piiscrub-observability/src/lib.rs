//! PII Scrubber Observability
//!
//! This crate provides:
//! - Prometheus metrics for mask requests, detections and boundary rejections
//! - The unauthenticated `/health` and `/metrics` endpoints

pub mod health;
pub mod metrics;

pub use health::{HealthResponse, HealthState, SERVICE_NAME, health_router};
pub use metrics::Metrics;
