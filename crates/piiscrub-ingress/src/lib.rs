//! PII Scrubber HTTP ingress
//!
//! Serves `POST /mask` on top of [`piiscrub_core::MaskPipeline`], together
//! with the boundary middleware (auth, rate limiting, body cap, CORS,
//! request IDs, security headers) and the health/metrics routes.

pub mod app;
pub mod auth;
pub mod mask;
pub mod middleware;
pub mod rate_limit;
pub mod types;

pub use app::build_app;
pub use mask::MaskState;
pub use rate_limit::ClientRateLimiter;
pub use types::{ErrorBody, IngressError, IngressResult, RequestId};
