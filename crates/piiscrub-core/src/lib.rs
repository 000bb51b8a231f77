//! PII Scrubber core pipeline
//!
//! This crate provides the request-level logic of the service:
//! - Request/response types and the error taxonomy
//! - Preprocessing, language routing and entity filtering
//! - Operator construction for replace, redact and hash strategies
//! - The authentication gate
//! - `MaskPipeline`, which drives injected analyzer and anonymizer engines

pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod language;
pub mod operators;
pub mod pipeline;
pub mod preprocess;
pub mod types;

pub use auth::{AuthGate, Credentials, Identity, parse_basic};
pub use config::ScrubConfig;
pub use error::{AuthError, Result, ScrubError, ValidationError};
pub use language::{LanguageDetector, LanguageRouter, WhatlangDetector};
pub use operators::OperatorBuilder;
pub use pipeline::MaskPipeline;
pub use types::{EntitySummary, MaskRequest, MaskResponse, MaskingMode, Mode};
