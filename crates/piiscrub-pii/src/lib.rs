//! PII Scrubber detection and rewrite engines
//!
//! This crate provides the two engines the masking pipeline drives:
//! - Entity analysis (person, email, phone, SSN, credit card, IP, IBAN, location)
//!   with per-language recognizer sets
//! - Anonymization of detected spans through typed rewrite operators
//!
//! Both engines sit behind traits so callers can inject their own implementations.

pub mod analyzer;
pub mod anonymizer;
pub mod offsets;

pub use analyzer::{
    AnalyzerConfig, AnalyzerError, DetectedEntity, EntityAnalyzer, EntityType, RegexAnalyzer,
    Span, UnknownEntityType,
};
pub use anonymizer::{Anonymizer, AnonymizerError, Operator, OperatorSet, StandardAnonymizer};
pub use offsets::TextIndex;
