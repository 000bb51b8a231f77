//! Entity analyzers

mod recognizers;
mod regex_analyzer;

pub use regex_analyzer::RegexAnalyzer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Types of PII the analyzers can report
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Person name
    Person,

    /// Email address
    EmailAddress,

    /// Phone number
    PhoneNumber,

    /// US Social Security Number
    UsSsn,

    /// Credit card number
    CreditCard,

    /// IPv4 or IPv6 address
    IpAddress,

    /// International bank account number
    IbanCode,

    /// Street address
    Location,
}

impl EntityType {
    pub const ALL: [EntityType; 8] = [
        EntityType::Person,
        EntityType::EmailAddress,
        EntityType::PhoneNumber,
        EntityType::UsSsn,
        EntityType::CreditCard,
        EntityType::IpAddress,
        EntityType::IbanCode,
        EntityType::Location,
    ];

    /// Wire tag, e.g. `EMAIL_ADDRESS`
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::EmailAddress => "EMAIL_ADDRESS",
            EntityType::PhoneNumber => "PHONE_NUMBER",
            EntityType::UsSsn => "US_SSN",
            EntityType::CreditCard => "CREDIT_CARD",
            EntityType::IpAddress => "IP_ADDRESS",
            EntityType::IbanCode => "IBAN_CODE",
            EntityType::Location => "LOCATION",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| UnknownEntityType(s.to_string()))
    }
}

/// Half-open character range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A detected PII span
///
/// Offsets are character offsets into the analyzed text. The matched text
/// itself is deliberately not carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    /// Type of PII detected
    pub entity_type: EntityType,

    /// Start position (inclusive, in characters)
    pub start: usize,

    /// End position (exclusive, in characters)
    pub end: usize,

    /// Confidence score (0.0 to 1.0)
    pub score: f32,
}

impl DetectedEntity {
    pub fn new(entity_type: EntityType, start: usize, end: usize, score: f32) -> Self {
        Self {
            entity_type,
            start,
            end,
            score,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &DetectedEntity) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Analyzer errors
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("No recognizers configured for language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid recognizer pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Trait for locating PII in text
pub trait EntityAnalyzer: Send + Sync {
    /// Detect entities in `text` using the recognizers for `language`.
    ///
    /// When `entities` is given, only recognizers for those types run.
    /// Results are ordered by start offset.
    fn analyze(
        &self,
        text: &str,
        language: &str,
        entities: Option<&[EntityType]>,
    ) -> Result<Vec<DetectedEntity>, AnalyzerError>;

    /// Languages this analyzer has recognizers for
    fn supported_languages(&self) -> Vec<String>;

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().iter().any(|l| l == language)
    }

    /// Entity types the analyzer can report for a language
    fn supported_entities(&self, language: &str) -> Vec<EntityType>;
}

/// Configuration for the bundled analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Languages to build recognizers for
    pub languages: Vec<String>,

    /// Minimum score a result needs to be reported
    pub min_score: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "de".to_string()],
            min_score: 0.5,
        }
    }
}

#[cfg(test)]
mod tests;
