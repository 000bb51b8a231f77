//! Error types for the masking pipeline

use thiserror::Error;

/// Client errors raised before any detection work
///
/// Messages never contain request text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing text in request body")]
    MissingText,

    #[error("Text too large. Maximum size is {max} characters")]
    TextTooLarge { max: usize },

    #[error("Invalid mode. Must be: detect or mask")]
    InvalidMode,

    #[error("Invalid masking_mode. Must be: replace, redact, or hash")]
    InvalidMaskingMode,

    #[error("masking_char must be a single character")]
    InvalidMaskingChar,

    #[error("Unsupported language '{code}'. Supported languages: {}", supported.join(", "))]
    UnsupportedLanguage { code: String, supported: Vec<String> },

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),
}

/// Authentication failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    #[error("Authentication is enabled but credentials are not configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum ScrubError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Too many entities detected ({found}); maximum per request is {max}")]
    TooManyEntities { found: usize, max: usize },

    #[error("Processing exceeded the {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },
}

impl ScrubError {
    /// Whether the message is safe to return to the caller verbatim
    pub fn is_client_error(&self) -> bool {
        match self {
            ScrubError::Validation(_) | ScrubError::TooManyEntities { .. } => true,
            ScrubError::Auth(e) => *e != AuthError::NotConfigured,
            ScrubError::Config(_) | ScrubError::Processing(_) | ScrubError::Timeout { .. } => {
                false
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrubError>;
