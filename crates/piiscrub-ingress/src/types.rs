//! Shared ingress types and the HTTP error mapping

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use piiscrub_core::{AuthError, ScrubError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generic message for every 500
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal processing error";

/// Generic message for panics caught at the boundary
pub const PANIC_MESSAGE: &str = "An internal error occurred";

/// Request ID for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied ID if it is short and printable
    pub fn from_header(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= 128
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error body: `{"detail": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Ingress error types
#[derive(Debug, Error)]
pub enum IngressError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body could not be parsed; the parser message is not returned since it
    /// may quote the input
    #[error("Malformed JSON body")]
    MalformedBody,

    #[error("{0}")]
    Unauthorized(AuthError),

    #[error("Authentication is enabled but credentials are not configured")]
    AuthNotConfigured,

    #[error("Request body too large. Maximum size is {max} bytes")]
    RequestTooLarge { max: usize },

    #[error("Too many entities detected ({found}); maximum per request is {max}")]
    TooManyEntities { found: usize, max: usize },

    #[error("Rate limit exceeded. Retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request processing timed out")]
    Timeout,

    /// Logged server-side only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::Validation(ValidationError::TextTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            IngressError::Validation(_) | IngressError::MalformedBody => StatusCode::BAD_REQUEST,
            IngressError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            IngressError::AuthNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            IngressError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IngressError::TooManyEntities { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            IngressError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            IngressError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            IngressError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            IngressError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for IngressError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotConfigured => IngressError::AuthNotConfigured,
            other => IngressError::Unauthorized(other),
        }
    }
}

impl From<ScrubError> for IngressError {
    fn from(err: ScrubError) -> Self {
        match err {
            ScrubError::Validation(e) => IngressError::Validation(e),
            ScrubError::Auth(e) => e.into(),
            ScrubError::TooManyEntities { found, max } => {
                IngressError::TooManyEntities { found, max }
            }
            ScrubError::Timeout { .. } => IngressError::Timeout,
            ScrubError::Config(msg) => {
                tracing::error!("Configuration error while processing request: {}", msg);
                IngressError::Internal(msg)
            }
            ScrubError::Processing(msg) => IngressError::Internal(msg),
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.detail(),
        };

        let mut response = (status, axum::Json(body)).into_response();

        match &self {
            IngressError::Unauthorized(_) => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic"),
                );
            }
            IngressError::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }

        response
    }
}

/// Ingress result type
pub type IngressResult<T> = Result<T, IngressError>;
