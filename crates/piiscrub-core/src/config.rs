//! Masking pipeline configuration
//!
//! Read once at startup and shared immutably by every request.

use crate::error::{Result, ScrubError};
use crate::types::MaskingMode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MASKING_CHAR: char = '█';

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    /// Deployment default strategy; `None` means the hardcoded fallback
    #[serde(default)]
    pub masking_mode: Option<MaskingMode>,

    #[serde(default)]
    pub masking_char: Option<char>,

    /// Maximum text length in characters
    #[serde(default = "default_max_text_size")]
    pub max_text_size: usize,

    #[serde(default)]
    pub languages: LanguageConfig,

    #[serde(default = "default_true")]
    pub enable_preprocessing: bool,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    /// Key for HMAC-SHA256 in hash mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default = "default_supported_languages")]
    pub supported: Vec<String>,

    #[serde(default = "default_language")]
    pub default: String,

    #[serde(default = "default_true")]
    pub auto_detect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_per_minute")]
    pub per_minute: u32,

    #[serde(default = "default_burst")]
    pub burst: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Empty means no cross-origin access
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_processing_time_ms")]
    pub max_processing_time_ms: u64,

    #[serde(default = "default_max_entities")]
    pub max_entities_per_request: usize,

    #[serde(default = "default_max_request_body")]
    pub max_request_body_bytes: usize,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            masking_mode: None,
            masking_char: None,
            max_text_size: default_max_text_size(),
            languages: LanguageConfig::default(),
            enable_preprocessing: true,
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            hash_key: None,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_languages(),
            default: default_language(),
            auto_detect: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: None,
            password: None,
            min_password_length: default_min_password_length(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: default_per_minute(),
            burst: default_burst(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_processing_time_ms: default_max_processing_time_ms(),
            max_entities_per_request: default_max_entities(),
            max_request_body_bytes: default_max_request_body(),
        }
    }
}

impl AuthConfig {
    /// Both username and password are set and non-empty
    pub fn has_credentials(&self) -> bool {
        matches!((&self.username, &self.password), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }
}

impl ScrubConfig {
    /// Reject configurations the service cannot run with.
    ///
    /// Enabled auth without credentials passes: the gate reports it per
    /// request instead.
    pub fn validate(&self) -> Result<()> {
        if self.languages.supported.is_empty() {
            return Err(ScrubError::Config(
                "at least one supported language is required".to_string(),
            ));
        }

        if !self
            .languages
            .supported
            .iter()
            .any(|l| l == &self.languages.default)
        {
            return Err(ScrubError::Config(format!(
                "default language '{}' is not in the supported set [{}]",
                self.languages.default,
                self.languages.supported.join(", ")
            )));
        }

        if self.max_text_size == 0 {
            return Err(ScrubError::Config("max_text_size must be > 0".to_string()));
        }

        if self.limits.max_processing_time_ms == 0
            || self.limits.max_entities_per_request == 0
            || self.limits.max_request_body_bytes == 0
        {
            return Err(ScrubError::Config("limits must be > 0".to_string()));
        }

        if self.rate_limit.enabled && (self.rate_limit.per_minute == 0 || self.rate_limit.burst == 0)
        {
            return Err(ScrubError::Config(
                "rate_limit.per_minute and rate_limit.burst must be > 0".to_string(),
            ));
        }

        if self.auth.enabled
            && let Some(password) = &self.auth.password
            && !password.is_empty()
            && password.chars().count() < self.auth.min_password_length
        {
            return Err(ScrubError::Config(format!(
                "API password must be at least {} characters",
                self.auth.min_password_length
            )));
        }

        Ok(())
    }

    /// Copy with secrets replaced, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.auth.password.is_some() {
            copy.auth.password = Some("***".to_string());
        }
        if copy.hash_key.is_some() {
            copy.hash_key = Some("***".to_string());
        }
        copy
    }
}

fn default_max_text_size() -> usize {
    50_000
}

fn default_supported_languages() -> Vec<String> {
    vec!["en".to_string(), "de".to_string()]
}

fn default_language() -> String {
    "en".to_string()
}

fn default_min_password_length() -> usize {
    12
}

fn default_per_minute() -> u32 {
    30
}

fn default_burst() -> u32 {
    10
}

fn default_max_processing_time_ms() -> u64 {
    30_000
}

fn default_max_entities() -> usize {
    1_000
}

fn default_max_request_body() -> usize {
    1_048_576
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
