//! Request and response types for the `/mask` endpoint

use crate::error::ValidationError;
use piiscrub_pii::{DetectedEntity, EntityType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Incoming mask request
///
/// Enumerated fields stay as strings here so an invalid value is reported
/// as a validation error naming the field, not as a generic body error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaskRequest {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub masking_mode: Option<String>,

    #[serde(default)]
    pub masking_char: Option<String>,

    /// Allow-list passed to the analyzer as its search scope
    #[serde(default)]
    pub entities: Option<Vec<String>>,

    /// Deny-list applied after detection
    #[serde(default)]
    pub skip_entities: Option<Vec<String>>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub enable_preprocessing: Option<bool>,
}

impl MaskRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Whether the request only detects or also rewrites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Detect,
    #[default]
    Mask,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Detect => "detect",
            Mode::Mask => "mask",
        }
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detect" => Ok(Mode::Detect),
            "mask" => Ok(Mode::Mask),
            _ => Err(ValidationError::InvalidMode),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anonymization strategy for mask mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskingMode {
    Replace,
    #[default]
    Redact,
    Hash,
}

impl MaskingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskingMode::Replace => "replace",
            MaskingMode::Redact => "redact",
            MaskingMode::Hash => "hash",
        }
    }
}

impl FromStr for MaskingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(MaskingMode::Replace),
            "redact" => Ok(MaskingMode::Redact),
            "hash" => Ok(MaskingMode::Hash),
            _ => Err(ValidationError::InvalidMaskingMode),
        }
    }
}

impl fmt::Display for MaskingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity metadata returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl From<&DetectedEntity> for EntitySummary {
    fn from(entity: &DetectedEntity) -> Self {
        Self {
            entity_type: entity.entity_type,
            start: entity.start,
            end: entity.end,
            score: round_to(f64::from(entity.score), 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskResponse {
    pub masked_text: String,
    pub entities_found: Vec<EntitySummary>,
    pub processing_time_ms: f64,
    pub detected_language: String,
}

/// Request value, else deployment default, else hardcoded fallback
pub fn resolve<T>(explicit: Option<T>, deployment: Option<T>, fallback: T) -> T {
    explicit.or(deployment).unwrap_or(fallback)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
