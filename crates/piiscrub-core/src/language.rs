//! Language routing
//!
//! Picks the language whose recognizers run for a request: the explicit
//! request value, else automatic detection, else the configured default.

use crate::config::LanguageConfig;
use crate::error::{Result, ScrubError, ValidationError};
use piiscrub_pii::EntityAnalyzer;
use std::sync::Arc;
use tracing::debug;
use whatlang::{Detector, Lang};

/// Trait for guessing the language of a text
pub trait LanguageDetector: Send + Sync {
    /// Best-guess language code, or `None` if undecided
    fn detect(&self, text: &str) -> Option<String>;
}

/// Trigram-based detector, restricted to a set of languages
pub struct WhatlangDetector {
    detector: Detector,
}

impl WhatlangDetector {
    /// Create a detector choosing only among `languages`.
    ///
    /// Codes without a known mapping are ignored; if none map, the detector
    /// considers every language it knows.
    pub fn new(languages: &[String]) -> Self {
        let allowlist: Vec<Lang> = languages.iter().filter_map(|l| to_whatlang(l)).collect();

        let detector = if allowlist.is_empty() {
            Detector::new()
        } else {
            Detector::with_allowlist(allowlist)
        };

        Self { detector }
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        self.detector
            .detect(text)
            .map(|info| info.lang().code().to_string())
    }
}

fn to_whatlang(code: &str) -> Option<Lang> {
    let three = match normalize_code(code).as_str() {
        "en" => "eng",
        "de" => "deu",
        "fr" => "fra",
        "es" => "spa",
        "it" => "ita",
        "nl" => "nld",
        "pt" => "por",
        _ => return None,
    };
    Lang::from_code(three)
}

/// Map a detector or request code to a lowercase two-letter code.
///
/// Handles ISO 639-3 variants (`eng`, `deu`, `ger`) and region suffixes
/// (`en-US`, `de_AT`).
pub fn normalize_code(code: &str) -> String {
    let lowered = code.trim().to_ascii_lowercase();
    let base = lowered
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_string();

    match base.as_str() {
        "eng" => "en".to_string(),
        "deu" | "ger" => "de".to_string(),
        "fra" | "fre" => "fr".to_string(),
        "spa" => "es".to_string(),
        "ita" => "it".to_string(),
        "nld" | "dut" => "nl".to_string(),
        "por" => "pt".to_string(),
        _ => base,
    }
}

/// Resolves one language per request
pub struct LanguageRouter {
    config: LanguageConfig,
    detector: Arc<dyn LanguageDetector>,
}

impl LanguageRouter {
    pub fn new(config: LanguageConfig, detector: Arc<dyn LanguageDetector>) -> Self {
        Self { config, detector }
    }

    pub fn supported(&self) -> &[String] {
        &self.config.supported
    }

    fn is_supported(&self, code: &str) -> bool {
        self.config.supported.iter().any(|l| l == code)
    }

    /// Pick the language without checking analyzer coverage
    pub fn choose(&self, explicit: Option<&str>, text: &str) -> Result<String> {
        if let Some(requested) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            let code = requested.to_ascii_lowercase();
            if self.is_supported(&code) {
                return Ok(code);
            }
            return Err(ValidationError::UnsupportedLanguage {
                code: requested.to_string(),
                supported: self.config.supported.clone(),
            }
            .into());
        }

        if self.config.auto_detect {
            if let Some(detected) = self.detector.detect(text) {
                let code = normalize_code(&detected);
                if self.is_supported(&code) {
                    return Ok(code);
                }
                debug!(detected = %detected, "Detected language not supported, using default");
            } else {
                debug!("Language detection inconclusive, using default");
            }
        }

        Ok(self.config.default.clone())
    }

    /// Pick the language and confirm the analyzer has recognizers for it
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        text: &str,
        analyzer: &dyn EntityAnalyzer,
    ) -> Result<String> {
        let language = self.choose(explicit, text)?;

        if !analyzer.supports_language(&language) {
            return Err(ScrubError::Config(format!(
                "No analyzer configured for language '{}'",
                language
            )));
        }

        Ok(language)
    }
}
