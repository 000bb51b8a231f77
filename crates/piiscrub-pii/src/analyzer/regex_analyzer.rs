//! Regex-based entity analyzer

use crate::analyzer::recognizers::{self, Recognizer};
use crate::analyzer::{
    AnalyzerConfig, AnalyzerError, DetectedEntity, EntityAnalyzer, EntityType,
};
use crate::offsets::TextIndex;
use std::collections::HashMap;

/// Regex-based entity analyzer with one recognizer set per language
///
/// Recognizers are compiled once at construction; analysis only reads them,
/// so a single instance can be shared across threads.
pub struct RegexAnalyzer {
    config: AnalyzerConfig,
    recognizers: HashMap<String, Vec<Recognizer>>,
}

impl RegexAnalyzer {
    /// Languages with a bundled recognizer set
    pub const LANGUAGES: &'static [&'static str] = &["en", "de"];

    /// Create an analyzer with recognizers for every configured language
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let mut recognizers = HashMap::new();

        for language in &config.languages {
            let set = match language.as_str() {
                "en" => recognizers::english()?,
                "de" => recognizers::german()?,
                other => return Err(AnalyzerError::UnsupportedLanguage(other.to_string())),
            };
            recognizers.insert(language.clone(), set);
        }

        Ok(Self {
            config,
            recognizers,
        })
    }

    fn recognizers_for(&self, language: &str) -> Result<&[Recognizer], AnalyzerError> {
        self.recognizers
            .get(language)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalyzerError::UnsupportedLanguage(language.to_string()))
    }
}

/// Drop exact duplicates and spans contained in an equal-or-higher scoring
/// span of the same type, then order by position
fn remove_duplicates(mut found: Vec<DetectedEntity>) -> Vec<DetectedEntity> {
    found.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
    });

    let mut kept: Vec<DetectedEntity> = Vec::with_capacity(found.len());
    for candidate in found {
        let shadowed = kept.iter().any(|k| {
            k.entity_type == candidate.entity_type
                && k.start <= candidate.start
                && candidate.end <= k.end
        });
        if !shadowed {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|e| (e.start, e.end));
    kept
}

impl EntityAnalyzer for RegexAnalyzer {
    fn analyze(
        &self,
        text: &str,
        language: &str,
        entities: Option<&[EntityType]>,
    ) -> Result<Vec<DetectedEntity>, AnalyzerError> {
        let recognizers = self.recognizers_for(language)?;
        let index = TextIndex::new(text);
        let mut found = Vec::new();

        for recognizer in recognizers {
            if let Some(allowed) = entities
                && !allowed.contains(&recognizer.entity_type)
            {
                continue;
            }

            if recognizer.score() < self.config.min_score {
                continue;
            }

            for (start, end) in recognizer.find(text) {
                found.push(DetectedEntity::new(
                    recognizer.entity_type,
                    index.char_offset(start),
                    index.char_offset(end),
                    recognizer.score(),
                ));
            }
        }

        Ok(remove_duplicates(found))
    }

    fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.recognizers.keys().cloned().collect();
        languages.sort();
        languages
    }

    fn supported_entities(&self, language: &str) -> Vec<EntityType> {
        let mut types: Vec<EntityType> = self
            .recognizers
            .get(language)
            .map(|set| set.iter().map(|r| r.entity_type).collect())
            .unwrap_or_default();
        types.sort();
        types.dedup();
        types
    }
}
