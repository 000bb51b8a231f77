//! The masking pipeline
//!
//! Validation, preprocessing, language routing, detection, filtering and
//! rewriting for a single request. Synchronous; callers on an async runtime
//! should run it on a blocking thread.

use crate::config::{DEFAULT_MASKING_CHAR, ScrubConfig};
use crate::error::{Result, ScrubError, ValidationError};
use crate::filter::filter_entities;
use crate::language::{LanguageDetector, LanguageRouter};
use crate::operators::OperatorBuilder;
use crate::preprocess::preprocess;
use crate::types::{EntitySummary, MaskRequest, MaskResponse, MaskingMode, Mode, resolve, round_to};
use piiscrub_pii::{Anonymizer, DetectedEntity, EntityAnalyzer, EntityType};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Request after validation, with every optional field resolved
#[derive(Debug, Clone)]
struct ValidatedRequest {
    text: String,
    mode: Mode,
    masking_mode: MaskingMode,
    masking_char: char,
    entities: Option<Vec<EntityType>>,
    skip_entities: Option<Vec<EntityType>>,
    language: Option<String>,
    preprocess: bool,
}

pub struct MaskPipeline {
    config: Arc<ScrubConfig>,
    analyzer: Arc<dyn EntityAnalyzer>,
    anonymizer: Arc<dyn Anonymizer>,
    router: LanguageRouter,
    operators: OperatorBuilder,
}

impl MaskPipeline {
    pub fn new(
        config: ScrubConfig,
        analyzer: Arc<dyn EntityAnalyzer>,
        anonymizer: Arc<dyn Anonymizer>,
        detector: Arc<dyn LanguageDetector>,
    ) -> Self {
        let router = LanguageRouter::new(config.languages.clone(), detector);
        let operators = match &config.hash_key {
            Some(key) if !key.is_empty() => OperatorBuilder::with_hash_key(key),
            _ => OperatorBuilder::new(),
        };

        Self {
            config: Arc::new(config),
            analyzer,
            anonymizer,
            router,
            operators,
        }
    }

    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }

    /// Run one request end to end
    pub fn run(&self, request: MaskRequest) -> Result<MaskResponse> {
        let started = Instant::now();
        let request = self.validate(request)?;

        let processed = if request.preprocess {
            preprocess(&request.text)
        } else {
            request.text.clone()
        };

        let language =
            self.router
                .resolve(request.language.as_deref(), &processed, self.analyzer.as_ref())?;

        let detected = self
            .analyzer
            .analyze(&processed, &language, request.entities.as_deref())
            .map_err(|e| {
                error!(
                    text_len = char_len(&processed),
                    language = %language,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Entity analysis failed: {}",
                    e
                );
                ScrubError::Processing(e.to_string())
            })?;

        let entities = filter_entities(detected, request.skip_entities.as_deref());

        let max = self.config.limits.max_entities_per_request;
        if entities.len() > max {
            return Err(ScrubError::TooManyEntities {
                found: entities.len(),
                max,
            });
        }

        let masked_text = match request.mode {
            Mode::Detect => request.text.clone(),
            Mode::Mask => self.rewrite(&request, &processed, &entities, &started)?,
        };

        let processing_time_ms = round_to(started.elapsed().as_secs_f64() * 1000.0, 2);

        info!(
            mode = %request.mode,
            masking_mode = %request.masking_mode,
            language = %language,
            text_len = char_len(&request.text),
            entity_count = entities.len(),
            entity_types = ?distinct_types(&entities),
            elapsed_ms = processing_time_ms,
            "Processed mask request"
        );

        Ok(MaskResponse {
            masked_text,
            entities_found: entities.iter().map(EntitySummary::from).collect(),
            processing_time_ms,
            detected_language: language,
        })
    }

    fn rewrite(
        &self,
        request: &ValidatedRequest,
        processed: &str,
        entities: &[DetectedEntity],
        started: &Instant,
    ) -> Result<String> {
        let operators = self.operators.build(
            request.masking_mode,
            request.masking_char,
            processed,
            entities,
        );

        let operators = if operators.is_empty() {
            None
        } else {
            Some(&operators)
        };

        self.anonymizer
            .anonymize(processed, entities, operators)
            .map_err(|e| {
                error!(
                    text_len = char_len(processed),
                    entity_count = entities.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Anonymization failed: {}",
                    e
                );
                ScrubError::Processing(e.to_string())
            })
    }

    fn validate(&self, request: MaskRequest) -> Result<ValidatedRequest> {
        let text = match request.text {
            Some(text) if !text.is_empty() => text,
            _ => return Err(ValidationError::MissingText.into()),
        };

        let max = self.config.max_text_size;
        if char_len(&text) > max {
            return Err(ValidationError::TextTooLarge { max }.into());
        }

        let mode = match request.mode.as_deref() {
            Some(mode) => mode.parse::<Mode>()?,
            None => Mode::default(),
        };

        let masking_mode = resolve(
            non_empty(request.masking_mode.as_deref())
                .map(str::parse::<MaskingMode>)
                .transpose()?,
            self.config.masking_mode,
            MaskingMode::default(),
        );

        let masking_char = resolve(
            non_empty(request.masking_char.as_deref())
                .map(single_char)
                .transpose()?,
            self.config.masking_char,
            DEFAULT_MASKING_CHAR,
        );

        let entities = request.entities.as_deref().map(parse_entities).transpose()?;
        let skip_entities = request
            .skip_entities
            .as_deref()
            .map(parse_entities)
            .transpose()?;

        debug!(
            mode = %mode,
            text_len = char_len(&text),
            "Validated mask request"
        );

        Ok(ValidatedRequest {
            text,
            mode,
            masking_mode,
            masking_char,
            entities,
            skip_entities,
            language: request.language,
            preprocess: resolve(
                request.enable_preprocessing,
                Some(self.config.enable_preprocessing),
                true,
            ),
        })
    }
}

/// Lengths in logs and limits are counted in characters
fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn single_char(value: &str) -> std::result::Result<char, ValidationError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ValidationError::InvalidMaskingChar),
    }
}

fn parse_entities(names: &[String]) -> std::result::Result<Vec<EntityType>, ValidationError> {
    names
        .iter()
        .map(|name| {
            name.parse::<EntityType>()
                .map_err(|e| ValidationError::UnknownEntityType(e.0))
        })
        .collect()
}

fn distinct_types(entities: &[DetectedEntity]) -> Vec<EntityType> {
    let mut types: Vec<EntityType> = entities.iter().map(|e| e.entity_type).collect();
    types.sort();
    types.dedup();
    types
}
