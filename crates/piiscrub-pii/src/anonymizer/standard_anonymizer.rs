//! Standard anonymizer implementation

use crate::analyzer::DetectedEntity;
use crate::anonymizer::{Anonymizer, AnonymizerError, Operator, OperatorSet};
use crate::offsets::TextIndex;

/// Standard implementation of span anonymization
///
/// Without a caller-supplied rule, every entity becomes `<ENTITY_TYPE>`
/// unless a default override was registered for its type.
#[derive(Debug, Clone, Default)]
pub struct StandardAnonymizer {
    defaults: OperatorSet,
}

impl StandardAnonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anonymizer with per-type default overrides
    pub fn with_defaults(defaults: OperatorSet) -> Self {
        Self { defaults }
    }

    fn operator_for(&self, entity: &DetectedEntity, operators: Option<&OperatorSet>) -> Operator {
        operators
            .and_then(|set| set.resolve(entity))
            .or_else(|| self.defaults.resolve(entity))
            .cloned()
            .unwrap_or_else(|| Operator::placeholder(entity.entity_type))
    }
}

/// Keep the strongest of any overlapping spans: higher score, then longer,
/// then earlier. Survivors are returned in text order.
fn resolve_conflicts(entities: &[DetectedEntity]) -> Vec<&DetectedEntity> {
    let mut ranked: Vec<&DetectedEntity> = entities.iter().collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
    });

    let mut kept: Vec<&DetectedEntity> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        if !kept.iter().any(|k| k.overlaps(candidate)) {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|e| e.start);
    kept
}

impl Anonymizer for StandardAnonymizer {
    fn anonymize(
        &self,
        text: &str,
        entities: &[DetectedEntity],
        operators: Option<&OperatorSet>,
    ) -> Result<String, AnonymizerError> {
        if entities.is_empty() {
            return Ok(text.to_string());
        }

        let index = TextIndex::new(text);
        for entity in entities {
            if entity.start >= entity.end || entity.end > index.char_len() {
                return Err(AnonymizerError::InvalidSpan {
                    start: entity.start,
                    end: entity.end,
                    len: index.char_len(),
                });
            }
        }

        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;

        for entity in resolve_conflicts(entities) {
            let range = index
                .byte_range(entity.start, entity.end)
                .ok_or(AnonymizerError::InvalidSpan {
                    start: entity.start,
                    end: entity.end,
                    len: index.char_len(),
                })?;

            result.push_str(&text[last_end..range.start]);
            result.push_str(&self.operator_for(entity, operators).render());
            last_end = range.end;
        }

        result.push_str(&text[last_end..]);

        Ok(result)
    }
}
