//! Span anonymization

mod standard_anonymizer;

pub use standard_anonymizer::StandardAnonymizer;

use crate::analyzer::{DetectedEntity, EntityType, Span};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Rewrite rule applied to one detected span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operator {
    /// Replace with a fixed string
    Literal(String),

    /// Replace with `ch` repeated `count` times
    RepeatedChar { ch: char, count: usize },

    /// Replace with a truncated digest of the original substring
    Hash { digest: String },
}

impl Operator {
    /// `<ENTITY_TYPE>` placeholder
    pub fn placeholder(entity_type: EntityType) -> Self {
        Operator::Literal(format!("<{}>", entity_type))
    }

    /// Text substituted for the span
    pub fn render(&self) -> String {
        match self {
            Operator::Literal(value) => value.clone(),
            Operator::RepeatedChar { ch, count } => ch.to_string().repeat(*count),
            Operator::Hash { digest } => format!("<HASH:{}>", digest),
        }
    }
}

/// Rewrite rules keyed by entity type, with optional per-span overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorSet {
    by_type: BTreeMap<EntityType, Operator>,
    by_span: BTreeMap<Span, Operator>,
}

impl OperatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_for_type(&mut self, entity_type: EntityType, operator: Operator) {
        self.by_type.insert(entity_type, operator);
    }

    pub fn insert_for_span(&mut self, span: Span, operator: Operator) {
        self.by_span.insert(span, operator);
    }

    pub fn for_type(&self, entity_type: EntityType) -> Option<&Operator> {
        self.by_type.get(&entity_type)
    }

    pub fn for_span(&self, span: Span) -> Option<&Operator> {
        self.by_span.get(&span)
    }

    /// Span rule first, then type rule
    pub fn resolve(&self, entity: &DetectedEntity) -> Option<&Operator> {
        self.for_span(entity.span())
            .or_else(|| self.for_type(entity.entity_type))
    }

    /// Number of rules across both keys
    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anonymizer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnonymizerError {
    #[error("Invalid span {start}..{end} for text of {len} characters")]
    InvalidSpan { start: usize, end: usize, len: usize },
}

/// Trait for rewriting detected spans
pub trait Anonymizer: Send + Sync {
    /// Rewrite `entities` in `text`.
    ///
    /// `None` (or a set without a rule for some entity) falls back to the
    /// anonymizer's own default for that entity type.
    fn anonymize(
        &self,
        text: &str,
        entities: &[DetectedEntity],
        operators: Option<&OperatorSet>,
    ) -> Result<String, AnonymizerError>;
}
