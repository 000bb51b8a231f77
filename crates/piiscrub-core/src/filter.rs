//! Post-detection entity filtering

use piiscrub_pii::{DetectedEntity, EntityType};

/// Drop results whose type is on the deny-list, preserving order
pub fn filter_entities(
    entities: Vec<DetectedEntity>,
    skip: Option<&[EntityType]>,
) -> Vec<DetectedEntity> {
    match skip {
        Some(skip) if !skip.is_empty() => entities
            .into_iter()
            .filter(|e| !skip.contains(&e.entity_type))
            .collect(),
        _ => entities,
    }
}
