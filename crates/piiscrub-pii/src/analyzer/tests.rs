//! Tests for analyzer types

use super::*;

#[test]
fn test_entity_type_wire_names() {
    assert_eq!(
        serde_json::to_string(&EntityType::EmailAddress).unwrap(),
        "\"EMAIL_ADDRESS\""
    );
    assert_eq!(serde_json::to_string(&EntityType::UsSsn).unwrap(), "\"US_SSN\"");
    assert_eq!(serde_json::to_string(&EntityType::IpAddress).unwrap(), "\"IP_ADDRESS\"");

    for entity_type in EntityType::ALL {
        let json = serde_json::to_string(&entity_type).unwrap();
        assert_eq!(json, format!("\"{}\"", entity_type.as_str()));
    }
}

#[test]
fn test_entity_type_from_str() {
    assert_eq!("PERSON".parse::<EntityType>().unwrap(), EntityType::Person);
    assert_eq!("credit_card".parse::<EntityType>().unwrap(), EntityType::CreditCard);
    assert_eq!(" IBAN_CODE ".parse::<EntityType>().unwrap(), EntityType::IbanCode);

    let err = "NOT_A_TYPE".parse::<EntityType>().unwrap_err();
    assert_eq!(err.to_string(), "Unknown entity type: NOT_A_TYPE");
}

#[test]
fn test_detected_entity_geometry() {
    let a = DetectedEntity::new(EntityType::Person, 0, 8, 0.85);
    let b = DetectedEntity::new(EntityType::Location, 5, 12, 0.7);
    let c = DetectedEntity::new(EntityType::EmailAddress, 8, 20, 0.95);

    assert_eq!(a.len(), 8);
    assert!(!a.is_empty());
    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
    assert_eq!(a.span(), Span { start: 0, end: 8 });
}

#[test]
fn test_detected_entity_serialization() {
    let entity = DetectedEntity::new(EntityType::CreditCard, 0, 19, 0.95);
    let json = serde_json::to_value(&entity).unwrap();

    assert_eq!(json["entity_type"], "CREDIT_CARD");
    assert_eq!(json["start"], 0);
    assert_eq!(json["end"], 19);
}

#[test]
fn test_analyzer_config_default() {
    let config = AnalyzerConfig::default();

    assert_eq!(config.languages, vec!["en", "de"]);
    assert!((config.min_score - 0.5).abs() < f32::EPSILON);
}
