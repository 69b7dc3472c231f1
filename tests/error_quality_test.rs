//! Error message quality tests
//!
//! Tests that verify error messages are helpful and distinguishable.

use gcp_collector_config::component::{ComponentId, ComponentType, Kind};
use gcp_collector_config::error::ConfigError;

#[test]
fn test_invalid_type_message_clarity() {
    // Given: A type starting with a digit
    let error = ComponentType::new("9cloud").unwrap_err();

    // When: Converting to string
    let message = format!("{}", error);

    // Then: Message names the value and the rule
    assert!(message.contains("Invalid component type"));
    assert!(message.contains("9cloud"));
    assert!(message.contains("ASCII letter"));
}

#[test]
fn test_empty_type_message_clarity() {
    // Given: An empty type
    let error = ComponentType::new("").unwrap_err();

    // Then: Message says the type must not be empty
    assert!(error.to_string().contains("must not be empty"));
}

#[test]
fn test_invalid_id_message_clarity() {
    // Given: An id with an empty name
    let error = "googlecloud/".parse::<ComponentId>().unwrap_err();

    // When: Converting to string
    let message = format!("{}", error);

    // Then: Message names the id and the missing part
    assert!(message.contains("Invalid component id"));
    assert!(message.contains("googlecloud/"));
    assert!(message.contains("name part must be specified"));
}

#[test]
fn test_unknown_type_message_clarity() {
    // Given: An unknown exporter type error
    let error = ConfigError::UnknownType {
        kind: Kind::Exporter,
        component_type: "otlp".to_string(),
        id: "otlp/backup".to_string(),
    };

    // When: Converting to string
    let message = format!("{}", error);

    // Then: Message names kind, type and id
    assert!(message.starts_with("Unknown exporter type"));
    assert!(message.contains("otlp/backup"));
}

#[test]
fn test_unknown_field_message_clarity() {
    // Given: An unmappable field error
    let error = ConfigError::UnknownField {
        kind: Kind::Exporter,
        id: "googlecloud".to_string(),
        field: "metric.prefx".to_string(),
    };

    // Then: Message names the field and the component
    let message = error.to_string();
    assert!(message.contains("metric.prefx"));
    assert!(message.contains("exporter"));
    assert!(message.contains("cannot be mapped"));
}

#[test]
fn test_decode_error_keeps_source() {
    // Given: A decode error wrapping a serde_json error
    use std::error::Error;
    let json_err = serde_json::from_str::<bool>("\"yes\"").unwrap_err();
    let error = ConfigError::Decode {
        kind: Kind::Exporter,
        id: "googlecloud/bad".to_string(),
        source: json_err,
    };

    // Then: Message names the id and the source is preserved
    assert!(error.to_string().contains("googlecloud/bad"));
    assert!(error.source().is_some());
}

#[test]
fn test_invalid_component_message_clarity() {
    // Given: A validation failure for a named exporter
    let id = ComponentId::with_name(ComponentType::new("googlecloud").unwrap(), "customname")
        .unwrap();
    let error = ConfigError::InvalidComponent {
        kind: Kind::Exporter,
        id,
        source: Box::new(ConfigError::Config(
            "metric.grpc_pool_size must be at least 1".to_string(),
        )),
    };

    // Then: Message carries the rendered id and the reason
    let message = error.to_string();
    assert!(message.contains("googlecloud/customname"));
    assert!(message.contains("grpc_pool_size"));
}

#[test]
fn test_error_messages_are_distinguishable() {
    // Given: Different error types
    let config_err = ConfigError::Config("test".to_string()).to_string();
    let pipeline_err = ConfigError::Pipeline("test".to_string()).to_string();
    let duplicate_err = ConfigError::DuplicateFactory {
        kind: Kind::Receiver,
        component_type: "test".to_string(),
    }
    .to_string();

    // Then: Each has its own prefix
    assert!(config_err.starts_with("Configuration error"));
    assert!(pipeline_err.starts_with("Pipeline error"));
    assert!(duplicate_err.starts_with("Factory for receiver type"));
    assert_ne!(config_err, pipeline_err);
    assert_ne!(pipeline_err, duplicate_err);
}

#[test]
fn test_error_debug_format() {
    // Given: An error instance
    let error = ConfigError::Pipeline("pipeline \"traces\" is empty".to_string());

    // When: Using debug format
    let debug_message = format!("{:?}", error);

    // Then: Should include variant name and details
    assert!(debug_message.contains("Pipeline"));
    assert!(debug_message.contains("traces"));
}
