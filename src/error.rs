use crate::component::{ComponentId, Kind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid component type {value:?}: {reason}")]
    InvalidType { value: String, reason: String },

    #[error("Invalid component id {value:?}: {reason}")]
    InvalidId { value: String, reason: String },

    #[error("Factory for {kind} type {component_type:?} is already registered")]
    DuplicateFactory {
        kind: Kind,
        component_type: String,
    },

    #[error("Unknown {kind} type {component_type:?} for {id:?}")]
    UnknownType {
        kind: Kind,
        component_type: String,
        id: String,
    },

    #[error("Error reading {kind} configuration for {id:?}: {source}")]
    Decode {
        kind: Kind,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field {field:?} of {kind} {id:?} cannot be mapped to any configuration key")]
    UnknownField { kind: Kind, id: String, field: String },

    #[error("Invalid {kind} configuration for {id}: {source}")]
    InvalidComponent {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
