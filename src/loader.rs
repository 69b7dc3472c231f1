//! Configuration Loading
//!
//! Reads a collector YAML file and resolves every declared component against
//! the registered factories.
//!
//! # Sources
//!
//! Configuration is layered with the `config` crate:
//! 1. The YAML file
//! 2. Optional environment overrides, e.g. with prefix `OTELCOL`:
//!    `OTELCOL__EXPORTERS__GOOGLECLOUD__PROJECT=my-project`
//!
//! Environment values arrive as strings. Where the factory default holds a
//! boolean or a number, the string is converted when the component is
//! resolved, so `..__METRIC__USE_INSECURE=true` works while
//! `..__PROJECT=123456789012` stays a string.
//!
//! # Resolution
//!
//! For each of `receivers`, `processors` and `exporters`, every key is parsed
//! as a [`ComponentId`], its factory is looked up by type, and the value is
//! applied as overrides on a fresh default configuration. A key with no value
//! (`googlecloud:`) yields the default unchanged. `service.pipelines` is
//! parsed last. Other top-level sections are ignored.

use crate::collector::{CollectorConfig, Components};
use crate::component::{ComponentId, Kind};
use crate::error::{ConfigError, Result};
use crate::factory::{Factories, UnmarshalError};
use crate::pipeline::{PipelineConfig, PipelineId, RawPipeline};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const KNOWN_SECTIONS: [&str; 4] = ["receivers", "processors", "exporters", "service"];
const ENV_SEPARATOR: &str = "__";

/// Loads collector files against a set of factories
pub struct ConfigLoader<'a> {
    factories: &'a Factories,
    env_prefix: Option<String>,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(factories: &'a Factories) -> Self {
        Self {
            factories,
            env_prefix: None,
        }
    }

    /// Layer environment variables named `<PREFIX>__SECTION__ID__FIELD` over the file
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<CollectorConfig> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let document = self.read_document(&contents)?;

        if let Value::Object(sections) = &document {
            for key in sections.keys() {
                if !KNOWN_SECTIONS.contains(&key.as_str()) {
                    debug!("Ignoring top-level section {:?}", key);
                }
            }
        }

        let config = CollectorConfig {
            receivers: self.load_section(Kind::Receiver, &document)?,
            processors: self.load_section(Kind::Processor, &document)?,
            exporters: self.load_section(Kind::Exporter, &document)?,
            pipelines: load_pipelines(&document)?,
        };

        info!(
            "Loaded {} receivers, {} processors, {} exporters from {}",
            config.receivers.len(),
            config.processors.len(),
            config.exporters.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn load_and_validate(&self, path: impl AsRef<Path>) -> Result<CollectorConfig> {
        let config = self.load(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_document(&self, contents: &str) -> Result<Value> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Yaml));
        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix).separator(ENV_SEPARATOR),
            );
        }

        let document: Value = builder.build()?.try_deserialize()?;
        match document {
            Value::Null => Ok(Value::Object(Default::default())),
            Value::Object(_) => Ok(document),
            _ => Err(ConfigError::Config(
                "top level of a collector file must be a mapping".to_string(),
            )),
        }
    }

    fn load_section(&self, kind: Kind, document: &Value) -> Result<Components> {
        let mut components = Components::new();
        let section = match document.get(kind.section()) {
            None | Some(Value::Null) => return Ok(components),
            Some(Value::Object(section)) => section,
            Some(_) => {
                return Err(ConfigError::Config(format!(
                    "{:?} must be a mapping of component ids",
                    kind.section()
                )))
            }
        };

        for (key, overrides) in section {
            let id: ComponentId = key.parse()?;
            let factory = self
                .factories
                .get(kind, id.component_type())
                .ok_or_else(|| ConfigError::UnknownType {
                    kind,
                    component_type: id.component_type().to_string(),
                    id: key.clone(),
                })?;

            let config = factory.unmarshal(overrides).map_err(|e| match e {
                UnmarshalError::UnknownField(field) => ConfigError::UnknownField {
                    kind,
                    id: key.clone(),
                    field,
                },
                UnmarshalError::Decode(source) => ConfigError::Decode {
                    kind,
                    id: key.clone(),
                    source,
                },
            })?;

            debug!("Resolved {} {}", kind, id);
            if components.insert(id, config).is_some() {
                return Err(ConfigError::InvalidId {
                    value: key.clone(),
                    reason: format!("duplicate {} id", kind),
                });
            }
        }
        Ok(components)
    }
}

fn load_pipelines(document: &Value) -> Result<BTreeMap<PipelineId, PipelineConfig>> {
    let mut pipelines = BTreeMap::new();
    let Some(declared) = document
        .get("service")
        .and_then(|service| service.get("pipelines"))
    else {
        return Ok(pipelines);
    };
    let declared = match declared {
        Value::Null => return Ok(pipelines),
        Value::Object(declared) => declared,
        _ => {
            return Err(ConfigError::Pipeline(
                "service.pipelines must be a mapping".to_string(),
            ))
        }
    };

    for (key, value) in declared {
        let id: PipelineId = key.parse()?;
        let raw: RawPipeline = if value.is_null() {
            RawPipeline::default()
        } else {
            serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Pipeline(format!("pipeline {:?}: {}", key, e)))?
        };
        pipelines.insert(id, PipelineConfig::from_raw(raw)?);
    }
    Ok(pipelines)
}

/// Load `path` against `factories` without validation
pub fn load_config(path: impl AsRef<Path>, factories: &Factories) -> Result<CollectorConfig> {
    ConfigLoader::new(factories).load(path)
}

/// Load `path` and validate components and pipelines
pub fn load_config_and_validate(
    path: impl AsRef<Path>,
    factories: &Factories,
) -> Result<CollectorConfig> {
    ConfigLoader::new(factories).load_and_validate(path)
}
