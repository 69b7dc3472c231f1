//! Resolved Collector Configuration
//!
//! [`CollectorConfig`] is the result of loading a collector file: every
//! declared component resolved against its factory default, keyed by
//! [`ComponentId`], plus the service pipelines.

use crate::component::{ComponentConfig, ComponentId, Kind};
use crate::error::{ConfigError, Result};
use crate::pipeline::{PipelineConfig, PipelineId};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type Components = BTreeMap<ComponentId, Box<dyn ComponentConfig>>;

#[derive(Debug, Default)]
pub struct CollectorConfig {
    pub receivers: Components,
    pub processors: Components,
    pub exporters: Components,
    pub pipelines: BTreeMap<PipelineId, PipelineConfig>,
}

impl CollectorConfig {
    pub fn components(&self, kind: Kind) -> &Components {
        match kind {
            Kind::Receiver => &self.receivers,
            Kind::Processor => &self.processors,
            Kind::Exporter => &self.exporters,
        }
    }

    /// Typed view of an exporter configuration
    ///
    /// Returns `None` when the id is not configured or its configuration is
    /// of another type.
    pub fn exporter<T: ComponentConfig>(&self, id: &ComponentId) -> Option<&T> {
        self.exporters.get(id).and_then(|config| config.downcast_ref::<T>())
    }

    pub fn exporter_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.exporters.keys()
    }

    /// Validate every component and the service pipelines
    pub fn validate(&self) -> Result<()> {
        for kind in [Kind::Receiver, Kind::Processor, Kind::Exporter] {
            for (id, config) in self.components(kind) {
                config
                    .validate()
                    .map_err(|e| ConfigError::InvalidComponent {
                        kind,
                        id: id.clone(),
                        source: Box::new(e),
                    })?;
            }
        }

        if self.pipelines.is_empty() {
            return Err(ConfigError::Pipeline(
                "service must have at least one pipeline".to_string(),
            ));
        }
        for (id, pipeline) in &self.pipelines {
            pipeline.validate(id, self)?;
        }
        Ok(())
    }

    /// Resolved configuration of one kind as a JSON mapping keyed by id
    pub fn to_json(&self, kind: Kind) -> Result<Value> {
        let mut section = Map::new();
        for (id, config) in self.components(kind) {
            section.insert(id.to_string(), config.to_json()?);
        }
        Ok(Value::Object(section))
    }
}
