//! Service Pipelines
//!
//! The `service.pipelines` section wires declared components together:
//!
//! ```yaml
//! service:
//!   pipelines:
//!     traces:
//!       receivers: [nop]
//!       processors: [nop]
//!       exporters: [googlecloud]
//! ```
//!
//! Pipeline ids use the same `type[/name]` form as component ids, with the
//! type restricted to a telemetry signal.

use crate::collector::CollectorConfig;
use crate::component::{ComponentId, Kind};
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Telemetry signal carried by a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Traces,
    Metrics,
    Logs,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
            Signal::Logs => "logs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId {
    signal: Signal,
    name: Option<String>,
}

impl PipelineId {
    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl FromStr for PipelineId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let id: ComponentId = s.parse()?;
        let signal = match id.component_type().as_str() {
            "traces" => Signal::Traces,
            "metrics" => Signal::Metrics,
            "logs" => Signal::Logs,
            other => {
                return Err(ConfigError::Pipeline(format!(
                    "unknown signal {:?} in pipeline {:?}",
                    other, s
                )))
            }
        };
        Ok(Self {
            signal,
            name: id.name().map(str::to_string),
        })
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{}", self.signal.as_str(), name),
            None => f.write_str(self.signal.as_str()),
        }
    }
}

/// Pipeline as written in the file, before ids are parsed
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawPipeline {
    #[serde(default)]
    pub receivers: Vec<String>,
    #[serde(default)]
    pub processors: Vec<String>,
    #[serde(default)]
    pub exporters: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub receivers: Vec<ComponentId>,
    pub processors: Vec<ComponentId>,
    pub exporters: Vec<ComponentId>,
}

impl PipelineConfig {
    pub(crate) fn from_raw(raw: RawPipeline) -> Result<Self> {
        let parse = |ids: Vec<String>| {
            ids.iter()
                .map(|id| id.parse())
                .collect::<Result<Vec<ComponentId>>>()
        };
        Ok(Self {
            receivers: parse(raw.receivers)?,
            processors: parse(raw.processors)?,
            exporters: parse(raw.exporters)?,
        })
    }

    pub fn components(&self, kind: Kind) -> &[ComponentId] {
        match kind {
            Kind::Receiver => &self.receivers,
            Kind::Processor => &self.processors,
            Kind::Exporter => &self.exporters,
        }
    }

    /// Check this pipeline's references against the declared components
    pub fn validate(&self, id: &PipelineId, config: &CollectorConfig) -> Result<()> {
        if self.receivers.is_empty() {
            return Err(ConfigError::Pipeline(format!(
                "pipeline {:?} must have at least one receiver",
                id.to_string()
            )));
        }
        if self.exporters.is_empty() {
            return Err(ConfigError::Pipeline(format!(
                "pipeline {:?} must have at least one exporter",
                id.to_string()
            )));
        }

        for kind in [Kind::Receiver, Kind::Processor, Kind::Exporter] {
            let mut seen = BTreeSet::new();
            for component in self.components(kind) {
                if !config.components(kind).contains_key(component) {
                    return Err(ConfigError::Pipeline(format!(
                        "pipeline {:?} references {} {:?} which is not configured",
                        id.to_string(),
                        kind,
                        component.to_string()
                    )));
                }
                if !seen.insert(component) {
                    return Err(ConfigError::Pipeline(format!(
                        "pipeline {:?} references {} {:?} multiple times",
                        id.to_string(),
                        kind,
                        component.to_string()
                    )));
                }
            }
        }
        Ok(())
    }
}
