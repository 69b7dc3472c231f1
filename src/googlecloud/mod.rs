//! Google Cloud exporter component
//!
//! Configuration types, default settings and the factory registered under the
//! `googlecloud` exporter type.

pub mod config;
pub mod resource;

pub use config::{
    default_config, AttributeMapping, ClientConfig, Compression, GoogleCloudConfig, Hook,
    ImpersonateConfig, LogConfig, MetricConfig, TraceConfig,
};
pub use resource::{MonitoredResource, Resource, ResourceFilter};

use crate::component::ComponentType;
use crate::error::Result;
use crate::factory::ComponentFactory;

/// Exporter type the factory registers under
pub const TYPE_STR: &str = "googlecloud";

pub fn component_type() -> Result<ComponentType> {
    ComponentType::new(TYPE_STR)
}

/// Factory for the `googlecloud` exporter
pub fn new_factory() -> Result<ComponentFactory<GoogleCloudConfig>> {
    Ok(ComponentFactory::new(component_type()?, default_config))
}
