//! Google Cloud Exporter Configuration
//!
//! Settings for the `googlecloud` exporter as they appear under
//! `exporters.googlecloud[/name]` in a collector file.
//!
//! # Layout
//!
//! ```yaml
//! googlecloud/customname:
//!   project: my-project
//!   trace:
//!     endpoint: test-trace-endpoint
//!     use_insecure: true
//!   metric:
//!     prefix: prefix
//!     known_domains: [googleapis.com]
//!   log:
//!     default_log_name: foo-log
//! ```
//!
//! Each of `trace`, `metric` and `log` embeds the client settings
//! (`endpoint`, `use_insecure`, `grpc_pool_size`, `compression`) directly in
//! its own mapping.
//!
//! # Function Hooks
//!
//! [`MetricConfig`] carries two hooks that cannot be expressed in a file: the
//! resource mapping and the metric naming function. They are skipped by serde
//! and compare by identity, so use [`GoogleCloudConfig::sanitize`] before
//! comparing two configurations field by field.

use super::resource::{self, MonitoredResource, Resource, ResourceFilter};
use crate::component::ComponentConfig;
use crate::error::{ConfigError, Result};
use crate::factory::DecodableConfig;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

pub const DEFAULT_USER_AGENT: &str = "opentelemetry-collector-contrib {{version}}";
pub const DEFAULT_METRIC_PREFIX: &str = "workload.googleapis.com";
pub const DEFAULT_KNOWN_DOMAINS: [&str; 4] =
    ["googleapis.com", "kubernetes.io", "istio.io", "knative.dev"];
pub const DEFAULT_DESCRIPTOR_BUFFER_SIZE: usize = 10;
pub const DEFAULT_GRPC_POOL_SIZE: u32 = 1;

pub type MapMonitoredResourceFn = dyn Fn(&Resource) -> MonitoredResource + Send + Sync;
pub type GetMetricNameFn = dyn Fn(&str) -> String + Send + Sync;

/// Shared function-valued setting
///
/// Two hooks are equal only when they point at the same function object.
pub struct Hook<F: ?Sized>(Arc<F>);

impl Hook<MapMonitoredResourceFn> {
    pub fn map_monitored_resource<F>(f: F) -> Self
    where
        F: Fn(&Resource) -> MonitoredResource + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl Hook<GetMetricNameFn> {
    pub fn get_metric_name<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl<F: ?Sized> Deref for Hook<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> PartialEq for Hook<F> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Wire compression for API calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "gzip")]
    Gzip,
}

/// Connection settings shared by the trace, metric and log clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoint: String,
    pub use_insecure: bool,
    pub grpc_pool_size: u32,
    pub compression: Compression,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            use_insecure: false,
            grpc_pool_size: DEFAULT_GRPC_POOL_SIZE,
            compression: Compression::None,
        }
    }
}

/// Service-account impersonation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonateConfig {
    pub target_principal: String,
    pub subject: String,
    pub delegates: Vec<String>,
}

/// Rewrites a span attribute key before export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeMapping {
    pub key: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    pub attribute_mappings: Vec<AttributeMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    pub prefix: String,
    pub skip_create_descriptor: bool,
    pub known_domains: Vec<String>,
    pub instrumentation_library_labels: bool,
    pub create_metric_descriptor_buffer_size: usize,
    pub service_resource_labels: bool,
    pub cumulative_normalization: bool,
    pub create_service_timeseries: bool,
    pub sum_of_squared_deviation: bool,
    pub resource_filters: Vec<ResourceFilter>,

    #[serde(skip)]
    pub map_monitored_resource: Option<Hook<MapMonitoredResourceFn>>,
    #[serde(skip)]
    pub get_metric_name: Option<Hook<GetMetricNameFn>>,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            prefix: DEFAULT_METRIC_PREFIX.to_string(),
            skip_create_descriptor: false,
            known_domains: DEFAULT_KNOWN_DOMAINS.iter().map(|d| d.to_string()).collect(),
            instrumentation_library_labels: true,
            create_metric_descriptor_buffer_size: DEFAULT_DESCRIPTOR_BUFFER_SIZE,
            service_resource_labels: true,
            cumulative_normalization: true,
            create_service_timeseries: false,
            sum_of_squared_deviation: false,
            resource_filters: Vec::new(),
            map_monitored_resource: Some(Hook::map_monitored_resource(
                resource::default_map_monitored_resource,
            )),
            get_metric_name: Some(Hook::get_metric_name(default_get_metric_name)),
        }
    }
}

/// Metric names pass through unchanged unless a custom hook is configured
pub fn default_get_metric_name(name: &str) -> String {
    name.to_string()
}

impl MetricConfig {
    /// Cloud Monitoring metric type for an instrument name
    ///
    /// Names that already mention a known domain are used as-is; everything
    /// else lands under `prefix`.
    pub fn metric_type(&self, name: &str) -> String {
        let base = match &self.get_metric_name {
            Some(hook) => hook(name),
            None => default_get_metric_name(name),
        };
        if self
            .known_domains
            .iter()
            .any(|domain| name.contains(domain.as_str()))
        {
            return base;
        }
        format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            base.trim_start_matches('/')
        )
    }

    /// Monitored resource for telemetry coming from `resource`
    pub fn monitored_resource(&self, resource: &Resource) -> MonitoredResource {
        match &self.map_monitored_resource {
            Some(hook) => hook(resource),
            None => resource::default_map_monitored_resource(resource),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    pub default_log_name: String,
    pub resource_filters: Vec<ResourceFilter>,
    pub service_resource_labels: bool,
    pub error_reporting_type: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            default_log_name: String::new(),
            resource_filters: Vec::new(),
            service_resource_labels: true,
            error_reporting_type: false,
        }
    }
}

/// Complete configuration of one `googlecloud` exporter instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleCloudConfig {
    pub project: String,
    pub user_agent: String,
    pub impersonate: ImpersonateConfig,
    pub destination_project_quota: bool,
    pub trace: TraceConfig,
    pub metric: MetricConfig,
    pub log: LogConfig,
}

impl Default for GoogleCloudConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            impersonate: ImpersonateConfig::default(),
            destination_project_quota: false,
            trace: TraceConfig::default(),
            metric: MetricConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Default configuration handed out by the `googlecloud` factory
pub fn default_config() -> GoogleCloudConfig {
    GoogleCloudConfig::default()
}

impl GoogleCloudConfig {
    /// Clear the function hooks so two configurations compare on data alone
    pub fn sanitize(&mut self) -> &mut Self {
        self.metric.map_monitored_resource = None;
        self.metric.get_metric_name = None;
        self
    }
}

fn validate_client(section: &str, client: &ClientConfig) -> Result<()> {
    if client.grpc_pool_size == 0 {
        return Err(ConfigError::Config(format!(
            "{}.grpc_pool_size must be at least 1",
            section
        )));
    }
    Ok(())
}

fn validate_filters(section: &str, filters: &[ResourceFilter]) -> Result<()> {
    for (i, filter) in filters.iter().enumerate() {
        if filter.prefix.is_empty() && filter.regex.is_empty() {
            return Err(ConfigError::Config(format!(
                "{}.resource_filters[{}] must set prefix or regex",
                section, i
            )));
        }
        filter.matcher()?;
    }
    Ok(())
}

impl ComponentConfig for GoogleCloudConfig {
    fn validate(&self) -> Result<()> {
        let impersonate = &self.impersonate;
        if impersonate.target_principal.is_empty()
            && (!impersonate.subject.is_empty() || !impersonate.delegates.is_empty())
        {
            return Err(ConfigError::Config(
                "impersonate.target_principal is required when subject or delegates are set"
                    .to_string(),
            ));
        }

        validate_client("trace", &self.trace.client)?;
        validate_client("metric", &self.metric.client)?;
        validate_client("log", &self.log.client)?;
        validate_filters("metric", &self.metric.resource_filters)?;
        validate_filters("log", &self.log.resource_filters)?;
        Ok(())
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DecodableConfig for GoogleCloudConfig {
    fn carry_unserialized(&mut self, defaults: &Self) {
        self.metric.map_monitored_resource = defaults.metric.map_monitored_resource.clone();
        self.metric.get_metric_name = defaults.metric.get_metric_name.clone();
    }
}
