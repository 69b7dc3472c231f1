//! Resource Mapping
//!
//! Telemetry carries a resource: a flat set of attributes describing where it
//! came from (`cloud.platform`, `k8s.pod.name`, `host.id`, ...). Cloud
//! Monitoring wants a monitored resource instead: a resource type such as
//! `k8s_container` plus the labels that type requires.
//!
//! # Mapping Order
//!
//! | Condition                                   | Monitored resource |
//! |---------------------------------------------|--------------------|
//! | GKE / `k8s.cluster.name` and container name | `k8s_container`    |
//! | GKE / `k8s.cluster.name` and pod name       | `k8s_pod`          |
//! | GKE / `k8s.cluster.name` and node name      | `k8s_node`         |
//! | GKE / `k8s.cluster.name`                    | `k8s_cluster`      |
//! | `cloud.platform = gcp_compute_engine`       | `gce_instance`     |
//! | `service.name` and `service.instance.id`    | `generic_task`     |
//! | anything else                               | `generic_node`     |

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CLOUD_PLATFORM: &str = "cloud.platform";
const CLOUD_ZONE: &str = "cloud.availability_zone";
const CLOUD_REGION: &str = "cloud.region";
const K8S_CLUSTER: &str = "k8s.cluster.name";
const K8S_NAMESPACE: &str = "k8s.namespace.name";
const K8S_POD: &str = "k8s.pod.name";
const K8S_CONTAINER: &str = "k8s.container.name";
const K8S_NODE: &str = "k8s.node.name";
const HOST_ID: &str = "host.id";
const HOST_NAME: &str = "host.name";
const SERVICE_NAMESPACE: &str = "service.namespace";
const SERVICE_NAME: &str = "service.name";
const SERVICE_INSTANCE: &str = "service.instance.id";

const PLATFORM_GKE: &str = "gcp_kubernetes_engine";
const PLATFORM_GCE: &str = "gcp_compute_engine";
const GLOBAL_LOCATION: &str = "global";

/// Attributes describing the source of telemetry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    attributes: BTreeMap<String, String>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Cloud Monitoring resource type with its labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredResource {
    pub resource_type: String,
    pub labels: BTreeMap<String, String>,
}

impl MonitoredResource {
    fn new(resource_type: &str, labels: &[(&str, String)]) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

/// Map resource attributes onto a monitored resource
pub fn default_map_monitored_resource(resource: &Resource) -> MonitoredResource {
    let attr = |key: &str| resource.get(key).unwrap_or_default().to_string();
    let location = resource
        .get(CLOUD_ZONE)
        .or_else(|| resource.get(CLOUD_REGION))
        .unwrap_or(GLOBAL_LOCATION)
        .to_string();

    let on_gke = resource.get(CLOUD_PLATFORM) == Some(PLATFORM_GKE)
        || resource.get(K8S_CLUSTER).is_some();
    if on_gke {
        let cluster = attr(K8S_CLUSTER);
        if resource.get(K8S_CONTAINER).is_some() {
            return MonitoredResource::new(
                "k8s_container",
                &[
                    ("location", location),
                    ("cluster_name", cluster),
                    ("namespace_name", attr(K8S_NAMESPACE)),
                    ("pod_name", attr(K8S_POD)),
                    ("container_name", attr(K8S_CONTAINER)),
                ],
            );
        }
        if resource.get(K8S_POD).is_some() {
            return MonitoredResource::new(
                "k8s_pod",
                &[
                    ("location", location),
                    ("cluster_name", cluster),
                    ("namespace_name", attr(K8S_NAMESPACE)),
                    ("pod_name", attr(K8S_POD)),
                ],
            );
        }
        if resource.get(K8S_NODE).is_some() {
            return MonitoredResource::new(
                "k8s_node",
                &[
                    ("location", location),
                    ("cluster_name", cluster),
                    ("node_name", attr(K8S_NODE)),
                ],
            );
        }
        return MonitoredResource::new(
            "k8s_cluster",
            &[("location", location), ("cluster_name", cluster)],
        );
    }

    if resource.get(CLOUD_PLATFORM) == Some(PLATFORM_GCE) {
        return MonitoredResource::new(
            "gce_instance",
            &[("zone", location), ("instance_id", attr(HOST_ID))],
        );
    }

    if resource.get(SERVICE_NAME).is_some() && resource.get(SERVICE_INSTANCE).is_some() {
        return MonitoredResource::new(
            "generic_task",
            &[
                ("location", location),
                ("namespace", attr(SERVICE_NAMESPACE)),
                ("job", attr(SERVICE_NAME)),
                ("task_id", attr(SERVICE_INSTANCE)),
            ],
        );
    }

    let node_id = resource
        .get(HOST_ID)
        .or_else(|| resource.get(HOST_NAME))
        .unwrap_or_default()
        .to_string();
    MonitoredResource::new(
        "generic_node",
        &[
            ("location", location),
            ("namespace", attr(SERVICE_NAMESPACE)),
            ("node_id", node_id),
        ],
    )
}

/// Selects resource attributes to copy onto metric or log labels
///
/// An attribute matches when its key starts with `prefix` and `regex` matches
/// somewhere in the key. An empty field places no constraint, but a filter
/// must set at least one of the two to pass validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFilter {
    pub prefix: String,
    pub regex: String,
}

impl ResourceFilter {
    pub fn matcher(&self) -> Result<ResourceMatcher<'_>> {
        let regex = if self.regex.is_empty() {
            None
        } else {
            Some(Regex::new(&self.regex)?)
        };
        Ok(ResourceMatcher {
            prefix: &self.prefix,
            regex,
        })
    }
}

/// Compiled form of a [`ResourceFilter`]
pub struct ResourceMatcher<'a> {
    prefix: &'a str,
    regex: Option<Regex>,
}

impl ResourceMatcher<'_> {
    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(self.prefix) && self.regex.as_ref().map_or(true, |re| re.is_match(key))
    }
}

/// Resource attributes selected by any of `filters`
pub fn filter_labels(
    filters: &[ResourceFilter],
    resource: &Resource,
) -> Result<BTreeMap<String, String>> {
    let matchers = filters
        .iter()
        .map(ResourceFilter::matcher)
        .collect::<Result<Vec<_>>>()?;

    Ok(resource
        .attributes()
        .filter(|(key, _)| matchers.iter().any(|m| m.matches(key)))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gke_container_mapping() {
        let resource = Resource::new()
            .with_attribute(CLOUD_PLATFORM, PLATFORM_GKE)
            .with_attribute(CLOUD_ZONE, "us-central1-a")
            .with_attribute(K8S_CLUSTER, "prod")
            .with_attribute(K8S_NAMESPACE, "default")
            .with_attribute(K8S_POD, "web-0")
            .with_attribute(K8S_CONTAINER, "app");

        let mapped = default_map_monitored_resource(&resource);

        assert_eq!(mapped.resource_type, "k8s_container");
        assert_eq!(mapped.labels["location"], "us-central1-a");
        assert_eq!(mapped.labels["container_name"], "app");
    }

    #[test]
    fn test_gce_instance_mapping() {
        let resource = Resource::new()
            .with_attribute(CLOUD_PLATFORM, PLATFORM_GCE)
            .with_attribute(CLOUD_ZONE, "europe-west1-b")
            .with_attribute(HOST_ID, "1234");

        let mapped = default_map_monitored_resource(&resource);

        assert_eq!(mapped.resource_type, "gce_instance");
        assert_eq!(mapped.labels["zone"], "europe-west1-b");
        assert_eq!(mapped.labels["instance_id"], "1234");
    }

    #[test]
    fn test_generic_task_and_node_fallbacks() {
        let task = Resource::new()
            .with_attribute(SERVICE_NAME, "checkout")
            .with_attribute(SERVICE_INSTANCE, "i-1");
        assert_eq!(default_map_monitored_resource(&task).resource_type, "generic_task");

        let node = Resource::new().with_attribute(HOST_NAME, "box");
        let mapped = default_map_monitored_resource(&node);
        assert_eq!(mapped.resource_type, "generic_node");
        assert_eq!(mapped.labels["location"], "global");
        assert_eq!(mapped.labels["node_id"], "box");
    }

    #[test]
    fn test_filter_labels_prefix_and_regex() {
        let resource = Resource::new()
            .with_attribute("k8s.pod.name", "web-0")
            .with_attribute("k8s.node.name", "n1")
            .with_attribute("host.name", "box");
        let filters = vec![ResourceFilter {
            prefix: "k8s.".to_string(),
            regex: "pod".to_string(),
        }];

        let labels = filter_labels(&filters, &resource).unwrap();

        assert_eq!(labels.len(), 1);
        assert_eq!(labels["k8s.pod.name"], "web-0");
    }
}
