//! Collector file loading tests
//!
//! Tests that the fixture file resolves into the expected exporter
//! configurations, with named blocks merged onto factory defaults.

use gcp_collector_config::collector::CollectorConfig;
use gcp_collector_config::component::{ComponentId, ComponentType, Kind};
use gcp_collector_config::factory::{nop_factories, ComponentFactory, Factories};
use gcp_collector_config::googlecloud::{
    default_config, ClientConfig, Compression, GoogleCloudConfig, ImpersonateConfig, LogConfig,
    MetricConfig, TraceConfig,
};
use gcp_collector_config::loader::load_config_and_validate;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join("config.yaml")
}

/// Stub factory standing in for the real exporter registration
fn new_factory(component_type: ComponentType) -> ComponentFactory<GoogleCloudConfig> {
    ComponentFactory::new(component_type, default_config)
}

fn factories_with(factory: ComponentFactory<GoogleCloudConfig>) -> Factories {
    let mut factories = nop_factories().expect("Failed to build nop factories");
    factories
        .register(Kind::Exporter, factory)
        .expect("Failed to register exporter factory");
    factories
}

/// Clear function hooks so configurations compare on data alone
fn sanitize(mut cfg: GoogleCloudConfig) -> GoogleCloudConfig {
    cfg.sanitize();
    cfg
}

fn load_fixture(gcp_type: &ComponentType) -> CollectorConfig {
    let factories = factories_with(new_factory(gcp_type.clone()));
    load_config_and_validate(fixture_path(), &factories).expect("Failed to load fixture")
}

fn expected_customname() -> GoogleCloudConfig {
    GoogleCloudConfig {
        project: "my-project".to_string(),
        user_agent: "opentelemetry-collector-contrib {{version}}".to_string(),
        impersonate: ImpersonateConfig::default(),
        destination_project_quota: false,
        trace: TraceConfig {
            client: ClientConfig {
                endpoint: "test-trace-endpoint".to_string(),
                use_insecure: true,
                grpc_pool_size: 1,
                compression: Compression::None,
            },
            attribute_mappings: Vec::new(),
        },
        metric: MetricConfig {
            client: ClientConfig {
                endpoint: "test-metric-endpoint".to_string(),
                use_insecure: true,
                grpc_pool_size: 1,
                compression: Compression::None,
            },
            prefix: "prefix".to_string(),
            skip_create_descriptor: true,
            known_domains: vec![
                "googleapis.com".to_string(),
                "kubernetes.io".to_string(),
                "istio.io".to_string(),
                "knative.dev".to_string(),
            ],
            instrumentation_library_labels: true,
            create_metric_descriptor_buffer_size: 10,
            service_resource_labels: true,
            cumulative_normalization: true,
            create_service_timeseries: false,
            sum_of_squared_deviation: false,
            resource_filters: Vec::new(),
            map_monitored_resource: None,
            get_metric_name: None,
        },
        log: LogConfig {
            client: ClientConfig {
                endpoint: String::new(),
                use_insecure: false,
                grpc_pool_size: 1,
                compression: Compression::None,
            },
            default_log_name: "foo-log".to_string(),
            resource_filters: Vec::new(),
            service_resource_labels: true,
            error_reporting_type: false,
        },
    }
}

#[test]
fn test_load_config() {
    // Given: A googlecloud component type and a stub factory registered for it
    let gcp_type = ComponentType::new("googlecloud");
    assert!(gcp_type.is_ok());
    let gcp_type = gcp_type.unwrap();
    let factory = new_factory(gcp_type.clone());
    let factories = factories_with(new_factory(gcp_type.clone()));

    // When: Loading the fixture file
    let cfg = load_config_and_validate(fixture_path(), &factories)
        .expect("Loading the fixture should succeed");

    // Then: Exactly two exporters are declared
    assert_eq!(cfg.exporters.len(), 2);

    // Then: The unnamed instance equals the factory default
    let r0 = cfg
        .exporter::<GoogleCloudConfig>(&ComponentId::new(gcp_type.clone()))
        .expect("googlecloud exporter should be configured")
        .clone();
    assert_eq!(sanitize(r0), sanitize(factory.default_config()));

    // Then: The named instance carries the declared overrides
    let custom_id = ComponentId::with_name(gcp_type, "customname").unwrap();
    let r1 = cfg
        .exporter::<GoogleCloudConfig>(&custom_id)
        .expect("googlecloud/customname exporter should be configured")
        .clone();
    assert_eq!(sanitize(r1), expected_customname());
}

#[test]
fn test_default_instance_keeps_function_hooks() {
    // Given: The loaded fixture
    let gcp_type = ComponentType::new("googlecloud").unwrap();
    let cfg = load_fixture(&gcp_type);

    // When: Looking at both exporter instances before sanitizing
    for id in cfg.exporter_ids() {
        let exporter = cfg.exporter::<GoogleCloudConfig>(id).unwrap();

        // Then: Hooks from the default are carried over
        assert!(exporter.metric.map_monitored_resource.is_some());
        assert!(exporter.metric.get_metric_name.is_some());
    }
}

#[test]
fn test_load_is_idempotent() {
    // Given: The same fixture loaded twice
    let gcp_type = ComponentType::new("googlecloud").unwrap();
    let first = load_fixture(&gcp_type);
    let second = load_fixture(&gcp_type);

    // Then: Both loads produce the same ids and the same structures
    let first_ids: Vec<_> = first.exporter_ids().collect();
    let second_ids: Vec<_> = second.exporter_ids().collect();
    assert_eq!(first_ids, second_ids);

    for id in first_ids {
        let a = first.exporter::<GoogleCloudConfig>(id).unwrap().clone();
        let b = second.exporter::<GoogleCloudConfig>(id).unwrap().clone();
        assert_eq!(sanitize(a), sanitize(b));
    }
}

#[test]
fn test_fixture_pipelines_and_nop_components() {
    // Given: The loaded fixture
    let gcp_type = ComponentType::new("googlecloud").unwrap();
    let cfg = load_fixture(&gcp_type);

    // Then: The nop receiver and processor are declared
    assert_eq!(cfg.receivers.len(), 1);
    assert_eq!(cfg.processors.len(), 1);

    // Then: The traces pipeline exports to the unnamed instance
    assert_eq!(cfg.pipelines.len(), 1);
    let (id, pipeline) = cfg.pipelines.iter().next().unwrap();
    assert_eq!(id.to_string(), "traces");
    assert_eq!(pipeline.exporters, vec![ComponentId::new(gcp_type)]);
}

#[test]
fn test_exporter_lookup_with_wrong_type_returns_none() {
    // Given: The loaded fixture
    let gcp_type = ComponentType::new("googlecloud").unwrap();
    let cfg = load_fixture(&gcp_type);

    // When: Asking for the googlecloud exporter as another config type
    let wrong = cfg.exporter::<gcp_collector_config::factory::NopConfig>(&ComponentId::new(gcp_type));

    // Then: The downcast fails cleanly
    assert!(wrong.is_none());
}

#[test]
fn test_resolved_exporters_serialize_to_json() {
    // Given: The loaded fixture
    let gcp_type = ComponentType::new("googlecloud").unwrap();
    let cfg = load_fixture(&gcp_type);

    // When: Rendering the exporters section
    let json = cfg.to_json(Kind::Exporter).unwrap();

    // Then: Named instance values are present, hooks are not
    let custom = &json["googlecloud/customname"];
    assert_eq!(custom["project"], "my-project");
    assert_eq!(custom["metric"]["prefix"], "prefix");
    assert_eq!(custom["log"]["default_log_name"], "foo-log");
    assert!(custom["metric"].get("get_metric_name").is_none());
}
