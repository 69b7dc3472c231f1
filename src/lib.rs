//! Google Cloud Exporter Collector Configuration
//!
//! Loads OpenTelemetry-collector style YAML files and resolves the declared
//! components, in particular the `googlecloud` exporter, against their
//! factory defaults.
//!
//! # Overview
//!
//! ```text
//! ┌──────────────┐   YAML + env   ┌────────────┐  type lookup  ┌─────────────┐
//! │ config.yaml  │ ─────────────► │   Loader   │ ────────────► │  Factories  │
//! └──────────────┘                │            │ ◄──────────── │  (defaults) │
//!                                 └─────┬──────┘   overrides   └─────────────┘
//!                                       │          merged
//!                                       ▼
//!                               ┌─────────────────┐
//!                               │ CollectorConfig │
//!                               └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`component`] - Component types, ids and the configuration trait
//! - [`factory`] - Factories and the per-kind registry
//! - [`loader`] - Reading and resolving collector files
//! - [`collector`] - The resolved configuration tree
//! - [`pipeline`] - Service pipeline wiring and validation
//! - [`googlecloud`] - Google Cloud exporter settings and factory
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use gcp_collector_config::component::{ComponentId, Kind};
//! use gcp_collector_config::factory::nop_factories;
//! use gcp_collector_config::googlecloud::{self, GoogleCloudConfig};
//! use gcp_collector_config::loader::load_config_and_validate;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut factories = nop_factories()?;
//!     factories.register(Kind::Exporter, googlecloud::new_factory()?)?;
//!
//!     let config = load_config_and_validate("config.yaml", &factories)?;
//!     let id = ComponentId::new(googlecloud::component_type()?);
//!     let gcp: Option<&GoogleCloudConfig> = config.exporter(&id);
//!     println!("{:?}", gcp.map(|c| &c.project));
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod component;
pub mod error;
pub mod factory;
pub mod googlecloud;
pub mod loader;
pub mod pipeline;
