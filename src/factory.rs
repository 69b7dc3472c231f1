//! Component Factories
//!
//! A factory binds a [`ComponentType`] to the function producing its default
//! configuration, and knows how to lay file-declared overrides on top of that
//! default.
//!
//! # Override Resolution
//!
//! 1. The default configuration is serialized to a `serde_json::Value` tree
//! 2. The overrides are checked against the shape of that tree; a key with no
//!    counterpart in the default is rejected
//! 3. Overrides are deep-merged: mappings merge key by key, scalars and lists
//!    replace the default value, `null` keeps it. A string landing on a
//!    boolean or numeric default is converted when it parses as one, which is
//!    how environment overrides reach typed fields
//! 4. The merged tree is deserialized back into the concrete type, and fields
//!    that never round-trip through serde (function hooks) are carried over
//!    from the default
//!
//! # Registry
//!
//! [`Factories`] holds one map per [`Kind`]. Registering a second factory for
//! the same kind and type is an error.

use crate::component::{ComponentConfig, ComponentType, Kind};
use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Failure while resolving overrides for a single component
#[derive(Debug)]
pub enum UnmarshalError {
    /// Dotted path of an override key the configuration type does not have
    UnknownField(String),
    /// The merged tree does not deserialize into the configuration type
    Decode(serde_json::Error),
}

impl fmt::Display for UnmarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmarshalError::UnknownField(field) => write!(f, "unknown field {:?}", field),
            UnmarshalError::Decode(e) => write!(f, "{}", e),
        }
    }
}

/// Object-safe factory interface used by the loader
pub trait Factory: Send + Sync {
    fn component_type(&self) -> &ComponentType;

    fn create_default_config(&self) -> Box<dyn ComponentConfig>;

    /// Resolve `overrides` against a fresh default configuration
    fn unmarshal(
        &self,
        overrides: &Value,
    ) -> std::result::Result<Box<dyn ComponentConfig>, UnmarshalError>;
}

/// Configuration types a [`ComponentFactory`] can resolve
pub trait DecodableConfig:
    ComponentConfig + Serialize + DeserializeOwned + Sized + 'static
{
    /// Copy fields skipped by serde from the default the overrides were applied to
    fn carry_unserialized(&mut self, _defaults: &Self) {}
}

type DefaultFn<C> = dyn Fn() -> C + Send + Sync;

/// Factory built from a component type and a default-configuration constructor
pub struct ComponentFactory<C> {
    component_type: ComponentType,
    create_default: Arc<DefaultFn<C>>,
}

impl<C: DecodableConfig> ComponentFactory<C> {
    pub fn new<F>(component_type: ComponentType, create_default: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            component_type,
            create_default: Arc::new(create_default),
        }
    }

    /// Typed variant of [`Factory::create_default_config`]
    pub fn default_config(&self) -> C {
        (self.create_default)()
    }

    /// Typed variant of [`Factory::unmarshal`]
    pub fn resolve(&self, overrides: &Value) -> std::result::Result<C, UnmarshalError> {
        let defaults = self.default_config();
        let mut tree = serde_json::to_value(&defaults).map_err(UnmarshalError::Decode)?;

        if let Some(field) = first_unknown_field(&tree, overrides, "") {
            return Err(UnmarshalError::UnknownField(field));
        }
        merge(&mut tree, overrides);

        let mut config: C = serde_json::from_value(tree).map_err(UnmarshalError::Decode)?;
        config.carry_unserialized(&defaults);
        Ok(config)
    }
}

impl<C: DecodableConfig> Factory for ComponentFactory<C> {
    fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    fn create_default_config(&self) -> Box<dyn ComponentConfig> {
        Box::new(self.default_config())
    }

    fn unmarshal(
        &self,
        overrides: &Value,
    ) -> std::result::Result<Box<dyn ComponentConfig>, UnmarshalError> {
        let config = self.resolve(overrides)?;
        Ok(Box::new(config))
    }
}

/// Deep-merge `overrides` into `base`
pub(crate) fn merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, Value::String(text)) => {
            *base = coerce_string(base, text).unwrap_or_else(|| Value::String(text.clone()))
        }
        (base, value) => *base = value.clone(),
    }
}

/// Convert `text` to the scalar type held by `default`, if it parses as one
fn coerce_string(default: &Value, text: &str) -> Option<Value> {
    let text = text.trim();
    match default {
        Value::Bool(_) => text.parse::<bool>().ok().map(Value::Bool),
        Value::Number(_) => text
            .parse::<u64>()
            .map(Value::from)
            .or_else(|_| text.parse::<i64>().map(Value::from))
            .ok()
            .or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
            }),
        _ => None,
    }
}

/// First override key, as a dotted path, that the default tree has no slot for
fn first_unknown_field(defaults: &Value, overrides: &Value, prefix: &str) -> Option<String> {
    // A mapping where the default holds a scalar or list is a type mismatch,
    // which deserialization reports with a better message.
    let (Value::Object(default_map), Value::Object(override_map)) = (defaults, overrides) else {
        return None;
    };

    for (key, value) in override_map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match default_map.get(key) {
            None => return Some(path),
            Some(default_value) => {
                if let Some(field) = first_unknown_field(default_value, value, &path) {
                    return Some(field);
                }
            }
        }
    }
    None
}

/// Configuration of components that take no settings, e.g. `nop`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NopConfig {}

impl ComponentConfig for NopConfig {
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl DecodableConfig for NopConfig {}

/// Component type of the no-op factories
pub const NOP_TYPE: &str = "nop";

/// Factories registered per component kind
#[derive(Default)]
pub struct Factories {
    by_kind: BTreeMap<Kind, BTreeMap<ComponentType, Box<dyn Factory>>>,
}

impl Factories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: Kind, factory: impl Factory + 'static) -> Result<()> {
        let component_type = factory.component_type().clone();
        let factories = self.by_kind.entry(kind).or_default();
        if factories.contains_key(&component_type) {
            return Err(ConfigError::DuplicateFactory {
                kind,
                component_type: component_type.to_string(),
            });
        }
        debug!("Registered {} factory {}", kind, component_type);
        factories.insert(component_type, Box::new(factory));
        Ok(())
    }

    pub fn get(&self, kind: Kind, component_type: &ComponentType) -> Option<&dyn Factory> {
        self.by_kind
            .get(&kind)
            .and_then(|factories| factories.get(component_type))
            .map(|factory| factory.as_ref())
    }

    /// Registered types of the given kind, in sorted order
    pub fn types(&self, kind: Kind) -> Vec<&ComponentType> {
        self.by_kind
            .get(&kind)
            .map(|factories| factories.keys().collect())
            .unwrap_or_default()
    }
}

/// Registry with a `nop` receiver, processor and exporter
pub fn nop_factories() -> Result<Factories> {
    let mut factories = Factories::new();
    let nop_type = ComponentType::new(NOP_TYPE)?;
    for kind in [Kind::Receiver, Kind::Processor, Kind::Exporter] {
        factories.register(
            kind,
            ComponentFactory::new(nop_type.clone(), NopConfig::default),
        )?;
    }
    Ok(factories)
}
