//! Component Identifiers
//!
//! Every configured component is addressed by a [`ComponentId`]: a validated
//! [`ComponentType`] plus an optional instance name. In a collector file the id
//! is the section key, written `type` or `type/name`:
//!
//! ```yaml
//! exporters:
//!   googlecloud:
//!   googlecloud/customname:
//!     project: my-project
//! ```
//!
//! Both forms may appear side by side; each id must be unique within its
//! section.

use crate::error::{ConfigError, Result};
use std::any::Any;
use std::fmt;
use std::str::FromStr;

const TYPE_NAME_SEPARATOR: char = '/';
const MAX_TYPE_LEN: usize = 63;

/// The kind of a pipeline component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Receiver,
    Processor,
    Exporter,
}

impl Kind {
    /// Name of the top-level section holding components of this kind
    pub fn section(self) -> &'static str {
        match self {
            Kind::Receiver => "receivers",
            Kind::Processor => "processors",
            Kind::Exporter => "exporters",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Receiver => "receiver",
            Kind::Processor => "processor",
            Kind::Exporter => "exporter",
        };
        f.write_str(name)
    }
}

/// Validated component type, e.g. `googlecloud`
///
/// A type starts with an ASCII letter, continues with ASCII letters, digits or
/// underscores, and is at most 63 characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(String);

impl ComponentType {
    pub fn new(value: &str) -> Result<Self> {
        let invalid = |reason: &str| ConfigError::InvalidType {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = value.chars();
        match chars.next() {
            None => return Err(invalid("type must not be empty")),
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(invalid("type must start with an ASCII letter"))
            }
            Some(_) => {}
        }
        if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
            return Err(invalid(
                "type may only contain ASCII letters, digits and underscores",
            ));
        }
        if value.len() > MAX_TYPE_LEN {
            return Err(invalid("type must be at most 63 characters long"));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a configured component instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    component_type: ComponentType,
    name: Option<String>,
}

impl ComponentId {
    /// Id of the unnamed instance of `component_type`
    pub fn new(component_type: ComponentType) -> Self {
        Self {
            component_type,
            name: None,
        }
    }

    /// Id of a named instance, e.g. `googlecloud/customname`
    pub fn with_name(component_type: ComponentType, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name).map_err(|reason| ConfigError::InvalidId {
            value: format!("{}{}{}", component_type, TYPE_NAME_SEPARATOR, name),
            reason,
        })?;
        Ok(Self {
            component_type,
            name: Some(name),
        })
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name part must be specified after '/'".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| *c == TYPE_NAME_SEPARATOR || c.is_whitespace() || c.is_control())
    {
        return Err(format!("name contains invalid character {:?}", c));
    }
    Ok(())
}

impl FromStr for ComponentId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let (type_part, name_part) = match s.split_once(TYPE_NAME_SEPARATOR) {
            Some((t, n)) => (t.trim(), Some(n.trim())),
            None => (s.trim(), None),
        };

        let component_type = ComponentType::new(type_part).map_err(|e| match e {
            ConfigError::InvalidType { reason, .. } => ConfigError::InvalidId {
                value: s.to_string(),
                reason,
            },
            other => other,
        })?;

        match name_part {
            None => Ok(Self::new(component_type)),
            Some(name) => {
                validate_name(name).map_err(|reason| ConfigError::InvalidId {
                    value: s.to_string(),
                    reason,
                })?;
                Ok(Self {
                    component_type,
                    name: Some(name.to_string()),
                })
            }
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}{}", self.component_type, TYPE_NAME_SEPARATOR, name),
            None => write!(f, "{}", self.component_type),
        }
    }
}

/// Configuration of a single component instance
///
/// Loaded configurations are stored as trait objects; use `downcast_ref` on
/// `dyn ComponentConfig` to get the concrete type back.
pub trait ComponentConfig: Any + fmt::Debug + Send + Sync {
    /// Check semantic constraints that deserialization alone cannot express
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Serialized form, used for dumping the resolved configuration
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn ComponentConfig {
    pub fn downcast_ref<T: ComponentConfig>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_rejects_leading_digit() {
        assert!(ComponentType::new("1cloud").is_err());
    }

    #[test]
    fn test_type_length_limit() {
        let ok = "a".repeat(63);
        let too_long = "a".repeat(64);
        assert!(ComponentType::new(&ok).is_ok());
        assert!(ComponentType::new(&too_long).is_err());
    }

    #[test]
    fn test_id_trims_whitespace() {
        let id: ComponentId = " googlecloud / customname ".parse().unwrap();
        assert_eq!(id.component_type().as_str(), "googlecloud");
        assert_eq!(id.name(), Some("customname"));
    }
}
