//! Core types for Grantsync

use crate::error::{Error, Result};
use crate::locator::{Locator, LocatorConvention};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Ordered string-keyed bag for registry fields this system does not model.
pub type CustomFields = BTreeMap<String, String>;

/// Permission object name - cheaply cloneable.
///
/// Derived only from the agreement id, so a revoke never needs to read back
/// what was granted.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct GrantId(Arc<str>);

pub const DEFAULT_GRANT_PREFIX: &str = "DataUsageAgreement_";

impl GrantId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn for_agreement(prefix: &str, agreement_id: &str) -> Self {
        Self::new(format!("{}{}", prefix, agreement_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GrantId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for GrantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A sharing relationship between one consumer and one provider output port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agreement {
    pub id: String,
    pub consumer_resource_id: String,
    pub provider_resource_id: String,
    pub provider_output_port_id: String,
    pub tags: BTreeSet<String>,
    pub custom: CustomFields,
}

/// Fields this system writes back onto an agreement. Unset fields are left
/// untouched by the registry's read-merge-write; `tags` replaces the whole
/// list while `custom` only sets the keys it names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AgreementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

impl AgreementPatch {
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            custom: None,
        }
    }

    pub fn with_custom(mut self, custom: CustomFields) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Top-level JSON fields to merge over the current record.
    pub fn to_fields(&self) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }
}

/// A consumer or provider data product.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub custom: CustomFields,
    pub output_ports: Vec<OutputPort>,
}

impl Resource {
    /// Required custom field; absence is a validation failure.
    pub fn required_custom(&self, field: &str) -> Result<&str> {
        self.custom
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| Error::missing_custom_field(format!("resource {}", self.id), field))
    }

    pub fn output_port(&self, port_id: &str) -> Result<&OutputPort> {
        self.output_ports
            .iter()
            .find(|p| p.id == port_id)
            .ok_or_else(|| Error::OutputPortNotFound {
                resource: self.id.clone(),
                port: port_id.to_string(),
            })
    }
}

/// A typed exposed resource within a provider's data product.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputPort {
    pub id: String,
    pub resource_type: Option<String>,
    pub locators: Vec<Locator>,
    pub custom: CustomFields,
}

impl OutputPort {
    /// Decode a port from its raw custom map, resolving type and locators once.
    pub fn from_custom(id: impl Into<String>, custom: CustomFields, convention: &LocatorConvention) -> Self {
        Self {
            id: id.into(),
            resource_type: custom.get(&convention.type_field).cloned(),
            locators: convention.resolve(&custom),
            custom,
        }
    }

    pub fn required_type(&self, type_field: &str) -> Result<&str> {
        self.resource_type
            .as_deref()
            .ok_or_else(|| Error::missing_custom_field(format!("output port {}", self.id), type_field))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Effect {
    Allow,
}

/// One statement of a permission grant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionStatement {
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<String>,
}

impl PermissionStatement {
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of synthesis: the grant name plus its ordered statements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionGrant {
    pub id: GrantId,
    pub statements: Vec<PermissionStatement>,
}
