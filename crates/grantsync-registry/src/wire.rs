//! Registry wire records and their conversion into the typed model

use grantsync_core::{Agreement, CustomFields, LocatorConvention, OutputPort, Resource};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct AgreementRecord {
    pub info: InfoRecord,
    pub consumer: ConsumerRecord,
    pub provider: ProviderRecord,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InfoRecord {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerRecord {
    pub data_product_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub data_product_id: String,
    pub output_port_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub info: Option<InfoRecord>,
    #[serde(default)]
    pub custom: Map<String, Value>,
    #[serde(default)]
    pub output_ports: Vec<OutputPortRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OutputPortRecord {
    pub id: String,
    #[serde(default)]
    pub custom: Map<String, Value>,
}

impl AgreementRecord {
    pub fn into_agreement(self) -> Agreement {
        Agreement {
            id: self.info.id,
            consumer_resource_id: self.consumer.data_product_id,
            provider_resource_id: self.provider.data_product_id,
            provider_output_port_id: self.provider.output_port_id,
            tags: self.tags.into_iter().collect(),
            custom: custom_fields(self.custom),
        }
    }
}

impl ResourceRecord {
    /// `requested_id` is used when the record carries no id of its own.
    pub fn into_resource(self, requested_id: &str, convention: &LocatorConvention) -> Resource {
        let id = self
            .id
            .or(self.info.map(|i| i.id))
            .unwrap_or_else(|| requested_id.to_string());
        Resource {
            id,
            custom: custom_fields(self.custom),
            output_ports: self
                .output_ports
                .into_iter()
                .map(|p| OutputPort::from_custom(p.id, custom_fields(p.custom), convention))
                .collect(),
        }
    }
}

/// Flatten a JSON custom bag into strings for reading. Nulls and nested
/// values are dropped; other scalars keep their JSON rendering. Never
/// written back: patches merge into the raw record instead.
pub fn custom_fields(map: Map<String, Value>) -> CustomFields {
    map.into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Bool(_) | Value::Number(_) => Some((k, v.to_string())),
            _ => None,
        })
        .collect()
}

/// Shallow merge: every top-level field of `patch` replaces the current one.
pub fn merge_fields(current: Value, patch: Map<String, Value>) -> Value {
    match current {
        Value::Object(mut map) => {
            for (k, v) in patch {
                map.insert(k, v);
            }
            Value::Object(map)
        }
        _ => Value::Object(patch),
    }
}

const CUSTOM_FIELD: &str = "custom";

/// Merge an agreement patch over the current record. Top-level fields are
/// replaced, except `custom`, whose keys are set one by one into the
/// record's own custom object so every other key keeps its JSON value.
pub fn merge_agreement(current: Value, mut patch: Map<String, Value>) -> Value {
    if let Some(Value::Object(keys)) = patch.remove(CUSTOM_FIELD) {
        let mut custom = match current.get(CUSTOM_FIELD) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        custom.extend(keys);
        patch.insert(CUSTOM_FIELD.to_string(), Value::Object(custom));
    }
    merge_fields(current, patch)
}
