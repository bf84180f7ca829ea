//! Registry lifecycle events
//!
//! Events arrive as CloudEvents. Only `id`, `type` and, for agreement
//! lifecycle events, `data.id` are read. Every other attribute, `data`
//! included, is carried through untouched so a forwarded event is the same
//! document the feed produced, whatever its payload looks like.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const AGREEMENT_ACTIVATED: &str = "com.datamesh-manager.events.DataUsageAgreementActivatedEvent";
pub const AGREEMENT_DEACTIVATED: &str =
    "com.datamesh-manager.events.DataUsageAgreementDeactivatedEvent";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    Activated,
    Deactivated,
    Other,
}

impl EventType {
    pub fn from_type_str(s: &str) -> Self {
        match s {
            AGREEMENT_ACTIVATED => Self::Activated,
            AGREEMENT_DEACTIVATED => Self::Deactivated,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>, agreement_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            data: agreement_id.map(|a| json!({ "id": a })),
            extra: Map::new(),
        }
    }

    pub fn activated(id: impl Into<String>, agreement_id: &str) -> Self {
        Self::new(id, AGREEMENT_ACTIVATED, Some(agreement_id))
    }

    pub fn deactivated(id: impl Into<String>, agreement_id: &str) -> Self {
        Self::new(id, AGREEMENT_DEACTIVATED, Some(agreement_id))
    }

    pub fn event_type(&self) -> EventType {
        EventType::from_type_str(&self.type_name)
    }

    /// The agreement this event refers to: `data.id` as a string. Only
    /// lifecycle events need one; asking any event without it is an error.
    pub fn agreement_id(&self) -> Result<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidEvent(format!("event {} has no data.id", self.id)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
