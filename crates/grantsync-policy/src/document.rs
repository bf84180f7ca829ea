//! Policy document rendering
//!
//! Field order is fixed by the struct layout, so identical statements always
//! render to identical bytes.

use grantsync_core::{PermissionGrant, PermissionStatement};
use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<PermissionStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PermissionStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&PermissionGrant> for PolicyDocument {
    fn from(grant: &PermissionGrant) -> Self {
        Self::new(grant.statements.clone())
    }
}
