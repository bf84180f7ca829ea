//! Error types for Grantsync

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("required custom field not set: {entity} is missing '{field}'")]
    MissingCustomField { entity: String, field: String },

    #[error("unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    #[error("resource type {resource_type} requires at least one {kind} locator")]
    MissingLocator { resource_type: String, kind: String },

    #[error("output port {port} not found on resource {resource}")]
    OutputPortNotFound { resource: String, port: String },

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn missing_custom_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingCustomField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    pub fn missing_locator(resource_type: impl Into<String>, kind: impl std::fmt::Display) -> Self {
        Self::MissingLocator {
            resource_type: resource_type.into(),
            kind: kind.to_string(),
        }
    }

    /// Validation errors cannot succeed on redelivery of the same event.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingCustomField { .. }
                | Self::UnsupportedResourceType(_)
                | Self::MissingLocator { .. }
                | Self::InvalidEvent(_)
        )
    }
}
