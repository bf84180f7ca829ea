//! Registry directory and event feed traits

use async_trait::async_trait;
use grantsync_core::{Agreement, AgreementPatch, Event, Resource};

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry error types. A 404 on a by-id lookup is never an error; it is
/// reported as `None`.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("agreement {0} disappeared before it could be patched")]
    AgreementGone(String),

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid registry url: {0}")]
    Url(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Read access to agreements and data products, plus the agreement write-back.
#[async_trait]
pub trait RegistryDirectory: Send + Sync {
    async fn get_agreement(&self, id: &str) -> RegistryResult<Option<Agreement>>;

    async fn get_resource(&self, id: &str) -> RegistryResult<Option<Resource>>;

    /// Read-merge-write: fetch the current record, overlay the patch's
    /// top-level fields, write the result back.
    async fn patch_agreement(&self, id: &str, patch: &AgreementPatch) -> RegistryResult<()>;
}

/// The registry's ordered event feed.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Next batch of events strictly after `last_event_id`, or from the
    /// beginning when `None`. An empty batch means the feed is drained.
    async fn next_batch(&self, last_event_id: Option<&str>) -> RegistryResult<Vec<Event>>;
}
