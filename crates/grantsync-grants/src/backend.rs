//! Permission backend contract

use async_trait::async_trait;
use grantsync_core::GrantId;
use grantsync_policy::PolicyDocument;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid permission object name: {0:?}")]
    InvalidName(String),

    #[error("permission service error: {0}")]
    Service(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Outcome of a revoke. Absence is success, reported so callers can log it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revocation {
    Removed,
    AlreadyAbsent,
}

/// An external permission system holding named grants attached to identities.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Create or replace the named grant and attach it to `identity`.
    /// Calling twice with the same inputs leaves the same state.
    async fn materialize(
        &self,
        identity: &str,
        grant_id: &GrantId,
        document: &PolicyDocument,
    ) -> BackendResult<()>;

    /// Detach and delete the named grant.
    async fn revoke(&self, identity: &str, grant_id: &GrantId) -> BackendResult<Revocation>;
}
