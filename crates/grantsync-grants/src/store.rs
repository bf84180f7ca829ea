//! Filesystem permission backend
//!
//! Layout: `<root>/<identity>/<grant_id>.json`, one policy document per grant.

use crate::backend::{BackendError, BackendResult, PermissionBackend, Revocation};
use async_trait::async_trait;
use grantsync_core::GrantId;
use grantsync_policy::PolicyDocument;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct LocalPermissionStore {
    root: PathBuf,
}

impl LocalPermissionStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn grant_path(&self, identity: &str, grant_id: &GrantId) -> BackendResult<PathBuf> {
        check_name(identity)?;
        check_name(grant_id.as_str())?;
        Ok(self
            .root
            .join(identity)
            .join(format!("{}.json", grant_id)))
    }

    /// Read back a materialized grant, `None` when it is not attached.
    pub async fn read(&self, identity: &str, grant_id: &GrantId) -> BackendResult<Option<PolicyDocument>> {
        let path = self.grant_path(identity, grant_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Grant ids attached to `identity`, sorted.
    pub async fn list(&self, identity: &str) -> BackendResult<Vec<GrantId>> {
        check_name(identity)?;
        let mut entries = match tokio::fs::read_dir(self.root.join(identity)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut grants = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(stem) = name.strip_suffix(".json") {
                grants.push(GrantId::new(stem));
            }
        }
        grants.sort();
        Ok(grants)
    }
}

fn check_name(name: &str) -> BackendResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(BackendError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl PermissionBackend for LocalPermissionStore {
    async fn materialize(
        &self,
        identity: &str,
        grant_id: &GrantId,
        document: &PolicyDocument,
    ) -> BackendResult<()> {
        let path = self.grant_path(identity, grant_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = document.to_json_pretty()?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("wrote {} ({} bytes)", path.display(), json.len());
        info!("Attached {} to {}", grant_id, identity);
        Ok(())
    }

    async fn revoke(&self, identity: &str, grant_id: &GrantId) -> BackendResult<Revocation> {
        let path = self.grant_path(identity, grant_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Detached {} from {}", grant_id, identity);
                Ok(Revocation::Removed)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Revocation::AlreadyAbsent),
            Err(e) => Err(e.into()),
        }
    }
}
