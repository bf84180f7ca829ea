//! Replication cursor persistence

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("cursor io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cursor is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type CursorResult<T> = std::result::Result<T, CursorError>;

/// Holds the id of the last event forwarded downstream.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// `None` when no cursor was ever stored.
    async fn load(&self) -> CursorResult<Option<String>>;

    async fn store(&self, cursor: &str) -> CursorResult<()>;
}

/// Cursor kept as a single UTF-8 file.
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CursorError {
        CursorError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self) -> CursorResult<Option<String>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let text = String::from_utf8(bytes)?;
        let cursor = text.trim();
        if cursor.is_empty() {
            return Ok(None);
        }
        Ok(Some(cursor.to_string()))
    }

    async fn store(&self, cursor: &str) -> CursorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, cursor.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("cursor -> {}", cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(tmp.path().join("cursor"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cursor");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileCursorStore::new(&path).load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(tmp.path().join("state").join("cursor"));
        store.store("e-1").await.unwrap();
        store.store("e-2").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("e-2"));
        assert!(!tmp.path().join("state").join("cursor.tmp").exists());
    }
}
