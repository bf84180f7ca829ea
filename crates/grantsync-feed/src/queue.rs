//! Outbound ordered queue
//!
//! `SpoolQueue` is a directory-backed FIFO with a persistent deduplication
//! ledger. Layout:
//!
//! ```text
//! <dir>/seq                    next sequence number
//! <dir>/messages/<seq>.json    pending envelopes, oldest first
//! <dir>/dedup/<sha256(id)>     message id accepted for a deduplication id
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt queue state: {0}")]
    Corrupt(String),
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    pub deduplication_id: String,
    pub group_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
    /// The deduplication id was seen before; nothing new was enqueued.
    pub duplicate: bool,
}

#[async_trait]
pub trait OutboundQueue: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> QueueResult<SendReceipt>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpooledMessage {
    pub sequence: u64,
    pub message_id: String,
    pub group_id: String,
    pub deduplication_id: String,
    pub sent_at: DateTime<Utc>,
    pub body: String,
}

pub struct SpoolQueue {
    dir: PathBuf,
    // serializes sequence allocation and ledger writes within the process
    lock: Mutex<()>,
}

impl SpoolQueue {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn messages_dir(&self) -> PathBuf {
        self.dir.join("messages")
    }

    fn ledger_path(&self, deduplication_id: &str) -> PathBuf {
        self.dir.join("dedup").join(ledger_key(deduplication_id))
    }

    fn message_path(&self, sequence: u64) -> PathBuf {
        self.messages_dir().join(format!("{:020}.json", sequence))
    }

    async fn next_sequence(&self) -> QueueResult<u64> {
        let path = self.dir.join("seq");
        let current = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| QueueError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        write_atomic(&path, (current + 1).to_string().as_bytes()).await?;
        Ok(current)
    }

    /// Oldest pending message, if any.
    pub async fn receive(&self) -> QueueResult<Option<SpooledMessage>> {
        let mut names = self.pending_names().await?;
        names.sort();
        match names.first() {
            Some(name) => {
                let bytes = tokio::fs::read(self.messages_dir().join(name)).await?;
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            None => Ok(None),
        }
    }

    /// Remove a received message. Acking twice is harmless.
    pub async fn ack(&self, message: &SpooledMessage) -> QueueResult<()> {
        match tokio::fs::remove_file(self.message_path(message.sequence)).await {
            Ok(()) => {
                debug!("acked {}", message.message_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn pending(&self) -> QueueResult<usize> {
        Ok(self.pending_names().await?.len())
    }

    async fn pending_names(&self) -> QueueResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(self.messages_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl OutboundQueue for SpoolQueue {
    async fn send(&self, message: &OutboundMessage) -> QueueResult<SendReceipt> {
        let _guard = self.lock.lock().await;

        let ledger = self.ledger_path(&message.deduplication_id);
        match tokio::fs::read_to_string(&ledger).await {
            Ok(message_id) => {
                info!(
                    "Duplicate {} absorbed (message {})",
                    message.deduplication_id, message_id
                );
                return Ok(SendReceipt {
                    message_id,
                    duplicate: true,
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let spooled = SpooledMessage {
            sequence: self.next_sequence().await?,
            message_id: uuid::Uuid::new_v4().to_string(),
            group_id: message.group_id.clone(),
            deduplication_id: message.deduplication_id.clone(),
            sent_at: Utc::now(),
            body: message.body.clone(),
        };

        // envelope first: a crash before the ledger write re-sends, never loses
        let json = serde_json::to_vec_pretty(&spooled)?;
        write_atomic(&self.message_path(spooled.sequence), &json).await?;
        write_atomic(&ledger, spooled.message_id.as_bytes()).await?;

        debug!(
            "spooled {} as #{} in group {}",
            spooled.deduplication_id, spooled.sequence, spooled.group_id
        );
        Ok(SendReceipt {
            message_id: spooled.message_id,
            duplicate: false,
        })
    }
}

/// File-name-safe ledger key: base64url of the SHA-256 of the id.
pub fn ledger_key(deduplication_id: &str) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, deduplication_id.as_bytes());
    URL_SAFE_NO_PAD.encode(digest.as_ref())
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}
