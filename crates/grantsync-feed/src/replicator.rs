//! Feed replicator - drains the registry event feed into the outbound queue
//!
//! Each event is forwarded, then its id is persisted as the cursor, one event
//! at a time. A failure leaves the cursor at the last forwarded event; the
//! next run resumes there and the queue's deduplication absorbs a re-send.

use crate::cursor::{CursorError, CursorStore};
use crate::queue::{OutboundMessage, OutboundQueue, QueueError};
use grantsync_registry::{EventFeed, RegistryError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// All forwarded events share one ordering group.
pub const DEFAULT_GROUP_ID: &str = "1";

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("feed: {0}")]
    Feed(#[from] RegistryError),

    #[error("queue: {0}")]
    Queue(#[from] QueueError),

    #[error("cursor: {0}")]
    Cursor(#[from] CursorError),

    #[error("event encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplicationSummary {
    pub batches: usize,
    pub forwarded: usize,
    /// Forwards the queue reported as already seen.
    pub duplicates: usize,
    pub cursor: Option<String>,
}

pub struct FeedReplicator {
    feed: Arc<dyn EventFeed>,
    queue: Arc<dyn OutboundQueue>,
    cursor: Arc<dyn CursorStore>,
    group_id: String,
}

impl FeedReplicator {
    pub fn new(
        feed: Arc<dyn EventFeed>,
        queue: Arc<dyn OutboundQueue>,
        cursor: Arc<dyn CursorStore>,
    ) -> Self {
        Self {
            feed,
            queue,
            cursor,
            group_id: DEFAULT_GROUP_ID.to_string(),
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub async fn replicate_new_events(&self) -> Result<ReplicationSummary, ReplicationError> {
        let mut cursor = self.cursor.load().await?;
        let mut summary = ReplicationSummary {
            cursor: cursor.clone(),
            ..Default::default()
        };
        info!("Replicating from cursor {:?}", cursor);

        loop {
            let batch = self.feed.next_batch(cursor.as_deref()).await?;
            if batch.is_empty() {
                debug!("Feed drained");
                break;
            }
            if cursor.is_some() && batch.last().map(|e| e.id.as_str()) == cursor.as_deref() {
                warn!(
                    "Feed returned cursor event {:?} as the newest event, stopping",
                    cursor
                );
                break;
            }
            summary.batches += 1;

            for event in &batch {
                let message = OutboundMessage {
                    body: serde_json::to_string(event)?,
                    deduplication_id: event.id.clone(),
                    group_id: self.group_id.clone(),
                };
                let receipt = self.queue.send(&message).await?;
                self.cursor.store(&event.id).await?;
                cursor = Some(event.id.clone());

                summary.forwarded += 1;
                if receipt.duplicate {
                    summary.duplicates += 1;
                }
                info!(
                    "Forwarded {} ({}) as {}",
                    event.id, event.type_name, receipt.message_id
                );
            }
        }

        summary.cursor = cursor;
        Ok(summary)
    }
}
