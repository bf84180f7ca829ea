//! Grantsync Feed - cursor-driven replication of the registry event feed

pub mod cursor;
pub mod queue;
pub mod replicator;

pub use cursor::{CursorError, CursorResult, CursorStore, FileCursorStore};
pub use queue::{
    ledger_key, OutboundMessage, OutboundQueue, QueueError, QueueResult, SendReceipt,
    SpoolQueue, SpooledMessage,
};
pub use replicator::{FeedReplicator, ReplicationError, ReplicationSummary, DEFAULT_GROUP_ID};
