//! Grantsync - keeps cloud permission grants in step with registry agreements

pub mod app;
pub mod config;
pub mod inbound;
pub mod logging;

pub use config::GrantsyncConfig;
pub use inbound::{InboundError, QueueRecords};
