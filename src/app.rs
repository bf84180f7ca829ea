//! Wiring of configured components

use crate::config::GrantsyncConfig;
use anyhow::Context;
use grantsync_core::{Event, GrantId, Locator};
use grantsync_feed::{FeedReplicator, FileCursorStore, SpoolQueue};
use grantsync_grants::{GrantCoordinator, LocalPermissionStore, Outcome};
use grantsync_policy::{create_default_registry, synthesize_grant, PolicyDocument};
use grantsync_registry::{EventFeed, RegistryClient, RegistryDirectory};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry client with the API key resolved through the configured secret source.
pub fn registry_client(config: &GrantsyncConfig) -> anyhow::Result<RegistryClient> {
    let secrets = config.secrets.source();
    let api_key = secrets
        .get_secret(&config.registry.api_key_secret)
        .context("cannot read registry api key")?;
    Ok(RegistryClient::new(&config.registry.base_url, api_key)
        .with_endpoints(config.registry.endpoints())
        .with_convention(config.locators.clone()))
}

pub fn coordinator(config: &GrantsyncConfig, directory: Arc<dyn RegistryDirectory>) -> GrantCoordinator {
    GrantCoordinator::new(
        directory,
        Arc::new(LocalPermissionStore::new(&config.grants.store_dir)),
        create_default_registry(),
    )
    .with_settings(config.coordinator_settings())
}

pub fn spool(config: &GrantsyncConfig) -> SpoolQueue {
    SpoolQueue::new(&config.feed.spool_dir)
}

pub fn replicator(config: &GrantsyncConfig, feed: Arc<dyn EventFeed>, spool: Arc<SpoolQueue>) -> FeedReplicator {
    FeedReplicator::new(
        feed,
        spool,
        Arc::new(FileCursorStore::new(&config.feed.cursor_path)),
    )
    .with_group_id(config.feed.group_id.clone())
}

/// Handle spooled events oldest first. A message is acked only after it was
/// handled; the first failure stops the drain and leaves it pending.
pub async fn drain_spool(coordinator: &GrantCoordinator, spool: &SpoolQueue) -> anyhow::Result<Vec<Outcome>> {
    let mut outcomes = Vec::new();
    while let Some(message) = spool.receive().await? {
        let event: Event = serde_json::from_str(&message.body)
            .with_context(|| format!("spooled message {} is not an event", message.message_id))?;
        let outcome = coordinator
            .handle(&event)
            .await
            .with_context(|| format!("event {} failed", event.id))?;
        spool.ack(&message).await?;
        debug!("handled {} -> {:?}", event.id, outcome);
        outcomes.push(outcome);
    }
    info!("Drained {} spooled events", outcomes.len());
    Ok(outcomes)
}

/// Policy document for an output port type and raw locator values,
/// classified with the configured convention.
pub fn synthesize_document(
    config: &GrantsyncConfig,
    resource_type: &str,
    locators: &[String],
) -> anyhow::Result<PolicyDocument> {
    let locators: Vec<Locator> = locators
        .iter()
        .map(|value| Locator::new(config.locators.classify(value), value.clone()))
        .collect();
    let grant = synthesize_grant(
        &create_default_registry(),
        GrantId::new("preview"),
        resource_type,
        &locators,
    )?;
    Ok(PolicyDocument::from(&grant))
}
