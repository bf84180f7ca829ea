//! Grant coordinator - applies agreement lifecycle events to the permission backend
//!
//! Activation: agreement -> consumer role + provider port -> synthesized grant
//! -> materialize -> registry patch. A failed patch revokes the grant again
//! before the error is returned, so no grant outlives a failed record update.
//!
//! Deactivation: agreement -> consumer role -> revoke -> registry patch.

use crate::backend::{BackendError, PermissionBackend, Revocation};
use grantsync_core::{Agreement, AgreementPatch, CustomFields, Event, EventType, GrantId, Resource};
use grantsync_policy::{synthesize_grant, PolicyDocument, SynthesizerRegistry};
use grantsync_registry::{RegistryDirectory, RegistryError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum GrantError {
    #[error(transparent)]
    Validation(#[from] grantsync_core::Error),

    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("permission backend: {0}")]
    Backend(#[from] BackendError),
}

impl GrantError {
    /// Redelivering the same event cannot fix a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(e) if e.is_validation())
    }
}

pub type GrantResult<T> = std::result::Result<T, GrantError>;

/// Field and tag names the coordinator reads and writes on registry records.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoordinatorSettings {
    pub grant_prefix: String,
    pub role_field: String,
    /// Mirrors the locator convention's type field; only used in error messages.
    #[serde(skip)]
    pub type_field: String,
    pub policy_name_field: String,
    pub tag_integration: String,
    pub tag_active: String,
    pub tag_inactive: String,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            grant_prefix: grantsync_core::DEFAULT_GRANT_PREFIX.to_string(),
            role_field: "identity-role-name".to_string(),
            type_field: "output-port-type".to_string(),
            policy_name_field: "policy-name".to_string(),
            tag_integration: "integration".to_string(),
            tag_active: "integration-active".to_string(),
            tag_inactive: "integration-inactive".to_string(),
        }
    }
}

/// What handling one event did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Activated { agreement_id: String, grant_id: GrantId, identity: String },
    Deactivated { agreement_id: String, grant_id: GrantId, revocation: Revocation },
    /// Agreement or one of its resources no longer exists.
    Stale { agreement_id: String },
    Ignored { event_type: String },
}

pub struct GrantCoordinator {
    directory: Arc<dyn RegistryDirectory>,
    backend: Arc<dyn PermissionBackend>,
    synthesizers: Arc<SynthesizerRegistry>,
    settings: CoordinatorSettings,
}

impl GrantCoordinator {
    pub fn new(
        directory: Arc<dyn RegistryDirectory>,
        backend: Arc<dyn PermissionBackend>,
        synthesizers: SynthesizerRegistry,
    ) -> Self {
        Self {
            directory,
            backend,
            synthesizers: Arc::new(synthesizers),
            settings: CoordinatorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn grant_id(&self, agreement_id: &str) -> GrantId {
        GrantId::for_agreement(&self.settings.grant_prefix, agreement_id)
    }

    pub async fn handle(&self, event: &Event) -> GrantResult<Outcome> {
        match event.event_type() {
            EventType::Activated => self.activate(event.agreement_id()?).await,
            EventType::Deactivated => self.deactivate(event.agreement_id()?).await,
            EventType::Other => {
                debug!("Ignoring event {} of type {}", event.id, event.type_name);
                Ok(Outcome::Ignored {
                    event_type: event.type_name.clone(),
                })
            }
        }
    }

    /// Handle events in order, stopping at the first failure.
    pub async fn handle_batch(&self, events: &[Event]) -> GrantResult<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            match self.handle(event).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("Event {} failed after {} handled: {}", event.id, outcomes.len(), e);
                    return Err(e);
                }
            }
        }
        Ok(outcomes)
    }

    pub async fn activate(&self, agreement_id: &str) -> GrantResult<Outcome> {
        let Some(agreement) = self.load_agreement(agreement_id).await? else {
            return Ok(Outcome::Stale { agreement_id: agreement_id.to_string() });
        };
        let Some(consumer) = self.load_resource(&agreement.consumer_resource_id).await? else {
            return Ok(Outcome::Stale { agreement_id: agreement_id.to_string() });
        };
        let Some(provider) = self.load_resource(&agreement.provider_resource_id).await? else {
            return Ok(Outcome::Stale { agreement_id: agreement_id.to_string() });
        };

        let identity = consumer.required_custom(&self.settings.role_field)?.to_string();
        let port = provider.output_port(&agreement.provider_output_port_id)?;
        let resource_type = port.required_type(&self.settings.type_field)?;

        let grant = synthesize_grant(
            &self.synthesizers,
            self.grant_id(&agreement.id),
            resource_type,
            &port.locators,
        )?;
        let document = PolicyDocument::from(&grant);

        self.backend.materialize(&identity, &grant.id, &document).await?;
        info!(
            "Materialized {} for {} ({} statements, {})",
            grant.id,
            identity,
            grant.statements.len(),
            resource_type
        );

        let mut custom = CustomFields::new();
        custom.insert(self.settings.policy_name_field.clone(), grant.id.to_string());
        let patch = AgreementPatch::tags([&self.settings.tag_integration, &self.settings.tag_active])
            .with_custom(custom);

        if let Err(patch_err) = self.directory.patch_agreement(&agreement.id, &patch).await {
            warn!("Patch of agreement {} failed, revoking {}", agreement.id, grant.id);
            if let Err(revoke_err) = self.backend.revoke(&identity, &grant.id).await {
                error!(
                    "Compensation failed: {} is still attached to {}: {}",
                    grant.id, identity, revoke_err
                );
            }
            return Err(patch_err.into());
        }

        info!("Agreement {} active", agreement.id);
        Ok(Outcome::Activated {
            agreement_id: agreement.id,
            grant_id: grant.id,
            identity,
        })
    }

    pub async fn deactivate(&self, agreement_id: &str) -> GrantResult<Outcome> {
        let Some(agreement) = self.load_agreement(agreement_id).await? else {
            return Ok(Outcome::Stale { agreement_id: agreement_id.to_string() });
        };
        let Some(consumer) = self.load_resource(&agreement.consumer_resource_id).await? else {
            return Ok(Outcome::Stale { agreement_id: agreement_id.to_string() });
        };

        let identity = consumer.required_custom(&self.settings.role_field)?;
        let grant_id = self.grant_id(&agreement.id);

        let revocation = self.backend.revoke(identity, &grant_id).await?;
        if revocation == Revocation::AlreadyAbsent {
            warn!("{} was not attached to {}, nothing to revoke", grant_id, identity);
        }

        let patch = AgreementPatch::tags([&self.settings.tag_integration, &self.settings.tag_inactive]);
        self.directory.patch_agreement(&agreement.id, &patch).await?;

        info!("Agreement {} inactive", agreement.id);
        Ok(Outcome::Deactivated {
            agreement_id: agreement.id,
            grant_id,
            revocation,
        })
    }

    async fn load_agreement(&self, id: &str) -> GrantResult<Option<Agreement>> {
        let agreement = self.directory.get_agreement(id).await?;
        if agreement.is_none() {
            warn!("Agreement {} not found, dropping event", id);
        }
        Ok(agreement)
    }

    async fn load_resource(&self, id: &str) -> GrantResult<Option<Resource>> {
        let resource = self.directory.get_resource(id).await?;
        if resource.is_none() {
            warn!("Resource {} not found, dropping event", id);
        }
        Ok(resource)
    }
}
