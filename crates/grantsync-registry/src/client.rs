//! HTTP client for the registry API

use crate::directory::{EventFeed, RegistryDirectory, RegistryError, RegistryResult};
use crate::wire::{merge_agreement, AgreementRecord, ResourceRecord};
use async_trait::async_trait;
use grantsync_core::{Agreement, AgreementPatch, Event, LocatorConvention, Resource};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const EVENTS_MEDIA_TYPE: &str = "application/cloudevents-batch+json";
const JSON_MEDIA_TYPE: &str = "application/json";

/// Paths of the registry resources, relative to the base url.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryEndpoints {
    pub events: String,
    pub agreements: String,
    pub resources: String,
}

impl Default for RegistryEndpoints {
    fn default() -> Self {
        Self {
            events: "/events".into(),
            agreements: "/agreements".into(),
            resources: "/resources".into(),
        }
    }
}

pub struct RegistryClient {
    client: Client,
    api_key: String,
    base_url: String,
    endpoints: RegistryEndpoints,
    convention: LocatorConvention,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints: RegistryEndpoints::default(),
            convention: LocatorConvention::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: RegistryEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_convention(mut self, convention: LocatorConvention) -> Self {
        self.convention = convention;
        self
    }

    fn url(&self, path: &str) -> RegistryResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| RegistryError::Url(format!("{}: {}", raw, e)))
    }

    fn record_url(&self, path: &str, id: &str) -> RegistryResult<Url> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::Url(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    pub fn events_url(&self, last_event_id: Option<&str>) -> RegistryResult<Url> {
        let mut url = self.url(&self.endpoints.events)?;
        if let Some(id) = last_event_id {
            url.query_pairs_mut().append_pair("lastEventId", id);
        }
        Ok(url)
    }

    pub fn agreement_url(&self, id: &str) -> RegistryResult<Url> {
        self.record_url(&self.endpoints.agreements, id)
    }

    pub fn resource_url(&self, id: &str) -> RegistryResult<Url> {
        self.record_url(&self.endpoints.resources, id)
    }

    async fn get(&self, url: Url, accept: &str) -> RegistryResult<Response> {
        debug!("GET {}", url);
        Ok(self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .header("accept", accept)
            .send()
            .await?)
    }

    /// GET a record by id. 404 is absence, any other failure is an error.
    async fn get_record(&self, url: Url) -> RegistryResult<Option<Value>> {
        let response = self.get(url.clone(), JSON_MEDIA_TYPE).await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!("No record at {}", url);
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        Ok(Some(response.json::<Value>().await?))
    }
}

async fn ensure_success(response: Response) -> RegistryResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RegistryError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RegistryDirectory for RegistryClient {
    async fn get_agreement(&self, id: &str) -> RegistryResult<Option<Agreement>> {
        match self.get_record(self.agreement_url(id)?).await? {
            Some(value) => {
                let record: AgreementRecord = serde_json::from_value(value)?;
                Ok(Some(record.into_agreement()))
            }
            None => Ok(None),
        }
    }

    async fn get_resource(&self, id: &str) -> RegistryResult<Option<Resource>> {
        match self.get_record(self.resource_url(id)?).await? {
            Some(value) => {
                let record: ResourceRecord = serde_json::from_value(value)?;
                Ok(Some(record.into_resource(id, &self.convention)))
            }
            None => Ok(None),
        }
    }

    async fn patch_agreement(&self, id: &str, patch: &AgreementPatch) -> RegistryResult<()> {
        let url = self.agreement_url(id)?;
        let current = self
            .get_record(url.clone())
            .await?
            .ok_or_else(|| RegistryError::AgreementGone(id.to_string()))?;

        let merged = merge_agreement(current, patch.to_fields()?);

        debug!("PUT {}", url);
        let response = self
            .client
            .put(url)
            .header("x-api-key", &self.api_key)
            .header("accept", JSON_MEDIA_TYPE)
            .header("content-type", JSON_MEDIA_TYPE)
            .json(&merged)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl EventFeed for RegistryClient {
    async fn next_batch(&self, last_event_id: Option<&str>) -> RegistryResult<Vec<Event>> {
        let url = self.events_url(last_event_id)?;
        let response = ensure_success(self.get(url, EVENTS_MEDIA_TYPE).await?).await?;
        let events: Vec<Event> = serde_json::from_slice(&response.bytes().await?)?;
        debug!("Fetched {} events after {:?}", events.len(), last_event_id);
        Ok(events)
    }
}
