//! Grantsync configuration
//!
//! Every setting in one place. Loaded from TOML at startup, falls back to
//! defaults when no config file exists.

use grantsync_core::LocatorConvention;
use grantsync_grants::CoordinatorSettings;
use grantsync_registry::{DirSecrets, EnvSecrets, RegistryEndpoints, SecretSource};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Names the config file when `--config` is not given.
pub const CONFIG_ENV: &str = "GRANTSYNC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "grantsync.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrantsyncConfig {
    pub registry: RegistryConfig,
    pub secrets: SecretsConfig,
    /// How locator fields are found on output ports.
    pub locators: LocatorConvention,
    pub grants: GrantsConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    /// Secret name of the registry API key.
    pub api_key_secret: String,
    pub events_path: String,
    pub agreements_path: String,
    pub resources_path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let endpoints = RegistryEndpoints::default();
        Self {
            base_url: "https://api.datamesh-manager.com/api".into(),
            api_key_secret: "registry_api_key".into(),
            events_path: endpoints.events,
            agreements_path: endpoints.agreements,
            resources_path: endpoints.resources,
        }
    }
}

impl RegistryConfig {
    pub fn endpoints(&self) -> RegistryEndpoints {
        RegistryEndpoints {
            events: self.events_path.clone(),
            agreements: self.agreements_path.clone(),
            resources: self.resources_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    Env,
    Dir,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretsConfig {
    pub source: SecretBackend,
    /// Directory for `source = "dir"`.
    pub dir: PathBuf,
    /// Variable prefix for `source = "env"`.
    pub env_prefix: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            source: SecretBackend::Env,
            dir: PathBuf::from("/run/secrets"),
            env_prefix: "GRANTSYNC_".into(),
        }
    }
}

impl SecretsConfig {
    pub fn source(&self) -> Box<dyn SecretSource> {
        match self.source {
            SecretBackend::Env => Box::new(EnvSecrets::new(self.env_prefix.clone())),
            SecretBackend::Dir => Box::new(DirSecrets::new(&self.dir)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrantsConfig {
    #[serde(flatten)]
    pub coordinator: CoordinatorSettings,
    /// Root of the local permission store.
    pub store_dir: PathBuf,
}

impl Default for GrantsConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorSettings::default(),
            store_dir: PathBuf::from("state/grants"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub cursor_path: PathBuf,
    pub spool_dir: PathBuf,
    pub group_id: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cursor_path: PathBuf::from("state/cursor"),
            spool_dir: PathBuf::from("state/spool"),
            group_id: grantsync_feed::DEFAULT_GROUP_ID.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set.
    pub filter: String,
    pub format: LogFormat,
    /// Also write logs here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "grantsync=info".into(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl GrantsyncConfig {
    /// Load from `path`. A missing file yields defaults, a malformed one fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Explicit path, else `$GRANTSYNC_CONFIG`, else `grantsync.toml`.
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Coordinator settings with the type field taken from the locator convention.
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            type_field: self.locators.type_field.clone(),
            ..self.grants.coordinator.clone()
        }
    }
}
