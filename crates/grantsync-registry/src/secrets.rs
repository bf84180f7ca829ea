//! Secret retrieval for the registry API key

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("failed to read secret {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies a secret value by name.
pub trait SecretSource: Send + Sync {
    fn get_secret(&self, name: &str) -> Result<String, SecretError>;
}

/// Secrets from environment variables. `registry_api_key` with prefix
/// `GRANTSYNC_` is read from `GRANTSYNC_REGISTRY_API_KEY`.
#[derive(Clone, Debug, Default)]
pub struct EnvSecrets {
    prefix: String,
}

impl EnvSecrets {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn var_name(&self, name: &str) -> String {
        let mangled: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", self.prefix, mangled)
    }
}

impl SecretSource for EnvSecrets {
    fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        std::env::var(self.var_name(name)).map_err(|_| SecretError::NotFound(name.to_string()))
    }
}

/// Secrets as files in a directory, one file per secret name.
#[derive(Clone, Debug)]
pub struct DirSecrets {
    dir: PathBuf,
}

impl DirSecrets {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }
}

impl SecretSource for DirSecrets {
    fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(SecretError::NotFound(name.to_string()));
        }
        match std::fs::read_to_string(self.dir.join(name)) {
            Ok(value) => Ok(value.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretError::NotFound(name.to_string()))
            }
            Err(source) => Err(SecretError::Read { name: name.to_string(), source }),
        }
    }
}
