//! Grantsync Registry - clients for the external agreement registry
//!
//! The directory (agreements and data products), the ordered event feed and
//! secret retrieval for the registry API key.

pub mod client;
pub mod directory;
pub mod secrets;
pub mod wire;

pub use client::{RegistryClient, RegistryEndpoints};
pub use directory::{EventFeed, RegistryDirectory, RegistryError, RegistryResult};
pub use secrets::{DirSecrets, EnvSecrets, SecretError, SecretSource};
