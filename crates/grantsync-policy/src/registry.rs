//! Synthesizer registry and trait definitions

use grantsync_core::{Error, Locator, PermissionStatement, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The Synthesizer trait. Implement this to support a new resource type.
///
/// Implementations are pure: identical locators must yield identical
/// statements in identical order.
pub trait Synthesizer: Send + Sync {
    /// Type tag this synthesizer is registered under (e.g. "generic-bucket").
    fn resource_type(&self) -> &str;

    /// Statements for the given typed locators, in fixed declaration order.
    fn synthesize(&self, locators: &[Locator]) -> Result<Vec<PermissionStatement>>;
}

pub struct SynthesizerRegistry {
    synthesizers: BTreeMap<String, Arc<dyn Synthesizer>>,
}

impl Default for SynthesizerRegistry {
    fn default() -> Self { Self::new() }
}

impl SynthesizerRegistry {
    pub fn new() -> Self { Self { synthesizers: BTreeMap::new() } }

    /// Register under the synthesizer's own type tag. Replaces any existing entry.
    pub fn register(&mut self, synthesizer: impl Synthesizer + 'static) {
        let name = synthesizer.resource_type().to_string();
        self.synthesizers.insert(name, Arc::new(synthesizer));
    }

    /// Register under an additional type tag.
    pub fn register_alias(&mut self, alias: impl Into<String>, synthesizer: impl Synthesizer + 'static) {
        self.synthesizers.insert(alias.into(), Arc::new(synthesizer));
    }

    pub fn remove(&mut self, resource_type: &str) -> bool {
        self.synthesizers.remove(resource_type).is_some()
    }

    pub fn get(&self, resource_type: &str) -> Option<Arc<dyn Synthesizer>> {
        self.synthesizers.get(resource_type).cloned()
    }

    pub fn synthesize(&self, resource_type: &str, locators: &[Locator]) -> Result<Vec<PermissionStatement>> {
        match self.synthesizers.get(resource_type) {
            Some(s) => {
                let statements = s.synthesize(locators)?;
                debug!("{}: {} statements from {} locators", resource_type, statements.len(), locators.len());
                Ok(statements)
            }
            None => Err(Error::UnsupportedResourceType(resource_type.to_string())),
        }
    }

    /// Registered type tags, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.synthesizers.keys().map(|s| s.as_str()).collect()
    }
}
