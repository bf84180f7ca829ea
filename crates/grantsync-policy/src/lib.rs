//! Grantsync Policy - resource type to permission statement synthesis
//!
//! Each resource type is a self-contained module in src/synthesizers/.
//! To add a type: create the file, implement Synthesizer, register below.
//! There is no fallback: an unregistered type is an error.

pub mod document;
pub mod registry;
pub mod synthesizers;

pub use document::{PolicyDocument, POLICY_VERSION};
pub use registry::{Synthesizer, SynthesizerRegistry};

use grantsync_core::{GrantId, Locator, PermissionGrant, Result};

/// Create the registry with all builtin resource types.
///
/// `s3_bucket` and `glue_table` are the names older output ports were
/// declared with; they are registered explicitly as aliases.
pub fn create_default_registry() -> SynthesizerRegistry {
    let mut registry = SynthesizerRegistry::new();

    registry.register(synthesizers::bucket::BucketSynthesizer);
    registry.register(synthesizers::table::TableSynthesizer);

    registry.register_alias("s3_bucket", synthesizers::bucket::BucketSynthesizer);
    registry.register_alias("glue_table", synthesizers::table::TableSynthesizer);

    registry
}

/// Synthesize the named grant for an agreement.
pub fn synthesize_grant(
    registry: &SynthesizerRegistry,
    grant_id: GrantId,
    resource_type: &str,
    locators: &[Locator],
) -> Result<PermissionGrant> {
    let statements = registry.synthesize(resource_type, locators)?;
    Ok(PermissionGrant {
        id: grant_id,
        statements,
    })
}
