//! generic-bucket - read access to whole storage buckets

use super::{objects_under, required};
use crate::registry::Synthesizer;
use grantsync_core::{Locator, LocatorKind, PermissionStatement, Result};

pub const RESOURCE_TYPE: &str = "generic-bucket";

const ACTIONS: [&str; 3] = ["s3:GetBucketLocation", "s3:GetObject", "s3:ListBucket"];

pub struct BucketSynthesizer;

impl Synthesizer for BucketSynthesizer {
    fn resource_type(&self) -> &str {
        RESOURCE_TYPE
    }

    /// One statement: the buckets themselves for list/location, then every
    /// bucket's object scope for reads.
    fn synthesize(&self, locators: &[Locator]) -> Result<Vec<PermissionStatement>> {
        let buckets = required(RESOURCE_TYPE, locators, LocatorKind::Storage)?;
        let resources = buckets
            .iter()
            .map(|b| b.to_string())
            .chain(buckets.iter().map(|b| objects_under(b)));
        Ok(vec![PermissionStatement::allow(ACTIONS, resources)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_storage_locators_are_ignored() {
        let statements = BucketSynthesizer
            .synthesize(&[
                Locator::catalog("arn:aws:glue:t"),
                Locator::storage("arn:aws:s3:::b"),
            ])
            .unwrap();
        assert_eq!(statements[0].resources, vec!["arn:aws:s3:::b", "arn:aws:s3:::b/*"]);
    }

    #[test]
    fn needs_a_bucket() {
        let err = BucketSynthesizer.synthesize(&[]).unwrap_err();
        assert!(err.is_validation());
    }
}
