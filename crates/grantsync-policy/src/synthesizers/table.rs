//! tabular-table - query access to a catalog table backed by a storage folder
//!
//! Four statements, always in this order:
//! 1. list the bucket holding each storage folder
//! 2. read objects under each folder
//! 3. read the catalog entries (catalog, database, table) as given
//! 4. run queries in the workgroup

use super::{objects_under, required};
use crate::registry::Synthesizer;
use grantsync_core::{Locator, LocatorKind, PermissionStatement, Result};

pub const RESOURCE_TYPE: &str = "tabular-table";

pub struct TableSynthesizer;

/// Bucket-level locator of a storage path: everything before the first `/`.
pub fn bucket_of(locator: &str) -> &str {
    locator.split('/').next().unwrap_or(locator)
}

impl Synthesizer for TableSynthesizer {
    fn resource_type(&self) -> &str {
        RESOURCE_TYPE
    }

    fn synthesize(&self, locators: &[Locator]) -> Result<Vec<PermissionStatement>> {
        let folders = required(RESOURCE_TYPE, locators, LocatorKind::Storage)?;
        let catalog = required(RESOURCE_TYPE, locators, LocatorKind::Catalog)?;
        let workgroups = required(RESOURCE_TYPE, locators, LocatorKind::QueryWorkgroup)?;

        Ok(vec![
            PermissionStatement::allow(["s3:ListBucket"], folders.iter().map(|f| bucket_of(f))),
            PermissionStatement::allow(["s3:GetObject"], folders.iter().map(|f| objects_under(f))),
            PermissionStatement::allow(["glue:GetTable"], catalog),
            PermissionStatement::allow(["athena:StartQueryExecution"], workgroups),
        ])
    }
}
