//! Builtin synthesizers, one module per resource type.

pub mod bucket;
pub mod table;

use grantsync_core::{values_of, Error, Locator, LocatorKind, Result};

/// Locator values of one kind; a recognized type without them is invalid.
pub(crate) fn required<'a>(
    resource_type: &str,
    locators: &'a [Locator],
    kind: LocatorKind,
) -> Result<Vec<&'a str>> {
    let values = values_of(locators, &kind);
    if values.is_empty() {
        return Err(Error::missing_locator(resource_type, kind));
    }
    Ok(values)
}

/// Object scope of a storage locator.
pub(crate) fn objects_under(locator: &str) -> String {
    format!("{}/*", locator)
}
