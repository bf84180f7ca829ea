//! Typed resource locators
//!
//! Output ports carry their locators as loosely named custom fields
//! (`aws-s3-bucket-arn`, `aws-glue-table-arn`, ...). They are classified once,
//! when the port is decoded, into a list of `Locator`s with a declared kind.
//! Synthesizers only ever see the typed list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a locator addresses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocatorKind {
    /// Object storage: a bucket or a path inside one.
    Storage,
    /// Catalog entries: catalog, database or table.
    Catalog,
    /// Query engine workgroup.
    QueryWorkgroup,
    /// Anything the convention does not recognize, tagged with its scheme.
    Other(String),
}

impl LocatorKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "storage" => Self::Storage,
            "catalog" => Self::Catalog,
            "query-workgroup" => Self::QueryWorkgroup,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Storage => "storage",
            Self::Catalog => "catalog",
            Self::QueryWorkgroup => "query-workgroup",
            Self::Other(scheme) => scheme,
        }
    }
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved locator: the opaque value plus its declared kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    pub kind: LocatorKind,
    pub value: String,
}

impl Locator {
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn storage(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Storage, value)
    }

    pub fn catalog(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Catalog, value)
    }

    pub fn workgroup(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::QueryWorkgroup, value)
    }
}

/// Values of every locator of the given kind, in declaration order.
pub fn values_of<'a>(locators: &'a [Locator], kind: &LocatorKind) -> Vec<&'a str> {
    locators
        .iter()
        .filter(|l| &l.kind == kind)
        .map(|l| l.value.as_str())
        .collect()
}

/// Maps a locator scheme prefix to a kind, e.g. `arn:aws:s3` -> storage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemeRule {
    pub prefix: String,
    pub kind: String,
}

impl SchemeRule {
    pub fn new(prefix: impl Into<String>, kind: LocatorKind) -> Self {
        Self {
            prefix: prefix.into(),
            kind: kind.name().to_string(),
        }
    }
}

/// How locator fields are discovered in a port's custom map and classified.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocatorConvention {
    /// Custom field names must start with this to be read as locators.
    pub field_prefix: String,
    /// ...and end with this.
    pub field_suffix: String,
    /// Custom field carrying the resource type discriminator.
    pub type_field: String,
    /// First matching rule wins.
    pub schemes: Vec<SchemeRule>,
}

impl Default for LocatorConvention {
    fn default() -> Self {
        Self {
            field_prefix: "aws-".into(),
            field_suffix: "-arn".into(),
            type_field: "output-port-type".into(),
            schemes: vec![
                SchemeRule::new("arn:aws:s3", LocatorKind::Storage),
                SchemeRule::new("arn:aws:glue", LocatorKind::Catalog),
                SchemeRule::new("arn:aws:athena", LocatorKind::QueryWorkgroup),
            ],
        }
    }
}

impl LocatorConvention {
    pub fn is_locator_field(&self, field: &str) -> bool {
        field.len() >= self.field_prefix.len() + self.field_suffix.len()
            && field.starts_with(&self.field_prefix)
            && field.ends_with(&self.field_suffix)
    }

    pub fn classify(&self, value: &str) -> LocatorKind {
        for rule in &self.schemes {
            if value.starts_with(&rule.prefix) {
                return LocatorKind::from_name(&rule.kind);
            }
        }
        LocatorKind::Other(scheme_of(value).to_string())
    }

    /// Resolve every locator field of a custom map, in key order.
    pub fn resolve(&self, custom: &BTreeMap<String, String>) -> Vec<Locator> {
        custom
            .iter()
            .filter(|(field, _)| self.is_locator_field(field))
            .map(|(_, value)| Locator::new(self.classify(value), value.clone()))
            .collect()
    }
}

/// Everything before the third `:` of an arn-like value, or the whole value.
fn scheme_of(value: &str) -> &str {
    match value.match_indices(':').nth(2) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_schemes() {
        let c = LocatorConvention::default();
        assert_eq!(c.classify("arn:aws:s3:::bucket/path"), LocatorKind::Storage);
        assert_eq!(c.classify("arn:aws:glue:eu:1:table/db/t"), LocatorKind::Catalog);
        assert_eq!(
            c.classify("arn:aws:athena:eu:1:workgroup/primary"),
            LocatorKind::QueryWorkgroup
        );
        assert_eq!(
            c.classify("arn:aws:kinesis:eu:1:stream/x"),
            LocatorKind::Other("arn:aws:kinesis".into())
        );
    }

    #[test]
    fn locator_field_needs_prefix_and_suffix() {
        let c = LocatorConvention::default();
        assert!(c.is_locator_field("aws-s3-bucket-arn"));
        assert!(!c.is_locator_field("aws-role-name"));
        assert!(!c.is_locator_field("gcp-bucket-arn"));
        assert!(!c.is_locator_field("aws-arn"));
    }

    #[test]
    fn resolve_keeps_key_order() {
        let c = LocatorConvention::default();
        let mut custom = BTreeMap::new();
        custom.insert("aws-glue-table-arn".to_string(), "arn:aws:glue:t".to_string());
        custom.insert("aws-athena-workgroup-arn".to_string(), "arn:aws:athena:w".to_string());
        custom.insert("output-port-type".to_string(), "tabular-table".to_string());
        let locators = c.resolve(&custom);
        assert_eq!(
            locators,
            vec![Locator::workgroup("arn:aws:athena:w"), Locator::catalog("arn:aws:glue:t")]
        );
    }
}
