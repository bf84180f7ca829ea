//! Tests for grantsync-policy: SynthesizerRegistry, builtin synthesizers, documents

use grantsync_core::*;
use grantsync_policy::*;

const BUCKET: &str = "arn:aws:s3:one:two:three";
const FOLDER: &str = "arn:aws:s3:one:two:three/folder";
const CATALOG: &str = "arn:aws:glue:catalog";
const DATABASE: &str = "arn:aws:glue:database/name";
const TABLE: &str = "arn:aws:glue:table/name/name";
const WORKGROUP: &str = "arn:aws:athena:workgroup/primary";

fn table_locators() -> Vec<Locator> {
    vec![
        Locator::storage(FOLDER),
        Locator::catalog(CATALOG),
        Locator::catalog(DATABASE),
        Locator::catalog(TABLE),
        Locator::workgroup(WORKGROUP),
    ]
}

// ===========================================================================
// SynthesizerRegistry
// ===========================================================================

#[test]
fn registry_default_lists_types_and_aliases() {
    let reg = create_default_registry();
    assert_eq!(
        reg.list(),
        vec!["generic-bucket", "glue_table", "s3_bucket", "tabular-table"]
    );
}

#[test]
fn registry_new_is_empty() {
    let reg = SynthesizerRegistry::new();
    assert!(reg.list().is_empty());
    assert!(reg.get("generic-bucket").is_none());
}

#[test]
fn registry_remove() {
    let mut reg = create_default_registry();
    assert!(reg.remove("s3_bucket"));
    assert!(!reg.remove("s3_bucket"));
    assert!(reg.get("s3_bucket").is_none());
    assert!(reg.get("generic-bucket").is_some());
}

#[test]
fn unsupported_type_fails_for_any_locators() {
    let reg = create_default_registry();
    let inputs: Vec<Vec<Locator>> = vec![
        vec![],
        vec![Locator::storage(BUCKET)],
        table_locators(),
        vec![Locator::new(LocatorKind::Other("arn:aws:iam".into()), "aws:arn:iam:one:two:three")],
    ];
    for locators in inputs {
        let err = reg.synthesize("unknown-type", &locators).unwrap_err();
        assert!(matches!(err, Error::UnsupportedResourceType(ref t) if t == "unknown-type"));
        assert!(err.is_validation());
    }
}

#[test]
fn custom_synthesizer_can_be_registered() {
    struct ReadOnlyWorkgroup;
    impl Synthesizer for ReadOnlyWorkgroup {
        fn resource_type(&self) -> &str { "query-only" }
        fn synthesize(&self, locators: &[Locator]) -> Result<Vec<PermissionStatement>> {
            Ok(vec![PermissionStatement::allow(
                ["athena:GetQueryResults"],
                values_of(locators, &LocatorKind::QueryWorkgroup),
            )])
        }
    }

    let mut reg = create_default_registry();
    reg.register(ReadOnlyWorkgroup);
    let statements = reg.synthesize("query-only", &table_locators()).unwrap();
    assert_eq!(statements[0].resources, vec![WORKGROUP]);
}

// ===========================================================================
// generic-bucket
// ===========================================================================

#[test]
fn generic_bucket_single_statement() {
    let reg = create_default_registry();
    let statements = reg
        .synthesize("generic-bucket", &[Locator::storage("loc:bucket:A")])
        .unwrap();
    assert_eq!(
        statements,
        vec![PermissionStatement::allow(
            ["s3:GetBucketLocation", "s3:GetObject", "s3:ListBucket"],
            ["loc:bucket:A", "loc:bucket:A/*"],
        )]
    );
}

#[test]
fn generic_bucket_is_deterministic() {
    let reg = create_default_registry();
    let locators = [Locator::storage("loc:bucket:A")];
    let first = reg.synthesize("generic-bucket", &locators).unwrap();
    for _ in 0..10 {
        assert_eq!(reg.synthesize("generic-bucket", &locators).unwrap(), first);
    }
}

#[test]
fn generic_bucket_many_buckets_keep_order() {
    let reg = create_default_registry();
    let statements = reg
        .synthesize(
            "generic-bucket",
            &[Locator::storage("arn:aws:s3:::b1"), Locator::storage("arn:aws:s3:::b2")],
        )
        .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].resources,
        vec![
            "arn:aws:s3:::b1",
            "arn:aws:s3:::b2",
            "arn:aws:s3:::b1/*",
            "arn:aws:s3:::b2/*"
        ]
    );
}

#[test]
fn generic_bucket_alias_matches() {
    let reg = create_default_registry();
    let locators = [Locator::storage(BUCKET)];
    assert_eq!(
        reg.synthesize("s3_bucket", &locators).unwrap(),
        reg.synthesize("generic-bucket", &locators).unwrap()
    );
}

#[test]
fn generic_bucket_without_storage_is_missing_locator() {
    let reg = create_default_registry();
    let err = reg
        .synthesize("generic-bucket", &[Locator::catalog(CATALOG)])
        .unwrap_err();
    assert!(matches!(err, Error::MissingLocator { .. }));
}

// ===========================================================================
// tabular-table
// ===========================================================================

#[test]
fn tabular_table_four_statements_in_order() {
    let reg = create_default_registry();
    let statements = reg.synthesize("tabular-table", &table_locators()).unwrap();
    assert_eq!(
        statements,
        vec![
            PermissionStatement::allow(["s3:ListBucket"], [BUCKET]),
            PermissionStatement::allow(["s3:GetObject"], [format!("{}/*", FOLDER)]),
            PermissionStatement::allow(["glue:GetTable"], [CATALOG, DATABASE, TABLE]),
            PermissionStatement::allow(["athena:StartQueryExecution"], [WORKGROUP]),
        ]
    );
}

#[test]
fn tabular_table_alias_matches() {
    let reg = create_default_registry();
    assert_eq!(
        reg.synthesize("glue_table", &table_locators()).unwrap(),
        reg.synthesize("tabular-table", &table_locators()).unwrap()
    );
}

#[test]
fn tabular_table_missing_workgroup() {
    let reg = create_default_registry();
    let mut locators = table_locators();
    locators.retain(|l| l.kind != LocatorKind::QueryWorkgroup);
    let err = reg.synthesize("tabular-table", &locators).unwrap_err();
    assert_eq!(
        err.to_string(),
        "resource type tabular-table requires at least one query-workgroup locator"
    );
}

// ===========================================================================
// Grants and documents
// ===========================================================================

#[test]
fn synthesize_grant_names_by_agreement() {
    let reg = create_default_registry();
    let grant = synthesize_grant(
        &reg,
        GrantId::for_agreement(DEFAULT_GRANT_PREFIX, "123-123-321"),
        "generic-bucket",
        &[Locator::storage(BUCKET)],
    )
    .unwrap();
    assert_eq!(grant.id.as_str(), "DataUsageAgreement_123-123-321");
    assert_eq!(grant.statements.len(), 1);
}

#[test]
fn document_is_byte_stable() {
    let reg = create_default_registry();
    let render = || {
        let grant = synthesize_grant(&reg, GrantId::new("g"), "tabular-table", &table_locators()).unwrap();
        PolicyDocument::from(&grant).to_json().unwrap()
    };
    let first = render();
    assert_eq!(render(), first);
    assert!(first.starts_with(r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":["s3:ListBucket"]"#));
}

#[test]
fn document_roundtrips_for_comparison() {
    let doc = PolicyDocument::new(vec![PermissionStatement::allow(["s3:GetObject"], ["x/*"])]);
    let back: PolicyDocument = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
    assert_eq!(back, doc);
}
