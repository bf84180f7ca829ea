//! Tests for grantsync-core: grant ids, records, events, errors

use grantsync_core::*;
use std::collections::BTreeMap;

// ===========================================================================
// GrantId
// ===========================================================================

#[test]
fn grant_id_is_a_pure_function_of_the_agreement() {
    let a = GrantId::for_agreement(DEFAULT_GRANT_PREFIX, "123-123-321");
    let b = GrantId::for_agreement(DEFAULT_GRANT_PREFIX, "123-123-321");
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "DataUsageAgreement_123-123-321");
    assert_eq!(format!("{}", a), "DataUsageAgreement_123-123-321");
}

#[test]
fn grant_id_differs_per_agreement() {
    let a = GrantId::for_agreement("p_", "one");
    let b = GrantId::for_agreement("p_", "two");
    assert_ne!(a, b);
}

#[test]
fn grant_id_from_str() {
    let id: GrantId = "x".into();
    assert_eq!(id.as_str(), "x");
}

// ===========================================================================
// Resource / OutputPort
// ===========================================================================

fn custom(pairs: &[(&str, &str)]) -> CustomFields {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn required_custom_present() {
    let r = Resource {
        id: "consumer".into(),
        custom: custom(&[("identity-role-name", "role-a")]),
        output_ports: vec![],
    };
    assert_eq!(r.required_custom("identity-role-name").unwrap(), "role-a");
}

#[test]
fn required_custom_missing_is_validation() {
    let r = Resource {
        id: "consumer".into(),
        ..Default::default()
    };
    let err = r.required_custom("identity-role-name").unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("identity-role-name"));
}

#[test]
fn output_port_decoded_once_with_typed_locators() {
    let port = OutputPort::from_custom(
        "port-1",
        custom(&[
            ("output-port-type", "generic-bucket"),
            ("aws-s3-bucket-arn", "arn:aws:s3:::bucket"),
            ("description", "not a locator"),
        ]),
        &LocatorConvention::default(),
    );
    assert_eq!(port.resource_type.as_deref(), Some("generic-bucket"));
    assert_eq!(port.locators, vec![Locator::storage("arn:aws:s3:::bucket")]);
    assert_eq!(port.custom.len(), 3);
}

#[test]
fn output_port_without_type_fails_validation() {
    let port = OutputPort::from_custom("p", BTreeMap::new(), &LocatorConvention::default());
    let err = port.required_type("output-port-type").unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn output_port_lookup_by_id() {
    let r = Resource {
        id: "provider".into(),
        custom: BTreeMap::new(),
        output_ports: vec![
            OutputPort {
                id: "a".into(),
                ..Default::default()
            },
            OutputPort {
                id: "b".into(),
                ..Default::default()
            },
        ],
    };
    assert_eq!(r.output_port("b").unwrap().id, "b");
    let err = r.output_port("c").unwrap_err();
    assert!(matches!(err, Error::OutputPortNotFound { .. }));
    assert!(!err.is_validation());
}

// ===========================================================================
// AgreementPatch
// ===========================================================================

#[test]
fn patch_serializes_only_set_fields() {
    let patch = AgreementPatch::tags(["integration", "integration-inactive"]);
    let fields = patch.to_fields().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(
        fields["tags"],
        serde_json::json!(["integration", "integration-inactive"])
    );
}

#[test]
fn patch_with_custom() {
    let patch = AgreementPatch::tags(["integration", "integration-active"])
        .with_custom(custom(&[("policy-name", "DataUsageAgreement_1")]));
    let fields = patch.to_fields().unwrap();
    assert_eq!(fields["custom"]["policy-name"], "DataUsageAgreement_1");
    assert_eq!(fields["tags"], serde_json::json!(["integration", "integration-active"]));
}

// ===========================================================================
// PermissionStatement
// ===========================================================================

#[test]
fn statement_serializes_in_policy_shape() {
    let s = PermissionStatement::allow(["s3:GetObject"], ["arn:aws:s3:::b/*"]);
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(
        json,
        r#"{"Effect":"Allow","Action":["s3:GetObject"],"Resource":["arn:aws:s3:::b/*"]}"#
    );
}

// ===========================================================================
// Event
// ===========================================================================

#[test]
fn event_type_classification() {
    assert_eq!(EventType::from_type_str(AGREEMENT_ACTIVATED), EventType::Activated);
    assert_eq!(EventType::from_type_str(AGREEMENT_DEACTIVATED), EventType::Deactivated);
    assert_eq!(
        EventType::from_type_str("com.datamesh-manager.events.OtherEvent"),
        EventType::Other
    );
}

#[test]
fn event_preserves_unknown_attributes() {
    let raw = r#"{"specversion":"1.0","id":"e-1","source":"registry","type":"com.datamesh-manager.events.DataUsageAgreementActivatedEvent","time":"2024-01-01T00:00:00Z","data":{"id":"a-1","info":"x"}}"#;
    let event: Event = serde_json::from_str(raw).unwrap();
    assert_eq!(event.id, "e-1");
    assert_eq!(event.event_type(), EventType::Activated);
    assert_eq!(event.agreement_id().unwrap(), "a-1");

    let back: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
    let orig: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(back, orig);
}

#[test]
fn event_without_data_has_no_agreement() {
    let event: Event =
        serde_json::from_str(r#"{"id":"e-2","type":"com.datamesh-manager.events.OtherEvent"}"#).unwrap();
    assert!(event.data.is_none());
    let err = event.agreement_id().unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn event_with_foreign_payload_still_decodes() {
    let raw = r#"[
        {"id":"e-1","type":"com.datamesh-manager.events.DataProductCreatedEvent","data":{"dataProductId":"dp"}},
        {"id":"e-2","type":"com.datamesh-manager.events.TeamRenamedEvent","data":"team-7"},
        {"id":"e-3","type":"com.datamesh-manager.events.DataUsageAgreementActivatedEvent","data":{"id":"a-3"}}
    ]"#;
    let events: Vec<Event> = serde_json::from_str(raw).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].data.as_ref().unwrap()["dataProductId"], "dp");
    assert!(events[0].agreement_id().unwrap_err().is_validation());
    assert!(events[1].agreement_id().is_err());
    assert_eq!(events[2].agreement_id().unwrap(), "a-3");

    let back: serde_json::Value = serde_json::from_str(&events[0].to_json().unwrap()).unwrap();
    assert_eq!(back["data"], serde_json::json!({"dataProductId": "dp"}));
}

#[test]
fn lifecycle_event_with_numeric_id_has_no_agreement() {
    let event: Event = serde_json::from_str(
        r#"{"id":"e-4","type":"com.datamesh-manager.events.DataUsageAgreementDeactivatedEvent","data":{"id":42}}"#,
    )
    .unwrap();
    assert_eq!(event.event_type(), EventType::Deactivated);
    assert!(event.agreement_id().unwrap_err().is_validation());
}

#[test]
fn event_constructors() {
    let e = Event::deactivated("e-3", "a-3");
    assert_eq!(e.event_type(), EventType::Deactivated);
    assert_eq!(e.agreement_id().unwrap(), "a-3");
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display() {
    let e = Error::UnsupportedResourceType("unknown-type".into());
    assert_eq!(e.to_string(), "unsupported resource type: unknown-type");
    assert!(e.is_validation());

    let e = Error::missing_locator("tabular-table", LocatorKind::Catalog);
    assert_eq!(
        e.to_string(),
        "resource type tabular-table requires at least one catalog locator"
    );
}
