//! Serialization contract: determinism modulo UUIDs, validation
//! completeness, and the fixed payload layout.

use pretty_assertions::assert_eq;
use profilesmith_core::ExportError;
use profilesmith_core::ModifiedValueStore;
use profilesmith_core::Parameter;
use profilesmith_core::ParameterType;
use profilesmith_core::ParameterValue;
use profilesmith_core::ProfileMeta;
use profilesmith_core::Section;
use profilesmith_core::ValueMeta;
use profilesmith_core::profile;

fn wifi_section() -> Section {
    let mut section = Section::new("wifi");
    let mut ssid = Parameter::new("SSID_STR", ParameterType::String);
    ssid.required = true;
    section.parameters.push(ssid);
    section
        .parameters
        .push(Parameter::new("AutoJoin", ParameterType::Boolean));
    section
}

fn meta() -> ProfileMeta {
    ProfileMeta {
        name: "Office".to_string(),
        identifier: "com.example.office".to_string(),
        description: "Office fleet".to_string(),
    }
}

fn populated_store() -> ModifiedValueStore {
    let mut store = ModifiedValueStore::new();
    store.set(
        "wifi",
        "SSID_STR",
        Some(ParameterValue::Text("CorpNet".to_string())),
        ValueMeta::typed(ParameterType::String).required(),
    );
    store.set(
        "wifi",
        "AutoJoin",
        Some(ParameterValue::Bool(true)),
        ValueMeta::typed(ParameterType::Boolean),
    );
    store
}

/// Drop the value line after every UUID-bearing key so two exports can be
/// compared structurally.
fn strip_generated(doc: &str) -> Vec<String> {
    let lines: Vec<&str> = doc.lines().collect();
    let mut out = Vec::new();
    let mut skip_next = false;
    for line in lines {
        if skip_next {
            skip_next = false;
            continue;
        }
        if line.contains("<key>PayloadUUID</key>") || line.contains("<key>PayloadIdentifier</key>")
        {
            skip_next = true;
        }
        out.push(line.to_string());
    }
    out
}

#[test]
fn test_output_is_deterministic_modulo_uuids() {
    let store = populated_store();
    let sections = [wifi_section()];
    let first = profile::serialize(&meta(), &sections, &store).unwrap();
    let second = profile::serialize(&meta(), &sections, &store).unwrap();

    assert_ne!(first, second, "UUIDs must be fresh per export");
    assert_eq!(strip_generated(&first), strip_generated(&second));
}

#[test]
fn test_validation_reports_every_violation_at_once() {
    let mut store = ModifiedValueStore::new();
    store.set(
        "wifi",
        "AutoJoin",
        Some(ParameterValue::Bool(true)),
        ValueMeta::typed(ParameterType::Boolean),
    );
    let bad_meta = ProfileMeta {
        name: String::new(),
        identifier: "bad id!".to_string(),
        description: String::new(),
    };

    let err = profile::serialize(&bad_meta, &[wifi_section()], &store).unwrap_err();
    let ExportError::Validation(violations) = err;
    assert_eq!(violations.len(), 3);
}

#[test]
fn test_parameters_serialize_in_set_order() {
    let mut store = ModifiedValueStore::new();
    store.set(
        "wifi",
        "AutoJoin",
        Some(ParameterValue::Bool(true)),
        ValueMeta::typed(ParameterType::Boolean),
    );
    store.set(
        "wifi",
        "SSID_STR",
        Some(ParameterValue::Text("CorpNet".to_string())),
        ValueMeta::typed(ParameterType::String).required(),
    );

    let doc = profile::serialize(&meta(), &[wifi_section()], &store).unwrap();
    let auto_join = doc.find("<key>AutoJoin</key>").unwrap();
    let ssid = doc.find("<key>SSID_STR</key>").unwrap();
    assert!(auto_join < ssid, "set order must survive serialization");
}

#[test]
fn test_document_skeleton() {
    let doc = profile::serialize(&meta(), &[wifi_section()], &populated_store()).unwrap();

    assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(doc.contains(
        "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
         \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">"
    ));
    assert!(doc.contains("<plist version=\"1.0\">"));
    assert!(doc.contains("<key>PayloadType</key>\n\t<string>Configuration</string>"));
    assert!(doc.contains("<key>PayloadDisplayName</key>\n\t<string>Office</string>"));
    assert!(doc.contains("<key>PayloadVersion</key>\n\t<integer>1</integer>"));
    assert!(doc.contains("<key>PayloadFormat</key>\n\t<integer>1</integer>"));
    assert!(doc.contains("<key>PayloadType</key>\n\t\t\t<string>wifi</string>"));
    assert!(doc.contains("<key>AutoJoin</key>\n\t\t\t<true/>"));
    assert!(doc.ends_with("</plist>\n"));
}

#[test]
fn test_special_characters_are_escaped() {
    let mut store = ModifiedValueStore::new();
    store.set(
        "wifi",
        "SSID_STR",
        Some(ParameterValue::Text("Guest & <Staff>".to_string())),
        ValueMeta::typed(ParameterType::String).required(),
    );

    let doc = profile::serialize(&meta(), &[wifi_section()], &store).unwrap();
    assert!(doc.contains("<string>Guest &amp; &lt;Staff&gt;</string>"));
}
