//! Full pipeline: resolve, normalize, modify, export.

use crate::suite::common::canned_corpus;
use crate::suite::common::test_config;
use pretty_assertions::assert_eq;
use profilesmith_core::ParameterValue;
use profilesmith_core::Pipeline;
use profilesmith_core::ProfileMeta;
use tempfile::TempDir;

fn profile_meta() -> ProfileMeta {
    ProfileMeta {
        name: "Office".to_string(),
        identifier: "com.example.office".to_string(),
        description: "Office fleet".to_string(),
    }
}

#[tokio::test]
async fn test_nested_groupings_flatten_to_three_sections() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = Pipeline::with_source(test_config(dir.path()), canned_corpus());

    let sections = pipeline.load_sections(false).await.unwrap();
    let real: Vec<_> = sections.iter().filter(|s| !s.synthetic).collect();
    assert_eq!(real.len(), 3);
    assert_eq!(real[0].identifier, "wifi");
    assert_eq!(real[0].parent_identifier.as_deref(), Some("networking"));
    assert_eq!(real[1].identifier, "vpn");
    assert_eq!(real[2].identifier, "mail");
    assert_eq!(real[2].parent_identifier, None);

    let wifi = pipeline.find_section("WiFi").unwrap();
    assert_eq!(wifi.parameters.len(), 2);
    assert_eq!(wifi.parameters[0].key, "SSID_STR");
    assert!(wifi.parameters[0].required);
}

#[tokio::test]
async fn test_modify_then_export_produces_one_payload() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = Pipeline::with_source(test_config(dir.path()), canned_corpus());
    pipeline.load_sections(false).await.unwrap();

    pipeline.set_value(
        "wifi",
        "SSID_STR",
        Some(ParameterValue::Text("CorpNet".to_string())),
    );

    let preview = pipeline.preview();
    assert_eq!(preview.summary, "1 parameter(s) modified across 1 section(s)");
    assert_eq!(preview.sections[0].section_id, "wifi");
    assert_eq!(preview.sections[0].entries[0].value, "CorpNet");

    let doc = pipeline.export(&profile_meta()).unwrap();
    // One payload dict inside PayloadContent plus the root dict.
    assert_eq!(doc.matches("<key>PayloadVersion</key>").count(), 2);
    assert_eq!(doc.matches("<string>wifi</string>").count(), 1);
    assert!(doc.contains("<key>SSID_STR</key>\n\t\t\t<string>CorpNet</string>"));
}

#[tokio::test]
async fn test_clearing_the_value_blocks_the_export() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = Pipeline::with_source(test_config(dir.path()), canned_corpus());
    pipeline.load_sections(false).await.unwrap();

    pipeline.set_value(
        "wifi",
        "SSID_STR",
        Some(ParameterValue::Text("CorpNet".to_string())),
    );
    pipeline.set_value("wifi", "SSID_STR", Some(ParameterValue::Text(String::new())));

    assert!(pipeline.store().is_empty());
    assert!(pipeline.export(&profile_meta()).is_err());
}

#[tokio::test]
async fn test_empty_value_never_reaches_the_document() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = Pipeline::with_source(test_config(dir.path()), canned_corpus());
    pipeline.load_sections(false).await.unwrap();

    pipeline.set_value(
        "wifi",
        "SSID_STR",
        Some(ParameterValue::Text("CorpNet".to_string())),
    );
    pipeline.set_value("wifi", "AutoJoin", Some(ParameterValue::TextList(vec![])));

    let doc = pipeline.export(&profile_meta()).unwrap();
    assert!(!doc.contains("AutoJoin"));
}
