//! Tier-ordering and degradation behavior of the resolver.

use crate::suite::common::CannedSource;
use crate::suite::common::FailingSource;
use crate::suite::common::canned_corpus;
use crate::suite::common::empty_section_document;
use crate::suite::common::test_config;
use crate::suite::common::wifi_document;
use pretty_assertions::assert_eq;
use profilesmith_core::ResolveError;
use profilesmith_core::Resolver;
use profilesmith_core::normalize::Normalizer;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_all_tiers_failing_falls_back_to_bundled_catalog() {
    let dir = TempDir::new().unwrap();
    let mut resolver = Resolver::new(test_config(dir.path()), Arc::new(FailingSource));

    let doc = resolver
        .resolve_section("WiFi", false)
        .await
        .expect("fallback always yields a document");
    assert!(doc.is_structurally_valid());

    let parameters = Normalizer::new().extract_parameters(&doc, "wifi");
    let keys: Vec<&str> = parameters.iter().map(|p| p.key.as_str()).collect();
    assert!(keys.contains(&"SSID_STR"));
    assert!(keys.contains(&"Password"));
    assert!(keys.contains(&"EncryptionType"));
    assert!(keys.contains(&"IsHiddenNetwork"));
    let ssid = parameters.iter().find(|p| p.key == "SSID_STR").unwrap();
    assert!(ssid.required);
}

#[tokio::test]
async fn test_unknown_section_degrades_to_empty_document() {
    let dir = TempDir::new().unwrap();
    let mut resolver = Resolver::new(test_config(dir.path()), Arc::new(FailingSource));

    let doc = resolver
        .resolve_section("NoSuchSection", false)
        .await
        .expect("degrades instead of failing");
    assert!(doc.is_structurally_valid());
    assert!(doc.topic_sections().is_empty());
}

#[tokio::test]
async fn test_main_fails_only_when_live_fetch_disabled_without_cache() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.live_fetch_enabled = false;
    let mut resolver = Resolver::new(config, Arc::new(FailingSource));

    let err = resolver.resolve_main(false).await.unwrap_err();
    let ResolveError::SourceUnavailable { name } = err else {
        panic!("expected SourceUnavailable, got {err}");
    };
    assert_eq!(name, "toplevel");
}

#[tokio::test]
async fn test_section_is_none_when_live_fetch_disabled_without_cache() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.live_fetch_enabled = false;
    let mut resolver = Resolver::new(config, Arc::new(FailingSource));

    assert_eq!(resolver.resolve_section("wifi", false).await, None);
}

#[tokio::test]
async fn test_main_fetch_failure_yields_fallback_document() {
    let dir = TempDir::new().unwrap();
    let mut resolver = Resolver::new(test_config(dir.path()), Arc::new(FailingSource));

    let doc = resolver.resolve_main(false).await.unwrap();
    assert!(doc.is_structurally_valid());
    assert!(!doc.topic_sections().is_empty());
}

#[tokio::test]
async fn test_remote_hit_is_written_through_to_the_durable_tier() {
    let dir = TempDir::new().unwrap();

    let mut online = Resolver::new(test_config(dir.path()), canned_corpus());
    online.resolve_main(false).await.unwrap();
    online.resolve_section("wifi", false).await.unwrap();

    // A second resolver over the same directory, fully offline, must be
    // served from the durable tier.
    let mut config = test_config(dir.path());
    config.live_fetch_enabled = false;
    let mut offline = Resolver::new(config, Arc::new(FailingSource));

    let main = offline.resolve_main(false).await.unwrap();
    assert!(!main.topic_sections().is_empty());
    let wifi = offline.resolve_section("wifi", false).await.unwrap();
    assert!(wifi.raw().get("primaryContentSections").is_some());
}

#[tokio::test]
async fn test_forced_refresh_recovers_durable_copy_after_fetch_failure() {
    let dir = TempDir::new().unwrap();

    let mut online = Resolver::new(test_config(dir.path()), canned_corpus());
    online.resolve_section("wifi", false).await.unwrap();

    let mut failing = Resolver::new(test_config(dir.path()), Arc::new(FailingSource));
    let doc = failing.resolve_section("wifi", true).await.unwrap();
    // The durable copy wins over the bundled catalog.
    assert!(doc.raw().get("primaryContentSections").is_some());
}

#[tokio::test]
async fn test_memory_tier_short_circuits_repeat_lookups() {
    let dir = TempDir::new().unwrap();
    let source = canned_corpus();
    let mut resolver = Resolver::new(test_config(dir.path()), source.clone());

    resolver.resolve_section("wifi", false).await.unwrap();
    resolver.resolve_section("wifi", false).await.unwrap();
    resolver.resolve_section("WiFi", false).await.unwrap();
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_batch_results_preserve_input_order() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CannedSource::new(HashMap::from([
        ("wifi".to_string(), wifi_document()),
        ("vpn".to_string(), empty_section_document()),
        ("mail".to_string(), empty_section_document()),
        ("restrictions".to_string(), empty_section_document()),
        ("accounts".to_string(), empty_section_document()),
        ("certificates".to_string(), empty_section_document()),
    ])));
    let mut config = test_config(dir.path());
    config.batch.size = 2;
    let mut resolver = Resolver::new(config, source);

    let names: Vec<String> = ["WiFi", "VPN", "Mail", "Restrictions", "Accounts", "Certificates"]
        .iter()
        .map(ToString::to_string)
        .collect();
    let resolved = resolver.resolve_sections(&names, false).await;
    let order: Vec<&str> = resolved.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        order,
        vec!["WiFi", "VPN", "Mail", "Restrictions", "Accounts", "Certificates"]
    );
    for (_, doc) in &resolved {
        assert!(doc.is_structurally_valid());
    }
}

#[tokio::test]
async fn test_batch_failures_degrade_per_item() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CannedSource::new(HashMap::from([(
        "wifi".to_string(),
        wifi_document(),
    )])));
    let mut resolver = Resolver::new(test_config(dir.path()), source);

    let names = vec!["WiFi".to_string(), "Bogus".to_string()];
    let resolved = resolver.resolve_sections(&names, false).await;
    assert_eq!(resolved.len(), 2);
    assert!(resolved[0].1.raw().get("primaryContentSections").is_some());
    // The failing sibling resolves to a valid empty document.
    assert!(resolved[1].1.is_structurally_valid());
}
