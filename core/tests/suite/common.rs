//! Shared fixtures for the integration suite: canned and failing sources,
//! plus a config pointing at a throwaway cache directory.

use async_trait::async_trait;
use profilesmith_core::FetchError;
use profilesmith_core::PipelineConfig;
use profilesmith_core::SpecDocument;
use profilesmith_core::SpecificationSource;
use profilesmith_core::config::BatchConfig;
use profilesmith_core::config::RetryConfig;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

/// Source serving a fixed path-to-document map; everything else is a 404.
pub struct CannedSource {
    pub documents: HashMap<String, serde_json::Value>,
    pub fetches: AtomicUsize,
}

impl CannedSource {
    pub fn new(documents: HashMap<String, serde_json::Value>) -> Self {
        Self {
            documents,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpecificationSource for CannedSource {
    async fn fetch(
        &self,
        path: &str,
        _cancel: &CancellationToken,
    ) -> Result<SpecDocument, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(path)
            .cloned()
            .map(SpecDocument::from_value)
            .ok_or(FetchError::Status { code: 404 })
    }
}

/// Source that fails every request with a transient network error.
pub struct FailingSource;

#[async_trait]
impl SpecificationSource for FailingSource {
    async fn fetch(
        &self,
        _path: &str,
        _cancel: &CancellationToken,
    ) -> Result<SpecDocument, FetchError> {
        Err(FetchError::network("connection refused"))
    }
}

/// Fast-retry config with the durable tier rooted in `cache_dir`.
pub fn test_config(cache_dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        cache_dir: cache_dir.to_string_lossy().into_owned(),
        retry: RetryConfig {
            max_attempts: 1,
            base_delay_ms: 1,
        },
        batch: BatchConfig {
            size: 5,
            delay_ms: 0,
        },
        ..PipelineConfig::default()
    }
}

/// Main document fixture: a Networking grouping over WiFi and VPN, plus a
/// Mail grouping whose only identifier names the grouping itself.
pub fn main_document() -> serde_json::Value {
    json!({
        "topicSections": [
            {
                "title": "Networking",
                "identifiers": [
                    "doc://x/documentation/DeviceManagement/WiFi",
                    "doc://x/documentation/DeviceManagement/VPN"
                ]
            },
            {
                "title": "Mail",
                "identifiers": ["doc://x/documentation/DeviceManagement/Mail"]
            }
        ],
        "references": {
            "doc://x/documentation/DeviceManagement/WiFi": {
                "title": "WiFi",
                "abstract": "Wireless settings.",
                "kind": "symbol",
                "platforms": ["iOS", "macOS"]
            },
            "doc://x/documentation/DeviceManagement/VPN": {
                "title": "VPN",
                "kind": "symbol"
            },
            "doc://x/documentation/DeviceManagement/Mail": {
                "title": "Mail",
                "kind": "symbol"
            }
        }
    })
}

/// Section document fixture with a property table.
pub fn wifi_document() -> serde_json::Value {
    json!({
        "topicSections": [],
        "references": {},
        "primaryContentSections": [{
            "kind": "properties",
            "items": [
                {
                    "name": "SSID_STR",
                    "type": [{"kind": "text", "text": "string"}],
                    "required": true,
                    "content": [{"type": "text", "text": "The network SSID."}]
                },
                {
                    "name": "AutoJoin",
                    "type": [{"kind": "text", "text": "boolean"}]
                }
            ]
        }]
    })
}

pub fn empty_section_document() -> serde_json::Value {
    json!({ "topicSections": [], "references": {} })
}

/// The full canned corpus behind a resolvable pipeline.
pub fn canned_corpus() -> Arc<CannedSource> {
    Arc::new(CannedSource::new(HashMap::from([
        ("toplevel".to_string(), main_document()),
        ("wifi".to_string(), wifi_document()),
        ("vpn".to_string(), empty_section_document()),
        ("mail".to_string(), empty_section_document()),
    ])))
}
