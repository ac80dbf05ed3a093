//! Composition root. `Pipeline` wires the resolver, normalizer, and
//! modified-value store behind one facade so callers never touch the tiers
//! directly.

use crate::config::PipelineConfig;
use crate::errors::ExportError;
use crate::errors::ResolveError;
use crate::model::ParameterValue;
use crate::model::Section;
use crate::model::SpecDocument;
use crate::model::derive_identifier;
use crate::normalize::Normalizer;
use crate::normalize::SectionDetails;
use crate::profile;
use crate::profile::Preview;
use crate::profile::ProfileMeta;
use crate::resolver::Resolver;
use crate::source::HttpSource;
use crate::source::SpecificationSource;
use crate::store::ModifiedValueStore;
use crate::store::ValueMeta;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Pipeline {
    resolver: Resolver,
    normalizer: Normalizer,
    store: ModifiedValueStore,
    sections: Vec<Section>,
    /// Resolved per-section documents, keyed by section identifier. Kept so
    /// detail queries do not re-resolve.
    documents: HashMap<String, SpecDocument>,
}

impl Pipeline {
    /// Construct the production pipeline over the HTTP source.
    pub fn new(config: PipelineConfig) -> Self {
        let source = Arc::new(HttpSource::new(config.base_url.clone(), config.timeout()));
        Self::with_source(config, source)
    }

    /// Construct over an injected source. Test seam, also used by callers
    /// that proxy or replay upstream traffic.
    pub fn with_source(config: PipelineConfig, source: Arc<dyn SpecificationSource>) -> Self {
        Self {
            resolver: Resolver::new(config, source),
            normalizer: Normalizer::new(),
            store: ModifiedValueStore::new(),
            sections: Vec::new(),
            documents: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.resolver.config()
    }

    /// Resolve the main specification, extract the section list, then batch
    /// resolve each section document and attach its parameters. The result
    /// replaces any previously loaded model; modified values survive a
    /// reload untouched.
    pub async fn load_sections(&mut self, force_refresh: bool) -> Result<&[Section], ResolveError> {
        let main = self.resolver.resolve_main(force_refresh).await?;
        let mut sections = self.normalizer.extract_sections(&main);

        let names: Vec<String> = sections.iter().map(|s| s.identifier.clone()).collect();
        let resolved = self.resolver.resolve_sections(&names, force_refresh).await;

        self.documents.clear();
        for (name, doc) in resolved {
            let key = derive_identifier(&name);
            if let Some(section) = sections.iter_mut().find(|s| s.identifier == key) {
                section.parameters = self.normalizer.extract_parameters(&doc, &name);
            }
            self.documents.insert(key, doc);
        }
        tracing::info!(
            sections = sections.len(),
            parameters = sections.iter().map(|s| s.parameters.len()).sum::<usize>(),
            "section model loaded"
        );
        self.sections = sections;
        Ok(&self.sections)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a loaded section by identifier or by display name.
    pub fn find_section(&self, name: &str) -> Option<&Section> {
        let key = derive_identifier(name);
        self.sections
            .iter()
            .find(|s| s.identifier == key)
            .or_else(|| self.sections.iter().find(|s| s.name == name))
    }

    /// Structured details for one loaded section, mined from its resolved
    /// document. `None` when the section was never resolved.
    pub fn section_details(&self, name: &str) -> Option<SectionDetails> {
        let doc = self.documents.get(&derive_identifier(name))?;
        Some(self.normalizer.extract_details(doc))
    }

    /// Set or clear one value. Metadata is drawn from the loaded model when
    /// the parameter is known there; unknown parameters are accepted with
    /// inferred metadata so the store stays usable before a load.
    pub fn set_value(
        &mut self,
        section_id: &str,
        parameter_key: &str,
        value: Option<ParameterValue>,
    ) {
        let meta = self
            .parameter_meta(section_id, parameter_key)
            .unwrap_or_default();
        self.store.set(section_id, parameter_key, value, meta);
    }

    pub fn clear_value(&mut self, section_id: &str, parameter_key: &str) {
        self.store.remove(section_id, parameter_key);
    }

    pub fn clear_all_values(&mut self) {
        self.store.clear();
    }

    pub fn store(&self) -> &ModifiedValueStore {
        &self.store
    }

    /// Serialize the current store into a profile document.
    pub fn export(&self, meta: &ProfileMeta) -> Result<String, ExportError> {
        profile::serialize(meta, &self.sections, &self.store)
    }

    pub fn preview(&self) -> Preview {
        profile::build_preview(&self.store)
    }

    fn parameter_meta(&self, section_id: &str, parameter_key: &str) -> Option<ValueMeta> {
        let section = self.sections.iter().find(|s| s.identifier == section_id)?;
        let parameter = section.parameters.iter().find(|p| p.key == parameter_key)?;
        Some(ValueMeta {
            param_type: Some(parameter.param_type),
            platforms: parameter.platforms.clone(),
            required: parameter.required,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::errors::FetchError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio_util::sync::CancellationToken;

    struct CannedSource {
        documents: HashMap<String, serde_json::Value>,
    }

    #[async_trait]
    impl SpecificationSource for CannedSource {
        async fn fetch(
            &self,
            path: &str,
            _cancel: &CancellationToken,
        ) -> Result<SpecDocument, FetchError> {
            self.documents
                .get(path)
                .cloned()
                .map(SpecDocument::from_value)
                .ok_or(FetchError::Status { code: 404 })
        }
    }

    fn offline_config() -> PipelineConfig {
        PipelineConfig {
            cache_enabled: false,
            retry: crate::config::RetryConfig {
                max_attempts: 1,
                base_delay_ms: 0,
            },
            batch: crate::config::BatchConfig {
                size: 5,
                delay_ms: 0,
            },
            ..PipelineConfig::default()
        }
    }

    fn canned_pipeline() -> Pipeline {
        let main = json!({
            "topicSections": [
                {"title": "Networking", "identifiers": [
                    "doc://com.apple.devicemanagement/documentation/DeviceManagement/WiFi",
                ]},
            ],
            "references": {},
        });
        let wifi = json!({
            "topicSections": [],
            "references": {},
            "primaryContentSections": [{
                "kind": "properties",
                "items": [
                    {"name": "SSID_STR", "type": [{"kind": "text", "text": "string"}], "required": true},
                    {"name": "AutoJoin", "type": [{"kind": "text", "text": "boolean"}]},
                ],
            }],
        });
        let documents = HashMap::from([
            ("toplevel".to_string(), main),
            ("wifi".to_string(), wifi),
        ]);
        Pipeline::with_source(offline_config(), Arc::new(CannedSource { documents }))
    }

    #[tokio::test]
    async fn test_load_attaches_parameters() {
        let mut pipeline = canned_pipeline();
        let sections = pipeline.load_sections(false).await.unwrap();
        let wifi = sections.iter().find(|s| s.identifier == "wifi").unwrap();
        assert_eq!(wifi.parameters.len(), 2);
        assert!(wifi.parameters[0].required);
    }

    #[tokio::test]
    async fn test_set_value_uses_model_metadata() {
        let mut pipeline = canned_pipeline();
        pipeline.load_sections(false).await.unwrap();
        pipeline.set_value(
            "wifi",
            "SSID_STR",
            Some(ParameterValue::Text("CorpNet".to_string())),
        );
        let records = pipeline.store().all();
        assert_eq!(records.len(), 1);
        assert!(records[0].required);
    }

    #[tokio::test]
    async fn test_reload_preserves_store() {
        let mut pipeline = canned_pipeline();
        pipeline.load_sections(false).await.unwrap();
        pipeline.set_value(
            "wifi",
            "AutoJoin",
            Some(ParameterValue::Bool(true)),
        );
        pipeline.load_sections(true).await.unwrap();
        assert_eq!(pipeline.store().count(), 1);
    }
}
