//! Tiered resolution of specification documents.
//!
//! Tier order, short-circuiting on the first structurally valid hit unless
//! a refresh is forced: memory cache → durable cache → remote fetch (with
//! retry) → durable cache again → static fallback catalog.
//!
//! The main specification is the only request that can fail outright; a
//! section request degrades to `None` (live fetch disabled) or to an
//! empty-but-valid document (all tiers exhausted), so batch loads of many
//! sections degrade per item instead of aborting.

use crate::cache::{FileCache, MemoryCache};
use crate::config::PipelineConfig;
use crate::errors::ResolveError;
use crate::fallback::FallbackCatalog;
use crate::model::{SpecDocument, derive_identifier};
use crate::source::{SpecificationSource, fetch_with_retry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upstream path segment of the root specification document.
pub const MAIN_SPEC_PATH: &str = "toplevel";

pub struct Resolver {
    config: PipelineConfig,
    source: Arc<dyn SpecificationSource>,
    memory: MemoryCache,
    durable: FileCache,
    fallback: FallbackCatalog,
}

impl Resolver {
    pub fn new(config: PipelineConfig, source: Arc<dyn SpecificationSource>) -> Self {
        let durable = FileCache::new(config.cache_dir.clone(), config.cache_ttl());
        Self {
            config,
            source,
            memory: MemoryCache::new(),
            durable,
            fallback: FallbackCatalog::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve the main specification document.
    ///
    /// Fatal only when live fetch is disabled with no cached copy, per the
    /// configuration gate; the static fallback otherwise guarantees a
    /// document.
    pub async fn resolve_main(&mut self, force_refresh: bool) -> Result<SpecDocument, ResolveError> {
        if !force_refresh
            && let Some(doc) = self.cached_lookup(MAIN_SPEC_PATH)
        {
            return Ok(doc);
        }
        if !self.config.live_fetch_enabled {
            tracing::warn!("live fetch disabled and no cached main specification");
            return Err(ResolveError::source_unavailable(MAIN_SPEC_PATH));
        }

        let cancel = CancellationToken::new();
        match fetch_with_retry(
            self.source.as_ref(),
            MAIN_SPEC_PATH,
            &self.config.retry,
            &cancel,
        )
        .await
        {
            Ok(doc) => match Self::check_shape(MAIN_SPEC_PATH, doc) {
                Ok(doc) => {
                    self.write_through_remote(MAIN_SPEC_PATH, &doc);
                    Ok(doc)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "fetched main specification rejected");
                    Ok(self.main_fallback())
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "main specification fetch failed");
                Ok(self.main_fallback())
            }
        }
    }

    /// Resolve one section document by upstream name.
    ///
    /// `None` means live fetch is disabled and no tier had a copy. Any other
    /// failure yields the empty-but-valid document.
    pub async fn resolve_section(
        &mut self,
        name: &str,
        force_refresh: bool,
    ) -> Option<SpecDocument> {
        let key = derive_identifier(name);
        if !force_refresh
            && let Some(doc) = self.cached_lookup(&key)
        {
            return Some(doc);
        }
        if !self.config.live_fetch_enabled {
            return None;
        }

        let cancel = CancellationToken::new();
        let result =
            fetch_with_retry(self.source.as_ref(), &key, &self.config.retry, &cancel).await;
        Some(self.settle_section(&key, result))
    }

    /// Resolve many sections with bounded concurrency: fixed-size batches,
    /// concurrent fetches inside a batch, sequential batches separated by a
    /// short pause. Results come back in input order; per-item failures
    /// degrade to empty documents and never abort siblings.
    pub async fn resolve_sections(
        &mut self,
        names: &[String],
        force_refresh: bool,
    ) -> Vec<(String, SpecDocument)> {
        let batch_size = self.config.batch.size.max(1);
        let delay = Duration::from_millis(self.config.batch.delay_ms);
        let mut out: Vec<(String, SpecDocument)> = Vec::with_capacity(names.len());
        let mut first_batch = true;

        for batch in names.chunks(batch_size) {
            if !first_batch {
                tokio::time::sleep(delay).await;
            }
            first_batch = false;

            let mut resolved: Vec<Option<SpecDocument>> = vec![None; batch.len()];
            let mut pending: Vec<(usize, String)> = Vec::new();

            for (index, name) in batch.iter().enumerate() {
                let key = derive_identifier(name);
                if !force_refresh
                    && let Some(doc) = self.cached_lookup(&key)
                {
                    resolved[index] = Some(doc);
                } else if self.config.live_fetch_enabled {
                    pending.push((index, key));
                }
                // Live fetch disabled with no cache: the item resolves to
                // nothing and is omitted from the result.
            }

            // Concurrent fetches; join_all preserves input order even when
            // individual requests complete out of order.
            let source = Arc::clone(&self.source);
            let retry = self.config.retry.clone();
            let fetches = pending.iter().map(|(_, key)| {
                let source = Arc::clone(&source);
                let retry = retry.clone();
                let key = key.clone();
                async move {
                    let cancel = CancellationToken::new();
                    fetch_with_retry(source.as_ref(), &key, &retry, &cancel).await
                }
            });
            let results = join_all(fetches).await;

            for ((index, key), result) in pending.into_iter().zip(results) {
                resolved[index] = Some(self.settle_section(&key, result));
            }

            for (name, doc) in batch.iter().zip(resolved) {
                if let Some(doc) = doc {
                    out.push((name.clone(), doc));
                }
            }
        }
        out
    }

    /// Memory tier, then durable tier, each guarded by the shape check.
    /// A durable hit is promoted into the memory tier.
    fn cached_lookup(&mut self, key: &str) -> Option<SpecDocument> {
        if !self.config.cache_enabled {
            return None;
        }
        if let Some(doc) = self.memory.get(key)
            && doc.is_structurally_valid()
        {
            tracing::debug!(key, "memory cache hit");
            return Some(doc);
        }
        match self.durable.read(key) {
            Ok(Some(doc)) if doc.is_structurally_valid() => {
                tracing::debug!(key, "durable cache hit");
                self.remember(key, doc.clone());
                Some(doc)
            }
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "durable cache read failed");
                None
            }
        }
    }

    /// Post-fetch settlement for a section: validate and write through, or
    /// walk the fallback chain (durable again → static catalog → empty).
    fn settle_section(
        &mut self,
        key: &str,
        result: Result<SpecDocument, crate::errors::FetchError>,
    ) -> SpecDocument {
        match result {
            Ok(doc) => match Self::check_shape(key, doc) {
                Ok(doc) => {
                    self.write_through_remote(key, &doc);
                    doc
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "fetched section rejected");
                    self.section_fallback(key)
                }
            },
            Err(err) => {
                tracing::warn!(key, error = %err, "section fetch failed");
                self.section_fallback(key)
            }
        }
    }

    /// Minimal shape gate applied to every freshly fetched document. The
    /// resulting error is logged at the rejecting tier and answered by the
    /// fallback chain; it never escapes the resolver.
    fn check_shape(key: &str, doc: SpecDocument) -> Result<SpecDocument, ResolveError> {
        if doc.is_structurally_valid() {
            Ok(doc)
        } else {
            Err(ResolveError::structural(format!(
                "document for '{key}' lacks topicSections/references"
            )))
        }
    }

    fn section_fallback(&mut self, key: &str) -> SpecDocument {
        // Durable tier again: the earlier consult may have been skipped by a
        // forced refresh, and a stale-but-valid snapshot beats nothing.
        if self.config.cache_enabled {
            if let Ok(Some(doc)) = self.durable.read(key)
                && doc.is_structurally_valid()
            {
                tracing::debug!(key, "recovered section from durable cache");
                self.remember(key, doc.clone());
                return doc;
            }
        }
        if let Some(doc) = self.fallback.section(key) {
            tracing::debug!(key, "recovered section from static fallback");
            self.remember(key, doc.clone());
            return doc;
        }
        tracing::debug!(key, "section degraded to empty document");
        SpecDocument::empty()
    }

    fn main_fallback(&mut self) -> SpecDocument {
        if self.config.cache_enabled {
            if let Ok(Some(doc)) = self.durable.read(MAIN_SPEC_PATH)
                && doc.is_structurally_valid()
            {
                self.remember(MAIN_SPEC_PATH, doc.clone());
                return doc;
            }
        }
        let doc = self.fallback.main_document();
        self.remember(MAIN_SPEC_PATH, doc.clone());
        doc
    }

    fn remember(&mut self, key: &str, doc: SpecDocument) {
        if self.config.cache_enabled {
            self.memory.set(key, doc, Some(self.config.cache_ttl()));
        }
    }

    fn write_through_remote(&mut self, key: &str, doc: &SpecDocument) {
        if !self.config.cache_enabled {
            return;
        }
        self.memory
            .set(key, doc.clone(), Some(self.config.cache_ttl()));
        if let Err(err) = self.durable.write(key, doc) {
            tracing::warn!(key, error = %err, "durable cache write failed");
        }
    }
}
