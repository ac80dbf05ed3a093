//! In-process cache tier.
//!
//! Single-writer by construction: all mutation comes from the resolver's
//! control flow, so no locking is needed.

use crate::model::SpecDocument;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct MemoryEntry {
    document: SpecDocument,
    expires_at: Option<DateTime<Utc>>,
}

/// Expiring key/value store for resolved documents.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, MemoryEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached document, dropping it first if expired.
    pub fn get(&mut self, key: &str) -> Option<SpecDocument> {
        let expired = self
            .entries
            .get(key)?
            .expires_at
            .is_some_and(|at| at <= Utc::now());
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.document.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, document: SpecDocument, ttl: Option<chrono::Duration>) {
        self.entries.insert(
            key.into(),
            MemoryEntry {
                document,
                expires_at: ttl.map(|t| Utc::now() + t),
            },
        );
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
