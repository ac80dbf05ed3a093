//! Durable cache tier: one JSON file per section under a cache directory,
//! plus a manifest describing the files.
//!
//! Two on-disk shapes are accepted when reading:
//! - an envelope `{cached_at, expires_at, document}` written by this tier,
//! - a bare specification document (pre-baked snapshot), treated as
//!   non-expiring.
//!
//! A write that hits a storage quota triggers a one-time clear-and-retry;
//! a second failure is logged and swallowed, since the durable tier is an
//! optimization, not a source of truth.

use crate::errors::CacheError;
use crate::model::{SpecDocument, derive_identifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    cached_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    document: serde_json::Value,
}

/// Manifest describing the durable tier's files. Checksums are written but
/// not verified here; integrity checking is a separate collaborator's job.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub total_files: usize,
    pub files: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub checksum: String,
}

/// File-per-key durable cache.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    ttl: chrono::Duration,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: chrono::Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", derive_identifier(name)))
    }

    /// Read a cached document. `Ok(None)` covers both a missing file and an
    /// expired envelope; a present-but-unparseable file is `CacheError::Corrupt`
    /// so the resolver can log it and treat it as a miss.
    pub fn read(&self, name: &str) -> Result<Option<SpecDocument>, CacheError> {
        let path = self.path_for(name);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(path, err)),
        };

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|err| CacheError::corrupt(&path, err.to_string()))?;

        // Envelope written by this tier, or a bare pre-baked snapshot.
        if value.get("cached_at").is_some() && value.get("document").is_some() {
            let envelope: Envelope = serde_json::from_value(value)
                .map_err(|err| CacheError::corrupt(&path, err.to_string()))?;
            if envelope.expires_at.is_some_and(|at| at <= Utc::now()) {
                tracing::debug!(name, "durable cache entry expired");
                return Ok(None);
            }
            return Ok(Some(SpecDocument::from_value(envelope.document)));
        }
        Ok(Some(SpecDocument::from_value(value)))
    }

    /// Write a document with an expiration stamp and refresh the manifest.
    ///
    /// Quota failures clear the tier and retry once; if that also fails the
    /// error is logged and dropped.
    pub fn write(&self, name: &str, document: &SpecDocument) -> Result<(), CacheError> {
        self.recover_quota(name, |cache| cache.write_inner(name, document))?;
        self.update_manifest()
    }

    /// Quota recovery policy around a write attempt: on `QuotaExceeded`,
    /// clear the tier and retry once; a second failure is logged and
    /// swallowed. Any other error propagates untouched.
    fn recover_quota<F>(&self, name: &str, mut attempt: F) -> Result<(), CacheError>
    where
        F: FnMut(&Self) -> Result<(), CacheError>,
    {
        match attempt(self) {
            Ok(()) => Ok(()),
            Err(CacheError::QuotaExceeded) => {
                tracing::warn!(name, "durable cache quota exceeded, clearing and retrying");
                self.clear()?;
                if let Err(err) = attempt(self) {
                    tracing::warn!(name, error = %err, "durable cache write failed after clear");
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn write_inner(&self, name: &str, document: &SpecDocument) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|err| map_write_err(&self.dir, err))?;
        let envelope = Envelope {
            cached_at: Utc::now(),
            expires_at: Some(Utc::now() + self.ttl),
            document: document.raw().clone(),
        };
        let path = self.path_for(name);
        let text = serde_json::to_string(&envelope)
            .map_err(|err| CacheError::corrupt(&path, err.to_string()))?;
        std::fs::write(&path, text).map_err(|err| map_write_err(&path, err))
    }

    /// Remove every cache file, including the manifest.
    pub fn clear(&self) -> Result<(), CacheError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(CacheError::io(&self.dir, err)),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path).map_err(|err| CacheError::io(&path, err))?;
            }
        }
        Ok(())
    }

    /// Load the manifest if present. Requires `files` to be an object (the
    /// serde shape enforces this); checksums are not verified.
    pub fn load_manifest(&self) -> Result<Option<Manifest>, CacheError> {
        let path = self.dir.join(MANIFEST_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(path, err)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| CacheError::corrupt(&path, err.to_string()))
    }

    fn update_manifest(&self) -> Result<(), CacheError> {
        let mut files = BTreeMap::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => return Err(CacheError::io(&self.dir, err)),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(std::ffi::OsStr::to_str) else {
                continue;
            };
            if file_name == MANIFEST_FILE || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|err| CacheError::io(&path, err))?;
            let meta = std::fs::metadata(&path).map_err(|err| CacheError::io(&path, err))?;
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            files.insert(
                file_name.to_string(),
                ManifestEntry {
                    size: bytes.len() as u64,
                    modified,
                    checksum: format!("{:x}", Sha256::digest(&bytes)),
                },
            );
        }
        let manifest = Manifest {
            generated_at: Utc::now(),
            total_files: files.len(),
            files,
        };
        let path = self.dir.join(MANIFEST_FILE);
        let text = serde_json::to_string_pretty(&manifest)
            .map_err(|err| CacheError::corrupt(&path, err.to_string()))?;
        std::fs::write(&path, text).map_err(|err| map_write_err(&path, err))
    }
}

fn map_write_err(path: &Path, err: std::io::Error) -> CacheError {
    match err.kind() {
        std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
            CacheError::QuotaExceeded
        }
        _ => CacheError::io(path, err),
    }
}
