//! Error taxonomy for the resolution/normalization/serialization pipeline.
//!
//! Policy summary:
//! - Extraction-strategy failures are logged and swallowed inside the
//!   normalizer; they never cross a module boundary.
//! - Resolver failures surface only for the main specification and only
//!   after the whole tier chain is exhausted. Per-section failures degrade
//!   to empty documents.
//! - Export validation failures carry every violation, not just the first.

use std::path::PathBuf;
use thiserror::Error;

/// Remote-tier fetch failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Non-success HTTP status from the upstream documentation host.
    #[error("upstream returned status {code}")]
    Status { code: u16 },

    /// The request exceeded its deadline or was cancelled.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure (DNS, TLS, reset, malformed body).
    #[error("network error: {message}")]
    Network { message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Whether the retry loop may attempt this request again.
    ///
    /// 404 means "resource does not exist", not a transient fault, so it is
    /// never retried. The same goes for the remaining 4xx family except 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network { .. } => true,
            Self::Status { code } => *code == 429 || *code >= 500,
        }
    }

    /// True when the upstream explicitly said the resource is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404 })
    }
}

/// Durable cache tier failure.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry exists but cannot be parsed. Treated as a miss by the resolver.
    #[error("corrupt cache entry at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The durable tier has no room left. Handled by a one-time
    /// clear-and-retry inside the cache itself.
    #[error("cache storage quota exceeded")]
    QuotaExceeded,
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Resolution failure, surfaced to callers only for the main specification.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every tier (memory, durable, remote, durable again, static fallback)
    /// failed to produce a structurally valid document.
    #[error("no source produced a valid specification for '{name}'")]
    SourceUnavailable { name: String },

    /// A freshly fetched document failed the minimal shape check. Logged at
    /// the rejecting tier and answered by the fallback chain; never escapes
    /// the resolver.
    #[error("structurally invalid document: {message}")]
    Structural { message: String },
}

impl ResolveError {
    pub fn source_unavailable(name: impl Into<String>) -> Self {
        Self::SourceUnavailable { name: name.into() }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }
}

/// Pre-serialization validation failure carrying every violation.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("profile validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ExportError {
    /// The individual human-readable violation messages.
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Validation(messages) => messages,
        }
    }
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
