//! Canonical data model: raw specification documents, normalized sections
//! and parameters, and the closed value union used for modified values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Derive a section identifier from an upstream title or anchor.
///
/// Lowercases and strips everything that is not ASCII alphanumeric, so the
/// same upstream title always yields the same identifier:
/// `"Top Level"` → `"toplevel"`, `"Wi-Fi"` → `"wifi"`.
pub fn derive_identifier(title: &str) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Raw resolved payload from any tier. The tree is kept opaque so the
/// normalizer's deep-search strategies can walk shapes we do not model.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    raw: Value,
}

impl SpecDocument {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// The empty-but-valid document used for per-section soft degradation.
    pub fn empty() -> Self {
        Self {
            raw: serde_json::json!({ "topicSections": [], "references": {} }),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    /// Minimal shape check: `topicSections` must be an array (possibly
    /// empty) and `references` a non-null object. Intentionally permissive;
    /// richer checks belong to the normalizer.
    pub fn is_structurally_valid(&self) -> bool {
        self.raw.get("topicSections").is_some_and(Value::is_array)
            && self.raw.get("references").is_some_and(Value::is_object)
    }

    /// Tolerantly-typed views over `topicSections`. Entries that are not
    /// objects are skipped rather than failing the whole document.
    pub fn topic_sections(&self) -> Vec<TopicSection> {
        self.raw
            .get("topicSections")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(TopicSection::from_value)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The identifier → description-record reference table, if present.
    pub fn references(&self) -> Option<&Map<String, Value>> {
        self.raw.get("references").and_then(Value::as_object)
    }
}

/// One upstream grouping node referencing configuration-type identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSection {
    pub title: Option<String>,
    pub anchor: Option<String>,
    pub identifiers: Vec<String>,
}

impl TopicSection {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let string_of = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            title: string_of("title"),
            anchor: string_of("anchor"),
            identifiers: obj
                .get("identifiers")
                .and_then(Value::as_array)
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Display label, preferring the title over the anchor.
    pub fn label(&self) -> Option<&str> {
        self.title.as_deref().or(self.anchor.as_deref())
    }
}

/// Platforms a section or parameter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Ios,
    MacOs,
    TvOs,
    WatchOs,
    VisionOs,
}

impl Platform {
    /// Case-insensitive parse of upstream platform labels. Unrecognized
    /// labels yield `None` and are dropped by callers.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ios" | "iphoneos" | "ipados" => Some(Self::Ios),
            "macos" | "osx" | "mac" => Some(Self::MacOs),
            "tvos" => Some(Self::TvOs),
            "watchos" => Some(Self::WatchOs),
            "visionos" => Some(Self::VisionOs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "iOS",
            Self::MacOs => "macOS",
            Self::TvOs => "tvOS",
            Self::WatchOs => "watchOS",
            Self::VisionOs => "visionOS",
        }
    }
}

/// Closed set of normalized parameter types. Unknown upstream type strings
/// are coerced into this set by `normalize::normalize_type`, never left raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Boolean,
    Number,
    Integer,
    Array,
    Object,
    Enum,
    Date,
    Data,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Array => "array",
            Self::Object => "object",
            Self::Enum => "enum",
            Self::Date => "date",
            Self::Data => "data",
        }
    }
}

/// Closed tagged union for parameter values, matching `ParameterType`.
/// Conversions happen at the normalizer/serializer boundary; nothing in the
/// pipeline inspects runtime JSON types past that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
    TextMap(BTreeMap<String, String>),
    Timestamp(DateTime<Utc>),
    /// Already base64-encoded payload text. Emitted verbatim inside a data
    /// element; the pipeline never transcodes it.
    Blob(String),
}

impl ParameterValue {
    /// An empty value must never be stored; the modified-value store removes
    /// the record instead.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) | Self::Blob(text) => text.is_empty(),
            Self::TextList(items) => items.is_empty(),
            Self::TextMap(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Human-readable rendering for previews.
    pub fn display_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) | Self::Blob(s) => s.clone(),
            Self::TextList(items) => items.join(", "),
            Self::TextMap(entries) => entries
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", "),
            Self::Timestamp(ts) => ts.to_rfc3339(),
        }
    }
}

/// Bounds and shape constraints carried alongside a parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.pattern.is_none()
    }
}

/// A single configurable field within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub name: String,
    pub param_type: ParameterType,
    pub description: String,
    pub required: bool,
    pub deprecated: bool,
    pub platforms: BTreeSet<Platform>,
    pub enum_values: Vec<String>,
    pub default_value: Option<ParameterValue>,
    pub constraints: Constraints,
}

impl Parameter {
    pub fn new(key: impl Into<String>, param_type: ParameterType) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            param_type,
            description: String::new(),
            required: false,
            deprecated: false,
            platforms: BTreeSet::new(),
            enum_values: Vec::new(),
            default_value: None,
            constraints: Constraints::default(),
        }
    }
}

/// Canonical grouping unit derived from a topic section or sub-identifier.
/// Sections form a tree of depth at most two via `parent_identifier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub platforms: BTreeSet<Platform>,
    pub deprecated: bool,
    /// True for sections unioned in from the supplement list rather than
    /// extracted from the upstream document.
    pub synthetic: bool,
    pub parameters: Vec<Parameter>,
    /// Derived identifier of the topic section this one was nested under.
    /// A grouping label, not a lookup key: the parent may have collapsed
    /// into its children and have no emitted `Section` of its own.
    pub parent_identifier: Option<String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            identifier: derive_identifier(&name),
            name,
            description: String::new(),
            platforms: BTreeSet::new(),
            deprecated: false,
            synthetic: false,
            parameters: Vec::new(),
            parent_identifier: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_identifier = Some(parent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier_derivation_is_deterministic() {
        assert_eq!(derive_identifier("Top Level"), "toplevel");
        assert_eq!(derive_identifier("Accounts"), "accounts");
        assert_eq!(derive_identifier("Wi-Fi"), "wifi");
        assert_eq!(
            derive_identifier("Top Level"),
            derive_identifier("Top Level")
        );
    }

    #[test]
    fn test_empty_document_is_structurally_valid() {
        let doc = SpecDocument::empty();
        assert!(doc.is_structurally_valid());
        assert!(doc.topic_sections().is_empty());
        assert_eq!(doc.references().map(Map::len), Some(0));
    }

    #[test]
    fn test_structural_validity_rejects_missing_references() {
        let doc = SpecDocument::from_value(serde_json::json!({ "topicSections": [] }));
        assert!(!doc.is_structurally_valid());

        let doc = SpecDocument::from_value(serde_json::json!({
            "topicSections": {}, "references": {}
        }));
        assert!(!doc.is_structurally_valid());
    }

    #[test]
    fn test_topic_sections_skip_malformed_entries() {
        let doc = SpecDocument::from_value(serde_json::json!({
            "topicSections": [
                { "title": "Networking", "identifiers": ["a", 7, "b"] },
                "not an object",
                { "anchor": "mail" }
            ],
            "references": {}
        }));
        let sections = doc.topic_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].identifiers, vec!["a", "b"]);
        assert_eq!(sections[1].label(), Some("mail"));
    }

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!(Platform::parse("macOS"), Some(Platform::MacOs));
        assert_eq!(Platform::parse("IOS"), Some(Platform::Ios));
        assert_eq!(Platform::parse("solaris"), None);
    }

    #[test]
    fn test_empty_values() {
        assert!(ParameterValue::Text(String::new()).is_empty());
        assert!(ParameterValue::TextList(vec![]).is_empty());
        assert!(!ParameterValue::Bool(false).is_empty());
        assert!(!ParameterValue::Int(0).is_empty());
    }
}
