//! Section extraction strategies.
//!
//! Upstream documents arrive in at least five incompatible shapes, so
//! extraction runs an explicit, ordered strategy list; the first strategy
//! yielding at least one section wins. Keep the order in
//! `SECTION_STRATEGIES` — it is the documented priority, not an accident
//! of code layout.

use super::property_table::{flatten_text, parse_platforms};
use crate::model::{Section, SpecDocument, derive_identifier};
use serde_json::Value;
use std::collections::HashSet;

pub(crate) type SectionStrategy = fn(&SpecDocument) -> Vec<Section>;

/// Ordered strategy table. Primary: the topic-section tree. Fallbacks, in
/// order: the reference table itself, known alternative container keys, and
/// a bounded whole-document search.
pub(crate) const SECTION_STRATEGIES: &[(&str, SectionStrategy)] = &[
    ("topic-sections", topic_section_strategy),
    ("reference-table", reference_table_strategy),
    ("alternative-containers", alternative_container_strategy),
    ("deep-search", deep_search_strategy),
];

/// Hard limit for the deep-search strategy.
const DEEP_SEARCH_MAX_DEPTH: usize = 5;

/// Sections the upstream source routinely omits from its tree. Unioned in
/// after extraction when absent, tagged synthetic.
const SUPPLEMENTAL_SECTIONS: &[(&str, &str)] = &[
    ("accounts", "Accounts"),
    ("certificates", "Certificates"),
    ("systemextensions", "System Extensions"),
    ("webcontentfilter", "Web Content Filter"),
];

/// Extract the canonical section list from a resolved document.
pub fn extract_sections(doc: &SpecDocument) -> Vec<Section> {
    let mut sections = Vec::new();
    for (name, strategy) in SECTION_STRATEGIES {
        let found = strategy(doc);
        if !found.is_empty() {
            tracing::debug!(strategy = name, count = found.len(), "sections extracted");
            sections = found;
            break;
        }
    }
    supplement_missing(&mut sections);
    sections
}

fn supplement_missing(sections: &mut Vec<Section>) {
    let present: HashSet<String> = sections.iter().map(|s| s.identifier.clone()).collect();
    for (identifier, name) in SUPPLEMENTAL_SECTIONS {
        if !present.contains(*identifier) {
            let mut section = Section::new(*name);
            section.synthetic = true;
            sections.push(section);
        }
    }
}

/// Primary strategy over `topicSections`.
///
/// Each identifier in a topic section resolves (via its trailing URL path
/// segment) to a section whose `parent_identifier` names the topic-section
/// grouping. A resolved identifier equal to the grouping itself is the
/// common single-page case: the guard drops the duplicate and the grouping
/// is emitted as a section of its own. A grouping whose identifiers all
/// fail to resolve likewise collapses to a single section.
fn topic_section_strategy(doc: &SpecDocument) -> Vec<Section> {
    let mut out: Vec<Section> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for topic in doc.topic_sections() {
        let Some(label) = topic.label() else {
            continue;
        };
        if topic.identifiers.is_empty() {
            continue;
        }
        let parent_identifier = derive_identifier(label);
        if parent_identifier.is_empty() {
            tracing::warn!(label, "topic section title normalizes to nothing, skipped");
            continue;
        }

        let mut resolved_any = false;
        for identifier in &topic.identifiers {
            let Some(segment) = trailing_path_segment(identifier) else {
                tracing::warn!(identifier, "identifier is not a documentation URL, skipped");
                continue;
            };
            let section_identifier = derive_identifier(segment);
            if section_identifier.is_empty() {
                continue;
            }
            // Self-reference guard.
            if section_identifier == parent_identifier {
                continue;
            }
            if !seen.insert(section_identifier) {
                continue;
            }
            let mut section = Section::new(segment).with_parent(parent_identifier.clone());
            enrich_from_reference(&mut section, doc, identifier);
            resolved_any = true;
            out.push(section);
        }

        if !resolved_any && seen.insert(parent_identifier) {
            let mut section = Section::new(label);
            // The self-referencing identifier usually carries the record
            // describing the page itself.
            if let Some(identifier) = topic.identifiers.first() {
                enrich_from_reference(&mut section, doc, identifier);
            }
            out.push(section);
        }
    }
    out
}

/// Fallback: scan the reference table for records describing configuration
/// pages (symbol-, topic-, or collection-kind entries with a title).
fn reference_table_strategy(doc: &SpecDocument) -> Vec<Section> {
    let Some(references) = doc.references() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for (identifier, record) in references {
        if !looks_like_section_record(record) {
            continue;
        }
        let Some(title) = record.get("title").and_then(Value::as_str) else {
            continue;
        };
        let section_identifier = derive_identifier(title);
        if section_identifier.is_empty() || !seen.insert(section_identifier) {
            continue;
        }
        let mut section = Section::new(title);
        apply_record(&mut section, record);
        tracing::debug!(identifier, "section from reference table");
        out.push(section);
    }
    out
}

fn looks_like_section_record(record: &Value) -> bool {
    const KIND_KEYS: &[&str] = &["kind", "type", "role"];
    KIND_KEYS.iter().any(|key| {
        record
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|kind| {
                let kind = kind.to_ascii_lowercase();
                kind.contains("symbol") || kind.contains("topic") || kind.contains("collection")
            })
    })
}

/// Fallback: known alternative container keys used by older document shapes.
fn alternative_container_strategy(doc: &SpecDocument) -> Vec<Section> {
    const CONTAINER_KEYS: &[&str] = &["primaryContentSections", "configurationTypes"];
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for key in CONTAINER_KEYS {
        let Some(entries) = doc.raw().get(key).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let Some(name) = entry
                .get("title")
                .or_else(|| entry.get("name"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let identifier = derive_identifier(name);
            if identifier.is_empty() || !seen.insert(identifier) {
                continue;
            }
            let mut section = Section::new(name);
            apply_record(&mut section, entry);
            out.push(section);
        }
    }
    out
}

/// Last resort: bounded recursive scan for objects that look like sections.
/// An object qualifies with a title/name plus an abstract/description, or a
/// name plus a parameters container.
fn deep_search_strategy(doc: &SpecDocument) -> Vec<Section> {
    fn walk(value: &Value, depth: usize, seen: &mut HashSet<String>, out: &mut Vec<Section>) {
        if depth > DEEP_SEARCH_MAX_DEPTH {
            return;
        }
        match value {
            Value::Object(obj) => {
                let name = obj
                    .get("title")
                    .or_else(|| obj.get("name"))
                    .and_then(Value::as_str);
                let described = obj.contains_key("abstract") || obj.contains_key("description");
                let has_parameters = obj.contains_key("parameters");
                if let Some(name) = name
                    && (described || has_parameters)
                {
                    let identifier = derive_identifier(name);
                    if !identifier.is_empty() && seen.insert(identifier) {
                        let mut section = Section::new(name);
                        apply_record(&mut section, value);
                        out.push(section);
                    }
                }
                for child in obj.values() {
                    walk(child, depth + 1, seen, out);
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, depth + 1, seen, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk(doc.raw(), 0, &mut seen, &mut out);
    out
}

/// The trailing path segment of a documentation URL, e.g.
/// `doc://…/documentation/DeviceManagement/WiFi` → `WiFi`.
fn trailing_path_segment(identifier: &str) -> Option<&str> {
    if !identifier.contains('/') {
        return None;
    }
    let segment = identifier.trim_end_matches('/').rsplit('/').next()?;
    (!segment.is_empty()).then_some(segment)
}

fn enrich_from_reference(section: &mut Section, doc: &SpecDocument, identifier: &str) {
    if let Some(record) = doc.references().and_then(|refs| refs.get(identifier)) {
        apply_record(section, record);
    }
}

/// Fold a reference/container record's descriptive fields into a section.
fn apply_record(section: &mut Section, record: &Value) {
    if let Some(title) = record.get("title").and_then(Value::as_str)
        && !title.is_empty()
    {
        section.name = title.to_string();
    }
    let description = flatten_text(
        record
            .get("abstract")
            .or_else(|| record.get("description"))
            .unwrap_or(&Value::Null),
    );
    if !description.is_empty() {
        section.description = description;
    }
    section.platforms = parse_platforms(record.get("platforms"));
    section.deprecated = record
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
}
