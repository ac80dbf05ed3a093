//! Parameter extraction for one section document.
//!
//! Like section extraction, this walks an ordered list of sources and takes
//! the first non-empty result. The property table is first because it is
//! the most structured shape; the bounded deep search is the last resort.

use super::property_table::{self, flatten_text, parse_platforms};
use super::types::{DEFAULT_KEYS, ENUM_KEYS, detect_parameter_type, json_to_value};
use crate::model::{Constraints, Parameter, SpecDocument};
use serde_json::Value;
use std::collections::HashSet;

const DEEP_SEARCH_MAX_DEPTH: usize = 5;

/// Extract the parameters of one section document, in source priority
/// order. Never fails; an unparseable document yields an empty list.
pub fn extract_parameters(doc: &SpecDocument, section_name: &str) -> Vec<Parameter> {
    type ParameterSource = fn(&SpecDocument) -> Vec<Parameter>;
    const SOURCES: &[(&str, ParameterSource)] = &[
        ("property-table", from_property_table),
        ("topic-identifiers", from_topic_identifiers),
        ("reference-scan", from_reference_scan),
        ("parameter-map", from_parameter_map),
        ("deep-search", from_deep_search),
    ];

    for (name, source) in SOURCES {
        let parameters = source(doc);
        if !parameters.is_empty() {
            tracing::debug!(
                section = section_name,
                source = name,
                count = parameters.len(),
                "parameters extracted"
            );
            return parameters;
        }
    }
    tracing::debug!(section = section_name, "no parameters found");
    Vec::new()
}

/// Highest priority: structured property definitions mined by the
/// property-table extractor.
fn from_property_table(doc: &SpecDocument) -> Vec<Parameter> {
    property_table::extract_details(doc)
        .properties
        .into_iter()
        .map(|definition| definition.parameter)
        .collect()
}

/// Topic-section identifiers resolved through the reference table.
fn from_topic_identifiers(doc: &SpecDocument) -> Vec<Parameter> {
    let Some(references) = doc.references() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for topic in doc.topic_sections() {
        for identifier in &topic.identifiers {
            let Some(record) = references.get(identifier) else {
                continue;
            };
            if !is_symbol_record(record) {
                continue;
            }
            let key = record
                .get("title")
                .and_then(Value::as_str)
                .or_else(|| trailing_segment(identifier));
            let Some(key) = key else { continue };
            if key.is_empty() || !seen.insert(key.to_string()) {
                continue;
            }
            out.push(parameter_from_record(key, record));
        }
    }
    out
}

/// Direct reference-table scan, filtered to symbol-kind entries.
fn from_reference_scan(doc: &SpecDocument) -> Vec<Parameter> {
    let Some(references) = doc.references() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for record in references.values() {
        if !is_symbol_record(record) {
            continue;
        }
        let Some(key) = record.get("title").and_then(Value::as_str) else {
            continue;
        };
        if key.is_empty() || !seen.insert(key.to_string()) {
            continue;
        }
        out.push(parameter_from_record(key, record));
    }
    out
}

/// A `parameters`/`configurationParameters` map keyed by parameter name.
fn from_parameter_map(doc: &SpecDocument) -> Vec<Parameter> {
    const MAP_KEYS: &[&str] = &["parameters", "configurationParameters"];
    for key in MAP_KEYS {
        if let Some(map) = doc.raw().get(key).and_then(Value::as_object) {
            let parameters: Vec<Parameter> = map
                .iter()
                .map(|(name, record)| parameter_from_record(name, record))
                .collect();
            if !parameters.is_empty() {
                return parameters;
            }
        }
    }
    Vec::new()
}

/// Bounded recursive scan for parameter-shaped objects. An object qualifies
/// when at least two of these hold: it declares a type, carries a
/// name/title, carries an abstract/description, is enum-like, has a
/// required flag, or has a default value.
fn from_deep_search(doc: &SpecDocument) -> Vec<Parameter> {
    fn walk(value: &Value, depth: usize, seen: &mut HashSet<String>, out: &mut Vec<Parameter>) {
        if depth > DEEP_SEARCH_MAX_DEPTH {
            return;
        }
        match value {
            Value::Object(obj) => {
                if parameter_signals(value) >= 2
                    && let Some(name) = obj
                        .get("name")
                        .or_else(|| obj.get("title"))
                        .and_then(Value::as_str)
                    && !name.is_empty()
                    && seen.insert(name.to_string())
                {
                    out.push(parameter_from_record(name, value));
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

fn parameter_signals(record: &Value) -> usize {
    let has = |keys: &[&str]| keys.iter().any(|k| record.get(*k).is_some_and(|v| !v.is_null()));
    [
        has(&["type", "dataType", "valueType"]),
        has(&["name", "title"]),
        has(&["abstract", "description"]),
        has(ENUM_KEYS),
        has(&["required"]),
        has(DEFAULT_KEYS),
    ]
    .into_iter()
    .filter(|signal| *signal)
    .count()
}

fn is_symbol_record(record: &Value) -> bool {
    record
        .get("kind")
        .or_else(|| record.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.to_ascii_lowercase().contains("symbol"))
}

fn trailing_segment(identifier: &str) -> Option<&str> {
    let segment = identifier.trim_end_matches('/').rsplit('/').next()?;
    (identifier.contains('/') && !segment.is_empty()).then_some(segment)
}

/// Build one parameter from a loosely shaped record.
fn parameter_from_record(key: &str, record: &Value) -> Parameter {
    let mut parameter = Parameter::new(key, detect_parameter_type(record));
    if let Some(name) = record
        .get("name")
        .or_else(|| record.get("title"))
        .and_then(Value::as_str)
        && !name.is_empty()
    {
        parameter.name = name.to_string();
    }
    parameter.description = flatten_text(
        record
            .get("abstract")
            .or_else(|| record.get("description"))
            .unwrap_or(&Value::Null),
    );
    parameter.required = flag(record, "required");
    parameter.deprecated = flag(record, "deprecated");
    parameter.platforms = parse_platforms(record.get("platforms"));
    for enum_key in ENUM_KEYS {
        if let Some(values) = record.get(enum_key).and_then(Value::as_array) {
            parameter.enum_values = values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            break;
        }
    }
    for default_key in DEFAULT_KEYS {
        if let Some(value) = record.get(default_key)
            && let Some(converted) = json_to_value(value)
        {
            parameter.default_value = Some(converted);
            break;
        }
    }
    parameter.constraints = Constraints {
        min_length: record.get("minLength").and_then(Value::as_u64),
        max_length: record.get("maxLength").and_then(Value::as_u64),
        minimum: record.get("minimum").and_then(Value::as_f64),
        maximum: record.get("maximum").and_then(Value::as_f64),
        pattern: record
            .get("pattern")
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    parameter
}

/// Booleans sometimes arrive as strings ("yes"/"true") in older shapes.
fn flag(record: &Value, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.to_ascii_lowercase();
            s == "true" || s == "yes" || s == "required"
        }
        _ => false,
    }
}
