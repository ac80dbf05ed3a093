//! Parameter type inference and normalization into the closed type set.

use crate::model::{ParameterType, ParameterValue};
use serde_json::Value;
use std::collections::BTreeMap;

/// Map an upstream type string into the closed set.
///
/// Precedence: exact canonical name → case-insensitive canonical name →
/// substring heuristics → `String`. The heuristics accept vendor spellings
/// like `"Int"`, `"Float"`, `"List"`, `"Dict"` and qualified forms like
/// `"uint32"` or `"array of strings"`.
pub fn normalize_type(raw: &str) -> ParameterType {
    const CANONICAL: &[(&str, ParameterType)] = &[
        ("string", ParameterType::String),
        ("boolean", ParameterType::Boolean),
        ("number", ParameterType::Number),
        ("integer", ParameterType::Integer),
        ("array", ParameterType::Array),
        ("object", ParameterType::Object),
        ("enum", ParameterType::Enum),
        ("date", ParameterType::Date),
        ("data", ParameterType::Data),
    ];

    let trimmed = raw.trim();
    if let Some((_, t)) = CANONICAL.iter().find(|(name, _)| *name == trimmed) {
        return *t;
    }
    let lower = trimmed.to_ascii_lowercase();
    if let Some((_, t)) = CANONICAL.iter().find(|(name, _)| *name == lower) {
        return *t;
    }

    // Substring heuristics, most specific first. "date"/"time" must be
    // checked before "data" would ever be reached via other spellings.
    if lower.contains("bool") {
        ParameterType::Boolean
    } else if lower.contains("int") {
        ParameterType::Integer
    } else if lower.contains("float") || lower.contains("double") || lower.contains("real") {
        ParameterType::Number
    } else if lower.contains("array") || lower.contains("list") {
        ParameterType::Array
    } else if lower.contains("dict") || lower.contains("object") {
        ParameterType::Object
    } else if lower.contains("date") || lower.contains("time") {
        ParameterType::Date
    } else if lower.contains("enum") || lower.contains("choice") {
        ParameterType::Enum
    } else if lower.contains("data") || lower.contains("base64") {
        ParameterType::Data
    } else if lower.contains("number") {
        ParameterType::Number
    } else {
        ParameterType::String
    }
}

/// Keys that may carry an explicit type declaration.
const TYPE_KEYS: &[&str] = &["type", "dataType", "valueType"];

/// Keys that mark a record as enum-like.
pub(crate) const ENUM_KEYS: &[&str] = &["enum", "possibleValues", "allowedValues"];

/// Keys that may carry a default value.
pub(crate) const DEFAULT_KEYS: &[&str] = &["default", "defaultValue"];

/// Infer the type of a parameter record.
///
/// Precedence: explicit type field → enum-like fields → the runtime type of
/// a present default value → numeric bounds → `String`.
pub fn detect_parameter_type(record: &Value) -> ParameterType {
    if let Some(raw) = explicit_type_text(record) {
        return normalize_type(&raw);
    }
    if ENUM_KEYS
        .iter()
        .any(|key| record.get(key).is_some_and(|v| !v.is_null()))
    {
        return ParameterType::Enum;
    }
    for key in DEFAULT_KEYS {
        match record.get(key) {
            Some(Value::Bool(_)) => return ParameterType::Boolean,
            Some(Value::Number(n)) => {
                return if n.is_i64() || n.is_u64() {
                    ParameterType::Integer
                } else {
                    ParameterType::Number
                };
            }
            Some(Value::String(_)) => return ParameterType::String,
            Some(Value::Array(_)) => return ParameterType::Array,
            Some(Value::Object(_)) => return ParameterType::Object,
            _ => {}
        }
    }
    if record.get("minimum").is_some() || record.get("maximum").is_some() {
        return ParameterType::Number;
    }
    ParameterType::String
}

/// The explicit type declaration of a record, flattened to text. Upstream
/// shapes vary: a plain string, or an array of token fragments each carrying
/// a `text` field.
fn explicit_type_text(record: &Value) -> Option<String> {
    for key in TYPE_KEYS {
        match record.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Array(tokens)) => {
                let joined: String = tokens
                    .iter()
                    .filter_map(|t| {
                        t.as_str()
                            .map(str::to_string)
                            .or_else(|| t.get("text").and_then(Value::as_str).map(str::to_string))
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                if !joined.trim().is_empty() {
                    return Some(joined);
                }
            }
            _ => {}
        }
    }
    None
}

/// Coerce a raw JSON value into the closed value union. Arrays and objects
/// flatten their items/entries to text, matching the serializer's encoding.
pub fn json_to_value(value: &Value) -> Option<ParameterValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(ParameterValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(ParameterValue::Int(i))
            } else {
                n.as_f64().map(ParameterValue::Float)
            }
        }
        Value::String(s) => Some(ParameterValue::Text(s.clone())),
        Value::Array(items) => Some(ParameterValue::TextList(
            items.iter().map(text_of).collect(),
        )),
        Value::Object(entries) => Some(ParameterValue::TextMap(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), text_of(v)))
                .collect::<BTreeMap<_, _>>(),
        )),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
