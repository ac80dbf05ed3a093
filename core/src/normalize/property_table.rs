//! Property-table extractor for the richer upstream page shape.
//!
//! Section pages sometimes carry `primaryContentSections` blocks with fully
//! structured property declarations, plus page metadata, an availability
//! matrix, and an example payload snippet. When present this is the most
//! structured parameter source and takes priority over the heuristics.
//! Everything here is tolerant: a malformed block yields nothing rather
//! than an error.

use super::types::{DEFAULT_KEYS, ENUM_KEYS, detect_parameter_type, json_to_value};
use crate::model::{Constraints, Parameter, ParameterValue, Platform, SpecDocument};
use serde_json::Value;
use std::collections::BTreeSet;

/// One fully structured property definition mined from a properties block.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub parameter: Parameter,
}

/// Page-level payload metadata. Descriptive only; nothing downstream
/// branches on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadMetadata {
    pub payload_type: Option<String>,
    pub platforms: BTreeSet<Platform>,
    pub schema_version: Option<String>,
}

/// One row of the availability matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityRow {
    pub setting: String,
    pub availability: Option<String>,
    pub channel: Option<String>,
    pub supervision: Option<String>,
}

/// Everything the property-table extractor mines from one section page.
#[derive(Debug, Clone, Default)]
pub struct SectionDetails {
    pub properties: Vec<PropertyDefinition>,
    pub payload: Option<PayloadMetadata>,
    pub availability: Vec<AvailabilityRow>,
    pub example: Option<String>,
}

/// Mine a section document for structured details.
pub fn extract_details(doc: &SpecDocument) -> SectionDetails {
    let mut details = SectionDetails {
        payload: payload_metadata(doc.raw()),
        ..SectionDetails::default()
    };

    let Some(sections) = doc
        .raw()
        .get("primaryContentSections")
        .and_then(Value::as_array)
    else {
        return details;
    };

    for block in sections {
        match block.get("kind").and_then(Value::as_str) {
            Some("properties") | Some("declarations") => {
                details.properties.extend(property_definitions(block));
            }
            Some("availability") => {
                details.availability.extend(availability_rows(block));
            }
            Some("example") | Some("codeListing") => {
                if details.example.is_none() {
                    details.example = example_snippet(block);
                }
            }
            _ => {}
        }
    }
    details
}

fn property_definitions(block: &Value) -> Vec<PropertyDefinition> {
    let items = block
        .get("items")
        .or_else(|| block.get("properties"))
        .and_then(Value::as_array);
    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name").and_then(Value::as_str)?;
            if name.is_empty() {
                tracing::warn!("skipping property definition with empty name");
                return None;
            }
            Some(PropertyDefinition {
                parameter: parameter_from_item(name, item),
            })
        })
        .collect()
}

fn parameter_from_item(name: &str, item: &Value) -> Parameter {
    let mut parameter = Parameter::new(name, detect_parameter_type(item));
    parameter.description = flatten_text(
        item.get("abstract")
            .or_else(|| item.get("content"))
            .unwrap_or(&Value::Null),
    );
    parameter.required = item
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    parameter.deprecated = item
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    parameter.platforms = parse_platforms(item.get("platforms"));
    parameter.enum_values = enum_values(item);
    parameter.default_value = default_value(item);

    // Bounds may sit directly on the item or inside an attributes list.
    parameter.constraints = constraints_of(item);
    parameter
}

fn constraints_of(item: &Value) -> Constraints {
    let mut constraints = Constraints {
        min_length: item.get("minimumLength").and_then(Value::as_u64),
        max_length: item.get("maximumLength").and_then(Value::as_u64),
        minimum: item.get("minimum").and_then(Value::as_f64),
        maximum: item.get("maximum").and_then(Value::as_f64),
        pattern: item
            .get("pattern")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    if let Some(attributes) = item.get("attributes").and_then(Value::as_array) {
        for attribute in attributes {
            let value = attribute.get("value");
            match attribute.get("kind").and_then(Value::as_str) {
                Some("minimum") => {
                    constraints.minimum = constraints
                        .minimum
                        .or_else(|| value.and_then(numeric_value));
                }
                Some("maximum") => {
                    constraints.maximum = constraints
                        .maximum
                        .or_else(|| value.and_then(numeric_value));
                }
                Some("minimumLength") => {
                    constraints.min_length =
                        constraints.min_length.or_else(|| value.and_then(Value::as_u64));
                }
                Some("maximumLength") => {
                    constraints.max_length =
                        constraints.max_length.or_else(|| value.and_then(Value::as_u64));
                }
                Some("pattern") => {
                    if constraints.pattern.is_none() {
                        constraints.pattern =
                            value.and_then(Value::as_str).map(str::to_string);
                    }
                }
                _ => {}
            }
        }
    }
    constraints
}

fn numeric_value(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn enum_values(item: &Value) -> Vec<String> {
    for key in ENUM_KEYS {
        if let Some(values) = item.get(key).and_then(Value::as_array) {
            return values.iter().map(enum_entry_text).collect();
        }
    }
    if let Some(attributes) = item.get("attributes").and_then(Value::as_array) {
        for attribute in attributes {
            if attribute.get("kind").and_then(Value::as_str) == Some("allowedValues")
                && let Some(values) = attribute.get("values").and_then(Value::as_array)
            {
                return values.iter().map(enum_entry_text).collect();
            }
        }
    }
    Vec::new()
}

fn enum_entry_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("value")
            .or_else(|| obj.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

fn default_value(item: &Value) -> Option<ParameterValue> {
    for key in DEFAULT_KEYS {
        if let Some(value) = item.get(key)
            && let Some(converted) = json_to_value(value)
        {
            return Some(converted);
        }
    }
    if let Some(attributes) = item.get("attributes").and_then(Value::as_array) {
        for attribute in attributes {
            if attribute.get("kind").and_then(Value::as_str) == Some("default")
                && let Some(value) = attribute.get("value")
            {
                return json_to_value(value);
            }
        }
    }
    None
}

fn payload_metadata(raw: &Value) -> Option<PayloadMetadata> {
    let metadata = raw.get("metadata")?.as_object()?;
    let payload_type = metadata
        .get("externalID")
        .or_else(|| metadata.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let schema_version = metadata
        .get("schemaVersion")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    let platforms = parse_platforms(metadata.get("platforms"));
    if payload_type.is_none() && schema_version.is_none() && platforms.is_empty() {
        return None;
    }
    Some(PayloadMetadata {
        payload_type,
        platforms,
        schema_version,
    })
}

fn availability_rows(block: &Value) -> Vec<AvailabilityRow> {
    let Some(rows) = block.get("rows").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let setting = row.get("setting").and_then(Value::as_str)?;
            let text_field =
                |key: &str| row.get(key).and_then(Value::as_str).map(str::to_string);
            Some(AvailabilityRow {
                setting: setting.to_string(),
                availability: text_field("availability"),
                channel: text_field("channel"),
                supervision: text_field("supervision"),
            })
        })
        .collect()
}

fn example_snippet(block: &Value) -> Option<String> {
    let code = block.get("code")?;
    match code {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => {
            let joined = lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// Flatten upstream rich-text shapes (plain strings, arrays of inline
/// fragments, nested paragraph content) into one plain string.
pub(crate) fn flatten_text(value: &Value) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    collect(item, out);
                }
            }
            Value::Object(obj) => {
                if let Some(text) = obj.get("text").and_then(Value::as_str) {
                    out.push(text.to_string());
                } else if let Some(inline) = obj.get("inlineContent").or_else(|| obj.get("content"))
                {
                    collect(inline, out);
                }
            }
            _ => {}
        }
    }
    let mut parts = Vec::new();
    collect(value, &mut parts);
    parts.join(" ").trim().to_string()
}

/// Platform labels arrive as plain strings or objects with a `name` field.
pub(crate) fn parse_platforms(value: Option<&Value>) -> BTreeSet<Platform> {
    let Some(Value::Array(items)) = value else {
        return BTreeSet::new();
    };
    items
        .iter()
        .filter_map(|item| {
            item.as_str()
                .or_else(|| item.get("name").and_then(Value::as_str))
                .and_then(Platform::parse)
        })
        .collect()
}
