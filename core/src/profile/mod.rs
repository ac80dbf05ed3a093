//! Configuration-profile export: validation, payload assembly, and the
//! plist rendering of the modified-value store.

mod plist;
mod preview;

pub use plist::PlistValue;
pub use plist::escape_xml;
pub use plist::write_document;
pub use preview::Preview;
pub use preview::PreviewEntry;
pub use preview::PreviewSection;
pub use preview::build_preview;

use crate::errors::ExportError;
use crate::model::ParameterType;
use crate::model::ParameterValue;
use crate::model::Section;
use crate::store::ModifiedRecord;
use crate::store::ModifiedValueStore;
use regex_lite::Regex;
use uuid::Uuid;

/// Top-level metadata for an exported profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileMeta {
    pub name: String,
    pub identifier: String,
    pub description: String,
}

/// Validate an export request, collecting every violation rather than
/// stopping at the first.
pub fn validate(meta: &ProfileMeta, sections: &[Section], store: &ModifiedValueStore) -> Vec<String> {
    let mut violations = Vec::new();
    if store.is_empty() {
        violations.push("no parameters have been modified".to_string());
    }
    if meta.name.trim().is_empty() {
        violations.push("profile name must not be empty".to_string());
    }
    if meta.identifier.is_empty() {
        violations.push("profile identifier must not be empty".to_string());
    } else if !identifier_pattern().is_match(&meta.identifier) {
        violations.push(format!(
            "profile identifier '{}' may only contain letters, digits, dots, and hyphens",
            meta.identifier
        ));
    }
    for (section_id, records) in store.by_section() {
        let Some(section) = sections.iter().find(|s| s.identifier == section_id) else {
            continue;
        };
        for parameter in section.parameters.iter().filter(|p| p.required) {
            let unset = !records.iter().any(|r| r.parameter_key == parameter.key);
            if unset {
                violations.push(format!(
                    "required parameter '{}' in section '{}' has no value",
                    parameter.key, section_id
                ));
            }
        }
    }
    violations
}

fn identifier_pattern() -> Regex {
    // regex-lite has no compile-time checking; the pattern is a constant and
    // covered by tests.
    #[allow(clippy::unwrap_used)]
    Regex::new("^[A-Za-z0-9.-]+$").unwrap()
}

/// Serialize the store into a complete configuration-profile document.
///
/// Fails with the full violation list when validation does not pass. Every
/// call generates fresh payload UUIDs; everything else about the output is
/// deterministic.
pub fn serialize(
    meta: &ProfileMeta,
    sections: &[Section],
    store: &ModifiedValueStore,
) -> Result<String, ExportError> {
    let violations = validate(meta, sections, store);
    if !violations.is_empty() {
        return Err(ExportError::Validation(violations));
    }

    let payloads = store
        .by_section()
        .into_iter()
        .map(|(section_id, records)| section_payload(&section_id, &records))
        .collect();

    let root = PlistValue::Dict(vec![
        ("PayloadContent".to_string(), PlistValue::Array(payloads)),
        (
            "PayloadDescription".to_string(),
            PlistValue::String(meta.description.clone()),
        ),
        (
            "PayloadDisplayName".to_string(),
            PlistValue::String(meta.name.clone()),
        ),
        (
            "PayloadIdentifier".to_string(),
            PlistValue::String(meta.identifier.clone()),
        ),
        (
            "PayloadType".to_string(),
            PlistValue::String("Configuration".to_string()),
        ),
        (
            "PayloadUUID".to_string(),
            PlistValue::String(fresh_uuid()),
        ),
        ("PayloadVersion".to_string(), PlistValue::Integer(1)),
        ("PayloadFormat".to_string(), PlistValue::Integer(1)),
    ]);
    Ok(write_document(&root))
}

fn section_payload(section_id: &str, records: &[ModifiedRecord]) -> PlistValue {
    let mut entries = vec![
        (
            "PayloadType".to_string(),
            PlistValue::String(section_id.to_string()),
        ),
        (
            "PayloadIdentifier".to_string(),
            PlistValue::String(format!("{section_id}.{}", fresh_uuid())),
        ),
        (
            "PayloadUUID".to_string(),
            PlistValue::String(fresh_uuid()),
        ),
        ("PayloadVersion".to_string(), PlistValue::Integer(1)),
    ];
    for record in records {
        entries.push((
            record.parameter_key.clone(),
            encode_value(&record.value, record.param_type),
        ));
    }
    PlistValue::Dict(entries)
}

fn fresh_uuid() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// Encode one stored value under its declared type. When the stored variant
/// does not match the declared type the textual rendering wins over a hard
/// failure; a lossy string beats a rejected export here.
fn encode_value(value: &ParameterValue, param_type: ParameterType) -> PlistValue {
    match (param_type, value) {
        (ParameterType::Boolean, ParameterValue::Bool(b)) => PlistValue::Boolean(*b),
        (ParameterType::Boolean, ParameterValue::Text(s)) => {
            PlistValue::Boolean(s.eq_ignore_ascii_case("true"))
        }
        (ParameterType::Integer, ParameterValue::Int(i)) => PlistValue::Integer(*i),
        (ParameterType::Integer, ParameterValue::Float(f)) => PlistValue::Integer(*f as i64),
        (ParameterType::Integer, ParameterValue::Text(s)) => match s.parse::<i64>() {
            Ok(i) => PlistValue::Integer(i),
            Err(_) => PlistValue::String(s.clone()),
        },
        (ParameterType::Number, ParameterValue::Float(f)) => PlistValue::Real(*f),
        (ParameterType::Number, ParameterValue::Int(i)) => PlistValue::Real(*i as f64),
        (ParameterType::Number, ParameterValue::Text(s)) => match s.parse::<f64>() {
            Ok(f) => PlistValue::Real(f),
            Err(_) => PlistValue::String(s.clone()),
        },
        (ParameterType::Date, ParameterValue::Timestamp(ts)) => PlistValue::Date(*ts),
        (ParameterType::Data, ParameterValue::Blob(encoded)) => PlistValue::Data(encoded.clone()),
        // Collection items always render as strings, whatever their source
        // type. Consumers rely on this shape.
        (ParameterType::Array, ParameterValue::TextList(items)) => PlistValue::Array(
            items
                .iter()
                .map(|item| PlistValue::String(item.clone()))
                .collect(),
        ),
        (ParameterType::Object, ParameterValue::TextMap(entries)) => PlistValue::Dict(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), PlistValue::String(v.clone())))
                .collect(),
        ),
        (_, other) => PlistValue::String(other.display_text()),
    }
}
