//! Modified-value store: the single source of truth for what the user has
//! changed. Sections and parameters are never mutated in place.
//!
//! Records keep insertion order because the serializer emits parameters in
//! the order they were set. A record exists iff its value is non-empty;
//! setting an empty value removes it.

use crate::model::{ParameterType, ParameterValue, Platform};
use std::collections::BTreeSet;

/// One user-edited value destined for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedRecord {
    pub section_id: String,
    pub parameter_key: String,
    pub value: ParameterValue,
    pub param_type: ParameterType,
    pub platforms: BTreeSet<Platform>,
    pub required: bool,
}

/// Metadata carried alongside a value on write.
#[derive(Debug, Clone, Default)]
pub struct ValueMeta {
    pub param_type: Option<ParameterType>,
    pub platforms: BTreeSet<Platform>,
    pub required: bool,
}

impl ValueMeta {
    pub fn typed(param_type: ParameterType) -> Self {
        Self {
            param_type: Some(param_type),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered map from `(section_id, parameter_key)` to a modified record.
#[derive(Debug, Default)]
pub struct ModifiedValueStore {
    records: Vec<ModifiedRecord>,
}

impl ModifiedValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. `None` or an empty value removes the record instead of
    /// storing an empty entry. Re-edits update in place, keeping the
    /// record's original position.
    pub fn set(
        &mut self,
        section_id: &str,
        parameter_key: &str,
        value: Option<ParameterValue>,
        meta: ValueMeta,
    ) {
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                self.remove(section_id, parameter_key);
                return;
            }
        };
        let param_type = meta.param_type.unwrap_or(infer_type(&value));
        if let Some(record) = self.position(section_id, parameter_key) {
            let record = &mut self.records[record];
            record.value = value;
            record.param_type = param_type;
            record.platforms = meta.platforms;
            record.required = meta.required;
            return;
        }
        self.records.push(ModifiedRecord {
            section_id: section_id.to_string(),
            parameter_key: parameter_key.to_string(),
            value,
            param_type,
            platforms: meta.platforms,
            required: meta.required,
        });
    }

    pub fn remove(&mut self, section_id: &str, parameter_key: &str) {
        if let Some(index) = self.position(section_id, parameter_key) {
            self.records.remove(index);
        }
    }

    pub fn get(&self, section_id: &str, parameter_key: &str) -> Option<&ParameterValue> {
        self.position(section_id, parameter_key)
            .map(|index| &self.records[index].value)
    }

    /// Defensive copies of every record, in set order.
    pub fn all(&self) -> Vec<ModifiedRecord> {
        self.records.clone()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records grouped by section, preserving both first-seen section order
    /// and per-section set order.
    pub fn by_section(&self) -> Vec<(String, Vec<ModifiedRecord>)> {
        let mut groups: Vec<(String, Vec<ModifiedRecord>)> = Vec::new();
        for record in &self.records {
            match groups.iter_mut().find(|(id, _)| *id == record.section_id) {
                Some((_, records)) => records.push(record.clone()),
                None => groups.push((record.section_id.clone(), vec![record.clone()])),
            }
        }
        groups
    }

    fn position(&self, section_id: &str, parameter_key: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.section_id == section_id && r.parameter_key == parameter_key)
    }
}

fn infer_type(value: &ParameterValue) -> ParameterType {
    match value {
        ParameterValue::Bool(_) => ParameterType::Boolean,
        ParameterValue::Int(_) => ParameterType::Integer,
        ParameterValue::Float(_) => ParameterType::Number,
        ParameterValue::Text(_) => ParameterType::String,
        ParameterValue::TextList(_) => ParameterType::Array,
        ParameterValue::TextMap(_) => ParameterType::Object,
        ParameterValue::Timestamp(_) => ParameterType::Date,
        ParameterValue::Blob(_) => ParameterType::Data,
    }
}
