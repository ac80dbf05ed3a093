//! Read-only projection of the modified-value store, used by the CLI to
//! show what an export would contain without producing a document.

use crate::store::ModifiedValueStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Preview {
    pub summary: String,
    pub sections: Vec<PreviewSection>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewSection {
    pub section_id: String,
    pub entries: Vec<PreviewEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewEntry {
    pub key: String,
    pub value: String,
    pub value_type: String,
}

/// Build a preview over the current store contents. Ordering mirrors the
/// export: first-seen section order, set order within each section.
pub fn build_preview(store: &ModifiedValueStore) -> Preview {
    let groups = store.by_section();
    let summary = format!(
        "{} parameter(s) modified across {} section(s)",
        store.count(),
        groups.len()
    );
    let sections = groups
        .into_iter()
        .map(|(section_id, records)| PreviewSection {
            section_id,
            entries: records
                .into_iter()
                .map(|record| PreviewEntry {
                    key: record.parameter_key,
                    value: record.value.display_text(),
                    value_type: record.param_type.as_str().to_string(),
                })
                .collect(),
        })
        .collect();
    Preview { summary, sections }
}
