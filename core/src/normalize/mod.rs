//! Normalization: heterogeneous upstream documents in, canonical
//! `Section`/`Parameter` records out.
//!
//! Nothing in this module throws past its own boundary. Strategy failures
//! are logged and skipped so a single malformed entry never poisons a
//! batch load.

pub mod parameters;
pub mod property_table;
pub mod sections;
pub mod types;

pub use property_table::{AvailabilityRow, PayloadMetadata, PropertyDefinition, SectionDetails};
pub use types::{detect_parameter_type, json_to_value, normalize_type};

use crate::model::{Parameter, Section, SpecDocument};

/// Explicitly constructed normalization service. Stateless; exists so the
/// composition root can hand out an injected instance instead of relying on
/// module-level globals.
#[derive(Debug, Default, Clone)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Extract the canonical section list from a resolved document.
    pub fn extract_sections(&self, doc: &SpecDocument) -> Vec<Section> {
        sections::extract_sections(doc)
    }

    /// Extract the parameters of one section document.
    pub fn extract_parameters(&self, doc: &SpecDocument, section_name: &str) -> Vec<Parameter> {
        parameters::extract_parameters(doc, section_name)
    }

    /// Mine structured section-level details (property table, payload
    /// metadata, availability matrix, example snippet) where present.
    pub fn extract_details(&self, doc: &SpecDocument) -> SectionDetails {
        property_table::extract_details(doc)
    }
}
