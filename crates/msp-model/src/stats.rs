//! Run statistics: expected absences and per-stage counts.
//!
//! Non-fatal conditions are aggregated here instead of being raised.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::relationship::RelationshipClass;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCounts {
    pub reference_indicators: usize,
    pub data_elements: usize,
    pub category_option_combos: usize,
    pub indicators: usize,
    pub derived_rows: usize,
    pub codelists: usize,
    /// Codelist rows without a resource type.
    pub skipped_codelist_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub inputs: InputCounts,
    /// Built entities per concept class.
    pub entities: BTreeMap<String, usize>,
    /// Unique reference indicator codes.
    pub indicator_codes: usize,
    pub matched_elements: usize,
    pub unmatched_elements: usize,
    /// Reference indicator codes no element or indicator was matched to.
    pub codes_without_children: Vec<String>,
    /// Data elements and derived elements with no period attribute.
    pub elements_without_periods: usize,
    pub indicators_without_periods: usize,
    /// Derivation sources that are not a built data element.
    pub unresolved_derivation_sources: usize,
    /// Derivation rows outside the configured run sequences.
    pub skipped_derived_rows: usize,
    pub uid_overlaps: usize,
    /// Edges per relationship class.
    pub edges: BTreeMap<String, usize>,
    /// Reference batches per collection.
    pub batches: BTreeMap<String, usize>,
    pub records_before_dedup: usize,
    pub records_after_dedup: usize,
    /// Mappings dropped because an endpoint concept was not emitted.
    pub skipped_mappings: usize,
    /// Reference expressions dropped because their record was not emitted.
    pub dropped_references: usize,
}

impl RunStats {
    pub fn record_entity(&mut self, kind: EntityKind) {
        self.add_entities(kind, 1);
    }

    pub fn add_entities(&mut self, kind: EntityKind, count: usize) {
        *self
            .entities
            .entry(kind.concept_class().to_string())
            .or_default() += count;
    }

    pub fn entity_count(&self, kind: EntityKind) -> usize {
        self.entities
            .get(kind.concept_class())
            .copied()
            .unwrap_or(0)
    }

    pub fn set_edges(&mut self, class: RelationshipClass, count: usize) {
        self.edges.insert(class.label().to_string(), count);
    }

    pub fn edge_count(&self, class: RelationshipClass) -> usize {
        self.edges.get(class.label()).copied().unwrap_or(0)
    }

    pub fn record_batch(&mut self, collection_id: &str) {
        *self.batches.entry(collection_id.to_string()).or_default() += 1;
    }

    pub fn duplicates_removed(&self) -> usize {
        self.records_before_dedup
            .saturating_sub(self.records_after_dedup)
    }
}
