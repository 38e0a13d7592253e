//! Import list assembly.
//!
//! Records are emitted in dependency order:
//! 1. Organization and source
//! 2. Codelist collections, then metadata collections
//! 3. Concepts for each output period, then unscoped concepts
//! 4. Mappings, grouped by relationship class
//! 5. Reference batches
//! 6. Released versions of every repository
//!
//! Reference batches keep only URLs emitted earlier in the list. The
//! result is deduplicated before it is returned.

use std::collections::BTreeSet;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use msp_core::BuildOutput;
use msp_model::records::{MappingRecord, OWNER_TYPE_ORGANIZATION};
use msp_model::{
    ConceptRecord, Entity, EntityKind, ImportRecord, RelationshipClass, Result, RunStats,
    SourceRef, concept_id_from_url,
};

use crate::dedup::dedup_records;
use crate::repositories::{
    codelist_collection_record, collection_version_record, metadata_collection_ids,
    metadata_collection_record, organization_record, source_record, source_version_record,
};

/// The deduplicated import list and the counts gathered while building it.
#[derive(Debug, Clone, Default)]
pub struct ImportList {
    pub records: Vec<Value>,
    pub records_before_dedup: usize,
    pub skipped_mappings: usize,
    /// Reference expressions dropped because their record was not emitted.
    pub dropped_references: usize,
}

impl ImportList {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.records_before_dedup.saturating_sub(self.records.len())
    }

    pub fn record_stats(&self, stats: &mut RunStats) {
        stats.records_before_dedup = self.records_before_dedup;
        stats.records_after_dedup = self.records.len();
        stats.skipped_mappings = self.skipped_mappings;
        stats.dropped_references = self.dropped_references;
    }
}

struct Assembler<'a> {
    output: &'a BuildOutput,
    records: Vec<Value>,
    /// Concept and mapping URLs emitted so far. Mappings and references
    /// only point at URLs in this set.
    emitted: BTreeSet<String>,
    skipped_mappings: usize,
    dropped_references: usize,
}

impl<'a> Assembler<'a> {
    fn new(output: &'a BuildOutput) -> Self {
        Self {
            output,
            records: Vec::new(),
            emitted: BTreeSet::new(),
            skipped_mappings: 0,
            dropped_references: 0,
        }
    }

    fn push(&mut self, record: ImportRecord) -> Result<()> {
        self.records.push(record.to_value()?);
        Ok(())
    }

    fn kind_enabled(&self, kind: EntityKind) -> bool {
        let emit = &self.output.options().emit;
        match kind {
            EntityKind::ReferenceIndicator => emit.reference_indicators,
            EntityKind::DataElement => emit.datim_data_elements,
            EntityKind::DerivedDataElement => emit.pdh_derived_data_elements,
            EntityKind::CategoryOptionCombo => emit.disaggregates,
            EntityKind::Indicator => emit.datim_indicators,
        }
    }

    fn concept(&mut self, entity: &Entity) -> Result<()> {
        if !self.kind_enabled(entity.kind()) {
            return Ok(());
        }
        self.push(ImportRecord::Concept(ConceptRecord::from_entity(entity)?))?;
        self.emitted.insert(entity.url.clone());
        Ok(())
    }

    fn repositories(&mut self) -> Result<()> {
        let output = self.output;
        let options = output.options();
        let repository = &options.repository;
        if options.emit.org {
            self.push(ImportRecord::Organization(organization_record(repository)))?;
        }
        if options.emit.source {
            self.push(ImportRecord::Source(source_record(repository)))?;
        }
        if options.emit.codelist_collections {
            for codelist in output.codelists.iter() {
                self.push(ImportRecord::Collection(codelist_collection_record(
                    repository, codelist,
                )))?;
            }
        }
        for collection_id in metadata_collection_ids(&options.emit, &options.output_periods) {
            self.push(ImportRecord::Collection(metadata_collection_record(
                repository,
                &collection_id,
            )))?;
        }
        Ok(())
    }

    fn concepts_for_period(&mut self, period: &str) -> Result<()> {
        let output = self.output;
        let entities = &output.entities;
        let before = self.records.len();
        for indicator in &entities.reference_indicators {
            if indicator.is_valid_for(period) {
                self.concept(indicator)?;
            }
        }
        let elements: Vec<&Entity> = entities
            .data_elements
            .values()
            .chain(entities.derived_data_elements.values())
            .filter(|element| element.is_valid_for(period))
            .collect();
        for element in &elements {
            self.concept(element)?;
        }
        for indicator in entities.indicators.values() {
            if indicator.is_valid_for(period) {
                self.concept(indicator)?;
            }
        }
        for element in &elements {
            for url in element.disaggregate_urls() {
                if let Some(disaggregate) = entities.disaggregates.get(url) {
                    self.concept(disaggregate)?;
                }
            }
        }
        debug!(period, concepts = self.records.len() - before, "period concepts emitted");
        Ok(())
    }

    /// Entities without a period attribute, and disaggregates no period reached.
    fn unscoped_concepts(&mut self) -> Result<()> {
        let output = self.output;
        let entities = &output.entities;
        let before = self.records.len();
        let unscoped = entities
            .data_elements
            .values()
            .chain(entities.derived_data_elements.values())
            .chain(entities.indicators.values())
            .filter(|entity| !entity.has_period_attribute());
        for entity in unscoped {
            self.concept(entity)?;
        }
        for disaggregate in entities.disaggregates.values() {
            if !self.emitted.contains(&disaggregate.url) {
                self.concept(disaggregate)?;
            }
        }
        debug!(concepts = self.records.len() - before, "unscoped concepts emitted");
        Ok(())
    }

    fn mapping_record(
        &self,
        source: &SourceRef,
        class: RelationshipClass,
        from: &str,
        to: &str,
    ) -> MappingRecord {
        let id = if self.output.options().explicit_mapping_ids {
            concept_id_from_url(from)
                .zip(concept_id_from_url(to))
                .map(|(from_id, to_id)| SourceRef::mapping_id(from_id, to_id))
        } else {
            None
        };
        MappingRecord {
            id,
            owner: source.org_id.clone(),
            owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
            source: source.source_id.clone(),
            map_type: class.map_type(),
            from_concept_url: from.to_string(),
            to_concept_url: to.to_string(),
        }
    }

    fn mappings(&mut self) -> Result<()> {
        let output = self.output;
        let source = &output.context.source;
        let graph = &output.graph;
        for class in RelationshipClass::ALL {
            let mut emitted = 0usize;
            for (from, to) in graph.class(class).edges() {
                if !(self.emitted.contains(from) && self.emitted.contains(to)) {
                    self.skipped_mappings += 1;
                    continue;
                }
                let record = self.mapping_record(source, class, from, to);
                if let Some(id) = &record.id {
                    self.emitted.insert(source.mapping_url(id));
                }
                self.push(ImportRecord::Mapping(record))?;
                emitted += 1;
            }
            debug!(class = %class, mappings = emitted, "mappings emitted");
        }
        Ok(())
    }

    fn references(&mut self) -> Result<()> {
        let output = self.output;
        let owner = &output.context.source.org_id;
        for batch in &output.references {
            let mut record = batch.to_record(owner);
            let expressions = &mut record.data.expressions;
            let before = expressions.len();
            expressions.retain(|url| self.emitted.contains(url));
            self.dropped_references += before - expressions.len();
            if expressions.is_empty() {
                continue;
            }
            self.push(ImportRecord::Reference(record))?;
        }
        Ok(())
    }

    fn versions(&mut self) -> Result<()> {
        let output = self.output;
        let options = output.options();
        let repository = &options.repository;
        if options.emit.source {
            self.push(ImportRecord::SourceVersion(source_version_record(repository)))?;
        }
        if options.emit.codelist_collections {
            for codelist in output.codelists.iter() {
                self.push(ImportRecord::CollectionVersion(collection_version_record(
                    repository,
                    &codelist.id,
                )))?;
            }
        }
        for collection_id in metadata_collection_ids(&options.emit, &options.output_periods) {
            self.push(ImportRecord::CollectionVersion(collection_version_record(
                repository,
                &collection_id,
            )))?;
        }
        Ok(())
    }
}

/// Orders every artifact of a run into one deduplicated import list.
pub fn build_import_list(output: &BuildOutput) -> Result<ImportList> {
    info_span!("assemble").in_scope(|| {
        let start = Instant::now();
        let mut assembler = Assembler::new(output);
        assembler.repositories()?;
        for period in &output.options().output_periods {
            assembler.concepts_for_period(period)?;
        }
        if output.options().emit_unscoped_concepts {
            assembler.unscoped_concepts()?;
        }
        assembler.mappings()?;
        assembler.references()?;
        assembler.versions()?;

        let records_before_dedup = assembler.records.len();
        let skipped_mappings = assembler.skipped_mappings;
        let dropped_references = assembler.dropped_references;
        let records = dedup_records(assembler.records)?;
        if skipped_mappings > 0 {
            warn!(
                skipped_mappings,
                "mappings dropped because an endpoint concept was not emitted"
            );
        }
        if dropped_references > 0 {
            warn!(
                dropped_references,
                "reference expressions dropped because their record was not emitted"
            );
        }
        info!(
            records = records.len(),
            duplicates_removed = records_before_dedup - records.len(),
            duration_ms = start.elapsed().as_millis(),
            "import list assembled"
        );
        Ok(ImportList {
            records,
            records_before_dedup,
            skipped_mappings,
            dropped_references,
        })
    })
}
