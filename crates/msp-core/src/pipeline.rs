//! End-to-end metadata build.
//!
//! Stages run in a fixed order, each inside its own span:
//! 1. Build reference indicators and the indicator matcher
//! 2. Build disaggregates, codelists and data elements
//! 3. Apply codelist membership
//! 4. Build derived data elements and resolve identifier overlaps
//! 5. Build computed indicators
//! 6. Annotate reference indicator codes
//! 7. Build the relationship graph
//! 8. Project reference batches

use std::time::Instant;

use tracing::{debug, info, info_span};

use msp_map::IndicatorMatcher;
use msp_model::{
    CodelistIndex, EntityKind, EntitySet, InputCounts, ProcessingOptions, ReferenceBatch,
    RelationshipGraph, Result, RunStats, SourceInputs,
};

use crate::builders::{
    build_category_option_combos, build_data_elements, build_derived_data_elements,
    build_indicators, build_reference_indicators, ensure_disaggregates_resolved,
};
use crate::codelists::{CodelistMembership, apply_codelist_membership, build_codelists};
use crate::matching::annotate_indicators;
use crate::overlap::{ensure_unique_urls, resolve_uid_overlaps};
use crate::pipeline_context::PipelineContext;
use crate::references::build_references;
use crate::relationships::build_relationship_graph;

/// Everything a run produces before the import list is assembled.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub context: PipelineContext,
    pub entities: EntitySet,
    pub codelists: CodelistIndex,
    pub membership: CodelistMembership,
    pub graph: RelationshipGraph,
    pub references: Vec<ReferenceBatch>,
    pub stats: RunStats,
}

impl BuildOutput {
    pub fn options(&self) -> &ProcessingOptions {
        &self.context.options
    }
}

fn input_counts(inputs: &SourceInputs) -> InputCounts {
    InputCounts {
        reference_indicators: inputs.reference_indicators.len(),
        data_elements: inputs.data_elements.len(),
        category_option_combos: inputs.category_option_combos.len(),
        indicators: inputs.indicators.len(),
        derived_rows: inputs.derived_rows.len(),
        codelists: inputs.codelists.len(),
        skipped_codelist_rows: 0,
    }
}

/// Runs every stage over already-parsed inputs.
///
/// Integrity violations stop the run at the stage that finds them.
pub fn run_pipeline(inputs: &SourceInputs, options: ProcessingOptions) -> Result<BuildOutput> {
    let run_span = info_span!(
        "build",
        org = %options.repository.org_id,
        source = %options.repository.source_id
    );
    let _run_guard = run_span.enter();
    let run_start = Instant::now();

    let mut context = PipelineContext::new(options);
    let mut stats = RunStats {
        inputs: input_counts(inputs),
        ..RunStats::default()
    };
    let mut entities = EntitySet::default();

    info_span!("reference_indicators").in_scope(|| {
        let start = Instant::now();
        entities.reference_indicators =
            build_reference_indicators(&inputs.reference_indicators, &context.source);
        debug!(
            reference_indicators = entities.reference_indicators.len(),
            duration_ms = start.elapsed().as_millis(),
            "reference indicators built"
        );
    });
    context = context.with_matcher(IndicatorMatcher::from_reference_indicators(
        &entities.reference_indicators,
    ));

    let (codelists, membership) = info_span!("entities").in_scope(|| -> Result<_> {
        let start = Instant::now();
        entities.disaggregates =
            build_category_option_combos(&inputs.category_option_combos, &context.source);
        let codelists = build_codelists(&inputs.codelists, &mut stats)?;
        entities.data_elements = build_data_elements(
            &inputs.data_elements,
            &context.source,
            &entities.disaggregates,
        )?;
        ensure_disaggregates_resolved(&entities.data_elements, &entities.disaggregates)?;

        let membership = CodelistMembership::compute(&entities.data_elements, &codelists);
        apply_codelist_membership(&mut entities.data_elements, &codelists, &membership);

        entities.derived_data_elements = build_derived_data_elements(
            &inputs.derived_rows,
            &context.source,
            context.input_periods(),
            context.options.pdh_run_sequences,
            &entities.disaggregates,
            &mut stats,
        )?;
        resolve_uid_overlaps(&mut entities, context.options.uid_overlap, &mut stats)?;

        entities.indicators = build_indicators(
            &inputs.indicators,
            &context.source,
            &entities.data_elements,
            &entities.disaggregates,
        );
        ensure_unique_urls(&entities)?;

        debug!(
            codelists = codelists.len(),
            data_elements = entities.data_elements.len(),
            derived_data_elements = entities.derived_data_elements.len(),
            disaggregates = entities.disaggregates.len(),
            indicators = entities.indicators.len(),
            duration_ms = start.elapsed().as_millis(),
            "entities built"
        );
        Ok((codelists, membership))
    })?;

    info_span!("matching").in_scope(|| {
        annotate_indicators(&mut entities, &context.matcher, &mut stats);
    });

    let graph =
        build_relationship_graph(&context.source, &entities, &context.matcher, &mut stats)?;

    let references = info_span!("references").in_scope(|| {
        build_references(
            &context.source,
            &entities,
            &graph,
            &codelists,
            &membership,
            &context.options,
            &mut stats,
        )
    });

    stats.add_entities(EntityKind::ReferenceIndicator, entities.reference_indicators.len());
    stats.add_entities(EntityKind::DataElement, entities.data_elements.len());
    stats.add_entities(EntityKind::DerivedDataElement, entities.derived_data_elements.len());
    stats.add_entities(EntityKind::CategoryOptionCombo, entities.disaggregates.len());
    stats.add_entities(EntityKind::Indicator, entities.indicators.len());

    info!(
        entities = entities.len(),
        matched_elements = stats.matched_elements,
        unmatched_elements = stats.unmatched_elements,
        batches = references.len(),
        duration_ms = run_start.elapsed().as_millis(),
        "metadata build complete"
    );

    Ok(BuildOutput {
        context,
        entities,
        codelists,
        membership,
        graph,
        references,
        stats,
    })
}
