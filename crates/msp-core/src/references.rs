//! Reference batches for every collection of a run.
//!
//! Codelists come first, then the `DATIM`, `PDH` and `MER` metadata
//! collections, each in period order with the `*` pass last.

use std::time::Instant;

use tracing::{debug, info};

use msp_model::options::{COLLECTION_DATIM, COLLECTION_MER, COLLECTION_PDH};
use msp_model::{
    CodelistIndex, Entity, EntitySet, ProcessingOptions, ReferenceBatch, RelationshipGraph,
    RunStats, SourceRef,
};

use crate::codelists::CodelistMembership;
use crate::projection::{CascadePolicy, PeriodBatches, Projector, merge_batches};

type CollectionProjection =
    fn(&Projector<'_>, &EntitySet, &RelationshipGraph, &[String]) -> PeriodBatches;

/// Member data elements with their disaggregates, per codelist.
pub fn codelist_references(
    projector: &Projector<'_>,
    entities: &EntitySet,
    codelists: &CodelistIndex,
    membership: &CodelistMembership,
    graph: &RelationshipGraph,
) -> Vec<ReferenceBatch> {
    let mut batches = Vec::new();
    for codelist in codelists.iter() {
        let members: Vec<&Entity> = membership
            .members(&codelist.external_id)
            .iter()
            .filter_map(|url| entities.data_elements.get(url))
            .collect();
        if members.is_empty() {
            debug!(codelist = %codelist.id, "codelist has no members");
            continue;
        }
        let projected = projector.project(
            &codelist.id,
            &members,
            &[&graph.data_element_to_disaggregate],
            &[],
            CascadePolicy::with_targets().all_periods(),
        );
        batches.extend(projected.into_values().flatten());
    }
    batches
}

/// DATIM data elements with their disaggregates, computed indicators, and
/// the reference indicators linked to either.
pub fn datim_references(
    projector: &Projector<'_>,
    entities: &EntitySet,
    graph: &RelationshipGraph,
    periods: &[String],
) -> PeriodBatches {
    let data_elements: Vec<&Entity> = entities.data_elements.values().collect();
    let indicators: Vec<&Entity> = entities.indicators.values().collect();
    let reference_indicators: Vec<&Entity> = entities.reference_indicators.iter().collect();

    let mut batches = projector.project(
        COLLECTION_DATIM,
        &data_elements,
        &[&graph.data_element_to_disaggregate],
        periods,
        CascadePolicy::with_targets().all_periods(),
    );
    merge_batches(
        &mut batches,
        projector.project(
            COLLECTION_DATIM,
            &indicators,
            &[],
            periods,
            CascadePolicy::default().all_periods(),
        ),
    );
    merge_batches(
        &mut batches,
        projector.project(
            COLLECTION_DATIM,
            &reference_indicators,
            &[
                &graph.indicator_to_data_element,
                &graph.indicator_to_indicator,
            ],
            periods,
            CascadePolicy::with_targets().all_periods().mapped_only(),
        ),
    );
    batches
}

/// PDH derived elements with their disaggregates, and the reference
/// indicators linked to them.
pub fn pdh_references(
    projector: &Projector<'_>,
    entities: &EntitySet,
    graph: &RelationshipGraph,
    periods: &[String],
) -> PeriodBatches {
    let derived: Vec<&Entity> = entities.derived_data_elements.values().collect();
    let reference_indicators: Vec<&Entity> = entities.reference_indicators.iter().collect();

    let mut batches = projector.project(
        COLLECTION_PDH,
        &derived,
        &[&graph.derived_data_element_to_disaggregate],
        periods,
        CascadePolicy::with_targets().all_periods(),
    );
    merge_batches(
        &mut batches,
        projector.project(
            COLLECTION_PDH,
            &reference_indicators,
            &[&graph.indicator_to_derived_data_element],
            periods,
            CascadePolicy::with_targets().all_periods().mapped_only(),
        ),
    );
    batches
}

/// Full fiscal-year collections. `MER` has no base collection.
pub fn mer_references(
    projector: &Projector<'_>,
    entities: &EntitySet,
    graph: &RelationshipGraph,
    periods: &[String],
) -> PeriodBatches {
    projector.project_fiscal_year(COLLECTION_MER, entities, graph, periods)
}

/// All reference batches enabled by `options`, in emission order.
pub fn build_references(
    source: &SourceRef,
    entities: &EntitySet,
    graph: &RelationshipGraph,
    codelists: &CodelistIndex,
    membership: &CodelistMembership,
    options: &ProcessingOptions,
    stats: &mut RunStats,
) -> Vec<ReferenceBatch> {
    let start = Instant::now();
    let projector = Projector::new(source, options.explicit_mapping_ids);
    let periods = options.output_periods.as_slice();
    let emit = &options.emit;

    let mut batches = Vec::new();
    if emit.codelist_collections {
        batches.extend(codelist_references(
            &projector,
            entities,
            codelists,
            membership,
            graph,
        ));
    }
    let metadata: [(&str, CollectionProjection); 3] = [
        (COLLECTION_DATIM, datim_references),
        (COLLECTION_PDH, pdh_references),
        (COLLECTION_MER, mer_references),
    ];
    for (collection, project) in metadata {
        if !emit.collection_enabled(collection) {
            debug!(collection, "collection disabled, no references");
            continue;
        }
        let projected = project(&projector, entities, graph, periods);
        batches.extend(projected.into_values().flatten());
    }

    for batch in &batches {
        stats.record_batch(&batch.collection_id);
    }
    info!(
        batches = batches.len(),
        expressions = batches.iter().map(ReferenceBatch::len).sum::<usize>(),
        duration_ms = start.elapsed().as_millis(),
        "reference batches built"
    );
    batches
}
