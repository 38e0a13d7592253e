pub mod builders;
pub mod codelists;
pub mod formula;
pub mod matching;
pub mod overlap;
pub mod pipeline;
pub mod pipeline_context;
pub mod projection;
pub mod references;
pub mod relationships;

pub use builders::{
    DerivedDataElementBuilder, build_category_option_combo, build_category_option_combos,
    build_data_element, build_data_elements, build_derived_data_elements, build_indicator,
    build_indicators, build_reference_indicator, build_reference_indicators, derived_periods,
    ensure_disaggregates_resolved,
};
pub use codelists::{
    CodelistMembership, apply_codelist_membership, build_codelist, build_codelists,
};
pub use formula::{
    EntityLabels, LabelLookup, parse_formula, referenced_data_elements, render_formula,
};
pub use matching::{annotate_indicators, annotate_map};
pub use overlap::{ensure_unique_urls, find_uid_overlaps, resolve_uid_overlaps};
pub use pipeline::{BuildOutput, run_pipeline};
pub use pipeline_context::PipelineContext;
pub use projection::{CascadePolicy, PeriodBatches, Projector, merge_batches};
pub use references::{
    build_references, codelist_references, datim_references, mer_references, pdh_references,
};
pub use relationships::{
    build_relationship_graph, codes_without_children, derivation_sources, disaggregate_links,
    indicator_children, version_chain,
};
