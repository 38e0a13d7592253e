//! End-to-end runs of the metadata build over small in-memory inputs.

use msp_core::run_pipeline;
use msp_model::entity::keys;
use msp_model::source::RawCategoryCombo;
use msp_model::{
    BatchRole, Cascade, MspError, ProcessingOptions, RawCategoryOptionCombo, RawCodelist,
    RawDataElement, RawNamed, RawReferenceIndicator, SourceInputs, SourceRef,
};

fn repository() -> SourceRef {
    SourceRef::new("PEPFAR", "MER")
}

fn reference_indicator(id: &str, period: &str) -> RawReferenceIndicator {
    RawReferenceIndicator {
        id: id.to_string(),
        period: period.to_string(),
        ..Default::default()
    }
}

fn data_element(id: &str, code: &str, combos: &[&str]) -> RawDataElement {
    RawDataElement {
        id: id.to_string(),
        code: Some(code.to_string()),
        name: code.to_string(),
        category_combo: Some(RawCategoryCombo {
            category_option_combos: combos.iter().map(|id| RawNamed::new(*id, "")).collect(),
        }),
        ..Default::default()
    }
}

fn combo(id: &str, name: &str) -> RawCategoryOptionCombo {
    RawCategoryOptionCombo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn single_element_inputs() -> SourceInputs {
    SourceInputs {
        reference_indicators: vec![reference_indicator("TX_CURR", "FY19")],
        data_elements: vec![data_element(
            "abc123de11",
            "TX_CURR_N_DSD_Age_Sex",
            &["coc1234567"],
        )],
        category_option_combos: vec![combo("coc1234567", "15+")],
        ..Default::default()
    }
}

#[test]
fn single_element_scenario_links_indicator_element_and_disaggregate() {
    let output =
        run_pipeline(&single_element_inputs(), ProcessingOptions::default()).expect("build");
    let repo = repository();
    let indicator_url = repo.concept_url("TX_CURR");
    let element_url = repo.concept_url("abc123de11");
    let combo_url = repo.concept_url("coc1234567");

    let element = &output.entities.data_elements[&element_url];
    assert_eq!(element.extra_str(keys::INDICATOR), Some("TX_CURR"));

    assert_eq!(output.graph.indicator_to_data_element.edge_count(), 1);
    assert!(
        output
            .graph
            .indicator_to_data_element
            .contains_edge(&indicator_url, &element_url)
    );
    assert_eq!(output.graph.data_element_to_disaggregate.edge_count(), 1);
    assert!(
        output
            .graph
            .data_element_to_disaggregate
            .contains_edge(&element_url, &combo_url)
    );

    let fy19: Vec<_> = output
        .references
        .iter()
        .filter(|batch| batch.collection_id == "DATIM-FY19")
        .collect();
    let from = fy19
        .iter()
        .find(|batch| batch.role == BatchRole::From && batch.contains(&indicator_url))
        .expect("from batch with the reference indicator");
    assert_eq!(from.cascade, Cascade::SourceMappings);
    let to = fy19
        .iter()
        .find(|batch| batch.role == BatchRole::To)
        .expect("to batch");
    assert!(to.contains(&element_url));
    assert_eq!(to.cascade, Cascade::None);

    assert_eq!(output.stats.matched_elements, 1);
    assert!(output.stats.codes_without_children.is_empty());
}

#[test]
fn unknown_disaggregate_aborts_the_run() {
    let mut inputs = single_element_inputs();
    inputs.category_option_combos.clear();
    let err = run_pipeline(&inputs, ProcessingOptions::default()).unwrap_err();
    assert!(err.is_integrity_violation());
    match err {
        MspError::MissingDisaggregate {
            entity_url,
            disaggregate_id,
        } => {
            assert_eq!(entity_url, repository().concept_url("abc123de11"));
            assert_eq!(disaggregate_id, "coc1234567");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn versions_replace_only_their_predecessor() {
    let inputs = SourceInputs {
        data_elements: vec![
            data_element("deA3", "A_v3", &[]),
            data_element("deA1", "A_v1", &[]),
            data_element("deA2", "A_v2", &[]),
        ],
        ..Default::default()
    };
    let output = run_pipeline(&inputs, ProcessingOptions::default()).expect("build");
    let repo = repository();
    let replaces = &output.graph.replaces;
    assert_eq!(replaces.edge_count(), 2);
    assert!(replaces.contains_edge(&repo.concept_url("deA2"), &repo.concept_url("deA1")));
    assert!(replaces.contains_edge(&repo.concept_url("deA3"), &repo.concept_url("deA2")));
    assert!(!replaces.contains_edge(&repo.concept_url("deA3"), &repo.concept_url("deA1")));
}

#[test]
fn element_in_two_periods_is_referenced_in_each_and_once_overall() {
    let mut element = data_element("de00000001", "HTS_TST_N_DSD", &[]);
    element.data_set_elements = ["ds18", "ds19"]
        .iter()
        .map(|id| msp_model::source::RawDataSetElement {
            data_set: RawNamed::new(*id, "Results"),
        })
        .collect();
    let codelist = |id: &str, external_id: &str, period: &str| RawCodelist {
        resource_type: "Collection".to_string(),
        id: id.to_string(),
        external_id: external_id.to_string(),
        name: id.to_string(),
        applicable_periods: period.to_string(),
        ..Default::default()
    };
    let inputs = SourceInputs {
        data_elements: vec![element],
        codelists: vec![
            codelist("Results FY18", "ds18", "FY18"),
            codelist("Results FY19", "ds19", "FY19"),
        ],
        ..Default::default()
    };
    let output = run_pipeline(&inputs, ProcessingOptions::default()).expect("build");
    let url = repository().concept_url("de00000001");

    let occurrences = |collection: &str| {
        output
            .references
            .iter()
            .filter(|batch| batch.collection_id == collection)
            .flat_map(|batch| batch.expressions.iter())
            .filter(|expression| **expression == url)
            .count()
    };
    assert_eq!(occurrences("DATIM-FY18"), 1);
    assert_eq!(occurrences("DATIM-FY19"), 1);
    assert_eq!(occurrences("DATIM-FY17"), 0);
    assert_eq!(occurrences("DATIM"), 1);
    assert_eq!(occurrences("Results-FY18"), 1);
}

#[test]
fn disabled_metadata_collections_produce_no_batches() {
    let mut options = ProcessingOptions::default();
    for enabled in options.emit.collections.values_mut() {
        *enabled = false;
    }
    let output = run_pipeline(&single_element_inputs(), options).expect("build");
    assert!(output.references.is_empty());
    assert!(output.stats.batches.is_empty());
}
