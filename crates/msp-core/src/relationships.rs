//! Relationship graph builder.
//!
//! Every adjacency map is keyed by the URL of the from entity and lists
//! target URLs without repeats, in first-seen order.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use msp_map::IndicatorMatcher;
use msp_model::entity::keys;
use msp_model::{
    Adjacency, Entity, EntityDetail, EntityMap, EntitySet, MspError, RelationshipClass,
    RelationshipGraph, Result, RunStats, SourceRef,
};

/// Links reference indicators to the children annotated with their code.
///
/// Codes outside the matcher's canonical list are ignored. A child that
/// carries periods must have its reference indicator defined in one of them.
pub fn indicator_children(
    source: &SourceRef,
    matcher: &IndicatorMatcher,
    children: &EntityMap,
) -> Result<Adjacency> {
    let mut adjacency = Adjacency::new();
    for child in children.values() {
        let Some(code) = child.indicator_code() else {
            continue;
        };
        if !matcher.contains_code(code) {
            debug!(url = %child.url, code, "indicator code is not canonical, skipping");
            continue;
        }
        let periods = child.periods();
        if !periods.is_empty()
            && !periods
                .iter()
                .any(|period| matcher.index().contains(code, period))
        {
            return Err(MspError::MissingReferenceIndicator {
                code: code.to_string(),
                period: periods.iter().max().cloned().unwrap_or_default(),
            });
        }
        adjacency.insert(&source.concept_url(code), &child.url);
    }
    Ok(adjacency)
}

/// Links elements to their disaggregates. An unbuilt disaggregate is fatal.
pub fn disaggregate_links(elements: &EntityMap, disaggregates: &EntityMap) -> Result<Adjacency> {
    let mut adjacency = Adjacency::new();
    for element in elements.values() {
        for url in element.disaggregate_urls() {
            if !disaggregates.contains_key(url) {
                return Err(MspError::MissingDisaggregate {
                    entity_url: element.url.clone(),
                    disaggregate_id: msp_model::concept_id_from_url(url)
                        .unwrap_or(url)
                        .to_string(),
                });
            }
            adjacency.insert(&element.url, url);
        }
    }
    Ok(adjacency)
}

fn version_of(entity: &Entity) -> u32 {
    entity
        .extra_str(keys::VERSION)
        .and_then(|version| version.get(1..))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(1)
}

/// Version replacement chain.
///
/// Elements sharing a version-less root are ordered by version (no suffix
/// counts as 1) and each one replaces only its immediate predecessor.
pub fn version_chain(elements: &EntityMap) -> Adjacency {
    let mut groups: BTreeMap<&str, Vec<(u32, &str)>> = BTreeMap::new();
    for element in elements.values() {
        if let Some(root) = element.extra_str(keys::ROOT) {
            groups
                .entry(root)
                .or_default()
                .push((version_of(element), element.url.as_str()));
        }
    }

    let mut adjacency = Adjacency::new();
    for members in groups.values_mut().filter(|members| members.len() > 1) {
        members.sort();
        for pair in members.windows(2) {
            let (older_version, older) = pair[0];
            let (newer_version, newer) = pair[1];
            if newer_version == older_version {
                debug!(older, newer, version = newer_version, "same version listed twice");
                continue;
            }
            adjacency.insert(newer, older);
        }
    }
    adjacency
}

/// Links derived elements to each distinct source element they are computed from.
///
/// Sources that resolve to no built element are still linked and counted;
/// the import list later drops links whose endpoints are not emitted.
pub fn derivation_sources(
    source: &SourceRef,
    derived: &EntityMap,
    entities: &EntitySet,
    stats: &mut RunStats,
) -> Adjacency {
    let mut adjacency = Adjacency::new();
    let mut unresolved = 0;
    for element in derived.values() {
        let EntityDetail::DerivedDataElement { sources, .. } = &element.detail else {
            continue;
        };
        for term in sources {
            let uid = term.source_data_element_uid.as_str();
            if uid.is_empty() {
                continue;
            }
            let url = source.concept_url(uid);
            if adjacency.insert(&element.url, &url) && entities.element(&url).is_none() {
                unresolved += 1;
            }
        }
    }
    stats.unresolved_derivation_sources = unresolved;
    if unresolved > 0 {
        warn!(count = unresolved, "derivation sources without a built element");
    }
    adjacency
}

/// Canonical codes with no child of any kind.
pub fn codes_without_children(
    source: &SourceRef,
    matcher: &IndicatorMatcher,
    graph: &RelationshipGraph,
) -> Vec<String> {
    let mut codes: Vec<String> = matcher
        .sorted_codes()
        .iter()
        .filter(|code| {
            let url = source.concept_url(code);
            graph.indicator_to_data_element.targets(&url).is_empty()
                && graph.indicator_to_derived_data_element.targets(&url).is_empty()
                && graph.indicator_to_indicator.targets(&url).is_empty()
        })
        .cloned()
        .collect();
    codes.sort();
    codes
}

/// Builds all relationship classes and records their edge counts.
pub fn build_relationship_graph(
    source: &SourceRef,
    entities: &EntitySet,
    matcher: &IndicatorMatcher,
    stats: &mut RunStats,
) -> Result<RelationshipGraph> {
    let span = info_span!("relationships");
    let _guard = span.enter();
    let start = Instant::now();

    let mut replaces = version_chain(&entities.data_elements);
    for (from, to) in version_chain(&entities.derived_data_elements).edges() {
        replaces.insert(from, to);
    }

    let graph = RelationshipGraph {
        indicator_to_data_element: indicator_children(source, matcher, &entities.data_elements)?,
        indicator_to_derived_data_element: indicator_children(
            source,
            matcher,
            &entities.derived_data_elements,
        )?,
        indicator_to_indicator: indicator_children(source, matcher, &entities.indicators)?,
        data_element_to_disaggregate: disaggregate_links(
            &entities.data_elements,
            &entities.disaggregates,
        )?,
        derived_data_element_to_disaggregate: disaggregate_links(
            &entities.derived_data_elements,
            &entities.disaggregates,
        )?,
        replaces,
        derived_from: derivation_sources(source, &entities.derived_data_elements, entities, stats),
    };

    for (class, count) in graph.edge_counts() {
        stats.set_edges(class, count);
    }
    stats.codes_without_children = codes_without_children(source, matcher, &graph);
    if !stats.codes_without_children.is_empty() {
        warn!(
            count = stats.codes_without_children.len(),
            "reference indicator codes without children"
        );
    }

    info!(
        indicator_links = stats.edge_count(RelationshipClass::IndicatorToDataElement)
            + stats.edge_count(RelationshipClass::IndicatorToDerivedDataElement)
            + stats.edge_count(RelationshipClass::IndicatorToIndicator),
        disaggregate_links = stats.edge_count(RelationshipClass::DataElementToDisaggregate)
            + stats.edge_count(RelationshipClass::DerivedDataElementToDisaggregate),
        replaces = stats.edge_count(RelationshipClass::Replaces),
        derived_from = stats.edge_count(RelationshipClass::DerivedFrom),
        duration_ms = start.elapsed().as_millis(),
        "relationship graph built"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use msp_model::LocalizedName;

    use super::*;

    fn source() -> SourceRef {
        SourceRef::new("PEPFAR", "MER")
    }

    fn element(id: &str, root: &str, version: Option<&str>) -> Entity {
        let mut entity = Entity::new(
            &source(),
            id,
            EntityDetail::DataElement {
                code: None,
                disaggregates: Vec::new(),
                datasets: Vec::new(),
            },
        );
        entity.set_extra(keys::ROOT, root);
        if let Some(version) = version {
            entity.set_extra(keys::VERSION, version);
        }
        entity
    }

    fn url(id: &str) -> String {
        source().concept_url(id)
    }

    #[test]
    fn version_chain_links_only_immediate_predecessors() {
        let mut elements = EntityMap::new();
        for entity in [
            element("a3", "A", Some("v3")),
            element("a1", "A", None),
            element("a2", "A", Some("v2")),
            element("b1", "B", None),
        ] {
            elements.insert(entity.url.clone(), entity);
        }
        let chain = version_chain(&elements);
        assert_eq!(chain.edge_count(), 2);
        assert!(chain.contains_edge(&url("a2"), &url("a1")));
        assert!(chain.contains_edge(&url("a3"), &url("a2")));
        assert!(!chain.contains_edge(&url("a3"), &url("a1")));
    }

    #[test]
    fn children_with_non_canonical_codes_are_skipped() {
        let matcher = IndicatorMatcher::default();
        let mut children = EntityMap::new();
        let mut child = element("de1", "TX_CURR_N", None);
        child.names.push(LocalizedName::fully_specified("TX_CURR_N"));
        child.set_extra(keys::INDICATOR, "TX_CURR");
        children.insert(child.url.clone(), child);
        let adjacency = indicator_children(&source(), &matcher, &children).expect("links");
        assert!(adjacency.is_empty());
    }

    #[test]
    fn child_period_without_reference_indicator_is_fatal() {
        let mut index = msp_map::ReferenceIndicatorIndex::new();
        index.insert("TX_CURR", "FY18");
        let matcher = IndicatorMatcher::new(vec!["TX_CURR".to_string()], index);
        let mut children = EntityMap::new();
        let mut child = element("de1", "TX_CURR_N", None);
        child.set_extra(keys::INDICATOR, "TX_CURR");
        child.set_extra(keys::APPLICABLE_PERIODS, json!(["FY19"]));
        children.insert(child.url.clone(), child);
        let err = indicator_children(&source(), &matcher, &children).unwrap_err();
        match err {
            MspError::MissingReferenceIndicator { code, period } => {
                assert_eq!(code, "TX_CURR");
                assert_eq!(period, "FY19");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn derivation_sources_collapse_disaggregate_rows() {
        let mut derived = EntityMap::new();
        let term = |uid: &str, combo: &str| msp_model::SourceDataElement {
            source_data_element_uid: uid.to_string(),
            source_data_element_name: String::new(),
            source_disaggregate: String::new(),
            source_category_option_combo_uid: combo.to_string(),
            source_category_option_combo_name: String::new(),
            derived_category_option_combo: combo.to_string(),
            derived_category_option_combo_name: String::new(),
            add_or_subtract: msp_model::Sign::Add,
            rule_id: String::new(),
            run_sequence: 1,
        };
        let entity = Entity::new(
            &source(),
            "dde1",
            EntityDetail::DerivedDataElement {
                sources: vec![term("src1", "c1"), term("src1", "c2"), term("src2", "c1")],
                disaggregates: Vec::new(),
            },
        );
        derived.insert(entity.url.clone(), entity);

        let mut entities = EntitySet::default();
        let known = element("src1", "SRC", None);
        entities.data_elements.insert(known.url.clone(), known);
        let mut stats = RunStats::default();
        let adjacency = derivation_sources(&source(), &derived, &entities, &mut stats);
        assert_eq!(adjacency.targets(&url("dde1")), [url("src1"), url("src2")]);
        assert_eq!(stats.unresolved_derivation_sources, 1);
    }
}
