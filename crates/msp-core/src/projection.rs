//! Period projection.
//!
//! Turns entity sets and relationship maps into period-scoped reference
//! batches. For each period the from entities valid in it are collected,
//! optionally followed one hop through relationship maps, and written as a
//! cascaded from batch plus a plain to batch.

use std::collections::{BTreeMap, BTreeSet};

use msp_model::{
    Adjacency, BatchRole, Cascade, Entity, EntityKind, EntitySet, PeriodKey, ReferenceBatch,
    RelationshipGraph, SourceRef, concept_id_from_url,
};

/// Batches grouped by period key; `All` sorts last.
pub type PeriodBatches = BTreeMap<PeriodKey, Vec<ReferenceBatch>>;

/// What a projection pass emits besides the from batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadePolicy {
    /// Follow relationships one hop and emit the targets as a to batch.
    pub include_to_concept_refs: bool,
    /// Add a `*` pass over every from entity regardless of period.
    pub include_all_periods: bool,
    /// Leave out from entities with no outgoing edge in the given maps.
    pub skip_unmapped: bool,
}

impl CascadePolicy {
    pub fn with_targets() -> Self {
        Self {
            include_to_concept_refs: true,
            ..Self::default()
        }
    }

    pub fn all_periods(mut self) -> Self {
        self.include_all_periods = true;
        self
    }

    pub fn mapped_only(mut self) -> Self {
        self.skip_unmapped = true;
        self
    }
}

/// Ordered, duplicate-free URL list.
#[derive(Debug, Default)]
struct UrlList {
    seen: BTreeSet<String>,
    urls: Vec<String>,
}

impl UrlList {
    fn push(&mut self, url: &str) -> bool {
        if !self.seen.insert(url.to_string()) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

/// Builds reference batches for one source's concepts.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    source: &'a SourceRef,
    explicit_mapping_ids: bool,
}

impl<'a> Projector<'a> {
    pub fn new(source: &'a SourceRef, explicit_mapping_ids: bool) -> Self {
        Self {
            source,
            explicit_mapping_ids,
        }
    }

    /// URL of the mapping record behind an edge, in explicit-id mode.
    pub fn mapping_url(&self, from_url: &str, to_url: &str) -> Option<String> {
        if !self.explicit_mapping_ids {
            return None;
        }
        let from_id = concept_id_from_url(from_url)?;
        let to_id = concept_id_from_url(to_url)?;
        Some(
            self.source
                .mapping_url(&SourceRef::mapping_id(from_id, to_id)),
        )
    }

    /// Projects `from` entities into `collection_id` for each period.
    ///
    /// An entity belongs to a period when its `Period` equals it or its
    /// `Applicable Periods` list contains it. Entities without either are
    /// only reached by the `*` pass.
    pub fn project(
        &self,
        collection_id: &str,
        from: &[&Entity],
        relationships: &[&Adjacency],
        periods: &[String],
        policy: CascadePolicy,
    ) -> PeriodBatches {
        let mut batches = PeriodBatches::new();
        for period in periods {
            let members = from
                .iter()
                .copied()
                .filter(|entity| entity.is_valid_for(period));
            let key = PeriodKey::Period(period.clone());
            let period_batches =
                self.project_key(collection_id, &key, members, relationships, policy);
            if !period_batches.is_empty() {
                batches.insert(key, period_batches);
            }
        }
        if policy.include_all_periods {
            let all = self.project_key(
                collection_id,
                &PeriodKey::All,
                from.iter().copied(),
                relationships,
                policy,
            );
            if !all.is_empty() {
                batches.insert(PeriodKey::All, all);
            }
        }
        batches
    }

    fn project_key<'e>(
        &self,
        collection_id: &str,
        key: &PeriodKey,
        members: impl Iterator<Item = &'e Entity>,
        relationships: &[&Adjacency],
        policy: CascadePolicy,
    ) -> Vec<ReferenceBatch> {
        let mut from_urls = UrlList::default();
        for entity in members {
            if policy.skip_unmapped
                && relationships
                    .iter()
                    .all(|adjacency| adjacency.targets(&entity.url).is_empty())
            {
                continue;
            }
            from_urls.push(&entity.url);
        }

        let mut to_urls = UrlList::default();
        let mut mapping_urls = UrlList::default();
        if policy.include_to_concept_refs {
            for from_url in &from_urls.urls {
                for adjacency in relationships {
                    for target in adjacency.targets(from_url) {
                        to_urls.push(target);
                        if let Some(mapping) = self.mapping_url(from_url, target) {
                            mapping_urls.push(&mapping);
                        }
                    }
                }
            }
        }

        let mut batches = BatchSet::new(collection_id, key);
        batches.push(BatchRole::From, Cascade::SourceMappings, from_urls);
        batches.push(BatchRole::To, Cascade::None, to_urls);
        batches.push(BatchRole::Mappings, Cascade::None, mapping_urls);
        batches.finish()
    }

    /// Full fiscal-year projection from reference indicators.
    ///
    /// Walks reference indicator to element or computed indicator, then
    /// element to disaggregate. Every target must itself be valid in the
    /// period; disaggregates carry no periods and follow their element.
    pub fn project_fiscal_year(
        &self,
        collection_id: &str,
        entities: &EntitySet,
        graph: &RelationshipGraph,
        periods: &[String],
    ) -> PeriodBatches {
        let first_hop = [
            &graph.indicator_to_data_element,
            &graph.indicator_to_derived_data_element,
            &graph.indicator_to_indicator,
        ];
        let second_hop = [
            &graph.data_element_to_disaggregate,
            &graph.derived_data_element_to_disaggregate,
        ];

        let mut batches = PeriodBatches::new();
        for period in periods {
            let mut indicators = UrlList::default();
            for entity in entities
                .reference_indicators
                .iter()
                .filter(|entity| entity.is_valid_for(period))
            {
                indicators.push(&entity.url);
            }
            if indicators.urls.is_empty() {
                continue;
            }

            let mut hop = Hop {
                entities,
                period,
                targets: UrlList::default(),
                mapping_urls: UrlList::default(),
            };
            for from_url in &indicators.urls {
                self.follow(from_url, &first_hop, &mut hop);
            }
            let children = std::mem::take(&mut hop.targets);
            for from_url in &children.urls {
                self.follow(from_url, &second_hop, &mut hop);
            }
            let Hop {
                targets: disaggregates,
                mapping_urls,
                ..
            } = hop;

            let key = PeriodKey::Period(period.clone());
            let mut period_batches = BatchSet::new(collection_id, &key);
            period_batches.push(BatchRole::From, Cascade::SourceMappings, indicators);
            period_batches.push(BatchRole::To, Cascade::SourceMappings, children);
            period_batches.push(BatchRole::To, Cascade::None, disaggregates);
            period_batches.push(BatchRole::Mappings, Cascade::None, mapping_urls);
            let period_batches = period_batches.finish();
            batches.insert(key, period_batches);
        }
        batches
    }

    fn follow(&self, from_url: &str, relationships: &[&Adjacency], hop: &mut Hop<'_>) {
        for adjacency in relationships {
            for target in adjacency.targets(from_url) {
                if !valid_target(hop.entities.get(target), hop.period) {
                    continue;
                }
                hop.targets.push(target);
                if let Some(mapping) = self.mapping_url(from_url, target) {
                    hop.mapping_urls.push(&mapping);
                }
            }
        }
    }
}

/// State of one relationship hop within a period.
struct Hop<'a> {
    entities: &'a EntitySet,
    period: &'a str,
    targets: UrlList,
    mapping_urls: UrlList,
}

fn valid_target(entity: Option<&Entity>, period: &str) -> bool {
    match entity {
        Some(entity) if entity.has_period_attribute() => entity.is_valid_for(period),
        Some(entity) => entity.kind() == EntityKind::CategoryOptionCombo,
        None => false,
    }
}

/// Collects the batches of one collection and period key, skipping empty ones.
struct BatchSet<'k> {
    collection_id: String,
    key: &'k PeriodKey,
    batches: Vec<ReferenceBatch>,
}

impl<'k> BatchSet<'k> {
    fn new(base_collection: &str, key: &'k PeriodKey) -> Self {
        Self {
            collection_id: key.collection_id(base_collection),
            key,
            batches: Vec::new(),
        }
    }

    fn push(&mut self, role: BatchRole, cascade: Cascade, urls: UrlList) {
        let expressions = urls.into_vec();
        if expressions.is_empty() {
            return;
        }
        self.batches.push(ReferenceBatch {
            collection_id: self.collection_id.clone(),
            period: self.key.clone(),
            role,
            cascade,
            expressions,
        });
    }

    fn finish(self) -> Vec<ReferenceBatch> {
        self.batches
    }
}

/// Appends every batch of `other` after the batches already under the same key.
pub fn merge_batches(target: &mut PeriodBatches, other: PeriodBatches) {
    for (key, batches) in other {
        target.entry(key).or_default().extend(batches);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use msp_model::entity::keys;
    use msp_model::{EntityDetail, EntityMap};

    use super::*;

    fn source() -> SourceRef {
        SourceRef::new("PEPFAR", "MER")
    }

    fn element(id: &str, periods: Option<&[&str]>) -> Entity {
        let mut entity = Entity::new(
            &source(),
            id,
            EntityDetail::DataElement {
                code: None,
                disaggregates: Vec::new(),
                datasets: Vec::new(),
            },
        );
        if let Some(periods) = periods {
            entity.set_extra(keys::APPLICABLE_PERIODS, json!(periods));
        }
        entity
    }

    fn periods() -> Vec<String> {
        vec!["FY18".to_string(), "FY19".to_string()]
    }

    #[test]
    fn list_valued_periods_use_or_semantics() {
        let both = element("de1", Some(&["FY18", "FY19"]));
        let none = element("de2", None);
        let batches = Projector::new(&source(), false).project(
            "DATIM",
            &[&both, &none],
            &[],
            &periods(),
            CascadePolicy::default().all_periods(),
        );

        for period in ["FY18", "FY19"] {
            let key = PeriodKey::Period(period.to_string());
            let period_batches = &batches[&key];
            assert_eq!(period_batches.len(), 1);
            assert_eq!(period_batches[0].collection_id, format!("DATIM-{period}"));
            assert_eq!(period_batches[0].expressions, vec![both.url.clone()]);
        }
        let all = &batches[&PeriodKey::All];
        assert_eq!(all[0].collection_id, "DATIM");
        assert_eq!(all[0].expressions, vec![both.url.clone(), none.url.clone()]);
    }

    #[test]
    fn targets_go_to_a_separate_uncascaded_batch() {
        let from = element("de1", Some(&["FY19"]));
        let mut links = Adjacency::new();
        links.insert(&from.url, "/orgs/PEPFAR/sources/MER/concepts/coc1/");
        links.insert(&from.url, "/orgs/PEPFAR/sources/MER/concepts/coc2/");
        let batches = Projector::new(&source(), true).project(
            "DATIM",
            &[&from],
            &[&links],
            &periods(),
            CascadePolicy::with_targets(),
        );
        assert!(!batches.contains_key(&PeriodKey::Period("FY18".to_string())));
        let fy19 = &batches[&PeriodKey::Period("FY19".to_string())];
        assert_eq!(fy19.len(), 3);
        assert_eq!(fy19[0].cascade, Cascade::SourceMappings);
        assert_eq!(fy19[1].role, BatchRole::To);
        assert_eq!(fy19[1].cascade, Cascade::None);
        assert_eq!(fy19[1].len(), 2);
        assert_eq!(
            fy19[2].expressions[0],
            "/orgs/PEPFAR/sources/MER/mappings/de1-coc1/"
        );
    }

    #[test]
    fn unmapped_from_entities_can_be_skipped() {
        let mapped = element("de1", Some(&["FY19"]));
        let unmapped = element("de2", Some(&["FY19"]));
        let mut links = Adjacency::new();
        links.insert(&mapped.url, "/orgs/PEPFAR/sources/MER/concepts/x/");
        let batches = Projector::new(&source(), false).project(
            "DATIM",
            &[&mapped, &unmapped],
            &[&links],
            &periods(),
            CascadePolicy::with_targets().mapped_only(),
        );
        let fy19 = &batches[&PeriodKey::Period("FY19".to_string())];
        assert_eq!(fy19[0].expressions, vec![mapped.url.clone()]);
    }

    #[test]
    fn fiscal_year_projection_rechecks_target_periods() {
        let mut reference = Entity::new(
            &source(),
            "TX_CURR",
            EntityDetail::ReferenceIndicator {
                period: "FY19".to_string(),
            },
        );
        reference.set_extra(keys::PERIOD, "FY19");
        let current = element("de19", Some(&["FY19"]));
        let stale = element("de18", Some(&["FY18"]));
        let combo = Entity::new(&source(), "coc1", EntityDetail::CategoryOptionCombo);

        let mut entities = EntitySet::default();
        entities.reference_indicators.push(reference.clone());
        let mut elements = EntityMap::new();
        elements.insert(current.url.clone(), current.clone());
        elements.insert(stale.url.clone(), stale.clone());
        entities.data_elements = elements;
        entities.disaggregates.insert(combo.url.clone(), combo.clone());

        let mut graph = RelationshipGraph::default();
        graph.indicator_to_data_element.insert(&reference.url, &current.url);
        graph.indicator_to_data_element.insert(&reference.url, &stale.url);
        graph.data_element_to_disaggregate.insert(&current.url, &combo.url);
        graph.data_element_to_disaggregate.insert(&stale.url, &combo.url);

        let batches = Projector::new(&source(), false).project_fiscal_year(
            "MER",
            &entities,
            &graph,
            &periods(),
        );
        assert_eq!(batches.len(), 1);
        let fy19 = &batches[&PeriodKey::Period("FY19".to_string())];
        assert_eq!(fy19.len(), 3);
        assert_eq!(fy19[0].expressions, vec![reference.url.clone()]);
        assert_eq!(fy19[1].expressions, vec![current.url.clone()]);
        assert_eq!(fy19[2].expressions, vec![combo.url.clone()]);
        assert!(fy19.iter().all(|batch| batch.collection_id == "MER-FY19"));
    }
}
