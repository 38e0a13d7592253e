//! Codelist definitions and data element membership.
//!
//! Membership is computed in a read-only pass over the built data elements
//! and applied afterwards, so the outcome never depends on build order.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};

use msp_model::entity::keys;
use msp_model::period::parse_period_list;
use msp_model::{Codelist, CodelistIndex, EntityDetail, EntityMap, RawCodelist, Result, RunStats};
use msp_normalization::normalize;

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn build_codelist(raw: &RawCodelist) -> Codelist {
    let id = if raw.id.trim().is_empty() {
        normalize(&raw.name)
    } else {
        normalize(&raw.id)
    };
    let name = optional(&raw.name).unwrap_or_else(|| id.clone());
    Codelist {
        full_name: optional(&raw.full_name).unwrap_or_else(|| name.clone()),
        name,
        id,
        external_id: raw.external_id.trim().to_string(),
        description: raw.description.trim().to_string(),
        applicable_periods: parse_period_list(&raw.applicable_periods),
        codelist_type: optional(&raw.codelist_type),
        result_target: optional(&raw.result_target),
        dataset_id: optional(&raw.dataset_id),
    }
}

/// Builds the codelist index. Rows without a resource type are skipped and counted.
pub fn build_codelists(raws: &[RawCodelist], stats: &mut RunStats) -> Result<CodelistIndex> {
    let mut codelists = Vec::with_capacity(raws.len());
    for raw in raws {
        if raw.resource_type.trim().is_empty() {
            stats.inputs.skipped_codelist_rows += 1;
            continue;
        }
        codelists.push(build_codelist(raw));
    }
    CodelistIndex::new(codelists)
}

/// Member data element URLs of each codelist, keyed by external id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodelistMembership {
    members: BTreeMap<String, Vec<String>>,
}

impl CodelistMembership {
    /// Joins data elements to codelists through their dataset ids.
    pub fn compute(data_elements: &EntityMap, codelists: &CodelistIndex) -> Self {
        let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entity in data_elements.values() {
            let EntityDetail::DataElement { datasets, .. } = &entity.detail else {
                continue;
            };
            for dataset in datasets {
                if let Some(codelist) = codelists.get(&dataset.id) {
                    let urls = members.entry(codelist.external_id.clone()).or_default();
                    if !urls.contains(&entity.url) {
                        urls.push(entity.url.clone());
                    }
                }
            }
        }
        Self { members }
    }

    pub fn members(&self, external_id: &str) -> &[String] {
        self.members.get(external_id).map_or(&[], Vec::as_slice)
    }

    /// External ids of the codelists a data element belongs to.
    pub fn codelists_of<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.members
            .iter()
            .filter(move |(_, urls)| urls.iter().any(|member| member == url))
            .map(|(external_id, _)| external_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Annotates members with `codelists` and the sorted union of codelist periods.
///
/// Elements outside every codelist keep no period attribute.
pub fn apply_codelist_membership(
    data_elements: &mut EntityMap,
    codelists: &CodelistIndex,
    membership: &CodelistMembership,
) {
    let mut annotations: BTreeMap<String, (Vec<Value>, BTreeSet<String>)> = BTreeMap::new();
    for codelist in codelists.iter() {
        for url in membership.members(&codelist.external_id) {
            let (refs, periods) = annotations.entry(url.clone()).or_default();
            refs.push(json!({"id": codelist.id, "name": codelist.name}));
            periods.extend(codelist.applicable_periods.iter().cloned());
        }
    }
    for (url, (refs, periods)) in annotations {
        let Some(entity) = data_elements.get_mut(&url) else {
            continue;
        };
        entity.set_extra(keys::CODELISTS, refs);
        if !periods.is_empty() {
            let periods: Vec<Value> = periods.into_iter().map(Value::from).collect();
            entity.set_extra(keys::APPLICABLE_PERIODS, periods);
        }
    }
}
