use serde_json::Value;

use msp_model::entity::{keys, source_system};
use msp_model::{
    Description, Entity, EntityDetail, EntityMap, LocalizedName, MspError, NamedRef,
    RawDataElement, Result, SourceRef,
};

use super::{numerator_denominator, resolve_disaggregate, result_or_target, set_version_extras};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Builds one DATIM data element.
///
/// Every category option combo of the element's category combo must already
/// be built; the first unresolved one fails the build.
pub fn build_data_element(
    raw: &RawDataElement,
    source: &SourceRef,
    disaggregates: &EntityMap,
) -> Result<Entity> {
    let id = raw.id.trim();
    let url = source.concept_url(id);
    let code = non_empty(raw.code.as_deref()).map(str::to_string);

    let mut disaggregate_urls: Vec<String> = Vec::new();
    for combo in raw.category_option_combos() {
        let combo_url = resolve_disaggregate(source, &url, combo.id.trim(), disaggregates)?;
        if !disaggregate_urls.contains(&combo_url) {
            disaggregate_urls.push(combo_url);
        }
    }

    let mut datasets: Vec<NamedRef> = Vec::new();
    for element in &raw.data_set_elements {
        let dataset = NamedRef {
            id: element.data_set.id.clone(),
            name: element.data_set.name.clone(),
        };
        if !datasets.contains(&dataset) {
            datasets.push(dataset);
        }
    }

    let mut entity = Entity::new(
        source,
        id,
        EntityDetail::DataElement {
            code: code.clone(),
            disaggregates: disaggregate_urls,
            datasets,
        },
    );
    entity.external_id = Some(id.to_string());

    let name = non_empty(Some(raw.name.as_str())).unwrap_or(id);
    entity.names.push(LocalizedName::fully_specified(name));
    if let Some(short_name) = non_empty(raw.short_name.as_deref()).filter(|short| *short != name) {
        entity.names.push(LocalizedName::short(short_name));
    }
    if let Some(description) = non_empty(raw.description.as_deref()) {
        entity.descriptions.push(Description::new(description));
    }

    entity.set_extra(keys::SOURCE, source_system::DATIM);
    let role_text = code.as_deref().unwrap_or(name);
    entity.set_extra(keys::RESULT_TARGET, result_or_target(role_text));
    if let Some(code) = code.as_deref() {
        entity.set_extra(keys::CODE, code);
        if let Some(support) = super::support_type(code) {
            entity.set_extra(keys::SUPPORT_TYPE, support);
        }
        if let Some(role) = numerator_denominator(code) {
            entity.set_extra(keys::NUMERATOR_DENOMINATOR, role);
        }
        set_version_extras(&mut entity, code);
    }
    if !raw.data_element_groups.is_empty() {
        let groups: Vec<Value> = raw
            .data_element_groups
            .iter()
            .map(|group| serde_json::json!({"id": group.id, "name": group.name}))
            .collect();
        entity.set_extra(keys::DATA_ELEMENT_GROUPS, groups);
    }
    for (key, value) in [
        (keys::DOMAIN_TYPE, raw.domain_type.as_deref()),
        (keys::VALUE_TYPE, raw.value_type.as_deref()),
        (keys::AGGREGATION_TYPE, raw.aggregation_type.as_deref()),
    ] {
        if let Some(value) = non_empty(value) {
            entity.set_extra(key, value);
        }
    }
    Ok(entity)
}

/// Builds all DATIM data elements keyed by URL.
///
/// A repeated id is the same logical element encountered twice and keeps
/// its first record.
pub fn build_data_elements(
    raws: &[RawDataElement],
    source: &SourceRef,
    disaggregates: &EntityMap,
) -> Result<EntityMap> {
    let mut elements = EntityMap::new();
    for raw in raws.iter().filter(|raw| !raw.id.trim().is_empty()) {
        let entity = build_data_element(raw, source, disaggregates)?;
        if elements.contains_key(&entity.url) {
            tracing::debug!(url = %entity.url, "data element listed twice, keeping first");
            continue;
        }
        elements.insert(entity.url.clone(), entity);
    }
    Ok(elements)
}

/// Fails when a built element points at a disaggregate URL outside `disaggregates`.
pub fn ensure_disaggregates_resolved(
    elements: &EntityMap,
    disaggregates: &EntityMap,
) -> Result<()> {
    for entity in elements.values() {
        if let Some(missing) = entity
            .disaggregate_urls()
            .iter()
            .find(|url| !disaggregates.contains_key(*url))
        {
            return Err(MspError::MissingDisaggregate {
                entity_url: entity.url.clone(),
                disaggregate_id: msp_model::concept_id_from_url(missing)
                    .unwrap_or(missing)
                    .to_string(),
            });
        }
    }
    Ok(())
}
