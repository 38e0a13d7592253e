use std::collections::BTreeSet;

use serde_json::Value;

use msp_model::entity::{keys, source_system};
use msp_model::{
    Description, Entity, EntityDetail, EntityMap, LocalizedName, RawIndicator, SourceRef,
};

use crate::formula::{EntityLabels, parse_formula, referenced_data_elements, render_formula};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Builds one computed DATIM indicator.
///
/// Formula ids are labelled from `data_elements` and `disaggregates`. The
/// indicator's periods are the union of the periods of the data elements
/// its formulas reference; without any, the attribute is left out.
pub fn build_indicator(
    raw: &RawIndicator,
    source: &SourceRef,
    data_elements: &EntityMap,
    disaggregates: &EntityMap,
) -> Entity {
    let labels = EntityLabels::new(source, vec![data_elements, disaggregates]);
    let id = raw.id.trim();
    let mut entity = Entity::new(
        source,
        id,
        EntityDetail::Indicator {
            numerator: parse_formula(&raw.numerator, &labels),
            denominator: parse_formula(&raw.denominator, &labels),
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
    if let Some(code) = non_empty(raw.code.as_deref()) {
        entity.set_extra(keys::CODE, code);
    }
    entity.set_extra(keys::NUMERATOR, raw.numerator.as_str());
    entity.set_extra(keys::DENOMINATOR, raw.denominator.as_str());
    entity.set_extra(keys::NUMERATOR_READABLE, render_formula(&raw.numerator, &labels));
    entity.set_extra(keys::DENOMINATOR_READABLE, render_formula(&raw.denominator, &labels));
    if let Some(text) = non_empty(raw.numerator_description.as_deref()) {
        entity.set_extra(keys::NUMERATOR_DESCRIPTION, text);
    }
    if let Some(text) = non_empty(raw.denominator_description.as_deref()) {
        entity.set_extra(keys::DENOMINATOR_DESCRIPTION, text);
    }
    if let Some(indicator_type) = raw.indicator_type.as_ref().filter(|t| !t.name.is_empty()) {
        entity.set_extra(keys::INDICATOR_TYPE, indicator_type.name.as_str());
    }
    if let Some(annualized) = raw.annualized {
        entity.set_extra(keys::ANNUALIZED, annualized);
    }
    if !raw.indicator_groups.is_empty() {
        let groups: Vec<Value> = raw
            .indicator_groups
            .iter()
            .map(|group| serde_json::json!({"id": group.id, "name": group.name}))
            .collect();
        entity.set_extra(keys::INDICATOR_GROUPS, groups);
    }

    let periods = formula_periods(raw, source, data_elements);
    if !periods.is_empty() {
        let periods: Vec<Value> = periods.into_iter().map(Value::from).collect();
        entity.set_extra(keys::APPLICABLE_PERIODS, periods);
    }
    entity
}

fn formula_periods(
    raw: &RawIndicator,
    source: &SourceRef,
    data_elements: &EntityMap,
) -> BTreeSet<String> {
    referenced_data_elements(&raw.numerator)
        .into_iter()
        .chain(referenced_data_elements(&raw.denominator))
        .filter_map(|id| data_elements.get(&source.concept_url(&id)))
        .flat_map(Entity::periods)
        .collect()
}

/// Builds computed indicators keyed by URL; a repeated id keeps its first record.
pub fn build_indicators(
    raws: &[RawIndicator],
    source: &SourceRef,
    data_elements: &EntityMap,
    disaggregates: &EntityMap,
) -> EntityMap {
    let mut indicators = EntityMap::new();
    for raw in raws.iter().filter(|raw| !raw.id.trim().is_empty()) {
        let entity = build_indicator(raw, source, data_elements, disaggregates);
        indicators.entry(entity.url.clone()).or_insert(entity);
    }
    indicators
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use msp_model::RawNamed;

    use super::*;

    fn source() -> SourceRef {
        SourceRef::new("PEPFAR", "MER")
    }

    fn data_element(id: &str, code: &str, periods: &[&str]) -> Entity {
        let mut entity = Entity::new(
            &source(),
            id,
            EntityDetail::DataElement {
                code: Some(code.to_string()),
                disaggregates: Vec::new(),
                datasets: Vec::new(),
            },
        );
        entity.names.push(LocalizedName::fully_specified(code));
        entity.set_extra(keys::APPLICABLE_PERIODS, json!(periods));
        entity
    }

    fn raw() -> RawIndicator {
        RawIndicator {
            id: "ind0000001".to_string(),
            name: "TX_NEW female".to_string(),
            numerator: "#{de1234567ab.coc7654321cd}+#{de9999999zz}".to_string(),
            denominator: "1".to_string(),
            indicator_type: Some(RawNamed::new("it00000001", "Number (Factor 1)")),
            annualized: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn renders_and_parses_formulas() {
        let mut elements = EntityMap::new();
        let de = data_element("de1234567ab", "TX_NEW", &["FY19"]);
        elements.insert(de.url.clone(), de);
        let mut combos = EntityMap::new();
        let mut combo = Entity::new(&source(), "coc7654321cd", EntityDetail::CategoryOptionCombo);
        combo.names.push(LocalizedName::fully_specified("Female"));
        combos.insert(combo.url.clone(), combo);

        let entity = build_indicator(&raw(), &source(), &elements, &combos);
        assert_eq!(
            entity.extra_str(keys::NUMERATOR_READABLE),
            Some("{[TX_NEW].[Female]} + {de9999999zz}")
        );
        assert_eq!(entity.extra_str(keys::DENOMINATOR_READABLE), Some("1"));
        assert_eq!(entity.extra_str(keys::INDICATOR_TYPE), Some("Number (Factor 1)"));
        assert_eq!(entity.periods(), vec!["FY19"]);
        let EntityDetail::Indicator { numerator, .. } = &entity.detail else {
            panic!("expected indicator");
        };
        assert_eq!(numerator.len(), 2);
    }

    #[test]
    fn indicator_without_known_elements_has_no_periods() {
        let entity = build_indicator(&raw(), &source(), &EntityMap::new(), &EntityMap::new());
        assert!(!entity.has_period_attribute());
    }
}
