//! Reference indicator annotation.
//!
//! Runs after every builder so period attributes are final. Matched
//! resources gain `extras.indicator`; unmatched ones are only counted.

use msp_map::IndicatorMatcher;
use msp_model::entity::keys;
use msp_model::{Entity, EntityKind, EntityMap, EntitySet, RunStats};

/// Name and code a resource is matched on.
///
/// Derived elements are matched by name alone; their names carry the code.
fn match_inputs(entity: &Entity) -> (&str, Option<&str>) {
    match entity.kind() {
        EntityKind::DerivedDataElement => (entity.display_name(), None),
        _ => (entity.display_name(), entity.code()),
    }
}

/// Annotates every entity of `map`, returning how many matched.
pub fn annotate_map(map: &mut EntityMap, matcher: &IndicatorMatcher) -> usize {
    let mut matched = 0;
    for entity in map.values_mut() {
        let (name, code) = match_inputs(entity);
        let periods = entity.periods();
        let Some(indicator) = matcher
            .match_indicator(name, code, &periods)
            .map(str::to_string)
        else {
            continue;
        };
        entity.set_extra(keys::INDICATOR, indicator);
        matched += 1;
    }
    matched
}

/// Annotates data elements, derived data elements and computed indicators.
pub fn annotate_indicators(
    entities: &mut EntitySet,
    matcher: &IndicatorMatcher,
    stats: &mut RunStats,
) {
    let elements = entities.data_elements.len() + entities.derived_data_elements.len();
    let matched = annotate_map(&mut entities.data_elements, matcher)
        + annotate_map(&mut entities.derived_data_elements, matcher);
    let matched_indicators = annotate_map(&mut entities.indicators, matcher);

    stats.indicator_codes = matcher.sorted_codes().len();
    stats.matched_elements = matched;
    stats.unmatched_elements = elements - matched;
    stats.elements_without_periods = entities
        .data_elements
        .values()
        .chain(entities.derived_data_elements.values())
        .filter(|entity| !entity.has_period_attribute())
        .count();
    stats.indicators_without_periods = entities
        .indicators
        .values()
        .filter(|entity| !entity.has_period_attribute())
        .count();

    tracing::debug!(
        matched,
        matched_indicators,
        unmatched = stats.unmatched_elements,
        "indicator annotation complete"
    );
    if stats.unmatched_elements > 0 {
        tracing::warn!(
            count = stats.unmatched_elements,
            "data elements without a reference indicator"
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use msp_model::{EntityDetail, LocalizedName, RawReferenceIndicator, SourceRef};

    use super::*;
    use crate::builders::build_reference_indicators;

    fn source() -> SourceRef {
        SourceRef::new("PEPFAR", "MER")
    }

    fn matcher() -> IndicatorMatcher {
        let raws: Vec<RawReferenceIndicator> = [("TX_CURR", "FY19"), ("HTS_TST", "FY18")]
            .iter()
            .map(|(id, period)| RawReferenceIndicator {
                id: id.to_string(),
                period: period.to_string(),
                ..Default::default()
            })
            .collect();
        IndicatorMatcher::from_reference_indicators(&build_reference_indicators(&raws, &source()))
    }

    fn derived(id: &str, name: &str, periods: &[&str]) -> Entity {
        let mut entity = Entity::new(
            &source(),
            id,
            EntityDetail::DerivedDataElement {
                sources: Vec::new(),
                disaggregates: Vec::new(),
            },
        );
        entity.names.push(LocalizedName::fully_specified(name));
        entity.set_extra(keys::APPLICABLE_PERIODS, json!(periods));
        entity
    }

    #[test]
    fn derived_elements_match_on_name_and_period() {
        let mut entities = EntitySet::default();
        for entity in [
            derived("dde1", "HTS_TST (N, DSD): HTS received results", &["FY18"]),
            derived("dde2", "HTS_TST (N, DSD): HTS received results", &["FY19"]),
        ] {
            entities
                .derived_data_elements
                .insert(entity.url.clone(), entity);
        }
        let mut stats = RunStats::default();
        annotate_indicators(&mut entities, &matcher(), &mut stats);

        let first = &entities.derived_data_elements["/orgs/PEPFAR/sources/MER/concepts/dde1/"];
        assert_eq!(first.indicator_code(), Some("HTS_TST"));
        let second = &entities.derived_data_elements["/orgs/PEPFAR/sources/MER/concepts/dde2/"];
        assert_eq!(second.indicator_code(), None);
        assert_eq!(stats.matched_elements, 1);
        assert_eq!(stats.unmatched_elements, 1);
        assert_eq!(stats.indicator_codes, 2);
    }
}
