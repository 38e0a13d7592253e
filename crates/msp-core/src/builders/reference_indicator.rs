use std::collections::BTreeSet;

use msp_model::entity::{keys, source_system};
use msp_model::{
    Description, Entity, EntityDetail, LocalizedName, RawReferenceIndicator, SourceRef,
};
use msp_normalization::normalize_concept_id;

/// Builds one reference indicator for one period.
pub fn build_reference_indicator(raw: &RawReferenceIndicator, source: &SourceRef) -> Entity {
    let code = normalize_concept_id(&raw.id);
    let period = raw.period.trim().to_string();
    let mut entity = Entity::new(
        source,
        code.clone(),
        EntityDetail::ReferenceIndicator {
            period: period.clone(),
        },
    );

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&code);
    entity.names.push(LocalizedName::fully_specified(name));
    if let Some(description) = raw.description.as_deref().filter(|d| !d.trim().is_empty()) {
        entity.descriptions.push(Description::new(description.trim()));
    }

    for (key, value) in &raw.attributes {
        if !value.trim().is_empty() {
            entity.set_extra(key, value.trim());
        }
    }
    entity.set_extra(keys::PERIOD, period);
    entity.set_extra(keys::SOURCE, source_system::MER_GUIDANCE);
    entity.set_extra(keys::CODE, code);
    if let Some(frequency) = raw
        .reporting_frequency
        .as_deref()
        .filter(|f| !f.trim().is_empty())
    {
        entity.set_extra(keys::REPORTING_FREQUENCY, frequency.trim());
    }
    entity
}

/// Builds reference indicators in input order.
///
/// A repeated `(code, period)` pair keeps its first definition.
pub fn build_reference_indicators(
    raws: &[RawReferenceIndicator],
    source: &SourceRef,
) -> Vec<Entity> {
    let mut seen = BTreeSet::new();
    let mut indicators = Vec::with_capacity(raws.len());
    for raw in raws {
        let entity = build_reference_indicator(raw, source);
        if entity.id.is_empty() {
            tracing::debug!(period = %raw.period, "skipping reference indicator without code");
            continue;
        }
        let EntityDetail::ReferenceIndicator { period } = &entity.detail else {
            continue;
        };
        if !seen.insert((entity.id.clone(), period.clone())) {
            tracing::debug!(code = %entity.id, period = %period, "duplicate reference indicator");
            continue;
        }
        indicators.push(entity);
    }
    indicators
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, period: &str) -> RawReferenceIndicator {
        RawReferenceIndicator {
            id: id.to_string(),
            period: period.to_string(),
            reporting_frequency: Some("Quarterly".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn periods_of_one_code_share_a_url() {
        let source = SourceRef::new("PEPFAR", "MER");
        let built = build_reference_indicators(
            &[raw("TX_CURR", "FY18"), raw("TX_CURR", "FY19"), raw("TX_CURR", "FY19")],
            &source,
        );
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].url, built[1].url);
        assert!(built[0].is_valid_for("FY18"));
        assert!(built[1].is_valid_for("FY19"));
        assert_eq!(built[1].extra_str(keys::REPORTING_FREQUENCY), Some("Quarterly"));
    }

    #[test]
    fn codes_are_normalized_concept_ids() {
        let source = SourceRef::new("PEPFAR", "MER");
        let entity = build_reference_indicator(&raw("OVC_SERV 18+", "FY20"), &source);
        assert_eq!(entity.id, "OVC_SERV_18_plus");
        assert_eq!(entity.display_name(), "OVC_SERV_18_plus");
    }
}
