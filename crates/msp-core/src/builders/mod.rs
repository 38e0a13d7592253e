//! Entity builders.
//!
//! Each builder turns one raw source record into a canonical [`Entity`].
//! Builders do no I/O; absent optional fields simply leave the matching
//! attribute out. The only hard failure is a disaggregate reference that
//! does not resolve against the already-built category option combos.

mod data_element;
mod derived;
mod disaggregate;
mod indicator;
mod reference_indicator;

pub use data_element::{build_data_element, build_data_elements, ensure_disaggregates_resolved};
pub use derived::{DerivedDataElementBuilder, build_derived_data_elements, derived_periods};
pub use disaggregate::{build_category_option_combo, build_category_option_combos};
pub use indicator::{build_indicator, build_indicators};
pub use reference_indicator::{build_reference_indicator, build_reference_indicators};

use msp_model::entity::keys;
use msp_model::{Entity, EntityMap, MspError, Result, SourceRef};
use msp_normalization::{extract_version_suffix, strip_version_suffix};

/// Resolves a category option combo id to its concept URL.
pub(crate) fn resolve_disaggregate(
    source: &SourceRef,
    entity_url: &str,
    disaggregate_id: &str,
    disaggregates: &EntityMap,
) -> Result<String> {
    let url = source.concept_url(disaggregate_id);
    if disaggregates.contains_key(&url) {
        Ok(url)
    } else {
        Err(MspError::MissingDisaggregate {
            entity_url: entity_url.to_string(),
            disaggregate_id: disaggregate_id.to_string(),
        })
    }
}

/// `Target` when the text mentions targets, otherwise `Result`.
pub fn result_or_target(text: &str) -> &'static str {
    if text.to_lowercase().contains("target") {
        "Target"
    } else {
        "Result"
    }
}

/// Support type from the `_`-separated tokens of a data element code.
pub fn support_type(code: &str) -> Option<&'static str> {
    code.split('_').find_map(|token| match token {
        "DSD" => Some("DSD"),
        "TA" => Some("TA"),
        _ => None,
    })
}

/// Numerator or denominator role from the tokens of a data element code.
pub fn numerator_denominator(code: &str) -> Option<&'static str> {
    code.split('_').find_map(|token| match token {
        "N" => Some("Numerator"),
        "D" => Some("Denominator"),
        _ => None,
    })
}

/// Records the version tag and version-less root of `code`.
pub(crate) fn set_version_extras(entity: &mut Entity, code: &str) {
    if code.is_empty() {
        return;
    }
    if let Some(version) = extract_version_suffix(code) {
        entity.set_extra(keys::VERSION, version);
    }
    entity.set_extra(keys::ROOT, strip_version_suffix(code));
}
