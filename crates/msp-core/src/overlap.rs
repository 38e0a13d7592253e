//! UIDs used by both DATIM data elements and PDH derived data elements.
//!
//! The two systems share one UID space but do not coordinate it, so the
//! same UID can name two different elements. Which definition should win
//! is an open product decision; [`OverlapPolicy`] makes it explicit.

use std::collections::BTreeSet;

use msp_model::{EntitySet, MspError, OverlapPolicy, Result, RunStats};

/// URLs present among both data elements and derived data elements.
pub fn find_uid_overlaps(entities: &EntitySet) -> Vec<String> {
    entities
        .derived_data_elements
        .keys()
        .filter(|url| entities.data_elements.contains_key(*url))
        .cloned()
        .collect()
}

/// Applies the overlap policy.
///
/// `Report` keeps the DATIM data element and drops the derived element of
/// the same URL; `Reject` fails on the first overlap.
pub fn resolve_uid_overlaps(
    entities: &mut EntitySet,
    policy: OverlapPolicy,
    stats: &mut RunStats,
) -> Result<Vec<String>> {
    let overlaps = find_uid_overlaps(entities);
    stats.uid_overlaps = overlaps.len();
    if overlaps.is_empty() {
        return Ok(overlaps);
    }
    match policy {
        OverlapPolicy::Reject => Err(MspError::UidOverlap {
            url: overlaps[0].clone(),
        }),
        OverlapPolicy::Report => {
            for url in &overlaps {
                entities.derived_data_elements.remove(url);
            }
            tracing::warn!(
                count = overlaps.len(),
                "UIDs shared by DATIM and PDH elements, keeping DATIM definitions"
            );
            Ok(overlaps)
        }
    }
}

/// Fails when two entities of different kinds share a URL.
///
/// Reference indicators are exempt; one code shares its URL across periods.
pub fn ensure_unique_urls(entities: &EntitySet) -> Result<()> {
    let mut seen = BTreeSet::new();
    for map in [
        &entities.data_elements,
        &entities.derived_data_elements,
        &entities.disaggregates,
        &entities.indicators,
    ] {
        for url in map.keys() {
            if !seen.insert(url.as_str()) {
                return Err(MspError::DuplicateEntity { url: url.clone() });
            }
        }
    }
    Ok(())
}
