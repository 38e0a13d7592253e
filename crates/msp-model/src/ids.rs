use std::fmt;

use serde::{Deserialize, Serialize};

/// Owner organization and source repository that concepts and mappings live in.
///
/// Every URL produced by the pipeline is derived from this pair, which keeps
/// entity keys deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub org_id: String,
    pub source_id: String,
}

impl SourceRef {
    pub fn new(org_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            source_id: source_id.into(),
        }
    }

    pub fn concept_url(&self, concept_id: &str) -> String {
        format!(
            "/orgs/{}/sources/{}/concepts/{}/",
            self.org_id, self.source_id, concept_id
        )
    }

    /// Deterministic mapping id for an edge between two concepts.
    ///
    /// Normalized concept ids never contain `-`, so the pair is recoverable.
    pub fn mapping_id(from_concept_id: &str, to_concept_id: &str) -> String {
        format!("{from_concept_id}-{to_concept_id}")
    }

    pub fn mapping_url(&self, mapping_id: &str) -> String {
        format!(
            "/orgs/{}/sources/{}/mappings/{}/",
            self.org_id, self.source_id, mapping_id
        )
    }

    pub fn source_url(&self) -> String {
        format!("/orgs/{}/sources/{}/", self.org_id, self.source_id)
    }

    pub fn collection_url(&self, collection_id: &str) -> String {
        format!("/orgs/{}/collections/{}/", self.org_id, collection_id)
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_url())
    }
}

/// Returns the concept id segment of a concept URL.
pub fn concept_id_from_url(url: &str) -> Option<&str> {
    let trimmed = url.strip_suffix('/')?;
    let (prefix, id) = trimmed.rsplit_once('/')?;
    if prefix.ends_with("/concepts") && !id.is_empty() {
        Some(id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_url_round_trips_to_id() {
        let source = SourceRef::new("PEPFAR", "MER");
        let url = source.concept_url("TX_CURR");
        assert_eq!(url, "/orgs/PEPFAR/sources/MER/concepts/TX_CURR/");
        assert_eq!(concept_id_from_url(&url), Some("TX_CURR"));
    }

    #[test]
    fn concept_id_rejects_non_concept_urls() {
        assert_eq!(concept_id_from_url("/orgs/PEPFAR/collections/DATIM/"), None);
        assert_eq!(concept_id_from_url("TX_CURR"), None);
    }

    #[test]
    fn mapping_url_uses_pair_id() {
        let source = SourceRef::new("PEPFAR", "MER");
        let id = SourceRef::mapping_id("TX_CURR", "abc123de11");
        assert_eq!(
            source.mapping_url(&id),
            "/orgs/PEPFAR/sources/MER/mappings/TX_CURR-abc123de11/"
        );
    }
}
