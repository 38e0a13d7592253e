//! Processing options handed to the pipeline by value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const COLLECTION_DATIM: &str = "DATIM";
pub const COLLECTION_PDH: &str = "PDH";
pub const COLLECTION_MER: &str = "MER";

/// Metadata-source collections, in emission order.
pub const METADATA_COLLECTIONS: [&str; 3] = [COLLECTION_DATIM, COLLECTION_PDH, COLLECTION_MER];

/// What to do when a DATIM data element and a PDH derived element share a UID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Count and log the overlap; the DATIM element keeps the URL.
    #[default]
    Report,
    /// Abort the run.
    Reject,
}

/// Owner organization and primary source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryOptions {
    pub org_id: String,
    pub org_name: String,
    pub org_company: String,
    pub org_website: String,
    pub org_location: String,
    pub source_id: String,
    pub source_name: String,
    pub source_full_name: String,
    pub public_access: String,
    pub version_id: String,
    pub version_description: String,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            org_id: "PEPFAR".to_string(),
            org_name: "The United States President's Emergency Plan for AIDS Relief".to_string(),
            org_company: "US Government".to_string(),
            org_website: "https://www.pepfar.gov/".to_string(),
            org_location: "Washington, DC, USA".to_string(),
            source_id: "MER".to_string(),
            source_name: "MER Indicators".to_string(),
            source_full_name: "DATIM Monitoring, Evaluation & Results Indicators".to_string(),
            public_access: "View".to_string(),
            version_id: "v1.0".to_string(),
            version_description: "Auto-generated release".to_string(),
        }
    }
}

/// Which parts of the import list are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    pub org: bool,
    pub source: bool,
    pub reference_indicators: bool,
    pub datim_data_elements: bool,
    pub pdh_derived_data_elements: bool,
    pub datim_indicators: bool,
    pub disaggregates: bool,
    pub codelist_collections: bool,
    /// Per metadata-source collection toggles; absent means off.
    pub collections: BTreeMap<String, bool>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            org: true,
            source: true,
            reference_indicators: true,
            datim_data_elements: true,
            pdh_derived_data_elements: true,
            datim_indicators: true,
            disaggregates: true,
            codelist_collections: true,
            collections: METADATA_COLLECTIONS
                .iter()
                .map(|name| (name.to_string(), true))
                .collect(),
        }
    }
}

impl EmitOptions {
    pub fn collection_enabled(&self, collection_id: &str) -> bool {
        self.collections.get(collection_id).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub repository: RepositoryOptions,
    /// Periods present in the inputs, oldest first.
    pub input_periods: Vec<String>,
    /// Periods that get concepts, mappings and period collections.
    pub output_periods: Vec<String>,
    /// Number of PDH run sequences processed, starting at 1.
    pub pdh_run_sequences: u32,
    pub emit: EmitOptions,
    /// Give mappings deterministic ids and reference them from batches.
    pub explicit_mapping_ids: bool,
    /// Emit entities without any period attribute after the period-scoped ones.
    pub emit_unscoped_concepts: bool,
    pub uid_overlap: OverlapPolicy,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        let periods: Vec<String> = ["FY16", "FY17", "FY18", "FY19", "FY20"]
            .iter()
            .map(ToString::to_string)
            .collect();
        Self {
            repository: RepositoryOptions::default(),
            input_periods: periods.clone(),
            output_periods: periods,
            pdh_run_sequences: 3,
            emit: EmitOptions::default(),
            explicit_mapping_ids: false,
            emit_unscoped_concepts: true,
            uid_overlap: OverlapPolicy::Report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_metadata_collection() {
        let options = ProcessingOptions::default();
        for name in METADATA_COLLECTIONS {
            assert!(options.emit.collection_enabled(name));
        }
        assert!(!options.emit.collection_enabled("OTHER"));
        assert_eq!(options.output_periods, options.input_periods);
        assert_eq!(options.repository.version_id, "v1.0");
    }

    #[test]
    fn overlap_policy_is_lowercase() {
        let policy: OverlapPolicy = serde_json::from_str("\"reject\"").expect("deserialize");
        assert_eq!(policy, OverlapPolicy::Reject);
    }
}
