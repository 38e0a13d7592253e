//! Raw source records as handed over by the loaders.
//!
//! DHIS2 exports deserialize straight into these types (camelCase fields).
//! CSV-backed records are filled in by `msp-ingest`, which owns the column
//! naming of each spreadsheet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `{id, name}` as found throughout DHIS2 exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNamed {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl RawNamed {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategoryCombo {
    #[serde(default)]
    pub category_option_combos: Vec<RawNamed>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataSetElement {
    pub data_set: RawNamed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataElement {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_combo: Option<RawCategoryCombo>,
    #[serde(default)]
    pub data_set_elements: Vec<RawDataSetElement>,
    #[serde(default)]
    pub data_element_groups: Vec<RawNamed>,
    #[serde(default)]
    pub domain_type: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub aggregation_type: Option<String>,
}

impl RawDataElement {
    /// Category option combos listed by the element's category combo.
    pub fn category_option_combos(&self) -> &[RawNamed] {
        self.category_combo
            .as_ref()
            .map_or(&[], |combo| combo.category_option_combos.as_slice())
    }

    /// Dataset ids the element is published in, in listing order.
    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.data_set_elements
            .iter()
            .map(|element| element.data_set.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCategoryOptionCombo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndicator {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub indicator_type: Option<RawNamed>,
    #[serde(default)]
    pub numerator: String,
    #[serde(default)]
    pub denominator: String,
    #[serde(default)]
    pub numerator_description: Option<String>,
    #[serde(default)]
    pub denominator_description: Option<String>,
    #[serde(default)]
    pub annualized: Option<bool>,
    #[serde(default)]
    pub dimension_item_type: Option<String>,
    #[serde(default)]
    pub indicator_groups: Vec<RawNamed>,
}

/// One MER guidance row: a reference indicator code for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReferenceIndicator {
    pub id: String,
    pub period: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reporting_frequency: Option<String>,
    /// Remaining guidance columns, emitted as extras under their own names.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// One PDH derivation row: a single source to derived edge at one disaggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDerivedDataElementRow {
    pub indicator: String,
    pub source_srgt_key: String,
    pub disaggregate: String,
    pub standardized_disaggregate: String,
    pub derived_data_element_uid: String,
    pub derived_data_element_name: String,
    pub derived_category_option_combo: String,
    pub derived_category_option_combo_name: String,
    pub source_data_element_uid: String,
    pub source_data_element_name: String,
    pub source_disaggregate: String,
    pub source_category_option_combo_uid: String,
    pub source_category_option_combo_name: String,
    pub rule_begin_period: String,
    pub rule_end_period: String,
    pub add_or_subtract: String,
    pub result_target: String,
    pub run_sequence: String,
    pub rule_id: String,
}

impl RawDerivedDataElementRow {
    pub fn run_sequence(&self) -> Option<u32> {
        self.run_sequence.trim().parse().ok()
    }
}

/// One codelist spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCodelist {
    /// Empty for rows that are not imported.
    pub resource_type: String,
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub applicable_periods: String,
    pub codelist_type: String,
    pub result_target: String,
    pub dataset_id: String,
}

/// Every raw input of one run.
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    pub reference_indicators: Vec<RawReferenceIndicator>,
    pub data_elements: Vec<RawDataElement>,
    pub category_option_combos: Vec<RawCategoryOptionCombo>,
    pub indicators: Vec<RawIndicator>,
    pub derived_rows: Vec<RawDerivedDataElementRow>,
    pub codelists: Vec<RawCodelist>,
}
