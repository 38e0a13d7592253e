//! Canonical entities produced by the builders.
//!
//! An [`Entity`] has a fixed set of common fields, a closed [`EntityDetail`]
//! payload for kind-specific structure, and an open `extras` bag for the
//! long tail of domain attributes that are emitted verbatim.
//!
//! ## Identity
//!
//! `url` is derived from owner, source and id and is the key of every entity
//! map. Reference indicators are the exception: one concept URL carries one
//! definition per period, so they are kept as an ordered list.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::SourceRef;

/// Open attribute bag, ordered for deterministic output.
pub type Extras = BTreeMap<String, Value>;

/// Entities keyed by concept URL.
pub type EntityMap = BTreeMap<String, Entity>;

/// Attribute names used in `extras`.
pub mod keys {
    pub const PERIOD: &str = "Period";
    pub const REPORTING_FREQUENCY: &str = "Reporting frequency";
    pub const APPLICABLE_PERIODS: &str = "Applicable Periods";
    pub const INDICATOR: &str = "indicator";
    pub const RESULT_TARGET: &str = "resultTarget";
    pub const SUPPORT_TYPE: &str = "pepfarSupportType";
    pub const NUMERATOR_DENOMINATOR: &str = "numeratorDenominator";
    pub const SOURCE: &str = "source";
    pub const CODE: &str = "code";
    pub const CODELISTS: &str = "codelists";
    pub const DATA_SETS: &str = "dataSets";
    pub const DATA_ELEMENT_GROUPS: &str = "dataElementGroups";
    pub const DOMAIN_TYPE: &str = "domainType";
    pub const VALUE_TYPE: &str = "valueType";
    pub const AGGREGATION_TYPE: &str = "aggregationType";
    pub const VERSION: &str = "data_element_version";
    pub const ROOT: &str = "data_element_root";
    pub const SOURCE_DATA_ELEMENTS: &str = "source_data_elements";
    pub const NUMERATOR: &str = "numerator";
    pub const DENOMINATOR: &str = "denominator";
    pub const NUMERATOR_READABLE: &str = "numerator_readable";
    pub const DENOMINATOR_READABLE: &str = "denominator_readable";
    pub const NUMERATOR_PARSED: &str = "numerator_parsed";
    pub const DENOMINATOR_PARSED: &str = "denominator_parsed";
    pub const NUMERATOR_DESCRIPTION: &str = "numeratorDescription";
    pub const DENOMINATOR_DESCRIPTION: &str = "denominatorDescription";
    pub const INDICATOR_TYPE: &str = "indicatorType";
    pub const ANNUALIZED: &str = "annualized";
    pub const INDICATOR_GROUPS: &str = "indicatorGroups";
}

/// Values of the `source` attribute.
pub mod source_system {
    pub const DATIM: &str = "DATIM";
    pub const PDH: &str = "PDH";
    pub const MER_GUIDANCE: &str = "MER Guidance";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    ReferenceIndicator,
    DataElement,
    DerivedDataElement,
    CategoryOptionCombo,
    Indicator,
}

impl EntityKind {
    /// Concept class emitted for this kind.
    pub fn concept_class(&self) -> &'static str {
        match self {
            Self::ReferenceIndicator => "Reference Indicator",
            Self::DataElement => "Data Element",
            Self::DerivedDataElement => "Derived Data Element",
            Self::CategoryOptionCombo => "Disaggregate",
            Self::Indicator => "Indicator",
        }
    }

    /// Datatype emitted for this kind.
    pub fn datatype(&self) -> &'static str {
        match self {
            Self::DataElement | Self::DerivedDataElement | Self::Indicator => "Numeric",
            Self::ReferenceIndicator | Self::CategoryOptionCombo => "None",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.concept_class())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameType {
    #[serde(rename = "Fully Specified")]
    FullySpecified,
    #[serde(rename = "Short")]
    Short,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name: String,
    pub name_type: NameType,
    pub locale: String,
    pub locale_preferred: bool,
}

impl LocalizedName {
    pub fn fully_specified(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_type: NameType::FullySpecified,
            locale: "en".to_string(),
            locale_preferred: true,
        }
    }

    pub fn short(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_type: NameType::Short,
            locale: "en".to_string(),
            locale_preferred: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub description: String,
    pub locale: String,
    pub locale_preferred: bool,
}

impl Description {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            locale: "en".to_string(),
            locale_preferred: true,
        }
    }
}

/// `{id, name}` pair used for datasets and codelist memberships.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Contribution of one source element to a derived element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
}

impl Sign {
    /// Parses the source-row spelling (`add`, `subtract`, `+`, `-`, `1`, `-1`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "add" | "+" | "1" | "+1" | "plus" => Some(Self::Add),
            "subtract" | "-" | "-1" | "minus" => Some(Self::Subtract),
            _ => None,
        }
    }
}

/// One term of a derivation rule: `sign * source element [at disaggregate]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDataElement {
    pub source_data_element_uid: String,
    pub source_data_element_name: String,
    pub source_disaggregate: String,
    pub source_category_option_combo_uid: String,
    pub source_category_option_combo_name: String,
    pub derived_category_option_combo: String,
    pub derived_category_option_combo_name: String,
    pub add_or_subtract: Sign,
    pub rule_id: String,
    pub run_sequence: u32,
}

/// One `#{...}` reference inside an indicator formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaTerm {
    pub data_element_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_element_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disaggregate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disaggregate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanism_id: Option<String>,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDetail {
    ReferenceIndicator {
        period: String,
    },
    DataElement {
        code: Option<String>,
        /// Disaggregate concept URLs, in category combo order.
        disaggregates: Vec<String>,
        datasets: Vec<NamedRef>,
    },
    DerivedDataElement {
        sources: Vec<SourceDataElement>,
        /// Derived disaggregate concept URLs, first-seen order.
        disaggregates: Vec<String>,
    },
    CategoryOptionCombo,
    Indicator {
        numerator: Vec<FormulaTerm>,
        denominator: Vec<FormulaTerm>,
    },
}

impl EntityDetail {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::ReferenceIndicator { .. } => EntityKind::ReferenceIndicator,
            Self::DataElement { .. } => EntityKind::DataElement,
            Self::DerivedDataElement { .. } => EntityKind::DerivedDataElement,
            Self::CategoryOptionCombo => EntityKind::CategoryOptionCombo,
            Self::Indicator { .. } => EntityKind::Indicator,
        }
    }
}

/// Period applicability read from `extras`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodAttribute<'a> {
    /// `Period`: matched by exact equality.
    Single(&'a str),
    /// `Applicable Periods`: matched when any member equals the period.
    Many(Vec<&'a str>),
}

impl PeriodAttribute<'_> {
    pub fn contains(&self, period: &str) -> bool {
        match self {
            Self::Single(value) => *value == period,
            Self::Many(values) => values.iter().any(|value| *value == period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub url: String,
    pub source: SourceRef,
    pub external_id: Option<String>,
    pub names: Vec<LocalizedName>,
    pub descriptions: Vec<Description>,
    pub extras: Extras,
    pub detail: EntityDetail,
}

impl Entity {
    pub fn new(source: &SourceRef, id: impl Into<String>, detail: EntityDetail) -> Self {
        let id = id.into();
        Self {
            url: source.concept_url(&id),
            id,
            source: source.clone(),
            external_id: None,
            names: Vec::new(),
            descriptions: Vec::new(),
            extras: Extras::new(),
            detail,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.detail.kind()
    }

    /// Preferred fully specified name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.names
            .iter()
            .find(|name| name.name_type == NameType::FullySpecified)
            .or_else(|| self.names.first())
            .map_or(self.id.as_str(), |name| name.name.as_str())
    }

    pub fn short_name(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|name| name.name_type == NameType::Short)
            .map(|name| name.name.as_str())
    }

    pub fn code(&self) -> Option<&str> {
        match &self.detail {
            EntityDetail::DataElement { code, .. } => code.as_deref(),
            _ => self.extra_str(keys::CODE),
        }
    }

    /// Best human-readable label: short code, then short name, then full name.
    pub fn display_label(&self) -> &str {
        self.code()
            .filter(|code| !code.is_empty())
            .or_else(|| self.short_name().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| self.display_name())
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key).and_then(Value::as_str)
    }

    pub fn set_extra(&mut self, key: &str, value: impl Into<Value>) {
        self.extras.insert(key.to_string(), value.into());
    }

    /// Matched reference indicator code, if any.
    pub fn indicator_code(&self) -> Option<&str> {
        self.extra_str(keys::INDICATOR).filter(|code| !code.is_empty())
    }

    pub fn period_attribute(&self) -> Option<PeriodAttribute<'_>> {
        if let Some(period) = self.extra_str(keys::PERIOD) {
            return Some(PeriodAttribute::Single(period));
        }
        match self.extras.get(keys::APPLICABLE_PERIODS)? {
            Value::Array(values) => Some(PeriodAttribute::Many(
                values.iter().filter_map(Value::as_str).collect(),
            )),
            Value::String(raw) => Some(PeriodAttribute::Many(
                raw.split(',').map(str::trim).filter(|p| !p.is_empty()).collect(),
            )),
            _ => None,
        }
    }

    pub fn has_period_attribute(&self) -> bool {
        self.period_attribute().is_some()
    }

    /// True when the entity's own period attribute contains `period`.
    pub fn is_valid_for(&self, period: &str) -> bool {
        self.period_attribute()
            .is_some_and(|attribute| attribute.contains(period))
    }

    /// Periods listed by the entity, in attribute order.
    pub fn periods(&self) -> Vec<String> {
        match self.period_attribute() {
            Some(PeriodAttribute::Single(period)) => vec![period.to_string()],
            Some(PeriodAttribute::Many(periods)) => {
                periods.into_iter().map(str::to_string).collect()
            }
            None => Vec::new(),
        }
    }

    /// Disaggregate concept URLs attached to a data element or derived element.
    pub fn disaggregate_urls(&self) -> &[String] {
        match &self.detail {
            EntityDetail::DataElement { disaggregates, .. }
            | EntityDetail::DerivedDataElement { disaggregates, .. } => disaggregates,
            _ => &[],
        }
    }
}

/// Every entity built in one run, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    /// One entry per (code, period); entries of one code share a URL.
    pub reference_indicators: Vec<Entity>,
    pub data_elements: EntityMap,
    pub derived_data_elements: EntityMap,
    pub disaggregates: EntityMap,
    pub indicators: EntityMap,
}

impl EntitySet {
    /// Looks a URL up across all kinds; reference indicators resolve to their first period.
    pub fn get(&self, url: &str) -> Option<&Entity> {
        self.data_elements
            .get(url)
            .or_else(|| self.derived_data_elements.get(url))
            .or_else(|| self.disaggregates.get(url))
            .or_else(|| self.indicators.get(url))
            .or_else(|| {
                self.reference_indicators
                    .iter()
                    .find(|entity| entity.url == url)
            })
    }

    /// Data element or derived data element behind a URL.
    pub fn element(&self, url: &str) -> Option<&Entity> {
        self.data_elements
            .get(url)
            .or_else(|| self.derived_data_elements.get(url))
    }

    pub fn len(&self) -> usize {
        self.reference_indicators.len()
            + self.data_elements.len()
            + self.derived_data_elements.len()
            + self.disaggregates.len()
            + self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
