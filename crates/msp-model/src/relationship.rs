//! Directed links between entities.
//!
//! Each relationship class is an [`Adjacency`] keyed by the URL of the
//! "from" entity. Target lists never hold the same URL twice and keep the
//! order in which targets were first seen.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Map type carried by emitted mapping records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MapType {
    #[serde(rename = "Has Data Element")]
    HasDataElement,
    #[serde(rename = "Has DATIM Indicator")]
    HasDatimIndicator,
    #[serde(rename = "Has Option")]
    HasOption,
    #[serde(rename = "Replaces")]
    Replaces,
    #[serde(rename = "Derived From")]
    DerivedFrom,
}

impl MapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasDataElement => "Has Data Element",
            Self::HasDatimIndicator => "Has DATIM Indicator",
            Self::HasOption => "Has Option",
            Self::Replaces => "Replaces",
            Self::DerivedFrom => "Derived From",
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The relationship classes built for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationshipClass {
    IndicatorToDataElement,
    IndicatorToDerivedDataElement,
    IndicatorToIndicator,
    DataElementToDisaggregate,
    DerivedDataElementToDisaggregate,
    Replaces,
    DerivedFrom,
}

impl RelationshipClass {
    /// Emission order of mapping records.
    pub const ALL: [Self; 7] = [
        Self::IndicatorToDataElement,
        Self::IndicatorToDerivedDataElement,
        Self::IndicatorToIndicator,
        Self::DataElementToDisaggregate,
        Self::DerivedDataElementToDisaggregate,
        Self::Replaces,
        Self::DerivedFrom,
    ];

    pub fn map_type(&self) -> MapType {
        match self {
            Self::IndicatorToDataElement | Self::IndicatorToDerivedDataElement => {
                MapType::HasDataElement
            }
            Self::IndicatorToIndicator => MapType::HasDatimIndicator,
            Self::DataElementToDisaggregate | Self::DerivedDataElementToDisaggregate => {
                MapType::HasOption
            }
            Self::Replaces => MapType::Replaces,
            Self::DerivedFrom => MapType::DerivedFrom,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::IndicatorToDataElement => "indicator -> data element",
            Self::IndicatorToDerivedDataElement => "indicator -> derived data element",
            Self::IndicatorToIndicator => "indicator -> DATIM indicator",
            Self::DataElementToDisaggregate => "data element -> disaggregate",
            Self::DerivedDataElementToDisaggregate => "derived data element -> disaggregate",
            Self::Replaces => "replaces",
            Self::DerivedFrom => "derived from",
        }
    }
}

impl fmt::Display for RelationshipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One directed adjacency map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    edges: BTreeMap<String, Vec<String>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge. Returns false when the edge already exists.
    pub fn insert(&mut self, from: &str, to: &str) -> bool {
        let targets = self.edges.entry(from.to_string()).or_default();
        if targets.iter().any(|target| target == to) {
            return false;
        }
        targets.push(to.to_string());
        true
    }

    /// Targets of `from`; empty when the entity has no outgoing edge.
    pub fn targets(&self, from: &str) -> &[String] {
        self.edges.get(from).map_or(&[], Vec::as_slice)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.targets(from).iter().any(|target| target == to)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges
            .iter()
            .map(|(from, targets)| (from.as_str(), targets.as_slice()))
    }

    /// Iterates `(from, to)` pairs in key order, then target order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to.as_str())))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// All relationship classes of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipGraph {
    pub indicator_to_data_element: Adjacency,
    pub indicator_to_derived_data_element: Adjacency,
    pub indicator_to_indicator: Adjacency,
    pub data_element_to_disaggregate: Adjacency,
    pub derived_data_element_to_disaggregate: Adjacency,
    pub replaces: Adjacency,
    pub derived_from: Adjacency,
}

impl RelationshipGraph {
    pub fn class(&self, class: RelationshipClass) -> &Adjacency {
        match class {
            RelationshipClass::IndicatorToDataElement => &self.indicator_to_data_element,
            RelationshipClass::IndicatorToDerivedDataElement => {
                &self.indicator_to_derived_data_element
            }
            RelationshipClass::IndicatorToIndicator => &self.indicator_to_indicator,
            RelationshipClass::DataElementToDisaggregate => &self.data_element_to_disaggregate,
            RelationshipClass::DerivedDataElementToDisaggregate => {
                &self.derived_data_element_to_disaggregate
            }
            RelationshipClass::Replaces => &self.replaces,
            RelationshipClass::DerivedFrom => &self.derived_from,
        }
    }

    pub fn edge_counts(&self) -> BTreeMap<RelationshipClass, usize> {
        RelationshipClass::ALL
            .into_iter()
            .map(|class| (class, self.class(class).edge_count()))
            .collect()
    }
}
