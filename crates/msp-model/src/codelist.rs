use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MspError, Result};

/// A period-tagged grouping of data elements, imported as a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelist {
    /// Canonical collection id.
    pub id: String,
    /// Dataset id in the source system; the membership join key.
    pub external_id: String,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub applicable_periods: Vec<String>,
    pub codelist_type: Option<String>,
    pub result_target: Option<String>,
    pub dataset_id: Option<String>,
}

impl Codelist {
    pub fn is_valid_for(&self, period: &str) -> bool {
        self.applicable_periods.iter().any(|p| p == period)
    }
}

/// Codelists in input order, looked up by external id.
///
/// External ids are unique; duplicates are rejected when the index is built.
#[derive(Debug, Clone, Default)]
pub struct CodelistIndex {
    codelists: Vec<Codelist>,
    by_external_id: BTreeMap<String, usize>,
}

impl CodelistIndex {
    pub fn new(codelists: Vec<Codelist>) -> Result<Self> {
        let mut by_external_id = BTreeMap::new();
        for (index, codelist) in codelists.iter().enumerate() {
            if by_external_id
                .insert(codelist.external_id.clone(), index)
                .is_some()
            {
                return Err(MspError::DuplicateCodelist {
                    external_id: codelist.external_id.clone(),
                });
            }
        }
        Ok(Self {
            codelists,
            by_external_id,
        })
    }

    pub fn get(&self, external_id: &str) -> Option<&Codelist> {
        self.by_external_id
            .get(external_id)
            .map(|index| &self.codelists[*index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Codelist> {
        self.codelists.iter()
    }

    pub fn len(&self) -> usize {
        self.codelists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codelists.is_empty()
    }
}

/// Codelist as exported for display filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodelistDisplay {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub periods: Vec<String>,
    pub codelist_type: Option<String>,
    pub description: String,
    pub dataset_id: Option<String>,
}

impl From<&Codelist> for CodelistDisplay {
    fn from(codelist: &Codelist) -> Self {
        Self {
            id: codelist.id.clone(),
            name: codelist.name.clone(),
            full_name: codelist.full_name.clone(),
            periods: codelist.applicable_periods.clone(),
            codelist_type: codelist.codelist_type.clone(),
            description: codelist.description.clone(),
            dataset_id: codelist.dataset_id.clone(),
        }
    }
}
