//! Import records: the flat, self-describing stream handed to the writer.
//!
//! Every record serializes as one JSON object with a `type` discriminator
//! and enough owner/repository fields for the importer to place it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{keys, Description, Entity, EntityDetail, Extras, LocalizedName};
use crate::error::Result;
use crate::period::PeriodKey;
use crate::relationship::MapType;

pub const OWNER_TYPE_ORGANIZATION: &str = "Organization";

/// Cascade instruction carried by a reference record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cascade {
    #[default]
    None,
    /// The importer also pulls in each referenced concept's own mappings.
    SourceMappings,
}

impl Cascade {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: String,
    pub name: String,
    pub company: String,
    pub website: String,
    pub location: String,
    pub public_access: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub short_code: String,
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub owner_type: String,
    pub source_type: String,
    pub default_locale: String,
    pub supported_locales: String,
    pub public_access: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: String,
    pub short_code: String,
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub owner_type: String,
    pub collection_type: String,
    pub public_access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptRecord {
    pub id: String,
    pub owner: String,
    pub owner_type: String,
    pub source: String,
    pub concept_class: String,
    pub datatype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub names: Vec<LocalizedName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<Description>,
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
}

impl ConceptRecord {
    /// Serializes an entity, refreshing the extras derived from its typed payload.
    pub fn from_entity(entity: &Entity) -> Result<Self> {
        let mut extras = entity.extras.clone();
        match &entity.detail {
            EntityDetail::DataElement { datasets, .. } if !datasets.is_empty() => {
                extras.insert(keys::DATA_SETS.to_string(), serde_json::to_value(datasets)?);
            }
            EntityDetail::DerivedDataElement { sources, .. } => {
                extras.insert(
                    keys::SOURCE_DATA_ELEMENTS.to_string(),
                    serde_json::to_value(sources)?,
                );
            }
            EntityDetail::Indicator {
                numerator,
                denominator,
            } => {
                extras.insert(
                    keys::NUMERATOR_PARSED.to_string(),
                    serde_json::to_value(numerator)?,
                );
                extras.insert(
                    keys::DENOMINATOR_PARSED.to_string(),
                    serde_json::to_value(denominator)?,
                );
            }
            _ => {}
        }
        let kind = entity.kind();
        Ok(Self {
            id: entity.id.clone(),
            owner: entity.source.org_id.clone(),
            owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
            source: entity.source.source_id.clone(),
            concept_class: kind.concept_class().to_string(),
            datatype: kind.datatype().to_string(),
            external_id: entity.external_id.clone(),
            names: entity.names.clone(),
            descriptions: entity.descriptions.clone(),
            extras,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Present only when explicit mapping ids are requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub owner: String,
    pub owner_type: String,
    pub source: String,
    pub map_type: MapType,
    pub from_concept_url: String,
    pub to_concept_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub expressions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub owner: String,
    pub owner_type: String,
    pub collection: String,
    pub data: ReferenceData,
    #[serde(default, skip_serializing_if = "Cascade::is_none")]
    pub cascade: Cascade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceVersionRecord {
    pub id: String,
    pub owner: String,
    pub owner_type: String,
    pub source: String,
    pub description: String,
    pub released: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionVersionRecord {
    pub id: String,
    pub owner: String,
    pub owner_type: String,
    pub collection: String,
    pub description: String,
    pub released: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImportRecord {
    Organization(OrganizationRecord),
    Source(SourceRecord),
    Collection(CollectionRecord),
    Concept(ConceptRecord),
    Mapping(MappingRecord),
    Reference(ReferenceRecord),
    #[serde(rename = "Source Version")]
    SourceVersion(SourceVersionRecord),
    #[serde(rename = "Collection Version")]
    CollectionVersion(CollectionVersionRecord),
}

impl ImportRecord {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Organization(_) => "Organization",
            Self::Source(_) => "Source",
            Self::Collection(_) => "Collection",
            Self::Concept(_) => "Concept",
            Self::Mapping(_) => "Mapping",
            Self::Reference(_) => "Reference",
            Self::SourceVersion(_) => "Source Version",
            Self::CollectionVersion(_) => "Collection Version",
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Which side of a projection a batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BatchRole {
    /// The "from" entities, cascaded.
    From,
    /// One-hop targets of the "from" entities.
    To,
    /// Explicit mapping URLs connecting from and to entities.
    Mappings,
}

/// URLs assigned to one collection for one period key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBatch {
    pub collection_id: String,
    pub period: PeriodKey,
    pub role: BatchRole,
    pub cascade: Cascade,
    pub expressions: Vec<String>,
}

impl ReferenceBatch {
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.expressions.iter().any(|expression| expression == url)
    }

    pub fn to_record(&self, owner: &str) -> ReferenceRecord {
        ReferenceRecord {
            owner: owner.to_string(),
            owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
            collection: self.collection_id.clone(),
            data: ReferenceData {
                expressions: self.expressions.clone(),
            },
            cascade: self.cascade,
        }
    }
}
