//! Organization, repository and release declarations.

use serde_json::Value;

use msp_model::entity::keys;
use msp_model::options::{COLLECTION_MER, METADATA_COLLECTIONS};
use msp_model::period::period_collection_id;
use msp_model::records::{
    CollectionRecord, CollectionVersionRecord, OrganizationRecord, SourceRecord,
    SourceVersionRecord, OWNER_TYPE_ORGANIZATION,
};
use msp_model::{Codelist, EmitOptions, Extras, RepositoryOptions};

pub const COLLECTION_TYPE_CODELIST: &str = "Code List";
pub const COLLECTION_TYPE_SUBSET: &str = "Subset";
pub const SOURCE_TYPE_DICTIONARY: &str = "Dictionary";
pub const DEFAULT_LOCALE: &str = "en";

pub fn organization_record(repository: &RepositoryOptions) -> OrganizationRecord {
    OrganizationRecord {
        id: repository.org_id.clone(),
        name: repository.org_name.clone(),
        company: repository.org_company.clone(),
        website: repository.org_website.clone(),
        location: repository.org_location.clone(),
        public_access: repository.public_access.clone(),
    }
}

pub fn source_record(repository: &RepositoryOptions) -> SourceRecord {
    SourceRecord {
        id: repository.source_id.clone(),
        short_code: repository.source_id.clone(),
        name: repository.source_name.clone(),
        full_name: repository.source_full_name.clone(),
        owner: repository.org_id.clone(),
        owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
        source_type: SOURCE_TYPE_DICTIONARY.to_string(),
        default_locale: DEFAULT_LOCALE.to_string(),
        supported_locales: DEFAULT_LOCALE.to_string(),
        public_access: repository.public_access.clone(),
    }
}

fn insert_text(extras: &mut Extras, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        extras.insert(key.to_string(), Value::from(value));
    }
}

pub fn codelist_collection_record(
    repository: &RepositoryOptions,
    codelist: &Codelist,
) -> CollectionRecord {
    let mut extras = Extras::new();
    if !codelist.applicable_periods.is_empty() {
        extras.insert(
            keys::APPLICABLE_PERIODS.to_string(),
            Value::from(codelist.applicable_periods.join(", ")),
        );
    }
    insert_text(&mut extras, "Code List Type", codelist.codelist_type.as_deref());
    insert_text(&mut extras, keys::RESULT_TARGET, codelist.result_target.as_deref());
    insert_text(&mut extras, "DATIM DataSet ID", codelist.dataset_id.as_deref());
    CollectionRecord {
        id: codelist.id.clone(),
        short_code: codelist.id.clone(),
        name: codelist.name.clone(),
        full_name: codelist.full_name.clone(),
        owner: repository.org_id.clone(),
        owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
        collection_type: COLLECTION_TYPE_CODELIST.to_string(),
        public_access: repository.public_access.clone(),
        external_id: Some(codelist.external_id.clone()),
        description: Some(codelist.description.clone()).filter(|d| !d.is_empty()),
        extras,
    }
}

pub fn metadata_collection_record(
    repository: &RepositoryOptions,
    collection_id: &str,
) -> CollectionRecord {
    CollectionRecord {
        id: collection_id.to_string(),
        short_code: collection_id.to_string(),
        name: collection_id.to_string(),
        full_name: collection_id.to_string(),
        owner: repository.org_id.clone(),
        owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
        collection_type: COLLECTION_TYPE_SUBSET.to_string(),
        public_access: repository.public_access.clone(),
        external_id: None,
        description: None,
        extras: Extras::new(),
    }
}

/// Enabled metadata collections and their period collections.
///
/// `MER` only exists per period.
pub fn metadata_collection_ids(emit: &EmitOptions, periods: &[String]) -> Vec<String> {
    let mut ids = Vec::new();
    for name in METADATA_COLLECTIONS {
        if !emit.collection_enabled(name) {
            continue;
        }
        if name != COLLECTION_MER {
            ids.push(name.to_string());
        }
        ids.extend(
            periods
                .iter()
                .map(|period| period_collection_id(name, period)),
        );
    }
    ids
}

pub fn source_version_record(repository: &RepositoryOptions) -> SourceVersionRecord {
    SourceVersionRecord {
        id: repository.version_id.clone(),
        owner: repository.org_id.clone(),
        owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
        source: repository.source_id.clone(),
        description: repository.version_description.clone(),
        released: true,
    }
}

pub fn collection_version_record(
    repository: &RepositoryOptions,
    collection_id: &str,
) -> CollectionVersionRecord {
    CollectionVersionRecord {
        id: repository.version_id.clone(),
        owner: repository.org_id.clone(),
        owner_type: OWNER_TYPE_ORGANIZATION.to_string(),
        collection: collection_id.to_string(),
        description: repository.version_description.clone(),
        released: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mer_has_period_collections_only() {
        let mut emit = EmitOptions::default();
        emit.collections.insert("PDH".to_string(), false);
        let periods = vec!["FY18".to_string(), "FY19".to_string()];
        assert_eq!(
            metadata_collection_ids(&emit, &periods),
            vec!["DATIM", "DATIM-FY18", "DATIM-FY19", "MER-FY18", "MER-FY19"]
        );
    }

    #[test]
    fn organization_record_snapshot() {
        let record = organization_record(&RepositoryOptions::default());
        insta::assert_json_snapshot!(record, @r#"
        {
          "id": "PEPFAR",
          "name": "The United States President's Emergency Plan for AIDS Relief",
          "company": "US Government",
          "website": "https://www.pepfar.gov/",
          "location": "Washington, DC, USA",
          "public_access": "View"
        }
        "#);
    }
}
