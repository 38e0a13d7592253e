//! DHIS2 metadata exports.
//!
//! Exports arrive wrapped under their collection key
//! (`{"dataElements": [...]}`); a bare array is accepted as well.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use msp_model::{RawCategoryOptionCombo, RawDataElement, RawIndicator};

use crate::error::{IngestError, Result};

pub const DATA_ELEMENTS_KEY: &str = "dataElements";
pub const CATEGORY_OPTION_COMBOS_KEY: &str = "categoryOptionCombos";
pub const INDICATORS_KEY: &str = "indicators";

/// Reads the records listed under `key`.
pub fn read_export<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let json_error = |source| IngestError::JsonParse {
        path: path.to_path_buf(),
        source,
    };
    let value: Value = serde_json::from_str(&contents).map_err(json_error)?;
    let records = match value {
        Value::Array(records) => Value::Array(records),
        Value::Object(mut object) => {
            object.remove(key).ok_or_else(|| IngestError::ExportFormat {
                path: path.to_path_buf(),
                reason: format!("missing '{key}'"),
            })?
        }
        _ => {
            return Err(IngestError::ExportFormat {
                path: path.to_path_buf(),
                reason: format!("expected an object with '{key}' or an array"),
            });
        }
    };
    let records: Vec<T> = serde_json::from_value(records).map_err(json_error)?;
    debug!(path = %path.display(), key, records = records.len(), "export loaded");
    Ok(records)
}

pub fn load_data_elements(path: &Path) -> Result<Vec<RawDataElement>> {
    read_export(path, DATA_ELEMENTS_KEY)
}

pub fn load_category_option_combos(path: &Path) -> Result<Vec<RawCategoryOptionCombo>> {
    read_export(path, CATEGORY_OPTION_COMBOS_KEY)
}

pub fn load_indicators(path: &Path) -> Result<Vec<RawIndicator>> {
    read_export(path, INDICATORS_KEY)
}
