//! PDH derivation extract: one row per source to derived edge.

use std::path::Path;

use tracing::debug;

use msp_model::RawDerivedDataElementRow;

use crate::csv_table::read_csv_table;
use crate::error::Result;

const REQUIRED: &[&str] = &["derived_data_element_uid", "source_data_element_uid"];

pub fn load_derived_rows(path: &Path) -> Result<Vec<RawDerivedDataElementRow>> {
    let table = read_csv_table(path)?;
    if table.headers.is_empty() {
        return Ok(Vec::new());
    }
    for column in REQUIRED.iter().copied() {
        table.require_column(&[column])?;
    }
    let rows: Vec<RawDerivedDataElementRow> = table.deserialize_rows()?;
    debug!(path = %path.display(), rows = rows.len(), "PDH extract loaded");
    Ok(rows)
}
