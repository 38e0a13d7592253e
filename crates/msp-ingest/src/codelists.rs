use std::path::Path;

use tracing::debug;

use msp_model::RawCodelist;

use crate::csv_table::read_csv_table;
use crate::error::Result;

/// Loads every codelist spreadsheet row, including rows not marked for import.
pub fn load_codelists(path: &Path) -> Result<Vec<RawCodelist>> {
    let table = read_csv_table(path)?;
    if table.headers.is_empty() {
        return Ok(Vec::new());
    }
    let resource_type = table.require_column(&["resource_type"])?;
    let id = table.require_column(&["id"])?;
    let external_id = table.require_column(&["external_id"])?;
    let name = table.column("name");
    let full_name = table.column("full_name");
    let description = table.column("description");
    let periods = table.column("attr:Applicable Periods");
    let codelist_type = table.column("attr:Code List Type");
    let result_target = table
        .column("attr:Result/Target")
        .or_else(|| table.column("result_target"));
    let dataset_id = table.column("ZenDesk: DATIM DataSet ID");

    let codelists: Vec<RawCodelist> = table
        .rows
        .iter()
        .map(|row| RawCodelist {
            resource_type: table.value(row, Some(resource_type)).to_string(),
            id: table.value(row, Some(id)).to_string(),
            external_id: table.value(row, Some(external_id)).to_string(),
            name: table.value(row, name).to_string(),
            full_name: table.value(row, full_name).to_string(),
            description: table.value(row, description).to_string(),
            applicable_periods: table.value(row, periods).to_string(),
            codelist_type: table.value(row, codelist_type).to_string(),
            result_target: table.value(row, result_target).to_string(),
            dataset_id: table.value(row, dataset_id).to_string(),
        })
        .collect();
    debug!(path = %path.display(), codelists = codelists.len(), "codelist spreadsheet loaded");
    Ok(codelists)
}
