//! MER guidance spreadsheets: one reference indicator per row and period.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use msp_model::RawReferenceIndicator;

use crate::csv_table::read_csv_table;
use crate::error::Result;

const ATTRIBUTE_PREFIX: &str = "attr:";

/// Columns consumed directly; every other column is passed through.
const RESERVED: &[&str] = &[
    "id",
    "name",
    "description",
    "period",
    "attr:Period",
    "attr:Reporting frequency",
    "owner_id",
    "source",
    "resource_type",
];

fn attribute_name(header: &str) -> &str {
    header.strip_prefix(ATTRIBUTE_PREFIX).unwrap_or(header)
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Loads reference indicators from one guidance spreadsheet.
///
/// The period comes from `attr:Period`, or a plain `period` column.
pub fn load_reference_indicators(path: &Path) -> Result<Vec<RawReferenceIndicator>> {
    let table = read_csv_table(path)?;
    if table.headers.is_empty() {
        return Ok(Vec::new());
    }
    let id = table.require_column(&["id"])?;
    let period = table.require_column(&["attr:Period", "period"])?;
    let name = table.column("name");
    let description = table.column("description");
    let frequency = table.column("attr:Reporting frequency");
    let passthrough: Vec<(usize, &str)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            !header.is_empty()
                && !RESERVED
                    .iter()
                    .any(|reserved| header.eq_ignore_ascii_case(reserved))
        })
        .map(|(idx, header)| (idx, attribute_name(header)))
        .collect();

    let mut indicators = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let code = table.value(row, Some(id));
        if code.is_empty() {
            continue;
        }
        let attributes: BTreeMap<String, String> = passthrough
            .iter()
            .filter(|(idx, _)| !row[*idx].is_empty())
            .map(|(idx, header)| (header.to_string(), row[*idx].clone()))
            .collect();
        indicators.push(RawReferenceIndicator {
            id: code.to_string(),
            period: table.value(row, Some(period)).to_string(),
            name: optional(table.value(row, name)),
            description: optional(table.value(row, description)),
            reporting_frequency: optional(table.value(row, frequency)),
            attributes,
        });
    }
    debug!(
        path = %path.display(),
        reference_indicators = indicators.len(),
        "guidance spreadsheet loaded"
    );
    Ok(indicators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_prefix_is_dropped() {
        assert_eq!(attribute_name("attr:Indicator Group"), "Indicator Group");
        assert_eq!(attribute_name("Level"), "Level");
    }
}
