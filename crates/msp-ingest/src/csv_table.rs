use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;

use crate::error::{IngestError, Result};

/// A spreadsheet read as trimmed strings, first non-blank row as header.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let csv_error = |source| IngestError::CsvParse {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|value| normalize_cell(value).is_empty()) {
            continue;
        }
        match &headers {
            None => headers = Some(record.iter().map(normalize_header).collect()),
            Some(headers) => {
                let row = (0..headers.len())
                    .map(|idx| normalize_cell(record.get(idx).unwrap_or("")))
                    .collect();
                rows.push(row);
            }
        }
    }
    Ok(CsvTable {
        path: path.to_path_buf(),
        headers: headers.unwrap_or_default(),
        rows,
    })
}

impl CsvTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    }

    /// Index of the first of `names` present, or `MissingColumn` naming the first.
    pub fn require_column(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|name| self.column(name))
            .ok_or_else(|| IngestError::MissingColumn {
                column: names.first().copied().unwrap_or_default().to_string(),
                path: self.path.clone(),
            })
    }

    pub fn value<'a>(&self, row: &'a [String], column: Option<usize>) -> &'a str {
        column
            .and_then(|idx| row.get(idx))
            .map_or("", String::as_str)
    }

    /// Deserializes every row by header name.
    pub fn deserialize_rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let header_record = StringRecord::from(self.headers.clone());
        self.rows
            .iter()
            .map(|row| {
                StringRecord::from(row.clone())
                    .deserialize(Some(&header_record))
                    .map_err(|source| IngestError::CsvParse {
                        path: self.path.clone(),
                        source,
                    })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
