use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use msp_model::{CodelistDisplay, CodelistIndex};

/// Codelists in input order, shaped for display filters.
pub fn codelist_display(codelists: &CodelistIndex) -> Vec<CodelistDisplay> {
    codelists.iter().map(CodelistDisplay::from).collect()
}

/// Writes the display codelists as one pretty-printed JSON array.
pub fn write_codelist_display(path: &Path, codelists: &CodelistIndex) -> Result<()> {
    let entries = codelist_display(codelists);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &entries)
        .with_context(|| format!("write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    info!(path = %path.display(), codelists = entries.len(), "codelist export written");
    Ok(())
}
