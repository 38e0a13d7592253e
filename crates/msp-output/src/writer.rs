//! JSON-lines output of the import list.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Placeholder replaced by the 1-based chunk number in chunked output paths.
pub const CHUNK_PLACEHOLDER: &str = "{chunk}";

/// Where and how the import list is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    /// Records per file; 0 writes a single file.
    pub chunk_size: usize,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size,
        }
    }

    /// True when the path has a `{chunk}` placeholder and a chunk size is set.
    pub fn is_chunked(&self) -> bool {
        self.chunk_size > 0 && self.path.to_string_lossy().contains(CHUNK_PLACEHOLDER)
    }

    pub fn chunk_path(&self, chunk: usize) -> PathBuf {
        let path = self.path.to_string_lossy();
        PathBuf::from(path.replace(CHUNK_PLACEHOLDER, &chunk.to_string()))
    }

    /// Path used when the output is not chunked.
    pub fn single_path(&self) -> PathBuf {
        if self.path.to_string_lossy().contains(CHUNK_PLACEHOLDER) {
            self.chunk_path(1)
        } else {
            self.path.clone()
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Writes one JSON object per line.
pub fn write_json_lines<W: Write>(writer: &mut W, records: &[Value]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *writer, record).context("serialize import record")?;
        writer.write_all(b"\n").context("write import record")?;
    }
    Ok(())
}

fn write_file(path: &Path, records: &[Value]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_json_lines(&mut writer, records)?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "import file written");
    Ok(())
}

/// Writes the import list and returns the files created, in chunk order.
pub fn write_import_list(target: &OutputTarget, records: &[Value]) -> Result<Vec<PathBuf>> {
    let paths = if target.is_chunked() {
        let mut paths = Vec::new();
        for (index, chunk) in records.chunks(target.chunk_size).enumerate() {
            let path = target.chunk_path(index + 1);
            write_file(&path, chunk)?;
            paths.push(path);
        }
        if paths.is_empty() {
            let path = target.chunk_path(1);
            write_file(&path, &[])?;
            paths.push(path);
        }
        paths
    } else {
        let path = target.single_path();
        write_file(&path, records)?;
        vec![path]
    };
    info!(files = paths.len(), records = records.len(), "import list written");
    Ok(paths)
}
