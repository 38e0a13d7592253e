use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use msp_core::{BuildOutput, build_codelists, run_pipeline};
use msp_ingest::{load_codelists, load_inputs};
use msp_model::RunStats;
use msp_output::{OutputTarget, build_import_list, write_codelist_display, write_import_list};

use crate::config::Settings;

/// Output overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct OutputOverrides {
    pub path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
}

/// What a `build` run produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub stats: RunStats,
    pub files: Vec<PathBuf>,
    pub codelist_export: Option<PathBuf>,
}

fn build_metadata(settings: &Settings, base_dir: &Path) -> Result<BuildOutput> {
    let inputs = load_inputs(&settings.input_paths(base_dir)).context("load inputs")?;
    run_pipeline(&inputs, settings.processing_options()).context("build metadata")
}

/// Builds the metadata and writes the import list.
pub fn run_build(
    settings: &Settings,
    base_dir: &Path,
    overrides: &OutputOverrides,
) -> Result<BuildReport> {
    let start = Instant::now();
    let output = build_metadata(settings, base_dir)?;
    let list = build_import_list(&output).context("assemble import list")?;
    let mut stats = output.stats.clone();
    list.record_stats(&mut stats);

    let target = OutputTarget::new(
        overrides
            .path
            .clone()
            .unwrap_or_else(|| base_dir.join(&settings.output.path)),
        overrides.chunk_size.unwrap_or(settings.output.chunk_size),
    );
    let files = write_import_list(&target, &list.records)?;

    let codelist_export = match &settings.output.codelist_json {
        Some(path) => {
            let path = base_dir.join(path);
            write_codelist_display(&path, &output.codelists)?;
            Some(path)
        }
        None => None,
    };
    info!(
        records = list.len(),
        files = files.len(),
        duration_ms = start.elapsed().as_millis(),
        "build complete"
    );
    Ok(BuildReport {
        stats,
        files,
        codelist_export,
    })
}

/// Builds the metadata and import list without writing anything.
pub fn run_summary(settings: &Settings, base_dir: &Path) -> Result<RunStats> {
    let output = build_metadata(settings, base_dir)?;
    let list = build_import_list(&output).context("assemble import list")?;
    let mut stats = output.stats.clone();
    list.record_stats(&mut stats);
    Ok(stats)
}

/// Writes the codelist display export from the codelist spreadsheet alone.
pub fn run_codelists(
    settings: &Settings,
    base_dir: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let paths = settings.input_paths(base_dir);
    let source = paths
        .codelists
        .context("no codelist spreadsheet configured under [inputs]")?;
    let raws = load_codelists(&source)?;
    let mut stats = RunStats::default();
    let codelists = build_codelists(&raws, &mut stats).context("build codelists")?;
    let path = output
        .or_else(|| {
            settings
                .output
                .codelist_json
                .as_ref()
                .map(|path| base_dir.join(path))
        })
        .context("no codelist export path given")?;
    write_codelist_display(&path, &codelists)?;
    Ok(path)
}
