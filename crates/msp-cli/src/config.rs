//! `msp.toml` settings.
//!
//! Every section is optional; missing keys take the defaults of the
//! library options they feed. Relative input paths are resolved against
//! the directory holding the settings file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use msp_ingest::InputPaths;
use msp_model::{EmitOptions, OverlapPolicy, ProcessingOptions, RepositoryOptions};

pub const DEFAULT_CONFIG_FILE: &str = "msp.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "msp_import.json";
pub const DEFAULT_CHUNK_SIZE: usize = 20_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub repository: RepositoryOptions,
    pub periods: PeriodSettings,
    pub inputs: InputSettings,
    pub output: OutputSettings,
    pub options: OptionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodSettings {
    /// Periods present in the inputs.
    pub input: Vec<String>,
    /// Periods emitted; the input periods when absent.
    pub output: Option<Vec<String>>,
}

impl Default for PeriodSettings {
    fn default() -> Self {
        Self {
            input: ProcessingOptions::default().input_periods,
            output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    #[serde(flatten)]
    pub paths: InputPaths,
    pub pdh_run_sequences: u32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            paths: InputPaths::default(),
            pdh_run_sequences: ProcessingOptions::default().pdh_run_sequences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// May contain a `{chunk}` placeholder.
    pub path: PathBuf,
    pub chunk_size: usize,
    pub codelist_json: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            chunk_size: DEFAULT_CHUNK_SIZE,
            codelist_json: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionSettings {
    #[serde(flatten)]
    pub emit: EmitOptions,
    pub explicit_mapping_ids: bool,
    pub emit_unscoped_concepts: bool,
    pub uid_overlap: OverlapPolicy,
}

impl Default for OptionSettings {
    fn default() -> Self {
        let defaults = ProcessingOptions::default();
        Self {
            emit: defaults.emit,
            explicit_mapping_ids: defaults.explicit_mapping_ids,
            emit_unscoped_concepts: defaults.emit_unscoped_concepts,
            uid_overlap: defaults.uid_overlap,
        }
    }
}

impl Settings {
    /// Reads a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parse settings {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn processing_options(&self) -> ProcessingOptions {
        let input_periods = self.periods.input.clone();
        let output_periods = self
            .periods
            .output
            .clone()
            .unwrap_or_else(|| input_periods.clone());
        ProcessingOptions {
            repository: self.repository.clone(),
            input_periods,
            output_periods,
            pdh_run_sequences: self.inputs.pdh_run_sequences,
            emit: self.options.emit.clone(),
            explicit_mapping_ids: self.options.explicit_mapping_ids,
            emit_unscoped_concepts: self.options.emit_unscoped_concepts,
            uid_overlap: self.options.uid_overlap,
        }
    }

    pub fn input_paths(&self, base_dir: &Path) -> InputPaths {
        self.inputs.paths.resolved(base_dir)
    }
}

/// Directory relative paths in a settings file are resolved against.
pub fn settings_base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_library_defaults() {
        let settings = Settings::parse("").expect("parse");
        assert_eq!(settings.processing_options(), ProcessingOptions::default());
        assert_eq!(settings.output.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn sections_override_defaults() {
        let settings = Settings::parse(
            r#"
            [repository]
            org_id = "TEST"

            [periods]
            input = ["FY18", "FY19"]
            output = ["FY19"]

            [inputs]
            reference_indicators = ["guidance/fy19.csv"]
            codelists = "codelists.csv"
            pdh_run_sequences = 2

            [output]
            path = "out/import-{chunk}.json"
            chunk_size = 500

            [options]
            disaggregates = false
            explicit_mapping_ids = true
            uid_overlap = "reject"

            [options.collections]
            DATIM = true
            PDH = false
            "#,
        )
        .expect("parse");
        let options = settings.processing_options();
        assert_eq!(options.repository.org_id, "TEST");
        assert_eq!(options.repository.source_id, "MER");
        assert_eq!(options.input_periods, vec!["FY18", "FY19"]);
        assert_eq!(options.output_periods, vec!["FY19"]);
        assert_eq!(options.pdh_run_sequences, 2);
        assert!(!options.emit.disaggregates);
        assert!(options.emit.datim_data_elements);
        assert!(options.emit.collection_enabled("DATIM"));
        assert!(!options.emit.collection_enabled("PDH"));
        assert!(!options.emit.collection_enabled("MER"));
        assert!(options.explicit_mapping_ids);
        assert_eq!(options.uid_overlap, OverlapPolicy::Reject);

        let paths = settings.input_paths(Path::new("/data"));
        assert_eq!(
            paths.reference_indicators,
            vec![PathBuf::from("/data/guidance/fy19.csv")]
        );
        assert_eq!(paths.codelists, Some(PathBuf::from("/data/codelists.csv")));
    }

    #[test]
    fn base_dir_of_bare_file_name_is_current_dir() {
        assert_eq!(settings_base_dir(Path::new("msp.toml")), PathBuf::from("."));
        assert_eq!(
            settings_base_dir(Path::new("/etc/msp/msp.toml")),
            PathBuf::from("/etc/msp")
        );
    }
}
