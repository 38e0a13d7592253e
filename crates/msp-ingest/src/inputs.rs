use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use msp_model::SourceInputs;

use crate::codelists::load_codelists;
use crate::dhis2::{load_category_option_combos, load_data_elements, load_indicators};
use crate::error::Result;
use crate::guidance::load_reference_indicators;
use crate::pdh::load_derived_rows;

/// Source files of one run. Absent files contribute no records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub reference_indicators: Vec<PathBuf>,
    pub data_elements: Option<PathBuf>,
    pub category_option_combos: Option<PathBuf>,
    pub indicators: Option<PathBuf>,
    pub codelists: Option<PathBuf>,
    pub pdh_derived: Option<PathBuf>,
}

impl InputPaths {
    /// Resolves relative paths against `base`.
    pub fn resolved(&self, base: &Path) -> Self {
        let resolve = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                base.join(path)
            }
        };
        let resolve_opt = |path: &Option<PathBuf>| path.as_ref().map(resolve);
        Self {
            reference_indicators: self.reference_indicators.iter().map(resolve).collect(),
            data_elements: resolve_opt(&self.data_elements),
            category_option_combos: resolve_opt(&self.category_option_combos),
            indicators: resolve_opt(&self.indicators),
            codelists: resolve_opt(&self.codelists),
            pdh_derived: resolve_opt(&self.pdh_derived),
        }
    }
}

fn load_optional<T>(
    path: Option<&PathBuf>,
    load: impl FnOnce(&Path) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    path.map_or_else(|| Ok(Vec::new()), |path| load(path.as_path()))
}

/// Loads every configured source file.
pub fn load_inputs(paths: &InputPaths) -> Result<SourceInputs> {
    info_span!("ingest").in_scope(|| {
        let start = Instant::now();
        let mut reference_indicators = Vec::new();
        for path in &paths.reference_indicators {
            reference_indicators.extend(load_reference_indicators(path)?);
        }
        let inputs = SourceInputs {
            reference_indicators,
            data_elements: load_optional(paths.data_elements.as_ref(), load_data_elements)?,
            category_option_combos: load_optional(
                paths.category_option_combos.as_ref(),
                load_category_option_combos,
            )?,
            indicators: load_optional(paths.indicators.as_ref(), load_indicators)?,
            derived_rows: load_optional(paths.pdh_derived.as_ref(), load_derived_rows)?,
            codelists: load_optional(paths.codelists.as_ref(), load_codelists)?,
        };
        info!(
            reference_indicators = inputs.reference_indicators.len(),
            data_elements = inputs.data_elements.len(),
            category_option_combos = inputs.category_option_combos.len(),
            indicators = inputs.indicators.len(),
            derived_rows = inputs.derived_rows.len(),
            codelists = inputs.codelists.len(),
            duration_ms = start.elapsed().as_millis(),
            "inputs loaded"
        );
        Ok(inputs)
    })
}
