//! Shared state handed to every builder.
//!
//! Bundles the owning repository, the processing options and the indicator
//! matcher so builders stay pure functions of their raw record plus context.

use msp_map::IndicatorMatcher;
use msp_model::{ProcessingOptions, SourceRef};

#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Organization and source every concept URL is derived from.
    pub source: SourceRef,
    pub options: ProcessingOptions,
    /// Empty until reference indicators are built.
    pub matcher: IndicatorMatcher,
}

impl PipelineContext {
    pub fn new(options: ProcessingOptions) -> Self {
        Self {
            source: SourceRef::new(&options.repository.org_id, &options.repository.source_id),
            options,
            matcher: IndicatorMatcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: IndicatorMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn input_periods(&self) -> &[String] {
        &self.options.input_periods
    }

    pub fn output_periods(&self) -> &[String] {
        &self.options.output_periods
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new(ProcessingOptions::default())
    }
}
