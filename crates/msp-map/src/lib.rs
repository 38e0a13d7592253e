//! Reference indicator matching.

pub mod matcher;

pub use matcher::{IndicatorMatcher, ReferenceIndicatorIndex, matches_code, sorted_unique_codes};
