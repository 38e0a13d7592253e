//! Reporting periods and period-scoped batch keys.
//!
//! Periods are fiscal-year labels such as `FY19`. Labels of the same family
//! sort chronologically as strings, which is what range checks rely on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of a period-scoped group of reference batches.
///
/// `All` sorts after every concrete period and renders as `*`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodKey {
    Period(String),
    All,
}

impl PeriodKey {
    pub fn period(&self) -> Option<&str> {
        match self {
            Self::Period(period) => Some(period),
            Self::All => None,
        }
    }

    /// Collection receiving batches for this key.
    ///
    /// Concrete periods go to `{collection}-{period}`; `All` goes to the base
    /// collection itself.
    pub fn collection_id(&self, base_collection: &str) -> String {
        match self {
            Self::Period(period) => period_collection_id(base_collection, period),
            Self::All => base_collection.to_string(),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Period(period) => f.write_str(period),
            Self::All => f.write_str("*"),
        }
    }
}

pub fn period_collection_id(base_collection: &str, period: &str) -> String {
    format!("{base_collection}-{period}")
}

/// Splits a comma-separated period list (`"FY18, FY19"`), dropping blanks.
pub fn parse_period_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|period| !period.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns true when `period` falls inside `[begin, end]`. Empty bounds are open.
pub fn period_in_range(period: &str, begin: &str, end: &str) -> bool {
    let begin = begin.trim();
    let end = end.trim();
    (begin.is_empty() || period >= begin) && (end.is_empty() || period <= end)
}
