//! Indicator matcher.
//!
//! Canonical codes are tried from longest to shortest and the first code
//! that qualifies wins. A code qualifies when it matches lexically and,
//! if the candidate carries periods, has a reference indicator defined in
//! at least one of them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use msp_model::{Entity, EntityDetail};

/// `(code, period)` pairs for which a reference indicator exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndicatorIndex {
    pairs: BTreeSet<(String, String)>,
}

impl ReferenceIndicatorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes reference indicator entities by id and period.
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut index = Self::new();
        for entity in entities {
            if let EntityDetail::ReferenceIndicator { period } = &entity.detail {
                index.insert(&entity.id, period);
            }
        }
        index
    }

    pub fn insert(&mut self, code: &str, period: &str) {
        self.pairs.insert((code.to_string(), period.to_string()));
    }

    pub fn contains(&self, code: &str, period: &str) -> bool {
        self.pairs
            .contains(&(code.to_string(), period.to_string()))
    }

    /// Distinct codes, in lexical order.
    pub fn codes(&self) -> BTreeSet<&str> {
        self.pairs.iter().map(|(code, _)| code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Orders codes longest first; equal lengths fall back to lexical order.
fn longest_first(a: &String, b: &String) -> Ordering {
    b.len().cmp(&a.len()).then_with(|| a.cmp(b))
}

/// Deduplicates and sorts codes longest first.
pub fn sorted_unique_codes<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let unique: BTreeSet<String> = codes
        .into_iter()
        .map(Into::into)
        .filter(|code| !code.is_empty())
        .collect();
    let mut sorted: Vec<String> = unique.into_iter().collect();
    sorted.sort_by(longest_first);
    sorted
}

/// Lexical rule: prefix of the code, prefix of the name, or a space-delimited word of the name.
pub fn matches_code(indicator_code: &str, name: &str, code: Option<&str>) -> bool {
    if code.is_some_and(|code| code.starts_with(indicator_code)) {
        return true;
    }
    if name.starts_with(indicator_code) {
        return true;
    }
    name.contains(&format!(" {indicator_code} "))
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorMatcher {
    codes: Vec<String>,
    index: ReferenceIndicatorIndex,
}

impl IndicatorMatcher {
    pub fn new(codes: Vec<String>, index: ReferenceIndicatorIndex) -> Self {
        Self {
            codes: sorted_unique_codes(codes),
            index,
        }
    }

    /// Builds the matcher from reference indicator entities.
    pub fn from_reference_indicators(entities: &[Entity]) -> Self {
        let index = ReferenceIndicatorIndex::from_entities(entities);
        let codes: Vec<String> = index.codes().into_iter().map(str::to_string).collect();
        tracing::debug!(codes = codes.len(), pairs = index.len(), "indicator matcher built");
        Self::new(codes, index)
    }

    /// Canonical codes, longest first.
    pub fn sorted_codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.iter().any(|candidate| candidate == code)
    }

    pub fn index(&self) -> &ReferenceIndicatorIndex {
        &self.index
    }

    /// Finds the reference indicator a resource belongs to.
    ///
    /// With `periods` empty only the lexical rule applies.
    pub fn match_indicator(
        &self,
        name: &str,
        code: Option<&str>,
        periods: &[String],
    ) -> Option<&str> {
        let code = code.filter(|code| !code.is_empty());
        self.codes
            .iter()
            .filter(|indicator_code| matches_code(indicator_code, name, code))
            .find(|indicator_code| {
                periods.is_empty() || self.defined_in_any(indicator_code, periods)
            })
            .map(String::as_str)
    }

    /// Most recent period first.
    fn defined_in_any(&self, indicator_code: &str, periods: &[String]) -> bool {
        let mut newest_first: Vec<&String> = periods.iter().collect();
        newest_first.sort_by(|a, b| b.cmp(a));
        newest_first
            .into_iter()
            .any(|period| self.index.contains(indicator_code, period))
    }
}
