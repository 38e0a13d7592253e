//! Canonical identifiers.
//!
//! Every character in [`INVALID_CHARS`] becomes whitespace, whitespace runs
//! collapse, the ends are trimmed, and the remaining single spaces become the
//! separator. The separator itself is an invalid character, so the rules are
//! idempotent.

use std::sync::LazyLock;

use regex::Regex;

/// Characters never allowed in a canonical identifier.
pub const INVALID_CHARS: &str = "`~!@#$%^&*()_+-=[]{}\\|;:\"',/<>?";

static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([vV][0-9])$").expect("Invalid version suffix regex"));

/// Normalizes `raw` using `separator` between words.
pub fn normalize_with(raw: &str, separator: char) -> String {
    let spaced: String = raw
        .chars()
        .map(|ch| if INVALID_CHARS.contains(ch) { ' ' } else { ch })
        .collect();
    let mut buf = [0u8; 4];
    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(separator.encode_utf8(&mut buf))
}

/// Collection and repository ids: words joined by `-`.
pub fn normalize(raw: &str) -> String {
    normalize_with(raw, '-')
}

/// Concept ids: `+` spelled out as `plus`, words joined by `_`.
///
/// `18+` becomes `18_plus`, so `18+` and `18` stay distinct.
pub fn normalize_concept_id(raw: &str) -> String {
    normalize_with(&raw.replace('+', " plus "), '_')
}

/// Trailing version tag of a code, e.g. `v2` for `HTS_TST_N_DSD_v2`.
pub fn extract_version_suffix(code: &str) -> Option<&str> {
    VERSION_SUFFIX
        .captures(code)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Code with any trailing `_v<digit>` removed.
pub fn strip_version_suffix(code: &str) -> &str {
    match VERSION_SUFFIX.find(code) {
        Some(m) => &code[..m.start()],
        None => code,
    }
}

/// Numeric version of a code; codes without a suffix are version 1.
pub fn version_number(code: &str) -> u32 {
    extract_version_suffix(code)
        .and_then(|suffix| suffix[1..].parse().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_invalid_characters_and_collapses_whitespace() {
        assert_eq!(normalize("  MER Results: Facility (FY19)  "), "MER-Results-Facility-FY19");
        assert_eq!(normalize("a__b--c"), "a-b-c");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn concept_ids_spell_out_plus() {
        assert_eq!(normalize_concept_id("TX_CURR 15+"), "TX_CURR_15_plus");
        assert_eq!(normalize_concept_id("PMTCT_STAT"), "PMTCT_STAT");
        assert_eq!(normalize_concept_id("+"), "plus");
    }

    #[test]
    fn version_suffix_handling() {
        assert_eq!(extract_version_suffix("HTS_TST_N_DSD_v2"), Some("v2"));
        assert_eq!(extract_version_suffix("HTS_TST_N_DSD_V3"), Some("V3"));
        assert_eq!(extract_version_suffix("HTS_TST_N_DSD_v12"), None);
        assert_eq!(extract_version_suffix("HTS_TST_N_DSD"), None);
        assert_eq!(strip_version_suffix("HTS_TST_N_DSD_v2"), "HTS_TST_N_DSD");
        assert_eq!(strip_version_suffix("HTS_TST_N_DSD"), "HTS_TST_N_DSD");
    }

    #[test]
    fn missing_version_counts_as_one() {
        assert_eq!(version_number("A"), 1);
        assert_eq!(version_number("A_v1"), 1);
        assert_eq!(version_number("A_v3"), 3);
    }
}
