use msp_normalization::{normalize, normalize_concept_id, strip_version_suffix};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in ".*") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn concept_id_normalization_is_idempotent(raw in ".*") {
        let once = normalize_concept_id(&raw);
        prop_assert_eq!(normalize_concept_id(&once), once);
    }

    #[test]
    fn normalized_ids_never_contain_whitespace_or_invalid_characters(
        raw in "[ a-zA-Z0-9_+()/,-]{0,40}"
    ) {
        let id = normalize_concept_id(&raw);
        prop_assert!(!id.chars().any(char::is_whitespace));
        prop_assert!(!id.contains('-'));
        prop_assert!(!id.contains('+'));
        prop_assert!(!id.starts_with('_') && !id.ends_with('_'));
    }

    #[test]
    fn stripping_a_version_suffix_recovers_the_root(root in "[A-Z_]{1,12}", version in 0u8..10) {
        let code = format!("{root}_v{version}");
        let stripped = strip_version_suffix(&code);
        prop_assert_eq!(stripped, root.as_str());
    }
}
