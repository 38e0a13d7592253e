use msp_map::{IndicatorMatcher, ReferenceIndicatorIndex};

fn periods(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn matcher(pairs: &[(&str, &str)]) -> IndicatorMatcher {
    let mut index = ReferenceIndicatorIndex::new();
    for (code, period) in pairs {
        index.insert(code, period);
    }
    let codes = pairs.iter().map(|(code, _)| code.to_string()).collect();
    IndicatorMatcher::new(codes, index)
}

#[test]
fn longest_code_wins() {
    let matcher = matcher(&[("TX", "FY19"), ("TX_CURR", "FY19")]);
    assert_eq!(matcher.sorted_codes(), ["TX_CURR", "TX"]);
    assert_eq!(
        matcher.match_indicator("", Some("TX_CURR_N_DSD_Age_Sex"), &[]),
        Some("TX_CURR")
    );
}

#[test]
fn name_prefix_and_word_rules_match_without_code() {
    let matcher = matcher(&[("HTS_TST", "FY19"), ("PMTCT_STAT", "FY19")]);
    assert_eq!(
        matcher.match_indicator("HTS_TST (N, DSD): HTS received results", None, &[]),
        Some("HTS_TST")
    );
    assert_eq!(
        matcher.match_indicator("Percent PMTCT_STAT_POS coverage", None, &[]),
        None
    );
    assert_eq!(
        matcher.match_indicator("Percent of PMTCT_STAT clients", None, &[]),
        Some("PMTCT_STAT")
    );
}

#[test]
fn period_must_have_a_reference_indicator() {
    let matcher = matcher(&[("TX_CURR", "FY18")]);
    assert_eq!(
        matcher.match_indicator("", Some("TX_CURR_N_DSD"), &periods(&["FY19", "FY18"])),
        Some("TX_CURR")
    );
    assert_eq!(
        matcher.match_indicator("", Some("TX_CURR_N_DSD"), &periods(&["FY19"])),
        None
    );
}

#[test]
fn out_of_period_code_falls_back_to_shorter_code_in_period() {
    let matcher = matcher(&[("TX", "FY19"), ("TX_CURR", "FY18")]);
    assert_eq!(
        matcher.match_indicator("", Some("TX_CURR_N_DSD"), &periods(&["FY19"])),
        Some("TX")
    );
    assert_eq!(
        matcher.match_indicator("", Some("TX_CURR_N_DSD"), &periods(&["FY18"])),
        Some("TX_CURR")
    );
    assert_eq!(
        matcher.match_indicator("", Some("TX_CURR_N_DSD"), &periods(&["FY17"])),
        None
    );
}

#[test]
fn empty_code_list_never_matches() {
    let matcher = IndicatorMatcher::new(Vec::new(), ReferenceIndicatorIndex::new());
    assert_eq!(matcher.match_indicator("TX_CURR", Some("TX_CURR"), &[]), None);
}
