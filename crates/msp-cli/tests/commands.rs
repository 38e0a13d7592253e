//! Tests for the build, summary and codelists commands over files on disk.

use std::fs;
use std::path::Path;

use msp_cli::commands::{OutputOverrides, run_build, run_codelists, run_summary};
use msp_cli::config::Settings;

const SETTINGS: &str = r#"
[periods]
input = ["FY18", "FY19"]

[inputs]
reference_indicators = ["guidance.csv"]
data_elements = "data_elements.json"
category_option_combos = "combos.json"
codelists = "codelists.csv"

[output]
path = "out/import.json"
chunk_size = 0
codelist_json = "out/codelists.json"
"#;

fn write_inputs(dir: &Path) {
    fs::write(
        dir.join("guidance.csv"),
        "id,name,attr:Period\nTX_CURR,Currently on treatment,FY19\n",
    )
    .expect("write guidance");
    fs::write(
        dir.join("data_elements.json"),
        r#"{"dataElements": [{
            "id": "abc123de11",
            "code": "TX_CURR_N_DSD_Age_Sex",
            "name": "TX_CURR (N, DSD, Age/Sex)",
            "categoryCombo": {"categoryOptionCombos": [{"id": "coc1234567", "name": "15+"}]},
            "dataSetElements": [{"dataSet": {"id": "ds19", "name": "MER Results FY19"}}]
        }]}"#,
    )
    .expect("write data elements");
    fs::write(
        dir.join("combos.json"),
        r#"{"categoryOptionCombos": [{"id": "coc1234567", "name": "15+"}]}"#,
    )
    .expect("write combos");
    fs::write(
        dir.join("codelists.csv"),
        "resource_type,id,external_id,name,full_name,description,attr:Applicable Periods\n\
         Collection,MER Results FY19,ds19,MER Results FY19,MER Results FY19,,FY19\n",
    )
    .expect("write codelists");
}

fn settings() -> Settings {
    Settings::parse(SETTINGS).expect("parse settings")
}

#[test]
fn build_writes_import_list_and_codelist_export() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());

    let report =
        run_build(&settings(), dir.path(), &OutputOverrides::default()).expect("run build");
    assert_eq!(report.files, vec![dir.path().join("out/import.json")]);
    let contents = fs::read_to_string(&report.files[0]).expect("read import list");
    assert_eq!(contents.lines().count(), report.stats.records_after_dedup);
    assert!(contents.contains("\"type\":\"Organization\""));
    assert!(contents.contains("MER-Results-FY19"));

    let export = report.codelist_export.expect("codelist export");
    let codelists: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(export).expect("read export")).expect("json");
    assert_eq!(codelists[0]["periods"][0], "FY19");

    assert_eq!(report.stats.inputs.data_elements, 1);
    assert_eq!(report.stats.matched_elements, 1);
    assert_eq!(report.stats.skipped_mappings, 0);
}

#[test]
fn output_override_enables_chunking() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());
    let overrides = OutputOverrides {
        path: Some(dir.path().join("chunks/import-{chunk}.json")),
        chunk_size: Some(10),
    };
    let report = run_build(&settings(), dir.path(), &overrides).expect("run build");
    assert!(report.files.len() > 1);
    assert_eq!(report.files[0], dir.path().join("chunks/import-1.json"));
}

#[test]
fn summary_counts_without_writing() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());
    let stats = run_summary(&settings(), dir.path()).expect("run summary");
    assert!(stats.records_after_dedup > 0);
    assert!(!dir.path().join("out/import.json").exists());
}

#[test]
fn missing_input_file_fails_the_build() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = run_build(&settings(), dir.path(), &OutputOverrides::default()).unwrap_err();
    assert!(format!("{err:#}").contains("guidance.csv"));
}

#[test]
fn codelists_command_writes_display_export() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_inputs(dir.path());
    let path = run_codelists(&settings(), dir.path(), None).expect("run codelists");
    assert_eq!(path, dir.path().join("out/codelists.json"));
}
