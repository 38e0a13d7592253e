use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use msp_model::RunStats;

pub fn print_summary(stats: &RunStats, files: &[PathBuf]) {
    for path in files {
        println!("Output: {}", path.display());
    }
    println!("{}", summary_table(stats));
}

/// Run statistics as a two-column table, grouped by section.
pub fn summary_table(stats: &RunStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Count")]);
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    let inputs = &stats.inputs;
    section(&mut table, "Inputs");
    row(&mut table, "Reference indicator rows", inputs.reference_indicators);
    row(&mut table, "Data elements", inputs.data_elements);
    row(&mut table, "Category option combos", inputs.category_option_combos);
    row(&mut table, "Indicators", inputs.indicators);
    row(&mut table, "PDH derivation rows", inputs.derived_rows);
    row(&mut table, "Codelist rows", inputs.codelists);
    warn_row(&mut table, "Codelist rows skipped", inputs.skipped_codelist_rows);

    section(&mut table, "Entities");
    for (kind, count) in &stats.entities {
        row(&mut table, kind, *count);
    }
    row(&mut table, "Reference indicator codes", stats.indicator_codes);
    row(&mut table, "Matched elements", stats.matched_elements);
    warn_row(&mut table, "Unmatched elements", stats.unmatched_elements);
    warn_row(
        &mut table,
        "Codes without children",
        stats.codes_without_children.len(),
    );
    warn_row(&mut table, "Elements without periods", stats.elements_without_periods);
    warn_row(&mut table, "Indicators without periods", stats.indicators_without_periods);
    warn_row(
        &mut table,
        "Unresolved derivation sources",
        stats.unresolved_derivation_sources,
    );
    warn_row(&mut table, "Derivation rows skipped", stats.skipped_derived_rows);
    warn_row(&mut table, "UID overlaps", stats.uid_overlaps);

    section(&mut table, "Relationships");
    for (class, count) in &stats.edges {
        row(&mut table, class, *count);
    }

    section(&mut table, "Reference batches");
    for (collection, count) in &stats.batches {
        row(&mut table, collection, *count);
    }

    section(&mut table, "Import list");
    row(&mut table, "Records before dedup", stats.records_before_dedup);
    row(&mut table, "Records written", stats.records_after_dedup);
    row(&mut table, "Duplicates removed", stats.duplicates_removed());
    warn_row(&mut table, "Mappings skipped", stats.skipped_mappings);
    warn_row(&mut table, "References dropped", stats.dropped_references);
    table
}

fn section(table: &mut Table, label: &str) {
    table.add_row(vec![
        Cell::new(label)
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
}

fn row(table: &mut Table, label: &str, count: usize) {
    table.add_row(vec![Cell::new(format!("  {label}")), count_cell(count)]);
}

fn warn_row(table: &mut Table, label: &str, count: usize) {
    let cell = if count > 0 {
        Cell::new(count)
            .fg(Color::Yellow)
            .add_attribute(Attribute::Bold)
    } else {
        count_cell(count)
    };
    table.add_row(vec![Cell::new(format!("  {label}")), cell]);
}

fn count_cell(count: usize) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_sections_and_counts() {
        let mut stats = RunStats::default();
        stats.inputs.data_elements = 12;
        stats.batches.insert("DATIM-FY19".to_string(), 3);
        let rendered = summary_table(&stats).to_string();
        assert!(rendered.contains("Inputs"));
        assert!(rendered.contains("Data elements"));
        assert!(rendered.contains("DATIM-FY19"));
        assert!(rendered.contains("12"));
    }
}
