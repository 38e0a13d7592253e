//! PDH derived data elements.
//!
//! A derived element arrives as many rows, one per source element and
//! disaggregate. Rows for the same UID accumulate onto one entity: the
//! first row fixes names and attributes, later rows only append source
//! terms, disaggregates and periods.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use msp_model::entity::{keys, source_system};
use msp_model::period::period_in_range;
use msp_model::{
    Entity, EntityDetail, EntityMap, LocalizedName, RawDerivedDataElementRow, Result, RunStats,
    Sign, SourceDataElement, SourceRef,
};
use msp_normalization::normalize_concept_id;

use super::{resolve_disaggregate, result_or_target, set_version_extras};

/// Input periods covered by a row's rule validity window.
pub fn derived_periods(row: &RawDerivedDataElementRow, input_periods: &[String]) -> Vec<String> {
    input_periods
        .iter()
        .filter(|period| period_in_range(period, &row.rule_begin_period, &row.rule_end_period))
        .cloned()
        .collect()
}

fn source_term(row: &RawDerivedDataElementRow) -> SourceDataElement {
    let sign = Sign::parse(&row.add_or_subtract).unwrap_or_else(|| {
        tracing::debug!(
            rule_id = %row.rule_id,
            value = %row.add_or_subtract,
            "unrecognized derivation sign, treating as add"
        );
        Sign::Add
    });
    SourceDataElement {
        source_data_element_uid: row.source_data_element_uid.trim().to_string(),
        source_data_element_name: row.source_data_element_name.trim().to_string(),
        source_disaggregate: row.source_disaggregate.trim().to_string(),
        source_category_option_combo_uid: row.source_category_option_combo_uid.trim().to_string(),
        source_category_option_combo_name: row
            .source_category_option_combo_name
            .trim()
            .to_string(),
        derived_category_option_combo: row.derived_category_option_combo.trim().to_string(),
        derived_category_option_combo_name: row
            .derived_category_option_combo_name
            .trim()
            .to_string(),
        add_or_subtract: sign,
        rule_id: row.rule_id.trim().to_string(),
        run_sequence: row.run_sequence().unwrap_or(0),
    }
}

/// Accumulates derivation rows into derived data elements.
#[derive(Debug)]
pub struct DerivedDataElementBuilder<'a> {
    source: &'a SourceRef,
    input_periods: &'a [String],
    disaggregates: &'a EntityMap,
    elements: EntityMap,
    periods: BTreeMap<String, BTreeSet<String>>,
}

impl<'a> DerivedDataElementBuilder<'a> {
    pub fn new(
        source: &'a SourceRef,
        input_periods: &'a [String],
        disaggregates: &'a EntityMap,
    ) -> Self {
        Self {
            source,
            input_periods,
            disaggregates,
            elements: EntityMap::new(),
            periods: BTreeMap::new(),
        }
    }

    /// Adds one row. Returns false for rows without a derived element UID.
    pub fn add_row(&mut self, row: &RawDerivedDataElementRow) -> Result<bool> {
        let uid = row.derived_data_element_uid.trim();
        if uid.is_empty() {
            return Ok(false);
        }
        let url = self.source.concept_url(uid);

        let derived_combo = row.derived_category_option_combo.trim();
        let combo_url = if derived_combo.is_empty() {
            None
        } else {
            Some(resolve_disaggregate(
                self.source,
                &url,
                derived_combo,
                self.disaggregates,
            )?)
        };

        let entity = self
            .elements
            .entry(url.clone())
            .or_insert_with(|| new_derived_element(self.source, uid, row));
        if let EntityDetail::DerivedDataElement {
            sources,
            disaggregates,
        } = &mut entity.detail
        {
            let term = source_term(row);
            if !sources.contains(&term) {
                sources.push(term);
            }
            if let Some(combo_url) = combo_url
                && !disaggregates.contains(&combo_url)
            {
                disaggregates.push(combo_url);
            }
        }

        self.periods
            .entry(url)
            .or_default()
            .extend(derived_periods(row, self.input_periods));
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Finalizes period attributes. Elements whose rules cover no input period get none.
    pub fn finish(self) -> EntityMap {
        let Self {
            mut elements,
            periods,
            ..
        } = self;
        for (url, periods) in periods {
            if periods.is_empty() {
                continue;
            }
            if let Some(entity) = elements.get_mut(&url) {
                let periods: Vec<Value> = periods.into_iter().map(Value::from).collect();
                entity.set_extra(keys::APPLICABLE_PERIODS, periods);
            }
        }
        elements
    }
}

fn new_derived_element(source: &SourceRef, uid: &str, row: &RawDerivedDataElementRow) -> Entity {
    let mut entity = Entity::new(
        source,
        uid,
        EntityDetail::DerivedDataElement {
            sources: Vec::new(),
            disaggregates: Vec::new(),
        },
    );
    entity.external_id = Some(uid.to_string());
    let name = row.derived_data_element_name.trim();
    let name = if name.is_empty() { uid } else { name };
    entity.names.push(LocalizedName::fully_specified(name));

    entity.set_extra(keys::SOURCE, source_system::PDH);
    let result_target = row.result_target.trim();
    let result_target = if result_target.is_empty() {
        result_or_target(name)
    } else {
        result_or_target(result_target)
    };
    entity.set_extra(keys::RESULT_TARGET, result_target);
    set_version_extras(&mut entity, &normalize_concept_id(name));
    entity
}

/// Builds derived elements, processing run sequences `1..=run_sequences` in order.
///
/// Rows outside those sequences are skipped and counted.
pub fn build_derived_data_elements(
    rows: &[RawDerivedDataElementRow],
    source: &SourceRef,
    input_periods: &[String],
    run_sequences: u32,
    disaggregates: &EntityMap,
    stats: &mut RunStats,
) -> Result<EntityMap> {
    let mut builder = DerivedDataElementBuilder::new(source, input_periods, disaggregates);
    for sequence in 1..=run_sequences {
        for row in rows.iter().filter(|row| row.run_sequence() == Some(sequence)) {
            if !builder.add_row(row)? {
                stats.skipped_derived_rows += 1;
            }
        }
    }
    let processed = rows
        .iter()
        .filter(|row| row.run_sequence().is_some_and(|seq| (1..=run_sequences).contains(&seq)))
        .count();
    stats.skipped_derived_rows += rows.len() - processed;
    tracing::debug!(
        rows = rows.len(),
        derived_elements = builder.len(),
        skipped = stats.skipped_derived_rows,
        "derived data elements accumulated"
    );
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use msp_model::RawCategoryOptionCombo;

    use super::*;
    use crate::builders::build_category_option_combos;

    fn source() -> SourceRef {
        SourceRef::new("PEPFAR", "MER")
    }

    fn periods() -> Vec<String> {
        ["FY16", "FY17", "FY18", "FY19", "FY20"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    fn combos() -> EntityMap {
        build_category_option_combos(
            &[
                RawCategoryOptionCombo {
                    id: "coc0000001".to_string(),
                    name: "Female".to_string(),
                },
                RawCategoryOptionCombo {
                    id: "coc0000002".to_string(),
                    name: "Male".to_string(),
                },
            ],
            &source(),
        )
    }

    fn row(
        source_uid: &str,
        combo: &str,
        begin: &str,
        end: &str,
        sequence: &str,
    ) -> RawDerivedDataElementRow {
        RawDerivedDataElementRow {
            derived_data_element_uid: "dde0000001".to_string(),
            derived_data_element_name: "HTS_TST (N, DSD, Age/Sex)".to_string(),
            derived_category_option_combo: combo.to_string(),
            source_data_element_uid: source_uid.to_string(),
            source_category_option_combo_uid: combo.to_string(),
            rule_begin_period: begin.to_string(),
            rule_end_period: end.to_string(),
            add_or_subtract: "add".to_string(),
            run_sequence: sequence.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn rows_accumulate_onto_one_entity() {
        let mut stats = RunStats::default();
        let elements = build_derived_data_elements(
            &[
                row("src0000001", "coc0000001", "FY18", "FY18", "1"),
                row("src0000001", "coc0000002", "FY19", "", "1"),
                row("src0000002", "coc0000001", "FY19", "FY19", "2"),
            ],
            &source(),
            &periods(),
            3,
            &combos(),
            &mut stats,
        )
        .expect("build");

        assert_eq!(elements.len(), 1);
        let entity = elements.values().next().expect("entity");
        let EntityDetail::DerivedDataElement {
            sources,
            disaggregates,
        } = &entity.detail
        else {
            panic!("expected derived element");
        };
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[2].run_sequence, 2);
        assert_eq!(disaggregates.len(), 2);
        assert_eq!(entity.periods(), vec!["FY18", "FY19", "FY20"]);
        assert_eq!(entity.extra_str(keys::SOURCE), Some("PDH"));
        assert_eq!(stats.skipped_derived_rows, 0);
    }

    #[test]
    fn rows_outside_run_sequences_are_skipped() {
        let mut stats = RunStats::default();
        let elements = build_derived_data_elements(
            &[
                row("src0000001", "coc0000001", "", "", "4"),
                row("src0000001", "coc0000001", "", "", ""),
            ],
            &source(),
            &periods(),
            3,
            &combos(),
            &mut stats,
        )
        .expect("build");
        assert!(elements.is_empty());
        assert_eq!(stats.skipped_derived_rows, 2);
    }

    #[test]
    fn unknown_derived_disaggregate_is_fatal() {
        let mut stats = RunStats::default();
        let result = build_derived_data_elements(
            &[row("src0000001", "cocUNKNOWN", "", "", "1")],
            &source(),
            &periods(),
            3,
            &combos(),
            &mut stats,
        );
        assert!(matches!(
            result,
            Err(msp_model::MspError::MissingDisaggregate { .. })
        ));
    }

    #[test]
    fn window_outside_inputs_leaves_no_period_attribute() {
        let source = source();
        let disaggregates = EntityMap::new();
        let mut builder = DerivedDataElementBuilder::new(&source, &[], &disaggregates);
        let mut bare = row("src0000001", "", "FY21", "FY22", "1");
        bare.derived_category_option_combo.clear();
        assert!(builder.add_row(&bare).expect("row"));
        let elements = builder.finish();
        assert!(!elements.values().next().expect("entity").has_period_attribute());
    }
}
