//! Serialized shape of import records.

use msp_model::{
    ConceptRecord, Entity, EntityDetail, ImportRecord, LocalizedName, SourceRef,
    SourceDataElement, Sign,
};

fn source() -> SourceRef {
    SourceRef::new("PEPFAR", "MER")
}

#[test]
fn disaggregate_concept_shape() {
    let mut entity = Entity::new(&source(), "coc1234567", EntityDetail::CategoryOptionCombo);
    entity.names.push(LocalizedName::fully_specified("15+"));

    let record = ImportRecord::Concept(ConceptRecord::from_entity(&entity).expect("record"));
    let value = record.to_value().expect("serialize");
    insta::assert_json_snapshot!(value, @r#"
    {
      "concept_class": "Disaggregate",
      "datatype": "None",
      "id": "coc1234567",
      "names": [
        {
          "locale": "en",
          "locale_preferred": true,
          "name": "15+",
          "name_type": "Fully Specified"
        }
      ],
      "owner": "PEPFAR",
      "owner_type": "Organization",
      "source": "MER",
      "type": "Concept"
    }
    "#);
}

#[test]
fn derived_concept_carries_source_rows_in_extras() {
    let row = SourceDataElement {
        source_data_element_uid: "src0000001".to_string(),
        source_data_element_name: "HTS_TST (N, DSD)".to_string(),
        source_disaggregate: "Age/Sex".to_string(),
        source_category_option_combo_uid: "coc1234567".to_string(),
        source_category_option_combo_name: "15+".to_string(),
        derived_category_option_combo: "coc7654321".to_string(),
        derived_category_option_combo_name: "15+, Positive".to_string(),
        add_or_subtract: Sign::Subtract,
        rule_id: "r1".to_string(),
        run_sequence: 1,
    };
    let entity = Entity::new(
        &source(),
        "dde0000001",
        EntityDetail::DerivedDataElement {
            sources: vec![row],
            disaggregates: Vec::new(),
        },
    );

    let record = ConceptRecord::from_entity(&entity).expect("record");
    let sources = &record.extras["source_data_elements"];
    assert_eq!(sources[0]["source_data_element_uid"], "src0000001");
    assert_eq!(sources[0]["add_or_subtract"], "-");
    assert_eq!(record.concept_class, "Derived Data Element");
    assert_eq!(record.datatype, "Numeric");
}
