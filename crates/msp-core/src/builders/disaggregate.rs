use msp_model::{Entity, EntityDetail, EntityMap, LocalizedName, RawCategoryOptionCombo, SourceRef};

pub fn build_category_option_combo(raw: &RawCategoryOptionCombo, source: &SourceRef) -> Entity {
    let mut entity = Entity::new(source, raw.id.trim(), EntityDetail::CategoryOptionCombo);
    entity.external_id = Some(raw.id.trim().to_string());
    let name = if raw.name.trim().is_empty() {
        raw.id.trim()
    } else {
        raw.name.trim()
    };
    entity.names.push(LocalizedName::fully_specified(name));
    entity
}

/// Builds disaggregates keyed by URL. A repeated id keeps its first record.
pub fn build_category_option_combos(
    raws: &[RawCategoryOptionCombo],
    source: &SourceRef,
) -> EntityMap {
    let mut combos = EntityMap::new();
    for raw in raws.iter().filter(|raw| !raw.id.trim().is_empty()) {
        let entity = build_category_option_combo(raw, source);
        combos.entry(entity.url.clone()).or_insert(entity);
    }
    combos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_of_an_id_wins() {
        let source = SourceRef::new("PEPFAR", "MER");
        let combos = build_category_option_combos(
            &[
                RawCategoryOptionCombo {
                    id: "coc1234567".to_string(),
                    name: "15+".to_string(),
                },
                RawCategoryOptionCombo {
                    id: "coc1234567".to_string(),
                    name: "Other".to_string(),
                },
                RawCategoryOptionCombo::default(),
            ],
            &source,
        );
        assert_eq!(combos.len(), 1);
        let entity = &combos["/orgs/PEPFAR/sources/MER/concepts/coc1234567/"];
        assert_eq!(entity.display_name(), "15+");
    }
}
