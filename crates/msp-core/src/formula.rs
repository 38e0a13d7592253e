//! Indicator formula rendering.
//!
//! Formulas reference data values as `#{element}`, `#{element.disaggregate}`
//! or `#{element.disaggregate.mechanism}`. Rendering swaps every id for the
//! best label known for it and spaces out the arithmetic operators; parsing
//! returns the same references as [`FormulaTerm`]s.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use msp_model::{EntityMap, FormulaTerm, SourceRef};

static FORMULA_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\{([A-Za-z0-9]+)(?:\.([A-Za-z0-9]+))?(?:\.([A-Za-z0-9]+))?\}")
        .expect("Invalid formula token regex")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

const OPERATORS: [char; 4] = ['+', '-', '*', '/'];

/// Resolves an id found in a formula to a display label.
pub trait LabelLookup {
    fn label(&self, id: &str) -> Option<&str>;
}

impl LabelLookup for BTreeMap<String, String> {
    fn label(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

/// Looks ids up as concepts of one source across several entity maps.
///
/// The label is the entity's short code, then short name, then full name.
#[derive(Debug, Clone)]
pub struct EntityLabels<'a> {
    source: &'a SourceRef,
    maps: Vec<&'a EntityMap>,
}

impl<'a> EntityLabels<'a> {
    pub fn new(source: &'a SourceRef, maps: Vec<&'a EntityMap>) -> Self {
        Self { source, maps }
    }
}

impl LabelLookup for EntityLabels<'_> {
    fn label(&self, id: &str) -> Option<&str> {
        let url = self.source.concept_url(id);
        self.maps
            .iter()
            .find_map(|map| map.get(&url))
            .map(msp_model::Entity::display_label)
    }
}

fn token_ids<'t>(captures: &Captures<'t>) -> impl Iterator<Item = &'t str> {
    (1..=3).filter_map(move |index| captures.get(index).map(|m| m.as_str()))
}

fn space_operators(gap: &str) -> String {
    let mut spaced = String::with_capacity(gap.len() + 4);
    for ch in gap.chars() {
        if OPERATORS.contains(&ch) {
            spaced.push(' ');
            spaced.push(ch);
            spaced.push(' ');
        } else {
            spaced.push(ch);
        }
    }
    WHITESPACE_RUN.replace_all(&spaced, " ").into_owned()
}

/// Renders a formula with labels in place of ids.
///
/// A resolved id becomes `[label]`; an unresolved one stays as is. Parts of
/// one reference are joined with `.` and wrapped in braces.
pub fn render_formula(formula: &str, labels: &impl LabelLookup) -> String {
    let mut rendered = String::with_capacity(formula.len());
    let mut last = 0;
    for captures in FORMULA_TOKEN.captures_iter(formula) {
        let Some(token) = captures.get(0) else {
            continue;
        };
        rendered.push_str(&space_operators(&formula[last..token.start()]));
        let parts: Vec<String> = token_ids(&captures)
            .map(|id| match labels.label(id) {
                Some(label) => format!("[{label}]"),
                None => id.to_string(),
            })
            .collect();
        rendered.push('{');
        rendered.push_str(&parts.join("."));
        rendered.push('}');
        last = token.end();
    }
    rendered.push_str(&space_operators(&formula[last..]));
    rendered.trim().to_string()
}

/// Parses the references of a formula, in formula order.
pub fn parse_formula(formula: &str, labels: &impl LabelLookup) -> Vec<FormulaTerm> {
    FORMULA_TOKEN
        .captures_iter(formula)
        .filter_map(|captures| {
            let mut ids = token_ids(&captures);
            let data_element_id = ids.next()?.to_string();
            let disaggregate_id = ids.next().map(str::to_string);
            let mechanism_id = ids.next().map(str::to_string);
            Some(FormulaTerm {
                data_element_name: labels.label(&data_element_id).map(str::to_string),
                disaggregate_name: disaggregate_id
                    .as_deref()
                    .and_then(|id| labels.label(id))
                    .map(str::to_string),
                data_element_id,
                disaggregate_id,
                mechanism_id,
            })
        })
        .collect()
}

/// Data element ids referenced by a formula, first occurrence order.
pub fn referenced_data_elements(formula: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for captures in FORMULA_TOKEN.captures_iter(formula) {
        if let Some(id) = captures.get(1).map(|m| m.as_str())
            && !ids.iter().any(|existing| existing == id)
        {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("de1234567ab".to_string(), "TX_NEW".to_string()),
            ("coc7654321cd".to_string(), "Female".to_string()),
        ])
    }

    #[test]
    fn renders_labels_and_spaces_operators() {
        let rendered = render_formula("#{de1234567ab.coc7654321cd}+#{de9999999zz}", &labels());
        assert_eq!(rendered, "{[TX_NEW].[Female]} + {de9999999zz}");
    }

    #[test]
    fn collapses_existing_spacing_around_operators() {
        let rendered = render_formula("(#{de1234567ab}  -#{de1234567ab})/ 2", &labels());
        assert_eq!(rendered, "({[TX_NEW]} - {[TX_NEW]}) / 2");
    }

    #[test]
    fn parses_terms_with_optional_parts() {
        let terms = parse_formula(
            "#{de1234567ab.coc7654321cd}+#{de9999999zz.cocAAAAAAAA.mech0000001}",
            &labels(),
        );
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].data_element_name.as_deref(), Some("TX_NEW"));
        assert_eq!(terms[0].disaggregate_name.as_deref(), Some("Female"));
        assert!(terms[0].mechanism_id.is_none());
        assert_eq!(terms[1].data_element_name, None);
        assert_eq!(terms[1].disaggregate_id.as_deref(), Some("cocAAAAAAAA"));
        assert_eq!(terms[1].mechanism_id.as_deref(), Some("mech0000001"));
    }

    #[test]
    fn constant_formula_has_no_references() {
        assert!(parse_formula("1", &labels()).is_empty());
        assert_eq!(render_formula("1", &labels()), "1");
        assert!(referenced_data_elements("1").is_empty());
    }

    #[test]
    fn referenced_elements_are_unique() {
        assert_eq!(
            referenced_data_elements("#{a1.b1}+#{a1.b2}-#{c1}"),
            vec!["a1", "c1"]
        );
    }
}
