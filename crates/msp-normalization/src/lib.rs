//! Identifier normalization for concept and collection keys.

pub mod identifier;

pub use identifier::{
    extract_version_suffix, normalize, normalize_concept_id, normalize_with, strip_version_suffix,
    version_number,
};
