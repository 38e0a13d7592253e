//! Import list generation for MER metadata.
//!
//! - **Assembly**: dependency-ordered import records for one build
//! - **Deduplication**: first-occurrence, order-preserving
//! - **JSON lines**: single or chunked output files
//! - **Codelist export**: display JSON for codelist filters

mod assembler;
mod codelist_export;
pub mod dedup;
pub mod repositories;
mod writer;

pub use assembler::{ImportList, build_import_list};
pub use codelist_export::{codelist_display, write_codelist_display};
pub use dedup::{Deduplicator, dedup_records, fingerprint};
pub use writer::{CHUNK_PLACEHOLDER, OutputTarget, write_import_list, write_json_lines};
