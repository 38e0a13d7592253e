pub mod codelists;
pub mod csv_table;
pub mod dhis2;
pub mod error;
pub mod guidance;
pub mod inputs;
pub mod pdh;

pub use codelists::load_codelists;
pub use csv_table::{CsvTable, read_csv_table};
pub use dhis2::{load_category_option_combos, load_data_elements, load_indicators, read_export};
pub use error::{IngestError, Result};
pub use guidance::load_reference_indicators;
pub use inputs::{InputPaths, load_inputs};
pub use pdh::load_derived_rows;
