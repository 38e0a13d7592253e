pub mod codelist;
pub mod entity;
pub mod error;
pub mod ids;
pub mod options;
pub mod period;
pub mod records;
pub mod relationship;
pub mod source;
pub mod stats;

pub use codelist::{Codelist, CodelistDisplay, CodelistIndex};
pub use entity::{
    Description, Entity, EntityDetail, EntityKind, EntityMap, EntitySet, Extras, FormulaTerm,
    LocalizedName, NameType, NamedRef, PeriodAttribute, Sign, SourceDataElement,
};
pub use error::{MspError, Result};
pub use ids::{SourceRef, concept_id_from_url};
pub use options::{EmitOptions, OverlapPolicy, ProcessingOptions, RepositoryOptions};
pub use period::PeriodKey;
pub use records::{BatchRole, Cascade, ConceptRecord, ImportRecord, ReferenceBatch};
pub use relationship::{Adjacency, MapType, RelationshipClass, RelationshipGraph};
pub use source::{
    RawCategoryOptionCombo, RawCodelist, RawDataElement, RawDerivedDataElementRow,
    RawIndicator, RawNamed, RawReferenceIndicator, SourceInputs,
};
pub use stats::{InputCounts, RunStats};
