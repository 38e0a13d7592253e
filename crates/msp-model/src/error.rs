use thiserror::Error;

/// Errors raised while building the metadata graph and import list.
///
/// Integrity violations mean the input snapshot is inconsistent. They abort
/// the run: downstream stages assume a closed entity universe.
#[derive(Debug, Error)]
pub enum MspError {
    #[error("{entity_url} references disaggregate {disaggregate_id} which was not built")]
    MissingDisaggregate {
        entity_url: String,
        disaggregate_id: String,
    },

    #[error("duplicate codelist external id {external_id}")]
    DuplicateCodelist { external_id: String },

    #[error("no reference indicator {code} is defined for period {period}")]
    MissingReferenceIndicator { code: String, period: String },

    #[error("{url} is claimed by both a DATIM data element and a PDH derived data element")]
    UidOverlap { url: String },

    #[error("entity {url} was built twice from different source records")]
    DuplicateEntity { url: String },

    #[error("failed to serialize import record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl MspError {
    /// Returns true for errors caused by an inconsistent input snapshot.
    pub fn is_integrity_violation(&self) -> bool {
        !matches!(self, Self::Serialize(_))
    }
}

pub type Result<T> = std::result::Result<T, MspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_disaggregate_names_the_offending_url() {
        let err = MspError::MissingDisaggregate {
            entity_url: "/orgs/PEPFAR/sources/MER/concepts/abc123de11/".to_string(),
            disaggregate_id: "coc1234567".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("/orgs/PEPFAR/sources/MER/concepts/abc123de11/"));
        assert!(message.contains("coc1234567"));
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn serialize_errors_are_not_integrity_violations() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MspError = json_err.into();
        assert!(!err.is_integrity_violation());
    }
}
