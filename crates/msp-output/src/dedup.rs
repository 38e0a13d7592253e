//! Order-preserving removal of repeated import records.
//!
//! Records are compared by the SHA256 of their JSON text. Objects
//! serialize with sorted keys, so two records with the same fields in a
//! different order hash the same.

use std::collections::HashSet;

use serde_json::Value;
use sha2::{Digest, Sha256};

use msp_model::Result;

/// Lowercase hex SHA256 of the record's JSON text.
pub fn fingerprint(record: &Value) -> Result<String> {
    let json = serde_json::to_string(record)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Tracks the records seen so far.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a record is offered.
    pub fn insert(&mut self, record: &Value) -> Result<bool> {
        Ok(self.seen.insert(fingerprint(record)?))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Keeps the first occurrence of every record, in input order.
pub fn dedup_records(records: Vec<Value>) -> Result<Vec<Value>> {
    let mut dedup = Deduplicator::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if dedup.insert(&record)? {
            kept.push(record);
        }
    }
    Ok(kept)
}
