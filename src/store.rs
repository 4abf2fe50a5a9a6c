use std::collections::HashSet;

use crate::record::{IdentityKey, MemberRecord};

/// Records accumulated over one crawl, unique by identity key.
///
/// First occurrence wins: a later record with the same key is dropped even if
/// it carries more detail fields. Records without an identifier are compared
/// whole against everything stored so far.
#[derive(Debug, Default)]
pub struct AggregationStore {
    records: Vec<MemberRecord>,
    keys: HashSet<(String, String)>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` unless an equal identity is already stored.
    /// Returns whether the record was kept.
    pub fn insert(&mut self, record: MemberRecord) -> bool {
        match record.identity_key() {
            IdentityKey::Keyed(identifier, name_local) => {
                if !self.keys.insert((identifier, name_local)) {
                    return false;
                }
            }
            IdentityKey::Whole => {
                if self.records.contains(&record) {
                    return false;
                }
            }
        }
        self.records.push(record);
        true
    }

    pub fn all(&self) -> &[MemberRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MemberRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
