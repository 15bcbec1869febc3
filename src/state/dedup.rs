//! Latest-submission-per-person index shared by the pagination workers

use crate::state::submission::SubmissionRecord;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What an upsert did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First record seen for this entity
    Inserted,

    /// Record was strictly newer than the stored one and replaced it
    Replaced,

    /// Stored record was at least as recent; nothing changed
    Kept,
}

/// Last-write-wins index from entity reference to its newest submission
///
/// Shared by all pagination workers. Each upsert runs under a single lock, so
/// the compare and the write are one linearizable step per key. Once the
/// pagination phase has drained, the index is read through [`DedupIndex::snapshot`].
#[derive(Debug, Default)]
pub struct DedupIndex {
    entries: Mutex<HashMap<String, SubmissionRecord>>,
}

impl DedupIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into the index
    ///
    /// The first record for a key is always accepted, whatever its timestamp.
    /// Later records replace it only when strictly newer under [`crate::state::Recency`].
    pub fn upsert(&self, record: SubmissionRecord) -> UpsertOutcome {
        let mut entries = self.lock();

        match entries.entry(record.entity_ref.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                UpsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) if record.recency() > slot.get().recency() => {
                slot.insert(record);
                UpsertOutcome::Replaced
            }
            Entry::Occupied(_) => UpsertOutcome::Kept,
        }
    }

    /// Folds a batch of records, returning how many were inserted or replaced
    pub fn upsert_all<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = SubmissionRecord>,
    {
        records
            .into_iter()
            .map(|record| self.upsert(record))
            .filter(|outcome| *outcome != UpsertOutcome::Kept)
            .count()
    }

    /// Returns the stored record for an entity, if any
    pub fn get(&self, entity_ref: &str) -> Option<SubmissionRecord> {
        self.lock().get(entity_ref).cloned()
    }

    /// Number of distinct entities
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the entries into a list sorted by entity reference
    ///
    /// Taken once the pagination phase has drained; the copy is what the
    /// enrichment phase works from.
    pub fn snapshot(&self) -> Vec<(String, SubmissionRecord)> {
        let mut snapshot: Vec<_> = self
            .lock()
            .iter()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SubmissionRecord>> {
        // Every mutation is a single insert, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
