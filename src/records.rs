use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::storage::BlobStore;

/// Name of the blob holding the serialized record list.
pub const RECORDS_KEY: &str = "typing-contest-records";
pub const DEFAULT_LEADERBOARD_SIZE: usize = 15;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// One successful completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub sentence: String,
    /// Seconds from first keystroke to the correct submit.
    pub time: f64,
    /// 1-based creation sequence number; not a display rank.
    pub original_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Saved shape accepted on restore. Older saves only carry sentence and time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedRecord {
    id: Option<String>,
    sentence: String,
    time: f64,
    original_index: Option<u32>,
    recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no record with id {id}")]
    NotFound { id: String },

    #[error("record {id} has index {index}, only the latest record ({latest}) can be deleted")]
    NotLatest { id: String, index: u32, latest: u32 },

    #[error("malformed records snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A leaderboard row: fastest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardEntry<'a> {
    /// 1-based position on the board.
    pub rank: usize,
    pub record: &'a Record,
    pub is_best: bool,
    /// Only the most recently created record may be deleted.
    pub deletable: bool,
}

/// Millisecond timestamp followed by a random base-36 suffix.
pub fn generate_id(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", at.timestamp_millis(), suffix)
}

/// Parse a saved record list, filling in what older saves lack and
/// renumbering indices into a compact 1..N run.
pub fn restore(snapshot: &str) -> Result<Vec<Record>, RecordError> {
    let saved: Vec<SavedRecord> = serde_json::from_str(snapshot)?;
    let mut next_index = saved
        .iter()
        .filter_map(|r| r.original_index)
        .max()
        .unwrap_or(0);
    let now = Utc::now();

    // the list is stored most recent first; number missing indices oldest first
    let mut records: Vec<Record> = saved
        .into_iter()
        .rev()
        .map(|r| Record {
            id: r.id.unwrap_or_else(|| generate_id(now)),
            sentence: r.sentence,
            time: r.time,
            original_index: r.original_index.unwrap_or_else(|| {
                next_index += 1;
                next_index
            }),
            recorded_at: r.recorded_at,
        })
        .collect();
    records.reverse();

    compact_indices(&mut records);
    Ok(records)
}

/// Serialize a record list in the same shape [`restore`] reads.
pub fn snapshot(records: &[Record]) -> String {
    serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
}

fn compact_indices(records: &mut [Record]) {
    let order = (0..records.len())
        .sorted_by_key(|&i| (records[i].original_index, Reverse(i)))
        .collect_vec();
    for (position, i) in order.into_iter().enumerate() {
        records[i].original_index = position as u32 + 1;
    }
}

/// Ordered collection of successful attempts, most recent first, mirrored
/// into a [`BlobStore`] after every change.
#[derive(Debug)]
pub struct RecordStore<S: BlobStore> {
    storage: S,
    records: Vec<Record>,
}

impl<S: BlobStore> RecordStore<S> {
    /// Load saved records. Missing or unreadable data starts an empty store.
    pub fn open(storage: S) -> Self {
        let records = match storage.get(RECORDS_KEY) {
            Ok(Some(blob)) => restore(&blob).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring unreadable saved records");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read saved records");
                Vec::new()
            }
        };
        info!(count = records.len(), "records loaded");

        Self { storage, records }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Most recent first.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest index in the store, 0 when empty.
    pub fn latest_index(&self) -> u32 {
        self.records
            .iter()
            .map(|r| r.original_index)
            .max()
            .unwrap_or(0)
    }

    pub fn latest(&self) -> Option<&Record> {
        self.records.iter().max_by_key(|r| r.original_index)
    }

    pub fn add(&mut self, sentence: &str, time: f64) -> Record {
        self.add_at(sentence, time, Utc::now())
    }

    pub fn add_at(&mut self, sentence: &str, time: f64, at: DateTime<Utc>) -> Record {
        let record = Record {
            id: generate_id(at),
            sentence: sentence.to_string(),
            time,
            original_index: self.latest_index() + 1,
            recorded_at: Some(at),
        };
        info!(index = record.original_index, time, "record added");

        self.records.insert(0, record.clone());
        self.persist();
        record
    }

    /// Delete the record with `id`, which must be the latest one.
    pub fn remove(&mut self, id: &str) -> Result<Record, RecordError> {
        let position = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RecordError::NotFound { id: id.to_string() })?;

        let index = self.records[position].original_index;
        let latest = self.latest_index();
        if index != latest {
            return Err(RecordError::NotLatest {
                id: id.to_string(),
                index,
                latest,
            });
        }

        let removed = self.records.remove(position);
        for record in self.records.iter_mut() {
            if record.original_index > removed.original_index {
                record.original_index -= 1;
            }
        }
        info!(index = removed.original_index, "record deleted");

        self.persist();
        Ok(removed)
    }

    pub fn remove_latest(&mut self) -> Option<Record> {
        let id = self.latest()?.id.clone();
        self.remove(&id).ok()
    }

    /// Drop every record and the saved blob with them.
    pub fn clear_all(&mut self) {
        self.records.clear();
        if let Err(e) = self.storage.remove(RECORDS_KEY) {
            warn!(error = %e, "could not erase saved records");
        }
        info!("records cleared");
    }

    pub fn snapshot(&self) -> String {
        snapshot(&self.records)
    }

    /// Fastest first, at most `limit` rows.
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry<'_>> {
        let latest = self.latest_index();
        let sorted = self
            .records
            .iter()
            .sorted_by(|a, b| a.time.total_cmp(&b.time))
            .take(limit)
            .collect_vec();
        let best_time = sorted.first().map(|r| r.time);

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, record)| LeaderboardEntry {
                rank: i + 1,
                record,
                is_best: Some(record.time) == best_time,
                deletable: record.original_index == latest,
            })
            .collect()
    }

    fn persist(&self) {
        if let Err(e) = self.storage.set(RECORDS_KEY, &self.snapshot()) {
            warn!(error = %e, "could not save records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use assert_matches::assert_matches;

    fn indices<S: BlobStore>(store: &RecordStore<S>) -> Vec<u32> {
        store
            .records()
            .iter()
            .map(|r| r.original_index)
            .sorted()
            .collect()
    }

    fn store_with(times: &[f64]) -> RecordStore<MemoryBlobStore> {
        let mut store = RecordStore::open(MemoryBlobStore::new());
        for t in times {
            store.add("abc", *t);
        }
        store
    }

    #[test]
    fn test_add_assigns_sequential_indices_most_recent_first() {
        let store = store_with(&[3.0, 2.0, 1.0]);

        let order: Vec<u32> = store.records().iter().map(|r| r.original_index).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(store.latest_index(), 3);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = store_with(&[1.0, 1.0, 1.0, 1.0]);
        let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).unique().collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_generated_id_shape() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let id = generate_id(at);

        assert!(id.starts_with("1700000000123"));
        assert_eq!(id.len(), 13 + ID_SUFFIX_LEN);
        assert!(id[13..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_only_latest_record_can_be_removed() {
        let mut store = store_with(&[1.0, 2.0, 3.0]);
        let second = store
            .records()
            .iter()
            .find(|r| r.original_index == 2)
            .unwrap()
            .id
            .clone();

        assert_matches!(
            store.remove(&second),
            Err(RecordError::NotLatest { index: 2, latest: 3, .. })
        );
        assert_eq!(store.len(), 3);

        let third = store.latest().unwrap().id.clone();
        let removed = store.remove(&third).unwrap();
        assert_eq!(removed.original_index, 3);
        assert_eq!(indices(&store), vec![1, 2]);

        let added = store.add("abc", 4.0);
        assert_eq!(added.original_index, 3);
    }

    #[test]
    fn test_remove_unknown_id_is_rejected() {
        let mut store = store_with(&[1.0]);
        assert_matches!(store.remove("nope"), Err(RecordError::NotFound { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_interleaved_latest_deletions_keep_indices_compact() {
        let mut store = store_with(&[1.0, 2.0]);
        store.remove_latest();
        store.add("abc", 3.0);
        store.add("abc", 4.0);
        store.remove_latest();
        store.add("abc", 5.0);

        assert_eq!(indices(&store), vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_latest_on_empty_store() {
        let mut store = store_with(&[]);
        assert_eq!(store.remove_latest(), None);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let storage = MemoryBlobStore::new();
        let mut store = RecordStore::open(&storage);
        store.add("abc", 1.5);

        let reopened = RecordStore::open(&storage);
        assert_eq!(reopened.records(), store.records());

        store.remove_latest();
        assert_eq!(storage.get(RECORDS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_clear_all_erases_blob() {
        let storage = MemoryBlobStore::new();
        let mut store = RecordStore::open(&storage);
        store.add("abc", 1.5);
        store.add("abc", 2.5);

        store.clear_all();

        assert!(store.is_empty());
        assert_eq!(storage.get(RECORDS_KEY).unwrap(), None);
        assert!(RecordStore::open(&storage).is_empty());
    }

    #[test]
    fn test_malformed_blob_opens_empty() {
        let storage = MemoryBlobStore::with_blob(RECORDS_KEY, "{not json");
        let store = RecordStore::open(&storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_restore_rejects_malformed_snapshot() {
        assert_matches!(restore("[{\"time\": 1}]"), Err(RecordError::Malformed(_)));
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_fields() {
        let store = store_with(&[1.25, 0.75]);
        let restored = restore(&store.snapshot()).unwrap();
        assert_eq!(restored, store.records());
    }

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let store = store_with(&[1.0]);
        let snap = store.snapshot();
        assert!(snap.contains("\"originalIndex\":1"));
        assert!(snap.contains("\"recordedAt\""));
    }

    #[test]
    fn test_restore_accepts_basic_variant() {
        // most recent first, no ids or indices
        let restored = restore(r#"[{"sentence":"b","time":2.0},{"sentence":"a","time":1.0}]"#)
            .unwrap();

        assert_eq!(restored[0].sentence, "b");
        assert_eq!(restored[0].original_index, 2);
        assert_eq!(restored[1].original_index, 1);
        assert_ne!(restored[0].id, restored[1].id);
        assert_eq!(restored[0].recorded_at, None);
    }

    #[test]
    fn test_restore_compacts_gaps() {
        let restored = restore(
            r#"[{"id":"c","sentence":"s","time":3.0,"originalIndex":7},
                {"id":"b","sentence":"s","time":2.0,"originalIndex":4},
                {"id":"a","sentence":"s","time":1.0,"originalIndex":1}]"#,
        )
        .unwrap();

        let by_id: Vec<(&str, u32)> = restored
            .iter()
            .map(|r| (r.id.as_str(), r.original_index))
            .collect();
        assert_eq!(by_id, vec![("c", 3), ("b", 2), ("a", 1)]);
    }

    #[test]
    fn test_leaderboard_sorts_by_time_and_caps() {
        let times: Vec<f64> = (0..20).map(|i| 20.0 - i as f64).collect();
        let store = store_with(&times);

        let board = store.leaderboard(DEFAULT_LEADERBOARD_SIZE);

        assert_eq!(board.len(), 15);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].record.time, 1.0);
        assert!(board[0].is_best);
        assert!(!board[1].is_best);
        assert!(board.windows(2).all(|w| w[0].record.time <= w[1].record.time));
        // the last added record is also the fastest one
        assert!(board[0].deletable);
        assert_eq!(board.iter().filter(|e| e.deletable).count(), 1);
    }

    #[test]
    fn test_leaderboard_marks_ties_for_best() {
        let store = store_with(&[1.5, 1.5, 2.0]);
        let board = store.leaderboard(DEFAULT_LEADERBOARD_SIZE);

        assert_eq!(board.iter().filter(|e| e.is_best).count(), 2);
        assert_eq!(board[2].record.original_index, 3);
        assert!(board[2].deletable);
    }

    #[test]
    fn test_deletable_record_can_fall_off_the_board() {
        let store = store_with(&[1.0, 2.0, 9.0]);
        let board = store.leaderboard(2);

        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|e| !e.deletable));
    }
}
