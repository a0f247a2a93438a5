/// Scan history: ordered newest-first, capped, persisted as one JSON array

use crate::scan_data::{ScanRecord, StoredRecord};
use crate::storage::StorageAdapter;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Key holding the whole history blob in extension storage.
pub const STORAGE_KEY: &str = "qr_scan_history";

/// Maximum number of history entries kept in memory and in storage.
pub const MAX_HISTORY: usize = 50;

fn default_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_clock() -> DateTime<Utc> {
    Utc::now()
}

/// The one owner of all [`ScanRecord`]s. Mutations keep the list
/// newest-first and never longer than [`MAX_HISTORY`].
#[derive(Clone, PartialEq)]
pub struct ScanHistory {
    records: Vec<ScanRecord>,
    make_id: fn() -> String,
    clock: fn() -> DateTime<Utc>,
}

impl ScanHistory {
    pub fn new() -> Self {
        Self::with_generators(default_id, default_clock)
    }

    /// Identifier and timestamp generation are injectable so tests can
    /// supply deterministic values.
    pub fn with_generators(make_id: fn() -> String, clock: fn() -> DateTime<Utc>) -> Self {
        ScanHistory {
            records: Vec::new(),
            make_id,
            clock,
        }
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Insert a fresh record at the front, evicting tail entries beyond
    /// the cap.
    pub fn add(&mut self, text: &str, tab_title: &str, tab_url: &str) -> &ScanRecord {
        let record = ScanRecord {
            id: (self.make_id)(),
            text: text.to_string(),
            tab_title: tab_title.to_string(),
            tab_url: tab_url.to_string(),
            timestamp: (self.clock)(),
        };

        self.records.insert(0, record);
        self.records.truncate(MAX_HISTORY);
        &self.records[0]
    }

    /// Remove the matching record. Absent ids are a no-op.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let original_len = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() < original_len
    }

    /// Stored form of the full history, newest first.
    pub fn serialize(&self) -> Vec<StoredRecord> {
        self.records.iter().map(ScanRecord::to_stored).collect()
    }

    /// Replace in-memory state wholesale from stored entries, normalizing
    /// timestamps as they are rehydrated.
    pub fn replace_from_stored(&mut self, stored: Vec<StoredRecord>) {
        let now = (self.clock)();
        self.records = stored
            .into_iter()
            .take(MAX_HISTORY)
            .map(|entry| entry.into_record(now))
            .collect();
    }

    /// Load the persisted history. Anything that is not a well-formed
    /// sequence degrades to an empty history inside the storage adapter.
    pub async fn load(&mut self, storage: &StorageAdapter) {
        let stored: Vec<StoredRecord> = storage.get_or(STORAGE_KEY, Vec::new()).await;
        self.replace_from_stored(stored);
    }

    /// Persist the full history. Best-effort: failures are logged by the
    /// storage adapter and the in-memory state stays authoritative.
    pub async fn save(&self, storage: &StorageAdapter) {
        storage.set(STORAGE_KEY, &self.serialize()).await;
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

    fn counter_id() -> String {
        format!("id-{}", NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn test_history() -> ScanHistory {
        ScanHistory::with_generators(counter_id, fixed_clock)
    }

    #[test]
    fn test_add_to_empty_history() {
        let mut history = test_history();

        history.add("HELLO", "", "");

        assert_eq!(history.len(), 1);
        assert_eq!(history.records()[0].text, "HELLO");
        assert_eq!(history.records()[0].timestamp, fixed_clock());
    }

    #[test]
    fn test_add_inserts_at_front() {
        let mut history = test_history();

        history.add("first", "", "");
        history.add("second", "", "");

        assert_eq!(history.records()[0].text, "second");
        assert_eq!(history.records()[1].text, "first");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut history = test_history();

        for n in 0..10 {
            history.add(&format!("scan {n}"), "", "");
        }

        let mut ids: Vec<&str> = history.records().iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = test_history();

        for n in 0..MAX_HISTORY {
            history.add(&format!("scan {n}"), "", "");
        }
        assert_eq!(history.len(), MAX_HISTORY);
        let oldest_id = history.records()[MAX_HISTORY - 1].id.clone();

        history.add("NEW", "", "");

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.records()[0].text, "NEW");
        assert!(history.records().iter().all(|r| r.id != oldest_id));
    }

    #[test]
    fn test_remove_by_id() {
        let mut history = test_history();
        history.add("a", "", "");
        history.add("b", "", "");
        history.add("c", "", "");
        let middle_id = history.records()[1].id.clone();

        let removed = history.remove_by_id(&middle_id);

        assert!(removed);
        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].text, "c");
        assert_eq!(history.records()[1].text, "a");
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut history = test_history();
        history.add("a", "", "");
        let before = history.records().to_vec();

        let removed = history.remove_by_id("nonexistent");

        assert!(!removed);
        assert_eq!(history.records(), before);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut history = test_history();
        history.add("one", "Tab One", "https://one.example");
        history.add("two", "Tab Two", "https://two.example");
        let before = history.records().to_vec();

        let stored = history.serialize();
        let mut reloaded = test_history();
        reloaded.replace_from_stored(stored);

        assert_eq!(reloaded.records(), before);
    }

    #[test]
    fn test_replace_from_stored_normalizes_bad_timestamps() {
        let mut history = test_history();
        history.replace_from_stored(vec![StoredRecord {
            id: "x".to_string(),
            text: "payload".to_string(),
            tab_title: String::new(),
            tab_url: String::new(),
            timestamp: Value::Bool(false),
        }]);

        assert_eq!(history.records()[0].timestamp, fixed_clock());
    }

    #[test]
    fn test_replace_from_stored_respects_cap() {
        let oversized: Vec<StoredRecord> = (0..MAX_HISTORY + 10)
            .map(|n| StoredRecord {
                id: format!("id-{n}"),
                text: format!("scan {n}"),
                tab_title: String::new(),
                tab_url: String::new(),
                timestamp: Value::Null,
            })
            .collect();

        let mut history = test_history();
        history.replace_from_stored(oversized);

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.records()[0].text, "scan 0");
    }
}
