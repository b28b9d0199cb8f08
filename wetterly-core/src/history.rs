//! Recent-search history: most-recent-first, unique, optionally bounded,
//! persisted through a [`HistoryStorage`] backend.

use std::{
    fmt,
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

pub mod storage;

pub use storage::{FileStorage, HistoryStorage, MemoryStorage, StorageError};

/// Storage key the snapshot lives under.
pub const HISTORY_KEY: &str = "searchHistory";

pub const DEFAULT_MAX_ENTRIES: usize = 8;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_MAX_ENTRIES) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("search query is blank")]
    BlankQuery,

    #[error("failed to persist search history: {0}")]
    Persistence(#[from] StorageError),

    #[error("stored search history is not a JSON list of strings: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("failed to serialize search history: {0}")]
    Serialization(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("history capacity must be at least 1 (use \"unbounded\" to disable the limit)")]
    Zero,

    #[error("unknown history capacity '{0}'. Expected a positive number or \"unbounded\".")]
    Unknown(String),
}

/// Upper bound on the number of remembered searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CapacityRepr", into = "CapacityRepr")]
pub enum Capacity {
    Bounded(NonZeroUsize),
    Unbounded,
}

impl Capacity {
    /// `None` for zero.
    pub fn bounded(max_entries: usize) -> Option<Self> {
        NonZeroUsize::new(max_entries).map(Capacity::Bounded)
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Capacity::Bounded(n) => Some(n.get()),
            Capacity::Unbounded => None,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Bounded(DEFAULT_CAPACITY)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(n) => write!(f, "{n}"),
            Capacity::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl TryFrom<&str> for Capacity {
    type Error = CapacityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("unbounded") {
            return Ok(Capacity::Unbounded);
        }

        let n: usize = trimmed.parse().map_err(|_| CapacityError::Unknown(value.to_string()))?;
        Capacity::bounded(n).ok_or(CapacityError::Zero)
    }
}

/// Config-file form: `max_entries = 8` or `max_entries = "unbounded"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CapacityRepr {
    Limit(usize),
    Keyword(String),
}

impl TryFrom<CapacityRepr> for Capacity {
    type Error = CapacityError;

    fn try_from(repr: CapacityRepr) -> Result<Self, Self::Error> {
        match repr {
            CapacityRepr::Limit(n) => Capacity::bounded(n).ok_or(CapacityError::Zero),
            CapacityRepr::Keyword(word) => Capacity::try_from(word.as_str()),
        }
    }
}

impl From<Capacity> for CapacityRepr {
    fn from(capacity: Capacity) -> Self {
        match capacity {
            Capacity::Bounded(n) => CapacityRepr::Limit(n.get()),
            Capacity::Unbounded => CapacityRepr::Keyword("unbounded".to_string()),
        }
    }
}

/// Ordered place names, most recent first, no duplicates, no blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryList(Vec<String>);

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The list after searching for `query`: the trimmed query moves (or is
    /// added) to the front and the tail is cut to `capacity`.
    ///
    /// Equality is exact and case-sensitive, so "paris" and "Paris" are
    /// separate entries.
    pub fn recorded(&self, query: &str, capacity: Capacity) -> Result<HistoryList, HistoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(HistoryError::BlankQuery);
        }

        let mut next = Vec::with_capacity(self.0.len() + 1);
        next.push(query.to_string());
        next.extend(self.0.iter().filter(|e| e.as_str() != query).cloned());

        let mut list = HistoryList(next);
        list.truncate(capacity);
        Ok(list)
    }

    fn truncate(&mut self, capacity: Capacity) {
        if let Some(limit) = capacity.limit() {
            self.0.truncate(limit);
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for HistoryList {
    /// Trims, drops blanks and keeps the first occurrence of each entry.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut entries: Vec<String> = Vec::new();
        for item in iter {
            let entry = item.as_ref().trim();
            if !entry.is_empty() && !entries.iter().any(|e| e == entry) {
                entries.push(entry.to_string());
            }
        }
        HistoryList(entries)
    }
}

impl<'a> IntoIterator for &'a HistoryList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Owns the in-memory history and mirrors it into storage.
///
/// Persistence is best-effort: when the backend fails, the failure is logged
/// and the in-memory list stays authoritative for the session.
#[derive(Debug)]
pub struct HistoryStore {
    storage: Box<dyn HistoryStorage>,
    capacity: Capacity,
    entries: Mutex<HistoryList>,
}

impl HistoryStore {
    /// Create a store and load whatever snapshot the backend holds.
    pub fn open(storage: Box<dyn HistoryStorage>, capacity: Capacity) -> Self {
        let store = Self { storage, capacity, entries: Mutex::new(HistoryList::new()) };
        store.load();
        store
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn entries(&self) -> HistoryList {
        self.lock().clone()
    }

    /// Re-read the snapshot from storage, replacing the in-memory list.
    /// Missing, unreadable or corrupt data yields an empty list.
    pub fn load(&self) -> HistoryList {
        let mut entries = self.lock();
        let loaded = match self.read_snapshot() {
            Ok(Some(list)) => list,
            Ok(None) => HistoryList::new(),
            Err(e) => {
                log::warn!("Ignoring stored search history: {e}");
                HistoryList::new()
            }
        };

        log::debug!("Loaded {} history entries", loaded.len());
        *entries = loaded.clone();
        loaded
    }

    /// Record a submitted search. A blank query leaves the history untouched
    /// and returns [`HistoryError::BlankQuery`].
    pub fn record(&self, query: &str) -> Result<HistoryList, HistoryError> {
        let mut entries = self.lock();
        let next = entries.recorded(query, self.capacity)?;
        *entries = next.clone();

        if let Err(e) = self.persist(&next) {
            log::warn!("Search history kept in memory only: {e}");
        }

        Ok(next)
    }

    /// Forget every entry and drop the stored snapshot.
    pub fn clear(&self) -> HistoryList {
        let mut entries = self.lock();
        *entries = HistoryList::new();

        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            log::warn!("Failed to remove stored search history: {e}");
        }

        HistoryList::new()
    }

    fn read_snapshot(&self) -> Result<Option<HistoryList>, HistoryError> {
        let Some(raw) = self.storage.get(HISTORY_KEY)? else {
            return Ok(None);
        };

        let stored: Vec<String> =
            serde_json::from_str(&raw).map_err(HistoryError::Deserialization)?;

        let mut list: HistoryList = stored.into_iter().collect();
        list.truncate(self.capacity);
        Ok(Some(list))
    }

    fn persist(&self, list: &HistoryList) -> Result<(), HistoryError> {
        let json = serde_json::to_string(list).map_err(HistoryError::Serialization)?;
        self.storage.set(HISTORY_KEY, &json)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HistoryList> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        path::PathBuf,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
            mpsc,
        },
        thread,
        time::Duration,
    };

    fn list(items: &[&str]) -> HistoryList {
        items.iter().collect()
    }

    fn bounded(n: usize) -> Capacity {
        Capacity::bounded(n).unwrap()
    }

    /// Shares one MemoryStorage between several stores.
    #[derive(Debug, Clone, Default)]
    struct SharedStorage(Arc<MemoryStorage>);

    impl HistoryStorage for SharedStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    /// Once `slow` is set, `get` announces itself and then stalls.
    #[derive(Debug)]
    struct StallingStorage {
        inner: SharedStorage,
        slow: Arc<AtomicBool>,
        started: Mutex<mpsc::Sender<()>>,
    }

    impl HistoryStorage for StallingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.slow.load(Ordering::SeqCst) {
                let _ = self.started.lock().unwrap().send(());
                thread::sleep(Duration::from_millis(200));
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[derive(Debug, Default)]
    struct FailingStorage;

    fn io_failure() -> StorageError {
        StorageError::Io {
            path: PathBuf::from("/unavailable/searchHistory.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    impl HistoryStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(io_failure())
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(io_failure())
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(io_failure())
        }
    }

    #[test]
    fn recording_prepends_in_most_recent_first_order() {
        let l = HistoryList::new()
            .recorded("Tokyo", Capacity::Unbounded)
            .unwrap()
            .recorded("Paris", Capacity::Unbounded)
            .unwrap();

        assert_eq!(l, list(&["Paris", "Tokyo"]));
    }

    #[test]
    fn rerecording_moves_entry_to_front() {
        let l = list(&["Paris", "Tokyo", "Rome"]).recorded("Rome", Capacity::Unbounded).unwrap();
        assert_eq!(l, list(&["Rome", "Paris", "Tokyo"]));
    }

    #[test]
    fn recording_twice_keeps_a_single_entry_at_front() {
        let starts = [list(&[]), list(&["Oslo"]), list(&["Lima", "Oslo", "Cairo"]), list(&["Oslo", "Lima"])];

        for start in starts {
            let l = start
                .recorded("Oslo", Capacity::Unbounded)
                .unwrap()
                .recorded("Oslo", Capacity::Unbounded)
                .unwrap();

            assert_eq!(l.get(0), Some("Oslo"));
            assert_eq!(l.iter().filter(|e| *e == "Oslo").count(), 1);
        }
    }

    #[test]
    fn blank_queries_are_rejected() {
        let start = list(&["Paris"]);
        for blank in ["", "   ", "\t\n"] {
            let err = start.recorded(blank, Capacity::Unbounded).unwrap_err();
            assert!(matches!(err, HistoryError::BlankQuery));
        }
    }

    #[test]
    fn queries_are_trimmed_before_recording() {
        let l = list(&["Paris"]).recorded("  Paris ", Capacity::Unbounded).unwrap();
        assert_eq!(l, list(&["Paris"]));
    }

    #[test]
    fn dedup_is_case_sensitive() {
        let l = list(&["paris"]).recorded("Paris", Capacity::Unbounded).unwrap();
        assert_eq!(l, list(&["Paris", "paris"]));
    }

    #[test]
    fn capacity_bounds_the_list() {
        let mut l = HistoryList::new();
        for city in ["A", "B", "C", "D", "E"] {
            l = l.recorded(city, bounded(3)).unwrap();
            assert!(l.len() <= 3);
        }
        assert_eq!(l, list(&["E", "D", "C"]));
    }

    #[test]
    fn unbounded_capacity_keeps_everything() {
        let mut l = HistoryList::new();
        for i in 0..50 {
            l = l.recorded(&format!("City {i}"), Capacity::Unbounded).unwrap();
        }
        assert_eq!(l.len(), 50);
    }

    #[test]
    fn from_iter_sanitizes_entries() {
        let l: HistoryList = [" Paris", "", "Rome", "Paris", "  "].into_iter().collect();
        assert_eq!(l.entries(), ["Paris", "Rome"]);
    }

    #[test]
    fn capacity_parses_numbers_and_keyword() {
        assert_eq!(Capacity::try_from("8"), Ok(bounded(8)));
        assert_eq!(Capacity::try_from("Unbounded"), Ok(Capacity::Unbounded));
        assert_eq!(Capacity::try_from("0"), Err(CapacityError::Zero));
        assert!(matches!(Capacity::try_from("lots"), Err(CapacityError::Unknown(_))));
        assert_eq!(Capacity::default().limit(), Some(DEFAULT_MAX_ENTRIES));
    }

    #[test]
    fn store_persists_records_across_instances() {
        let shared = SharedStorage::default();

        let store = HistoryStore::open(Box::new(shared.clone()), Capacity::default());
        store.record("Tokyo").unwrap();
        store.record("Paris").unwrap();

        let reopened = HistoryStore::open(Box::new(shared), Capacity::default());
        assert_eq!(reopened.entries(), list(&["Paris", "Tokyo"]));
    }

    #[test]
    fn snapshot_is_a_json_array() {
        let shared = SharedStorage::default();
        let store = HistoryStore::open(Box::new(shared.clone()), Capacity::default());
        store.record("Rome").unwrap();
        store.record("Oslo").unwrap();

        let raw = shared.get(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"["Oslo","Rome"]"#);
    }

    #[test]
    fn blank_record_leaves_store_unchanged() {
        let shared = SharedStorage::default();
        let store = HistoryStore::open(Box::new(shared.clone()), Capacity::default());
        store.record("Rome").unwrap();

        assert!(matches!(store.record("  "), Err(HistoryError::BlankQuery)));
        assert_eq!(store.entries(), list(&["Rome"]));
        assert_eq!(shared.get(HISTORY_KEY).unwrap().as_deref(), Some(r#"["Rome"]"#));
    }

    #[test]
    fn clear_then_load_is_empty() {
        let shared = SharedStorage::default();
        let store = HistoryStore::open(Box::new(shared.clone()), Capacity::default());
        store.record("Rome").unwrap();

        assert!(store.clear().is_empty());
        assert!(store.load().is_empty());
        assert_eq!(shared.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_snapshot_loads_as_empty() {
        let shared = SharedStorage::default();
        shared.set(HISTORY_KEY, "{not json").unwrap();

        let store = HistoryStore::open(Box::new(shared.clone()), Capacity::default());
        assert!(store.entries().is_empty());

        shared.set(HISTORY_KEY, r#"{"city":"Rome"}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_sanitizes_and_truncates_snapshot() {
        let shared = SharedStorage::default();
        shared.set(HISTORY_KEY, r#"["Rome", " ", "Oslo", "Rome", "Lima", "Kyiv"]"#).unwrap();

        let store = HistoryStore::open(Box::new(shared), bounded(2));
        assert_eq!(store.entries(), list(&["Rome", "Oslo"]));
    }

    #[test]
    fn failing_storage_does_not_roll_back_memory() {
        let store = HistoryStore::open(Box::new(FailingStorage), Capacity::default());
        assert!(store.entries().is_empty());

        let l = store.record("Paris").unwrap();
        assert_eq!(l, list(&["Paris"]));
        assert_eq!(store.entries(), list(&["Paris"]));

        store.record("Rome").unwrap();
        assert_eq!(store.entries(), list(&["Rome", "Paris"]));

        assert!(store.clear().is_empty());
        assert!(store.entries().is_empty());
    }

    #[test]
    fn store_enforces_configured_capacity() {
        let store = HistoryStore::open(Box::new(MemoryStorage::new()), bounded(8));
        for i in 0..20 {
            let l = store.record(&format!("City {i}")).unwrap();
            assert!(l.len() <= 8);
        }
        assert_eq!(store.entries().get(0), Some("City 19"));
        assert_eq!(store.entries().get(7), Some("City 12"));
    }

    #[test]
    fn record_during_load_is_not_lost() {
        let shared = SharedStorage::default();
        let slow = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let storage = StallingStorage {
            inner: shared.clone(),
            slow: Arc::clone(&slow),
            started: Mutex::new(tx),
        };

        let store = Arc::new(HistoryStore::open(Box::new(storage), Capacity::Unbounded));
        store.record("Rome").unwrap();

        slow.store(true, Ordering::SeqCst);
        let slow_store = Arc::clone(&store);
        let loader = thread::spawn(move || slow_store.load());

        rx.recv().expect("load reached storage");
        store.record("Paris").unwrap();
        loader.join().unwrap();

        assert_eq!(store.entries(), list(&["Paris", "Rome"]));

        store.record("Oslo").unwrap();
        assert_eq!(shared.get(HISTORY_KEY).unwrap().as_deref(), Some(r#"["Oslo","Paris","Rome"]"#));
    }

    #[test]
    fn concurrent_records_are_all_kept() {
        let shared = SharedStorage::default();
        let store = Arc::new(HistoryStore::open(Box::new(shared.clone()), Capacity::Unbounded));

        let workers: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store.record(&format!("City {t}-{i}")).unwrap();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.entries().len(), 400);

        let reopened = HistoryStore::open(Box::new(shared), Capacity::Unbounded);
        assert_eq!(reopened.entries(), store.entries());
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let store = Arc::new(HistoryStore::open(Box::new(MemoryStorage::new()), Capacity::default()));
        store.record("Rome").unwrap();

        let poisoner = Arc::clone(&store);
        let result = thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("panic while holding the history lock");
        })
        .join();

        assert!(result.is_err());
        assert!(store.entries.is_poisoned());

        assert_eq!(store.entries(), list(&["Rome"]));
        assert_eq!(store.record("Paris").unwrap(), list(&["Paris", "Rome"]));
        assert!(store.clear().is_empty());
    }
}
