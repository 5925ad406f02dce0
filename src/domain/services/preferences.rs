//! Persistence of filters, favorites, search history, last location and theme
//!
//! Every read fails soft: a missing, unreadable or corrupt value is logged and
//! treated as "never persisted".

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::models::{Coordinate, FavoriteRecord, FilterSpec, HistoryRecord, Place, Theme};
use crate::infrastructure::storage::{KeyValueStore, keys};
use crate::shared::StorageError;
use crate::shared::logging::log_storage_error;

/// Default number of entries returned by [`PreferenceStore::get_history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Fixed-capacity FIFO of history records, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory {
    entries: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from a newest-first list, dropping anything past capacity
    pub fn from_records(records: Vec<HistoryRecord>, capacity: usize) -> Self {
        let mut entries: VecDeque<HistoryRecord> = records.into();
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Insert as newest; returns the evicted oldest entry, if any
    pub fn push(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        if self.capacity == 0 {
            return Some(record);
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        self.entries.push_front(record);
        evicted
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        self.entries.len() != before
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<HistoryRecord> {
        self.entries.into()
    }
}

/// Typed view over a [`KeyValueStore`]
pub struct PreferenceStore<K> {
    store: K,
    history_capacity: usize,
    // Serializes read-modify-write sequences on the collections
    write_lock: Mutex<()>,
}

impl<K: KeyValueStore> PreferenceStore<K> {
    pub fn new(store: K, history_capacity: usize) -> Self {
        Self {
            store,
            history_capacity,
            write_lock: Mutex::new(()),
        }
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_storage_error(key, "read", &e.to_string());
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let error = StorageError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                log_storage_error(key, "decode", &error.to_string());
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                log_storage_error(key, "encode", &e.to_string());
                return false;
            }
        };
        match self.store.set(key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                log_storage_error(key, "write", &e.to_string());
                false
            }
        }
    }

    fn remove_key(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(e) => {
                log_storage_error(key, "remove", &e.to_string());
                false
            }
        }
    }

    // ---- Preference snapshot ----

    pub fn save_preferences(&self, filters: &FilterSpec) -> bool {
        self.write_json(keys::PREFERENCES, filters)
    }

    pub fn load_preferences(&self) -> Option<FilterSpec> {
        self.read_json::<FilterSpec>(keys::PREFERENCES)
            .map(FilterSpec::normalized)
    }

    // ---- Favorites ----

    /// Favorites, most recently added first
    pub fn favorites(&self) -> Vec<FavoriteRecord> {
        self.read_json(keys::FAVORITES).unwrap_or_default()
    }

    /// Returns false (and changes nothing) if the place is already a favorite
    pub fn add_favorite(&self, place: &Place) -> bool {
        self.add_favorite_at(place, now_millis())
    }

    pub fn add_favorite_at(&self, place: &Place, saved_at: i64) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.favorites();
        if favorites.iter().any(|f| f.id == place.id) {
            return false;
        }
        favorites.insert(0, FavoriteRecord::from_place(place, saved_at));
        self.write_json(keys::FAVORITES, &favorites)
    }

    pub fn remove_favorite(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.favorites();
        let before = favorites.len();
        favorites.retain(|f| f.id != id);
        if favorites.len() == before {
            return false;
        }
        self.write_json(keys::FAVORITES, &favorites)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites().iter().any(|f| f.id == id)
    }

    /// Add or remove; returns whether the place is a favorite afterwards.
    /// A failed write leaves the stored state, and the return value, unchanged.
    pub fn toggle_favorite(&self, place: &Place) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.favorites();
        match favorites.iter().position(|f| f.id == place.id) {
            Some(index) => {
                favorites.remove(index);
                !self.write_json(keys::FAVORITES, &favorites)
            }
            None => {
                favorites.insert(0, FavoriteRecord::from_place(place, now_millis()));
                self.write_json(keys::FAVORITES, &favorites)
            }
        }
    }

    // ---- Search history ----

    /// Full history, newest first
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.bounded_history().into_vec()
    }

    /// At most `limit` newest entries
    pub fn get_history(&self, limit: usize) -> Vec<HistoryRecord> {
        let mut history = self.history();
        history.truncate(limit);
        history
    }

    fn bounded_history(&self) -> BoundedHistory {
        let records = self.read_json(keys::HISTORY).unwrap_or_default();
        BoundedHistory::from_records(records, self.history_capacity)
    }

    pub fn save_search(&self, filters: &FilterSpec, result_count: usize) -> HistoryRecord {
        self.save_search_at(filters, result_count, now_millis())
    }

    pub fn save_search_at(
        &self,
        filters: &FilterSpec,
        result_count: usize,
        timestamp: i64,
    ) -> HistoryRecord {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut history = self.bounded_history();

        let mut record = HistoryRecord::new(filters.clone(), result_count, timestamp);
        let base_id = record.id.clone();
        let mut suffix = 1;
        while history.contains_id(&record.id) {
            record.id = format!("{}_{}", base_id, suffix);
            suffix += 1;
        }

        history.push(record.clone());
        self.write_json(keys::HISTORY, &history.into_vec());
        record
    }

    pub fn remove_history(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut history = self.bounded_history();
        if !history.remove(id) {
            return false;
        }
        self.write_json(keys::HISTORY, &history.into_vec())
    }

    pub fn clear_history(&self) -> bool {
        self.remove_key(keys::HISTORY)
    }

    // ---- Last location ----

    pub fn save_last_location(&self, coordinate: Coordinate) -> bool {
        self.write_json(keys::LAST_LOCATION, &coordinate)
    }

    pub fn last_location(&self) -> Option<Coordinate> {
        self.read_json::<Coordinate>(keys::LAST_LOCATION)
            .filter(Coordinate::is_finite)
    }

    // ---- Theme ----

    pub fn save_theme(&self, theme: Theme) -> bool {
        match self.store.set(keys::THEME, theme.as_str()) {
            Ok(()) => true,
            Err(e) => {
                log_storage_error(keys::THEME, "write", &e.to_string());
                false
            }
        }
    }

    /// Stored theme, or `None` when the system preference should decide
    pub fn load_theme(&self) -> Option<Theme> {
        match self.store.get(keys::THEME) {
            Ok(raw) => raw.and_then(|raw| raw.parse().ok()),
            Err(e) => {
                log_storage_error(keys::THEME, "read", &e.to_string());
                None
            }
        }
    }

    /// Remove every persisted key
    pub fn clear_all(&self) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        keys::ALL
            .iter()
            .fold(true, |ok, key| self.remove_key(key) && ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CuisineType, DistanceBand, TimeSlot};
    use crate::infrastructure::storage::MemoryStore;
    use crate::testing::{FailingStore, place};

    fn store() -> PreferenceStore<MemoryStore> {
        PreferenceStore::new(MemoryStore::new(), 20)
    }

    #[test]
    fn test_filter_spec_round_trip_through_store() {
        let prefs = store();
        let filters = FilterSpec::default()
            .with_cuisines([CuisineType::Japanese, CuisineType::Hotpot])
            .with_price_levels([1, 2])
            .with_distance(DistanceBand::FiveKm)
            .with_min_rating(4.0)
            .with_min_reviews(50)
            .with_time_slot(TimeSlot::Lunch);

        assert!(prefs.save_preferences(&filters));
        assert_eq!(prefs.load_preferences(), Some(filters));
    }

    #[test]
    fn test_add_favorite_is_idempotent() {
        let prefs = store();
        let p = place("a", 4.5, 1.0);

        assert!(prefs.add_favorite(&p));
        assert!(!prefs.add_favorite(&p));
        assert_eq!(prefs.favorites().len(), 1);
        assert!(prefs.is_favorite("a"));
    }

    #[test]
    fn test_favorites_newest_first() {
        let prefs = store();
        prefs.add_favorite_at(&place("a", 4.0, 1.0), 1);
        prefs.add_favorite_at(&place("b", 4.0, 1.0), 2);

        let ids: Vec<_> = prefs.favorites().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_toggle_and_remove_favorite() {
        let prefs = store();
        let p = place("a", 4.0, 1.0);
        assert!(prefs.toggle_favorite(&p));
        assert!(!prefs.toggle_favorite(&p));
        assert!(!prefs.is_favorite("a"));
        assert!(!prefs.remove_favorite("a"));
    }

    #[test]
    fn test_history_keeps_most_recent_entries() {
        let prefs = store();
        for i in 0..21 {
            prefs.save_search_at(&FilterSpec::default(), i, 1_000 + i as i64);
        }

        let history = prefs.history();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].timestamp, 1_020);
        assert_eq!(history[19].timestamp, 1_001);
        assert!(history.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn test_history_ids_stay_unique_within_a_millisecond() {
        let prefs = store();
        let first = prefs.save_search_at(&FilterSpec::default(), 3, 42);
        let second = prefs.save_search_at(&FilterSpec::default(), 4, 42);
        assert_eq!(first.id, "search_42");
        assert_eq!(second.id, "search_42_1");
    }

    #[test]
    fn test_remove_and_clear_history() {
        let prefs = store();
        let record = prefs.save_search_at(&FilterSpec::default(), 3, 1);
        prefs.save_search_at(&FilterSpec::default(), 3, 2);

        assert!(prefs.remove_history(&record.id));
        assert_eq!(prefs.history().len(), 1);
        assert_eq!(prefs.get_history(DEFAULT_HISTORY_LIMIT).len(), 1);

        assert!(prefs.clear_history());
        assert!(prefs.history().is_empty());
    }

    #[test]
    fn test_corrupt_values_read_as_absent() {
        let memory = MemoryStore::new();
        memory.set(keys::FAVORITES, "not json").unwrap();
        memory.set(keys::LAST_LOCATION, "{\"lat\": 1}").unwrap();
        let prefs = PreferenceStore::new(memory, 20);

        assert!(prefs.favorites().is_empty());
        assert_eq!(prefs.last_location(), None);
        assert_eq!(prefs.load_preferences(), None);
    }

    #[test]
    fn test_failing_store_never_panics() {
        let prefs = PreferenceStore::new(FailingStore, 20);
        assert!(prefs.favorites().is_empty());
        assert!(!prefs.add_favorite(&place("a", 4.0, 1.0)));
        assert!(!prefs.save_preferences(&FilterSpec::default()));
        assert_eq!(prefs.save_search(&FilterSpec::default(), 1).result_count, 1);
        assert_eq!(prefs.load_theme(), None);
        assert!(!prefs.clear_all());
    }

    /// Serves reads from the wrapped store and rejects every write
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
                reason: "read only".to_string(),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read only".to_string()))
        }
    }

    #[test]
    fn test_toggle_reports_persisted_state_when_writes_fail() {
        let p = place("a", 4.0, 1.0);

        let prefs = PreferenceStore::new(FailingStore, 20);
        assert!(!prefs.toggle_favorite(&p));
        assert!(!prefs.is_favorite("a"));

        let seeded = PreferenceStore::new(MemoryStore::new(), 20);
        assert!(seeded.add_favorite(&p));
        let prefs = PreferenceStore::new(ReadOnlyStore(seeded.store), 20);
        assert!(prefs.toggle_favorite(&p));
        assert!(prefs.is_favorite("a"));
    }

    #[test]
    fn test_theme_and_clear_all() {
        let prefs = store();
        assert_eq!(prefs.load_theme(), None);
        prefs.save_theme(Theme::Dark);
        prefs.save_last_location(Coordinate::new(1.0, 2.0));
        assert_eq!(prefs.load_theme(), Some(Theme::Dark));

        assert!(prefs.clear_all());
        assert_eq!(prefs.load_theme(), None);
        assert_eq!(prefs.last_location(), None);
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = BoundedHistory::new(2);
        assert!(history.push(HistoryRecord::new(FilterSpec::default(), 1, 1)).is_none());
        assert!(history.push(HistoryRecord::new(FilterSpec::default(), 1, 2)).is_none());
        let evicted = history.push(HistoryRecord::new(FilterSpec::default(), 1, 3));
        assert_eq!(evicted.map(|r| r.timestamp), Some(1));
        assert_eq!(history.len(), 2);
    }
}
