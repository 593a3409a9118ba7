use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use quizify::{
    errors::AppResult,
    models::domain::{PlayerProfile, ProfileCollection},
    repositories::{
        profile_repository::{ACTIVE_PROFILE_KEY, PROFILES_KEY},
        FileStore, InMemoryStore, KeyValueStore, ProfileRepository,
    },
};

/// Wraps a store and counts write calls.
struct CountingStore {
    inner: InMemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            writes: AtomicUsize::new(0),
        }
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn clear(&self) -> AppResult<()> {
        self.inner.clear()
    }
}

fn exercise_store_contract(store: &dyn KeyValueStore) {
    assert_eq!(store.get("quiz_topics").unwrap(), None);

    store.set("quiz_topics", "[\"Cells\"]").unwrap();
    assert_eq!(
        store.get("quiz_topics").unwrap().as_deref(),
        Some("[\"Cells\"]")
    );

    store.set("quiz_topics", "[]").unwrap();
    assert_eq!(store.get("quiz_topics").unwrap().as_deref(), Some("[]"));

    store
        .set_many(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "with \"quotes\" and\nnewlines".to_string()),
        ])
        .unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    assert_eq!(
        store.get("b").unwrap().as_deref(),
        Some("with \"quotes\" and\nnewlines")
    );
    assert_eq!(store.get("quiz_topics").unwrap().as_deref(), Some("[]"));

    store.clear().unwrap();
    assert_eq!(store.get("a").unwrap(), None);
    assert_eq!(store.get("quiz_topics").unwrap(), None);
}

#[test]
fn in_memory_store_honours_contract() {
    exercise_store_contract(&InMemoryStore::new());
}

#[test]
fn file_store_honours_contract() {
    let dir = tempfile::tempdir().unwrap();
    exercise_store_contract(&FileStore::new(dir.path().join("store.json")));
}

#[test]
fn default_set_many_falls_back_to_individual_writes() {
    let store = CountingStore::new();
    store
        .set_many(vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ])
        .unwrap();

    assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    assert_eq!(store.get("y").unwrap().as_deref(), Some("2"));
}

#[test]
fn profile_collection_survives_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut veteran = PlayerProfile::new("Quantum Sage");
    veteran.award_xp(345);
    veteran.save_topic("Photosynthesis");
    veteran.check_streak(chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    let collection = ProfileCollection::new(vec![PlayerProfile::new("Nova Wiz"), veteran], 1);

    ProfileRepository::new(Arc::new(FileStore::new(&path)))
        .save(&collection)
        .unwrap();

    let store = Arc::new(FileStore::new(&path));
    assert_eq!(store.get(ACTIVE_PROFILE_KEY).unwrap().as_deref(), Some("1"));
    let raw = store.get(PROFILES_KEY).unwrap().unwrap();
    assert!(raw.contains("\"lastDate\":\"2026-10-18\""));

    let loaded = ProfileRepository::new(store)
        .find_collection()
        .unwrap()
        .unwrap();
    assert_eq!(loaded, collection);
    assert_eq!(loaded.active().unwrap().level, 4);
}
