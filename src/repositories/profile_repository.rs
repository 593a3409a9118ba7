use std::sync::Arc;

use crate::{
    errors::AppResult,
    models::domain::{PlayerProfile, ProfileCollection},
    repositories::KeyValueStore,
};

pub const PROFILES_KEY: &str = "quiz_player_profiles";
pub const ACTIVE_PROFILE_KEY: &str = "quiz_active_profile_idx";
pub const LEGACY_STATS_KEY: &str = "quiz_user_stats";
pub const LEGACY_TOPICS_KEY: &str = "quiz_topics";

/// Owns the storage keys of the profile ledger.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The saved collection, or `None` when nothing usable is stored.
    pub fn find_collection(&self) -> AppResult<Option<ProfileCollection>> {
        let Some(raw) = self.store.get(PROFILES_KEY)? else {
            return Ok(None);
        };

        let profiles: Vec<PlayerProfile> = match serde_json::from_str(&raw) {
            Ok(profiles) => profiles,
            Err(err) => {
                log::warn!("Ignoring unreadable profile collection: {}", err);
                return Ok(None);
            }
        };
        if profiles.is_empty() {
            return Ok(None);
        }

        let active_index = self
            .store
            .get(ACTIVE_PROFILE_KEY)?
            .and_then(|idx| idx.trim().parse::<usize>().ok())
            .unwrap_or(0);

        Ok(Some(ProfileCollection::new(profiles, active_index)))
    }

    /// Reads the single-profile layout used before multiple profiles existed.
    pub fn find_legacy_profile(&self) -> AppResult<Option<PlayerProfile>> {
        let Some(raw) = self.store.get(LEGACY_STATS_KEY)? else {
            return Ok(None);
        };

        let mut profile: PlayerProfile = match serde_json::from_str(&raw) {
            Ok(profile) => profile,
            Err(err) => {
                log::warn!("Ignoring unreadable legacy stats: {}", err);
                return Ok(None);
            }
        };

        profile.topics = self
            .store
            .get(LEGACY_TOPICS_KEY)?
            .and_then(|topics| serde_json::from_str::<Vec<String>>(&topics).ok())
            .unwrap_or_default();

        Ok(Some(profile))
    }

    pub fn save(&self, collection: &ProfileCollection) -> AppResult<()> {
        let profiles = serde_json::to_string(&collection.profiles)?;
        self.store.set_many(vec![
            (PROFILES_KEY.to_string(), profiles),
            (ACTIVE_PROFILE_KEY.to_string(), collection.active_index.to_string()),
        ])
    }

    pub fn clear(&self) -> AppResult<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::repositories::kv_store::{InMemoryStore, MockKeyValueStore};

    fn repository_with(entries: &[(&str, &str)]) -> ProfileRepository {
        let store = InMemoryStore::new();
        for (key, value) in entries {
            store.set(key, value).unwrap();
        }
        ProfileRepository::new(Arc::new(store))
    }

    #[test]
    fn empty_store_has_nothing() {
        let repository = repository_with(&[]);
        assert!(repository.find_collection().unwrap().is_none());
        assert!(repository.find_legacy_profile().unwrap().is_none());
    }

    #[test]
    fn save_then_find_round_trips_collection() {
        let repository = repository_with(&[]);
        let collection = ProfileCollection::new(
            vec![PlayerProfile::new("Nova Sage"), PlayerProfile::new("Logic Wiz")],
            1,
        );

        repository.save(&collection).unwrap();

        assert_eq!(repository.find_collection().unwrap(), Some(collection));
    }

    #[test]
    fn bad_active_index_falls_back_to_first_profile() {
        let repository = repository_with(&[
            (PROFILES_KEY, r#"[{"username":"a","xp":0,"level":1,"streak":0,"lastDate":null,"topics":[]}]"#),
            (ACTIVE_PROFILE_KEY, "NaN"),
        ]);

        let collection = repository.find_collection().unwrap().unwrap();
        assert_eq!(collection.active_index, 0);
    }

    #[test]
    fn corrupt_or_empty_collection_is_treated_as_missing() {
        assert!(repository_with(&[(PROFILES_KEY, "{oops")])
            .find_collection()
            .unwrap()
            .is_none());
        assert!(repository_with(&[(PROFILES_KEY, "[]")])
            .find_collection()
            .unwrap()
            .is_none());
    }

    #[test]
    fn legacy_profile_merges_topics() {
        let repository = repository_with(&[
            (LEGACY_STATS_KEY, r#"{"xp":120,"level":2,"streak":3,"lastDate":"Sat Oct 17 2026"}"#),
            (LEGACY_TOPICS_KEY, r#"["Cells","Atoms"]"#),
        ]);

        let profile = repository.find_legacy_profile().unwrap().unwrap();
        assert_eq!(profile.xp, 120);
        assert_eq!(profile.topics, vec!["Cells", "Atoms"]);
        assert_eq!(profile.username, "");
    }

    #[test]
    fn save_writes_both_keys_in_one_call() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_set_many()
            .withf(|entries| {
                entries.len() == 2
                    && entries[0].0 == PROFILES_KEY
                    && entries[1] == (ACTIVE_PROFILE_KEY.to_string(), "0".to_string())
            })
            .times(1)
            .returning(|_| Ok(()));
        store.expect_set().never();

        let repository = ProfileRepository::new(Arc::new(store));
        repository
            .save(&ProfileCollection::new(vec![PlayerProfile::new("a")], 0))
            .unwrap();
    }

    #[test]
    fn storage_errors_propagate() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(AppError::StorageError("disk gone".into())));

        let repository = ProfileRepository::new(Arc::new(store));
        let err = repository.find_collection().unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
