use chrono::NaiveDate;
use rand::{seq::SliceRandom, Rng};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{PlayerProfile, ProfileCollection, ResultSummary},
    repositories::ProfileRepository,
};

const NAME_PREFIXES: [&str; 10] = [
    "Quantum", "Cyber", "Atomic", "Prismatic", "Digital", "Logic", "Hyper", "Nova", "Cerebral",
    "Infinite",
];
const NAME_SUFFIXES: [&str; 10] = [
    "Scholar", "Explorer", "Sage", "Architect", "Alchemist", "Pioneer", "Wiz", "Master", "Seeker",
    "Mind",
];

/// A random "Prefix Suffix" player name.
pub fn generate_username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES.choose(rng).copied().unwrap_or("Quiz");
    let suffix = NAME_SUFFIXES.choose(rng).copied().unwrap_or("Player");
    format!("{} {}", prefix, suffix)
}

/// The gamification ledger. Every mutation is persisted before returning.
pub struct ProfileService {
    repository: ProfileRepository,
    collection: ProfileCollection,
}

impl ProfileService {
    /// Loads the saved profiles, migrating the single-profile layout or
    /// creating a first profile when needed. The result is persisted.
    pub fn load(repository: ProfileRepository) -> AppResult<Self> {
        let mut rng = rand::thread_rng();

        let mut collection = match repository.find_collection()? {
            Some(collection) => collection,
            None => match repository.find_legacy_profile()? {
                Some(profile) => {
                    log::info!("Migrating single-profile stats to the profile list");
                    ProfileCollection::new(vec![profile], 0)
                }
                None => {
                    let profile = PlayerProfile::new(generate_username(&mut rng));
                    log::info!("Creating first profile '{}'", profile.username);
                    ProfileCollection::new(vec![profile], 0)
                }
            },
        };

        for profile in collection.profiles.iter_mut() {
            profile.normalize();
            if profile.username.trim().is_empty() {
                profile.username = generate_username(&mut rng);
            }
        }

        repository.save(&collection)?;

        Ok(Self {
            repository,
            collection,
        })
    }

    pub fn collection(&self) -> &ProfileCollection {
        &self.collection
    }

    pub fn active(&self) -> AppResult<&PlayerProfile> {
        self.collection.active()
    }

    pub fn save(&self) -> AppResult<()> {
        self.repository.save(&self.collection)
    }

    pub fn check_streak(&mut self, today: NaiveDate) -> AppResult<u32> {
        let profile = self.collection.active_mut()?;
        let changed = profile.check_streak(today);
        let streak = profile.streak;
        if changed {
            self.save()?;
        }
        Ok(streak)
    }

    pub fn award_xp(&mut self, amount: u32) -> AppResult<&PlayerProfile> {
        let profile = self.collection.active_mut()?;
        let previous_level = profile.level;
        profile.award_xp(amount);
        if profile.level > previous_level {
            log::info!("'{}' reached level {}", profile.username, profile.level);
        }
        self.save()?;
        self.active()
    }

    pub fn record_result(&mut self, summary: &ResultSummary) -> AppResult<&PlayerProfile> {
        self.award_xp(summary.xp_awarded)
    }

    pub fn save_topic(&mut self, topic: &str) -> AppResult<bool> {
        let saved = self.collection.active_mut()?.save_topic(topic.trim());
        if saved {
            self.save()?;
        }
        Ok(saved)
    }

    pub fn delete_topic(&mut self, topic: &str) -> AppResult<bool> {
        let deleted = self.collection.active_mut()?.delete_topic(topic);
        if deleted {
            self.save()?;
        }
        Ok(deleted)
    }

    /// Adds a profile with a random name and makes it active.
    pub fn create_profile(&mut self) -> AppResult<&PlayerProfile> {
        let profile = PlayerProfile::new(generate_username(&mut rand::thread_rng()));
        log::info!("Creating profile '{}'", profile.username);

        self.collection.profiles.push(profile);
        self.collection.active_index = self.collection.len() - 1;
        self.save()?;
        self.active()
    }

    pub fn switch_profile(&mut self, index: usize) -> AppResult<&PlayerProfile> {
        if index >= self.collection.len() {
            return Err(AppError::InvalidProfileState(format!(
                "cannot switch to profile {}, only {} exist",
                index,
                self.collection.len()
            )));
        }

        self.collection.active_index = index;
        self.save()?;
        self.active()
    }

    /// Wipes every stored key and starts over with one fresh profile.
    pub fn reset_all(&mut self, today: NaiveDate) -> AppResult<&PlayerProfile> {
        log::warn!("Resetting all profile data");
        self.repository.clear()?;

        let mut profile = PlayerProfile::new(generate_username(&mut rand::thread_rng()));
        profile.check_streak(today);
        self.collection = ProfileCollection::new(vec![profile], 0);
        self.save()?;
        self.active()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::repositories::{
        profile_repository::{LEGACY_STATS_KEY, LEGACY_TOPICS_KEY, PROFILES_KEY},
        InMemoryStore, KeyValueStore,
    };

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new())
    }

    /// A session start: load, then record today's visit.
    fn load(store: &Arc<InMemoryStore>, today: NaiveDate) -> ProfileService {
        let mut service = ProfileService::load(ProfileRepository::new(store.clone())).unwrap();
        service.check_streak(today).unwrap();
        service
    }

    #[test]
    fn generated_names_use_known_words() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let name = generate_username(&mut rng);
            let (prefix, suffix) = name.split_once(' ').unwrap();
            assert!(NAME_PREFIXES.contains(&prefix));
            assert!(NAME_SUFFIXES.contains(&suffix));
        }
    }

    #[test]
    fn first_load_creates_and_persists_a_profile() {
        let store = store();
        let service = ProfileService::load(ProfileRepository::new(store.clone())).unwrap();

        let profile = service.active().unwrap();
        assert_eq!(service.collection().len(), 1);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.streak, 0);
        assert!(profile.topics.is_empty());
        assert!(!profile.username.is_empty());
        assert!(store.get(PROFILES_KEY).unwrap().is_some());
    }

    #[test]
    fn reload_keeps_state_and_counts_consecutive_days() {
        let store = store();
        let mut service = load(&store, day(2026, 10, 17));
        service.award_xp(140).unwrap();
        let name = service.active().unwrap().username.clone();

        let same_day = load(&store, day(2026, 10, 17));
        assert_eq!(same_day.active().unwrap().streak, 1);

        let next_day = load(&store, day(2026, 10, 18));
        let profile = next_day.active().unwrap();
        assert_eq!(profile.username, name);
        assert_eq!(profile.xp, 140);
        assert_eq!(profile.level, 2);
        assert_eq!(profile.streak, 2);

        let after_gap = load(&store, day(2026, 10, 21));
        assert_eq!(after_gap.active().unwrap().streak, 1);
    }

    #[test]
    fn legacy_layout_is_migrated() {
        let store = store();
        store
            .set(
                LEGACY_STATS_KEY,
                r#"{"username":null,"xp":250,"level":1,"streak":5,"lastDate":"Sat Oct 17 2026"}"#,
            )
            .unwrap();
        store.set(LEGACY_TOPICS_KEY, r#"["Cells"]"#).unwrap();

        let service = load(&store, day(2026, 10, 18));
        let profile = service.active().unwrap();

        assert_eq!(profile.xp, 250);
        assert_eq!(profile.level, 3);
        assert_eq!(profile.streak, 6);
        assert_eq!(profile.topics, vec!["Cells"]);
        assert!(!profile.username.is_empty());
    }

    #[test]
    fn profiles_can_be_created_and_switched() {
        let store = store();
        let mut service = load(&store, day(2026, 10, 18));
        service.award_xp(30).unwrap();

        service.create_profile().unwrap();
        assert_eq!(service.collection().active_index, 1);
        assert_eq!(service.active().unwrap().xp, 0);

        service.switch_profile(0).unwrap();
        assert_eq!(service.active().unwrap().xp, 30);

        let err = service.switch_profile(5).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROFILE_STATE");
        assert_eq!(service.collection().active_index, 0);

        let reloaded = load(&store, day(2026, 10, 18));
        assert_eq!(reloaded.collection().len(), 2);
        assert_eq!(reloaded.collection().active_index, 0);
    }

    #[test]
    fn topics_are_saved_and_deleted() {
        let store = store();
        let mut service = load(&store, day(2026, 10, 18));

        assert!(service.save_topic("  Photosynthesis ").unwrap());
        assert!(!service.save_topic("Photosynthesis").unwrap());
        assert!(!service.save_topic("ab").unwrap());
        assert!(service.delete_topic("Photosynthesis").unwrap());
        assert!(!service.delete_topic("Photosynthesis").unwrap());
    }

    #[test]
    fn reset_all_starts_over() {
        let store = store();
        let mut service = load(&store, day(2026, 10, 18));
        service.award_xp(500).unwrap();
        service.create_profile().unwrap();

        let profile = service.reset_all(day(2026, 10, 18)).unwrap();
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.streak, 1);
        assert_eq!(service.collection().len(), 1);
        assert!(store.get(LEGACY_STATS_KEY).unwrap().is_none());
    }

    #[test]
    fn record_result_awards_summary_xp() {
        let store = store();
        let mut service = load(&store, day(2026, 10, 18));
        let summary = ResultSummary {
            correct_count: 5,
            incorrect_count: 0,
            skipped_count: 0,
            percent: 100,
            xp_awarded: 100,
        };

        let profile = service.record_result(&summary).unwrap();
        assert_eq!(profile.xp, 100);
        assert_eq!(profile.level, 2);
    }
}
