use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{AppError, AppResult};

pub const XP_PER_LEVEL: u32 = 100;
pub const MAX_TOPICS: usize = 6;
pub const MIN_TOPIC_CHARS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerProfile {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(default)]
    pub xp: u32,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(rename = "lastDate", default, with = "profile_date")]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

fn first_level() -> u32 {
    1
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

impl PlayerProfile {
    pub fn new(username: impl Into<String>) -> Self {
        PlayerProfile {
            username: username.into(),
            xp: 0,
            level: 1,
            streak: 0,
            last_active_date: None,
            topics: Vec::new(),
        }
    }

    /// Updates the daily streak for a visit on `today`. Returns whether the
    /// profile changed.
    pub fn check_streak(&mut self, today: NaiveDate) -> bool {
        if self.last_active_date == Some(today) {
            return false;
        }

        let yesterday = today.pred_opt();
        if yesterday.is_some() && self.last_active_date == yesterday {
            self.streak += 1;
        } else {
            self.streak = 1;
        }

        self.last_active_date = Some(today);
        true
    }

    pub fn award_xp(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for_xp(self.xp);
    }

    /// XP earned inside the current level, `0..100`.
    pub fn xp_into_level(&self) -> u32 {
        self.xp % XP_PER_LEVEL
    }

    /// Remembers a topic at the front of the history. Short or already known
    /// topics are ignored.
    pub fn save_topic(&mut self, topic: &str) -> bool {
        if topic.chars().count() < MIN_TOPIC_CHARS || self.topics.iter().any(|t| t == topic) {
            return false;
        }

        self.topics.insert(0, topic.to_string());
        self.topics.truncate(MAX_TOPICS);
        true
    }

    pub fn delete_topic(&mut self, topic: &str) -> bool {
        let before = self.topics.len();
        self.topics.retain(|t| t != topic);
        self.topics.len() != before
    }

    /// Repairs fields that older saves may have left inconsistent.
    pub fn normalize(&mut self) {
        self.level = level_for_xp(self.xp);
        let mut seen = Vec::with_capacity(self.topics.len());
        self.topics.retain(|t| {
            if seen.contains(t) {
                false
            } else {
                seen.push(t.clone());
                true
            }
        });
        self.topics.truncate(MAX_TOPICS);
    }
}

/// Every profile on this device plus the one currently in use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileCollection {
    pub profiles: Vec<PlayerProfile>,
    pub active_index: usize,
}

impl ProfileCollection {
    pub fn new(profiles: Vec<PlayerProfile>, active_index: usize) -> Self {
        let active_index = if active_index < profiles.len() { active_index } else { 0 };
        ProfileCollection {
            profiles,
            active_index,
        }
    }

    pub fn active(&self) -> AppResult<&PlayerProfile> {
        self.profiles
            .get(self.active_index)
            .ok_or_else(|| no_active_profile(self.active_index))
    }

    pub fn active_mut(&mut self) -> AppResult<&mut PlayerProfile> {
        let index = self.active_index;
        self.profiles
            .get_mut(index)
            .ok_or_else(|| no_active_profile(index))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn no_active_profile(index: usize) -> AppError {
    AppError::InvalidProfileState(format!("no profile at index {}", index))
}

/// `lastDate` is stored as `YYYY-MM-DD`; older saves used the browser's
/// `Date.toDateString()` form (`Sun Oct 18 2026`).
mod profile_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const ISO_FORMAT: &str = "%Y-%m-%d";
    const LEGACY_FORMAT: &str = "%a %b %d %Y";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(ISO_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| parse(&s)))
    }

    pub fn parse(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        let parsed = NaiveDate::parse_from_str(value, ISO_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(value, LEGACY_FORMAT))
            .ok();
        if parsed.is_none() && !value.is_empty() {
            log::warn!("Ignoring unreadable profile date '{}'", value);
        }
        parsed
    }
}
