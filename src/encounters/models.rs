//! Data models for encounter tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::WordKey;

/// Encounters needed before a definition unlocks on its own
pub const DEFAULT_UNLOCK_THRESHOLD: u32 = 3;

/// Exposure history of one word for one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterRecord {
    pub user_id: String,
    pub word: String,
    pub language: String,
    pub encounter_count: u32,
    /// Once true, never reverts
    #[serde(default)]
    pub definition_unlocked: bool,
    #[serde(default)]
    pub self_discovered: bool,
    #[serde(default)]
    pub looked_up: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Most recent non-empty sentence the word was seen in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Most recent non-empty source (story, lesson) the word was seen in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl EncounterRecord {
    /// First sighting of a word
    pub fn first(key: &WordKey, now: DateTime<Utc>) -> Self {
        Self {
            user_id: key.user_id.clone(),
            word: key.word.clone(),
            language: key.language.clone(),
            encounter_count: 1,
            definition_unlocked: false,
            self_discovered: false,
            looked_up: false,
            first_seen_at: now,
            last_seen_at: now,
            context: None,
            source_id: None,
        }
    }

    /// Still locked and not yet at the threshold
    pub fn is_pending(&self, threshold: u32) -> bool {
        !self.definition_unlocked && self.encounter_count < threshold
    }

    pub fn matches_language(&self, language: Option<&str>) -> bool {
        language.map_or(true, |lang| self.language == lang)
    }
}

/// Filters for listing encounter records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub unlocked_only: bool,
}

/// Encounter statistics for a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterStats {
    pub total: usize,
    pub unlocked: usize,
    pub self_discovered: usize,
    pub looked_up: usize,
    /// Locked and still below the unlock threshold
    pub pending_unlock: usize,
}
