//! Data models for recognition/production tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::WordKey;

/// Default number of focus words surfaced by the gap report
pub const DEFAULT_FOCUS_WORD_LIMIT: usize = 20;

/// What a learner can do with one word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyState {
    pub user_id: String,
    pub word: String,
    pub language: String,
    #[serde(default)]
    pub can_recognize: bool,
    #[serde(default)]
    pub can_produce: bool,
    #[serde(default)]
    pub recognition_count: u32,
    #[serde(default)]
    pub production_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_recognized_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_produced_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
}

impl VocabularyState {
    pub fn new(key: &WordKey, now: DateTime<Utc>) -> Self {
        Self {
            user_id: key.user_id.clone(),
            word: key.word.clone(),
            language: key.language.clone(),
            can_recognize: false,
            can_produce: false,
            recognition_count: 0,
            production_count: 0,
            last_recognized_at: None,
            last_produced_at: None,
            first_seen_at: now,
        }
    }

    /// Recognized but never produced
    pub fn is_gap(&self) -> bool {
        self.can_recognize && !self.can_produce
    }

    pub fn matches_language(&self, language: Option<&str>) -> bool {
        language.map_or(true, |lang| self.language == lang)
    }
}

/// A recognize-only word worth practicing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusWord {
    pub word: String,
    pub language: String,
    pub recognition_count: u32,
}

/// Recognition vs. production breakdown for a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionGap {
    pub recognize_only_count: usize,
    pub produce_only_count: usize,
    pub both_count: usize,
    /// Share of recognized words the learner cannot produce, 0-100
    pub gap_percentage: u32,
    /// Highest-exposure recognize-only words first
    pub focus_words: Vec<FocusWord>,
}

/// Vocabulary statistics for a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyStats {
    pub total_words: usize,
    pub recognized: usize,
    pub produced: usize,
    pub gap_words: usize,
}

/// round(recognize_only / (recognize_only + both) * 100), 0 with nothing recognized
pub fn gap_percentage(recognize_only: usize, both: usize) -> u32 {
    let recognized = recognize_only + both;
    if recognized == 0 {
        return 0;
    }
    (recognize_only as f64 / recognized as f64 * 100.0).round() as u32
}
