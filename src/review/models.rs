//! Data models for the review scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Starting easiness factor for a newly harvested error
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// A harvested error scheduled for spaced repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub item_id: String,
    pub user_id: String,
    pub language: String,
    /// What the learner wrote
    pub original: String,
    /// The corrected form
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// SM-2 easiness factor, never below 1.3
    #[serde(default = "default_easiness_factor")]
    pub easiness_factor: f64,
    /// Current interval in days
    #[serde(default)]
    pub interval_days: u32,
    /// Consecutive successful reviews
    #[serde(default)]
    pub repetition_count: u32,
    /// When the item is due for review
    pub due_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn default_easiness_factor() -> f64 {
    DEFAULT_EASINESS_FACTOR
}

impl ReviewItem {
    /// Build an item in its first-review state, due immediately
    pub fn new(request: NewReviewItem, now: DateTime<Utc>) -> Self {
        Self {
            item_id: request.item_id,
            user_id: request.user_id,
            language: request.language,
            original: request.original,
            correct_answer: request.correct_answer,
            context: request.context,
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            interval_days: 0,
            repetition_count: 0,
            due_at: now,
            last_reviewed_at: None,
            created_at: now,
        }
    }

    /// Check if the item is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    pub fn matches_language(&self, language: Option<&str>) -> bool {
        language.map_or(true, |lang| self.language == lang)
    }
}

/// Request to start scheduling a harvested error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewItem {
    pub user_id: String,
    pub item_id: String,
    pub language: String,
    pub original: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// SM-2 recall quality, 0 (blackout) to 5 (perfect)
///
/// - 0: Complete blackout, no recall
/// - 1: Incorrect, but upon seeing answer, remembered
/// - 2: Incorrect, but answer seemed easy to recall
/// - 3: Correct response with serious difficulty
/// - 4: Correct response after hesitation
/// - 5: Perfect response with no hesitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Qualities 3 and above count as a successful recall
    pub fn is_passing(self) -> bool {
        self.0 >= 3
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Every valid quality, lowest first
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=Self::MAX).map(Quality)
    }
}

impl TryFrom<i32> for Quality {
    type Error = TrackerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (0..=Self::MAX as i32).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(TrackerError::InvalidQuality(value))
        }
    }
}

impl From<Quality> for i32 {
    fn from(q: Quality) -> Self {
        q.0 as i32
    }
}

/// Review statistics for a user (optionally one language)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub due_count: usize,
    pub total_count: usize,
    /// Mean interval in days over all items
    pub average_interval: f64,
}
