//! SM-2 Spaced Repetition Algorithm
//!
//! Calculates the next review interval and easiness factor for a harvested
//! error based on how well the learner recalled the correction.
//!
//! - A failed recall (quality < 3) restarts the repetition sequence with a
//!   one-day interval.
//! - A successful recall advances the sequence: 1 day, 6 days, then the
//!   previous interval multiplied by the easiness factor.
//! - The easiness factor moves after every review and never drops below 1.3.

use chrono::{DateTime, Duration, Utc};

use super::models::{Quality, ReviewItem};

/// Minimum easiness factor allowed
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Result of calculating the next review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub interval_days: u32,
    pub easiness_factor: f64,
    pub repetition_count: u32,
    pub due_at: DateTime<Utc>,
}

/// Calculate the next schedule for `item` after a review of the given quality
pub fn calculate_next_review(item: &ReviewItem, quality: Quality, now: DateTime<Utc>) -> ReviewResult {
    let (repetition_count, interval_days) = if quality.is_passing() {
        let repetition_count = item.repetition_count + 1;
        let interval_days = match repetition_count {
            1 => 1,
            2 => 6,
            // Grow from the previous interval with the pre-review EF
            _ => ((item.interval_days as f64 * item.easiness_factor).round() as u32).max(1),
        };
        (repetition_count, interval_days)
    } else {
        (0, 1)
    };

    ReviewResult {
        interval_days,
        easiness_factor: next_easiness_factor(item.easiness_factor, quality),
        repetition_count,
        due_at: now
            .checked_add_signed(Duration::days(interval_days as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at 1.3
pub fn next_easiness_factor(easiness_factor: f64, quality: Quality) -> f64 {
    let miss = (Quality::MAX - quality.value()) as f64;
    let updated = easiness_factor + (0.1 - miss * (0.08 + miss * 0.02));
    updated.max(MIN_EASINESS_FACTOR)
}

/// The interval each quality rating (0-5) would produce for `item` at `now`.
/// Used to label answer buttons before the learner commits to one.
pub fn preview_intervals(item: &ReviewItem, now: DateTime<Utc>) -> [u32; 6] {
    let mut intervals = [0; 6];
    for quality in Quality::all() {
        intervals[quality.value() as usize] = calculate_next_review(item, quality, now).interval_days;
    }
    intervals
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
