//! Review scheduler: owns the `review_items` table

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::keys::{non_empty, required};
use crate::store::{Collection, KeyLocks, RowStore, Table};

use super::algorithm::{calculate_next_review, preview_intervals, ReviewResult};
use super::models::*;

/// Spaced-repetition schedule for harvested errors
pub struct ReviewScheduler {
    items: Collection<ReviewItem>,
    locks: KeyLocks,
    clock: Arc<dyn Clock>,
}

impl ReviewScheduler {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>, lock_shards: usize) -> Self {
        Self {
            items: Collection::new(store, Table::ReviewItems),
            locks: KeyLocks::new(lock_shards),
            clock,
        }
    }

    /// Start scheduling a newly harvested error. It is due immediately.
    pub fn record_new_item(&self, request: NewReviewItem) -> Result<ReviewItem> {
        let request = NewReviewItem {
            user_id: required("userId", &request.user_id)?,
            item_id: required("itemId", &request.item_id)?,
            language: required("language", &request.language)?,
            original: required("original", &request.original)?,
            correct_answer: required("correctAnswer", &request.correct_answer)?,
            context: non_empty(request.context.as_deref()),
        };

        let _guard = self.locks.lock(&request.item_id);
        let item = ReviewItem::new(request, self.clock.now());
        if !self.items.insert(&item.item_id, &item.user_id, &item)? {
            return Err(TrackerError::DuplicateItem(item.item_id));
        }

        log::info!(
            "Scheduled review item {} for user {} ({})",
            item.item_id,
            item.user_id,
            item.language
        );
        Ok(item)
    }

    /// Get a specific item
    pub fn get_item(&self, item_id: &str) -> Result<ReviewItem> {
        let item_id = required("itemId", item_id)?;
        self.items
            .get(&item_id)?
            .ok_or_else(|| TrackerError::NotFound(format!("Review item {}", item_id)))
    }

    /// All items due now, oldest-due first (ties by item id)
    pub fn get_due_items(&self, user_id: &str, language: Option<&str>) -> Result<Vec<ReviewItem>> {
        let user_id = required("userId", user_id)?;
        let language = non_empty(language);
        let now = self.clock.now();
        let mut due: Vec<ReviewItem> = self
            .items
            .scan(&user_id)?
            .into_iter()
            .filter(|item| item.matches_language(language.as_deref()) && item.is_due(now))
            .collect();

        due.sort_by(|a, b| {
            a.due_at
                .cmp(&b.due_at)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        Ok(due)
    }

    /// Apply a review of the given quality (0-5) and reschedule the item
    pub fn process_review(&self, item_id: &str, quality: i32) -> Result<ReviewItem> {
        let quality = Quality::try_from(quality).map_err(|err| {
            log::warn!("Rejected review of {}: {}", item_id, err);
            err
        })?;

        let item_id = required("itemId", item_id)?;
        let _guard = self.locks.lock(&item_id);
        // Owner never changes, so reading it outside the update is safe.
        let owner = self.get_item(&item_id)?.user_id;

        let item = self.items.update(&item_id, &owner, |current| {
            let mut item = current
                .ok_or_else(|| TrackerError::NotFound(format!("Review item {}", item_id)))?;
            let now = self.clock.now();

            let ReviewResult {
                interval_days,
                easiness_factor,
                repetition_count,
                due_at,
            } = calculate_next_review(&item, quality, now);

            item.interval_days = interval_days;
            item.easiness_factor = easiness_factor;
            item.repetition_count = repetition_count;
            item.due_at = due_at;
            item.last_reviewed_at = Some(now);
            Ok::<_, TrackerError>(item)
        })?;

        log::debug!(
            "Reviewed {} with quality {}: interval {}d, EF {:.2}, reps {}",
            item.item_id,
            quality.value(),
            item.interval_days,
            item.easiness_factor,
            item.repetition_count
        );
        Ok(item)
    }

    /// The interval each quality (0-5) would give `item` if reviewed now
    pub fn preview_intervals(&self, item: &ReviewItem) -> [u32; 6] {
        preview_intervals(item, self.clock.now())
    }

    /// Get review statistics for a user (optionally filtered by language)
    pub fn get_stats(&self, user_id: &str, language: Option<&str>) -> Result<ReviewStats> {
        let user_id = required("userId", user_id)?;
        let language = non_empty(language);
        let now = self.clock.now();
        let items: Vec<ReviewItem> = self
            .items
            .scan(&user_id)?
            .into_iter()
            .filter(|item| item.matches_language(language.as_deref()))
            .collect();

        let mut stats = ReviewStats {
            total_count: items.len(),
            ..ReviewStats::default()
        };
        stats.due_count = items.iter().filter(|item| item.is_due(now)).count();
        if !items.is_empty() {
            let total: u64 = items.iter().map(|item| item.interval_days as u64).sum();
            stats.average_interval = total as f64 / items.len() as f64;
        }

        Ok(stats)
    }
}
