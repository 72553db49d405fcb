//! The three components wired over one store and one clock

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::{StorageBackend, TrackerConfig};
use crate::encounters::EncounterUnlocker;
use crate::error::Result;
use crate::keys::split_words;
use crate::review::{Quality, ReviewItem, ReviewScheduler};
use crate::store::{MemoryStore, RowStore, SqliteStore};
use crate::vocabulary::{GapAnalyzer, VocabularyState};

/// Outcome of a completed review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCompletion {
    pub item: ReviewItem,
    /// One production event per distinct word of the correct answer, on a passing recall
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub production: Vec<VocabularyState>,
}

/// Learner knowledge-state tracker.
///
/// The components never call each other; composition happens here.
pub struct Tracker {
    pub scheduler: ReviewScheduler,
    pub encounters: EncounterUnlocker,
    pub vocabulary: GapAnalyzer,
}

impl Tracker {
    /// Open the store configured in `config` and use the wall clock
    pub fn open(config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn RowStore> = match config.storage.backend {
            StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.database_path())?),
            StorageBackend::Memory => {
                log::warn!("Using in-memory store; nothing will be persisted");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(store, Arc::new(SystemClock), config))
    }

    pub fn with_store(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>, config: &TrackerConfig) -> Self {
        let shards = config.locks.shards;
        Self {
            scheduler: ReviewScheduler::new(Arc::clone(&store), Arc::clone(&clock), shards),
            encounters: EncounterUnlocker::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                config.encounters.unlock_threshold,
                shards,
            ),
            vocabulary: GapAnalyzer::new(store, clock, config.vocabulary.focus_word_limit, shards),
        }
    }

    /// Process a review and, if the recall passed, count each word of the
    /// correct answer as produced.
    ///
    /// The writes are independent per-key mutations. If a production write fails
    /// the review stays applied; re-read before retrying.
    pub fn complete_review(&self, item_id: &str, quality: i32) -> Result<ReviewCompletion> {
        let quality = Quality::try_from(quality)?;
        let item = self.scheduler.process_review(item_id, quality.into())?;

        let mut production = Vec::new();
        if quality.is_passing() {
            for word in split_words(&item.correct_answer) {
                production.push(
                    self.vocabulary
                        .record_production(&item.user_id, &word, &item.language)?,
                );
            }
        }

        Ok(ReviewCompletion { item, production })
    }
}
