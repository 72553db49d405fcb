//! Encounter unlocker: owns the `encounters` table

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::keys::{non_empty, required, WordKey};
use crate::store::{Collection, KeyLocks, RowStore, Table};

use super::models::*;

/// Which explicit action unlocked a definition
#[derive(Debug, Clone, Copy)]
enum UnlockAction {
    LookedUp,
    SelfDiscovered,
}

/// Counts exposures to words and unlocks definitions progressively
pub struct EncounterUnlocker {
    records: Collection<EncounterRecord>,
    locks: KeyLocks,
    clock: Arc<dyn Clock>,
    unlock_threshold: u32,
}

impl EncounterUnlocker {
    pub fn new(
        store: Arc<dyn RowStore>,
        clock: Arc<dyn Clock>,
        unlock_threshold: u32,
        lock_shards: usize,
    ) -> Self {
        Self {
            records: Collection::new(store, Table::Encounters),
            locks: KeyLocks::new(lock_shards),
            clock,
            unlock_threshold: unlock_threshold.max(1),
        }
    }

    pub fn unlock_threshold(&self) -> u32 {
        self.unlock_threshold
    }

    /// Record one exposure to a word.
    ///
    /// Context and source are only replaced by non-empty values. Reaching the
    /// threshold unlocks the definition.
    pub fn record_encounter(
        &self,
        user_id: &str,
        word: &str,
        language: &str,
        context: Option<&str>,
        source_id: Option<&str>,
    ) -> Result<EncounterRecord> {
        let key = WordKey::new(user_id, word, language)?;
        let row_key = key.row_key();
        let now = self.clock.now();

        let context = non_empty(context);
        let source_id = non_empty(source_id);
        let threshold = self.unlock_threshold;

        let _guard = self.locks.lock(&row_key);
        let record = self.records.update(&row_key, &key.user_id, |current| {
            let mut record = match current {
                Some(mut existing) => {
                    existing.encounter_count = existing.encounter_count.saturating_add(1);
                    existing.last_seen_at = now;
                    existing
                }
                None => EncounterRecord::first(&key, now),
            };

            if context.is_some() {
                record.context = context;
            }
            if source_id.is_some() {
                record.source_id = source_id;
            }

            if !record.definition_unlocked && record.encounter_count >= threshold {
                record.definition_unlocked = true;
                log::info!(
                    "Unlocked definition of '{}' ({}) for user {} after {} encounters",
                    record.word,
                    record.language,
                    record.user_id,
                    record.encounter_count
                );
            }
            Ok::<_, TrackerError>(record)
        })?;

        log::debug!(
            "Encounter {} of '{}' ({}) for user {}",
            record.encounter_count,
            record.word,
            record.language,
            record.user_id
        );
        Ok(record)
    }

    /// The learner looked the word up: unlock regardless of encounter count
    pub fn mark_looked_up(&self, user_id: &str, word: &str, language: &str) -> Result<EncounterRecord> {
        self.unlock(user_id, word, language, UnlockAction::LookedUp)
    }

    /// The learner inferred the meaning: unlock regardless of encounter count
    pub fn mark_self_discovered(
        &self,
        user_id: &str,
        word: &str,
        language: &str,
    ) -> Result<EncounterRecord> {
        self.unlock(user_id, word, language, UnlockAction::SelfDiscovered)
    }

    fn unlock(
        &self,
        user_id: &str,
        word: &str,
        language: &str,
        action: UnlockAction,
    ) -> Result<EncounterRecord> {
        let key = WordKey::new(user_id, word, language)?;
        let row_key = key.row_key();

        let _guard = self.locks.lock(&row_key);
        let record = self.records.update(&row_key, &key.user_id, |current| {
            // An explicit unlock implies a prior encounter; never create a row here.
            let mut record = current.ok_or_else(|| {
                TrackerError::NotFound(format!(
                    "No encounter of '{}' ({}) for user {}",
                    key.word, key.language, key.user_id
                ))
            })?;

            match action {
                UnlockAction::LookedUp => record.looked_up = true,
                UnlockAction::SelfDiscovered => record.self_discovered = true,
            }
            record.definition_unlocked = true;
            Ok::<_, TrackerError>(record)
        })?;

        log::debug!("{:?} '{}' ({}) for user {}", action, record.word, record.language, record.user_id);
        Ok(record)
    }

    /// Get the record for a word, if it has ever been encountered
    pub fn get_record(&self, user_id: &str, word: &str, language: &str) -> Result<Option<EncounterRecord>> {
        let key = WordKey::new(user_id, word, language)?;
        Ok(self.records.get(&key.row_key())?)
    }

    /// List a user's records, most recently seen first
    pub fn list_records(&self, user_id: &str, options: &ListOptions) -> Result<Vec<EncounterRecord>> {
        let user_id = required("userId", user_id)?;
        let language = non_empty(options.language.as_deref());
        let mut records: Vec<EncounterRecord> = self
            .records
            .scan(&user_id)?
            .into_iter()
            .filter(|r| r.matches_language(language.as_deref()))
            .filter(|r| !options.unlocked_only || r.definition_unlocked)
            .collect();

        records.sort_by(|a, b| {
            b.last_seen_at
                .cmp(&a.last_seen_at)
                .then_with(|| a.word.cmp(&b.word))
        });
        Ok(records)
    }

    /// Get encounter statistics for a user (optionally filtered by language)
    pub fn get_stats(&self, user_id: &str, language: Option<&str>) -> Result<EncounterStats> {
        let user_id = required("userId", user_id)?;
        let language = non_empty(language);
        let mut stats = EncounterStats::default();

        for record in self.records.scan(&user_id)? {
            if !record.matches_language(language.as_deref()) {
                continue;
            }
            stats.total += 1;
            if record.definition_unlocked {
                stats.unlocked += 1;
            }
            if record.self_discovered {
                stats.self_discovered += 1;
            }
            if record.looked_up {
                stats.looked_up += 1;
            }
            if record.is_pending(self.unlock_threshold) {
                stats.pending_unlock += 1;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStore, SqliteStore};

    fn create_test_unlocker() -> (EncounterUnlocker, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let unlocker = EncounterUnlocker::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            DEFAULT_UNLOCK_THRESHOLD,
            16,
        );
        (unlocker, clock)
    }

    #[test]
    fn test_first_encounter_creates_record() {
        let (unlocker, clock) = create_test_unlocker();

        let record = unlocker
            .record_encounter("u1", "mama", "pl", Some("Mama gotuje."), Some("story-1"))
            .unwrap();

        assert_eq!(record.encounter_count, 1);
        assert!(!record.definition_unlocked);
        assert_eq!(record.first_seen_at, clock.now());
        assert_eq!(record.last_seen_at, clock.now());
        assert_eq!(record.context.as_deref(), Some("Mama gotuje."));
        assert_eq!(record.source_id.as_deref(), Some("story-1"));
    }

    #[test]
    fn test_third_encounter_unlocks() {
        let (unlocker, _clock) = create_test_unlocker();

        let first = unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
        assert!(!first.definition_unlocked);
        let second = unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
        assert!(!second.definition_unlocked);
        let third = unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
        assert!(third.definition_unlocked);

        assert_eq!(third.encounter_count, 3);
        assert!(!third.looked_up);
        assert!(!third.self_discovered);

        for _ in 0..3 {
            let later = unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
            assert!(later.definition_unlocked);
        }
    }

    #[test]
    fn test_encounter_updates_last_seen_and_keeps_context() {
        let (unlocker, clock) = create_test_unlocker();
        let first = unlocker
            .record_encounter("u1", "mama", "pl", Some("Mama gotuje."), Some("story-1"))
            .unwrap();

        clock.advance(Duration::minutes(5));
        let second = unlocker.record_encounter("u1", "Mama", "pl", Some("  "), None).unwrap();

        assert_eq!(second.encounter_count, 2);
        assert_eq!(second.first_seen_at, first.first_seen_at);
        assert_eq!(second.last_seen_at, clock.now());
        assert_eq!(second.context.as_deref(), Some("Mama gotuje."));
        assert_eq!(second.source_id.as_deref(), Some("story-1"));

        let third = unlocker
            .record_encounter("u1", "mama", "pl", Some("Gdzie jest mama?"), Some("story-2"))
            .unwrap();
        assert_eq!(third.context.as_deref(), Some("Gdzie jest mama?"));
        assert_eq!(third.source_id.as_deref(), Some("story-2"));
    }

    #[test]
    fn test_mark_looked_up_unlocks_immediately() {
        let (unlocker, _clock) = create_test_unlocker();
        unlocker.record_encounter("u1", "kot", "pl", None, None).unwrap();

        let record = unlocker.mark_looked_up("u1", "kot", "pl").unwrap();

        assert!(record.looked_up);
        assert!(record.definition_unlocked);
        assert!(!record.self_discovered);
        assert_eq!(record.encounter_count, 1);
    }

    #[test]
    fn test_mark_self_discovered_unlocks_immediately() {
        let (unlocker, _clock) = create_test_unlocker();
        unlocker.record_encounter("u1", "kot", "pl", None, None).unwrap();

        let record = unlocker.mark_self_discovered("u1", "kot", "pl").unwrap();

        assert!(record.self_discovered);
        assert!(record.definition_unlocked);
        assert!(!record.looked_up);
    }

    #[test]
    fn test_unlock_unseen_word_is_not_found() {
        let (unlocker, _clock) = create_test_unlocker();

        assert!(matches!(
            unlocker.mark_looked_up("u1", "pies", "pl"),
            Err(TrackerError::NotFound(_))
        ));
        assert!(matches!(
            unlocker.mark_self_discovered("u1", "pies", "pl"),
            Err(TrackerError::NotFound(_))
        ));
        assert_eq!(unlocker.get_record("u1", "pies", "pl").unwrap(), None);
    }

    #[test]
    fn test_unlock_survives_later_encounters() {
        let (unlocker, _clock) = create_test_unlocker();
        unlocker.record_encounter("u1", "kot", "pl", None, None).unwrap();
        unlocker.mark_looked_up("u1", "kot", "pl").unwrap();

        let record = unlocker.record_encounter("u1", "kot", "pl", None, None).unwrap();
        assert!(record.definition_unlocked);
        assert!(record.looked_up);
    }

    #[test]
    fn test_list_records_order_and_filters() {
        let (unlocker, clock) = create_test_unlocker();
        unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
        clock.advance(Duration::seconds(1));
        unlocker.record_encounter("u1", "casa", "es", None, None).unwrap();
        clock.advance(Duration::seconds(1));
        unlocker.record_encounter("u1", "kot", "pl", None, None).unwrap();
        unlocker.mark_looked_up("u1", "kot", "pl").unwrap();
        unlocker.record_encounter("u2", "mama", "pl", None, None).unwrap();

        let all = unlocker.list_records("u1", &ListOptions::default()).unwrap();
        let words: Vec<&str> = all.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["kot", "casa", "mama"]);

        let polish = unlocker
            .list_records(
                "u1",
                &ListOptions {
                    language: Some("pl".to_string()),
                    unlocked_only: false,
                },
            )
            .unwrap();
        assert_eq!(polish.len(), 2);

        let unlocked = unlocker
            .list_records(
                "u1",
                &ListOptions {
                    language: None,
                    unlocked_only: true,
                },
            )
            .unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].word, "kot");
    }

    #[test]
    fn test_get_stats() {
        let (unlocker, _clock) = create_test_unlocker();
        for _ in 0..3 {
            unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
        }
        unlocker.record_encounter("u1", "kot", "pl", None, None).unwrap();
        unlocker.mark_looked_up("u1", "kot", "pl").unwrap();
        unlocker.record_encounter("u1", "pies", "pl", None, None).unwrap();
        unlocker.mark_self_discovered("u1", "pies", "pl").unwrap();
        unlocker.record_encounter("u1", "dom", "pl", None, None).unwrap();
        unlocker.record_encounter("u1", "casa", "es", None, None).unwrap();

        let stats = unlocker.get_stats("u1", Some("pl")).unwrap();
        assert_eq!(
            stats,
            EncounterStats {
                total: 4,
                unlocked: 3,
                self_discovered: 1,
                looked_up: 1,
                pending_unlock: 1,
            }
        );

        let all = unlocker.get_stats("u1", None).unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.pending_unlock, 2);
        assert_eq!(unlocker.get_stats("u1", None).unwrap(), all);
    }

    #[test]
    fn test_untrimmed_user_and_language_on_reads() {
        let (unlocker, _clock) = create_test_unlocker();
        unlocker.record_encounter(" u1", "mama", "pl ", None, None).unwrap();

        assert!(unlocker.get_record(" u1", "mama", "pl").unwrap().is_some());
        assert_eq!(unlocker.list_records(" u1", &ListOptions::default()).unwrap().len(), 1);
        let polish = ListOptions {
            language: Some(" pl ".to_string()),
            unlocked_only: false,
        };
        assert_eq!(unlocker.list_records("u1", &polish).unwrap().len(), 1);
        assert_eq!(unlocker.get_stats("u1 ", Some("pl ")).unwrap().total, 1);
        assert!(matches!(
            unlocker.list_records("  ", &ListOptions::default()),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_encounters_from_separate_sqlite_trackers_do_not_interleave() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("lexis.db");
        let open = |path: &std::path::Path| {
            EncounterUnlocker::new(
                Arc::new(SqliteStore::open(path).unwrap()),
                Arc::new(ManualClock::new(Utc::now())),
                DEFAULT_UNLOCK_THRESHOLD,
                16,
            )
        };
        open(&db_path).record_encounter("u1", "mama", "pl", None, None).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db_path = db_path.clone();
                thread::spawn(move || {
                    let unlocker = open(&db_path);
                    for _ in 0..30 {
                        unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let record = open(&db_path).get_record("u1", "mama", "pl").unwrap().unwrap();
        assert_eq!(record.encounter_count, 121);
        assert!(record.definition_unlocked);
    }

    #[test]
    fn test_configured_threshold() {
        let unlocker = EncounterUnlocker::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
            1,
            4,
        );
        let record = unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
        assert!(record.definition_unlocked);
    }

    #[test]
    fn test_concurrent_encounters_do_not_lose_updates() {
        let (unlocker, _clock) = create_test_unlocker();
        let unlocker = Arc::new(unlocker);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let unlocker = Arc::clone(&unlocker);
                thread::spawn(move || {
                    for _ in 0..25 {
                        unlocker.record_encounter("u1", "mama", "pl", None, None).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let record = unlocker.get_record("u1", "mama", "pl").unwrap().unwrap();
        assert_eq!(record.encounter_count, 200);
        assert!(record.definition_unlocked);
    }
}
