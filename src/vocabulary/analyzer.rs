//! Gap analyzer: owns the `vocabulary_states` table

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::keys::{non_empty, required, WordKey};
use crate::store::{Collection, KeyLocks, RowStore, Table};

use super::models::*;

#[derive(Debug, Clone, Copy)]
enum Skill {
    Recognition,
    Production,
}

/// Tracks recognition and production per word and reports the gap between them
pub struct GapAnalyzer {
    states: Collection<VocabularyState>,
    locks: KeyLocks,
    clock: Arc<dyn Clock>,
    focus_word_limit: usize,
}

impl GapAnalyzer {
    pub fn new(
        store: Arc<dyn RowStore>,
        clock: Arc<dyn Clock>,
        focus_word_limit: usize,
        lock_shards: usize,
    ) -> Self {
        Self {
            states: Collection::new(store, Table::VocabularyStates),
            locks: KeyLocks::new(lock_shards),
            clock,
            focus_word_limit: focus_word_limit.max(1),
        }
    }

    /// The learner recognized the word (e.g. understood it while reading)
    pub fn record_recognition(&self, user_id: &str, word: &str, language: &str) -> Result<VocabularyState> {
        self.record(user_id, word, language, Skill::Recognition)
    }

    /// The learner produced the word (e.g. wrote it correctly)
    pub fn record_production(&self, user_id: &str, word: &str, language: &str) -> Result<VocabularyState> {
        self.record(user_id, word, language, Skill::Production)
    }

    fn record(&self, user_id: &str, word: &str, language: &str, skill: Skill) -> Result<VocabularyState> {
        let key = WordKey::new(user_id, word, language)?;
        let row_key = key.row_key();
        let now = self.clock.now();

        let _guard = self.locks.lock(&row_key);
        let state = self.states.update(&row_key, &key.user_id, |current| {
            let mut state = current.unwrap_or_else(|| VocabularyState::new(&key, now));
            match skill {
                Skill::Recognition => {
                    state.can_recognize = true;
                    state.recognition_count = state.recognition_count.saturating_add(1);
                    state.last_recognized_at = Some(now);
                }
                Skill::Production => {
                    state.can_produce = true;
                    state.production_count = state.production_count.saturating_add(1);
                    state.last_produced_at = Some(now);
                }
            }
            Ok::<_, TrackerError>(state)
        })?;

        log::debug!(
            "{:?} of '{}' ({}) for user {}: recognized {}x, produced {}x",
            skill,
            state.word,
            state.language,
            state.user_id,
            state.recognition_count,
            state.production_count
        );
        Ok(state)
    }

    /// Get the state of a word, if any event was recorded for it
    pub fn get_state(&self, user_id: &str, word: &str, language: &str) -> Result<Option<VocabularyState>> {
        let key = WordKey::new(user_id, word, language)?;
        Ok(self.states.get(&key.row_key())?)
    }

    /// Recognition vs. production breakdown with the words most worth practicing
    pub fn get_production_gap(&self, user_id: &str, language: Option<&str>) -> Result<ProductionGap> {
        let user_id = required("userId", user_id)?;
        let language = non_empty(language);
        let mut gap = ProductionGap::default();
        let mut focus: Vec<VocabularyState> = Vec::new();

        for state in self.states.scan(&user_id)? {
            if !state.matches_language(language.as_deref()) {
                continue;
            }
            match (state.can_recognize, state.can_produce) {
                (true, false) => {
                    gap.recognize_only_count += 1;
                    focus.push(state);
                }
                (false, true) => gap.produce_only_count += 1,
                (true, true) => gap.both_count += 1,
                (false, false) => {}
            }
        }

        gap.gap_percentage = gap_percentage(gap.recognize_only_count, gap.both_count);

        focus.sort_by(|a, b| {
            b.recognition_count
                .cmp(&a.recognition_count)
                .then_with(|| a.word.cmp(&b.word))
                .then_with(|| a.language.cmp(&b.language))
        });
        gap.focus_words = focus
            .into_iter()
            .take(self.focus_word_limit)
            .map(|state| FocusWord {
                word: state.word,
                language: state.language,
                recognition_count: state.recognition_count,
            })
            .collect();

        Ok(gap)
    }

    /// Get vocabulary statistics for a user (optionally filtered by language)
    pub fn get_stats(&self, user_id: &str, language: Option<&str>) -> Result<VocabularyStats> {
        let user_id = required("userId", user_id)?;
        let language = non_empty(language);
        let mut stats = VocabularyStats::default();

        for state in self.states.scan(&user_id)? {
            if !state.matches_language(language.as_deref()) {
                continue;
            }
            stats.total_words += 1;
            if state.can_recognize {
                stats.recognized += 1;
            }
            if state.can_produce {
                stats.produced += 1;
            }
            if state.is_gap() {
                stats.gap_words += 1;
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

    fn create_test_analyzer() -> (GapAnalyzer, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let analyzer = GapAnalyzer::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            DEFAULT_FOCUS_WORD_LIMIT,
            16,
        );
        (analyzer, clock)
    }

    #[test]
    fn test_record_recognition_creates_state() {
        let (analyzer, clock) = create_test_analyzer();

        let state = analyzer.record_recognition("u1", "perro", "es").unwrap();

        assert!(state.can_recognize);
        assert!(!state.can_produce);
        assert_eq!(state.recognition_count, 1);
        assert_eq!(state.production_count, 0);
        assert_eq!(state.last_recognized_at, Some(clock.now()));
        assert!(state.last_produced_at.is_none());
    }

    #[test]
    fn test_production_upserts_same_row() {
        let (analyzer, clock) = create_test_analyzer();
        analyzer.record_recognition("u1", "perro", "es").unwrap();
        clock.advance(Duration::minutes(1));

        let state = analyzer.record_production("u1", "Perro", "es").unwrap();

        assert!(state.can_recognize);
        assert!(state.can_produce);
        assert_eq!(state.recognition_count, 1);
        assert_eq!(state.production_count, 1);
        assert_eq!(state.last_produced_at, Some(clock.now()));
        assert!(state.last_recognized_at < state.last_produced_at);
        assert_eq!(analyzer.get_stats("u1", None).unwrap().total_words, 1);
    }

    #[test]
    fn test_gap_is_zero_with_nothing_recognized() {
        let (analyzer, _clock) = create_test_analyzer();
        assert_eq!(analyzer.get_production_gap("u1", None).unwrap(), ProductionGap::default());

        analyzer.record_production("u1", "gato", "es").unwrap();
        let gap = analyzer.get_production_gap("u1", None).unwrap();
        assert_eq!(gap.gap_percentage, 0);
        assert_eq!(gap.produce_only_count, 1);
    }

    #[test]
    fn test_recognized_never_produced_is_focus_word() {
        let (analyzer, _clock) = create_test_analyzer();
        for _ in 0..5 {
            analyzer.record_recognition("u1", "mariposa", "es").unwrap();
        }

        let gap = analyzer.get_production_gap("u1", None).unwrap();

        assert_eq!(gap.gap_percentage, 100);
        assert_eq!(gap.recognize_only_count, 1);
        assert_eq!(
            gap.focus_words,
            vec![FocusWord {
                word: "mariposa".to_string(),
                language: "es".to_string(),
                recognition_count: 5,
            }]
        );
    }

    #[test]
    fn test_gap_breakdown() {
        let (analyzer, _clock) = create_test_analyzer();
        analyzer.record_recognition("u1", "casa", "es").unwrap();
        analyzer.record_recognition("u1", "perro", "es").unwrap();
        analyzer.record_production("u1", "perro", "es").unwrap();
        analyzer.record_recognition("u1", "gato", "es").unwrap();
        analyzer.record_production("u1", "gato", "es").unwrap();
        analyzer.record_production("u1", "hola", "es").unwrap();
        analyzer.record_recognition("u1", "kot", "pl").unwrap();

        let gap = analyzer.get_production_gap("u1", Some("es")).unwrap();
        assert_eq!(gap.recognize_only_count, 1);
        assert_eq!(gap.both_count, 2);
        assert_eq!(gap.produce_only_count, 1);
        assert_eq!(gap.gap_percentage, 33);

        let all = analyzer.get_production_gap("u1", None).unwrap();
        assert_eq!(all.recognize_only_count, 2);
        assert_eq!(all.gap_percentage, 50);
    }

    #[test]
    fn test_focus_words_ranked_and_limited() {
        let analyzer = GapAnalyzer::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
            3,
            16,
        );
        for (word, times) in [("uno", 1), ("dos", 4), ("tres", 2), ("cuatro", 4), ("cinco", 3)] {
            for _ in 0..times {
                analyzer.record_recognition("u1", word, "es").unwrap();
            }
        }
        analyzer.record_production("u1", "cinco", "es").unwrap();

        let gap = analyzer.get_production_gap("u1", None).unwrap();
        let words: Vec<&str> = gap.focus_words.iter().map(|f| f.word.as_str()).collect();
        assert_eq!(words, vec!["cuatro", "dos", "tres"]);
        assert_eq!(gap.recognize_only_count, 4);
    }

    #[test]
    fn test_default_focus_limit_is_twenty() {
        let (analyzer, _clock) = create_test_analyzer();
        for i in 0..25 {
            analyzer.record_recognition("u1", &format!("word{:02}", i), "es").unwrap();
        }

        let gap = analyzer.get_production_gap("u1", None).unwrap();
        assert_eq!(gap.focus_words.len(), 20);
        assert_eq!(gap.recognize_only_count, 25);
    }

    #[test]
    fn test_get_stats_idempotent() {
        let (analyzer, _clock) = create_test_analyzer();
        analyzer.record_recognition("u1", "casa", "es").unwrap();
        analyzer.record_recognition("u1", "perro", "es").unwrap();
        analyzer.record_production("u1", "perro", "es").unwrap();
        analyzer.record_production("u1", "hola", "es").unwrap();

        let stats = analyzer.get_stats("u1", None).unwrap();
        assert_eq!(
            stats,
            VocabularyStats {
                total_words: 3,
                recognized: 2,
                produced: 2,
                gap_words: 1,
            }
        );
        assert_eq!(analyzer.get_stats("u1", None).unwrap(), stats);
        assert_eq!(analyzer.get_stats("u2", None).unwrap(), VocabularyStats::default());
    }

    #[test]
    fn test_untrimmed_user_and_language_on_reads() {
        let (analyzer, _clock) = create_test_analyzer();
        analyzer.record_recognition(" u1", "casa", "es ").unwrap();

        assert_eq!(analyzer.get_stats(" u1", None).unwrap().total_words, 1);
        assert_eq!(analyzer.get_stats("u1", Some(" es")).unwrap().recognized, 1);
        let gap = analyzer.get_production_gap("u1 ", Some("es ")).unwrap();
        assert_eq!(gap.recognize_only_count, 1);
        assert_eq!(gap.focus_words[0].language, "es");
        assert!(matches!(
            analyzer.get_production_gap("", None),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_events_from_separate_sqlite_trackers_do_not_interleave() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("lexis.db");
        let open = |path: &std::path::Path| {
            GapAnalyzer::new(
                Arc::new(SqliteStore::open(path).unwrap()),
                Arc::new(ManualClock::new(Utc::now())),
                DEFAULT_FOCUS_WORD_LIMIT,
                16,
            )
        };
        open(&db_path).record_recognition("u1", "casa", "es").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db_path = db_path.clone();
                thread::spawn(move || {
                    let analyzer = open(&db_path);
                    for _ in 0..25 {
                        if i % 2 == 0 {
                            analyzer.record_recognition("u1", "casa", "es").unwrap();
                        } else {
                            analyzer.record_production("u1", "casa", "es").unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let state = open(&db_path).get_state("u1", "casa", "es").unwrap().unwrap();
        assert_eq!(state.recognition_count, 51);
        assert_eq!(state.production_count, 50);
    }

    #[test]
    fn test_rejects_empty_word() {
        let (analyzer, _clock) = create_test_analyzer();
        assert!(matches!(
            analyzer.record_recognition("u1", " ", "es"),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_concurrent_events_on_one_word() {
        let (analyzer, _clock) = create_test_analyzer();
        let analyzer = Arc::new(analyzer);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let analyzer = Arc::clone(&analyzer);
                thread::spawn(move || {
                    for _ in 0..20 {
                        if i % 2 == 0 {
                            analyzer.record_recognition("u1", "casa", "es").unwrap();
                        } else {
                            analyzer.record_production("u1", "casa", "es").unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let state = analyzer.get_state("u1", "casa", "es").unwrap().unwrap();
        assert_eq!(state.recognition_count, 60);
        assert_eq!(state.production_count, 60);
    }
}
