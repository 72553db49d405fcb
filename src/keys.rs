//! Composite keys for word-level rows

use crate::error::{Result, TrackerError};

/// Separator between key parts. Never appears in trimmed user input we accept.
const KEY_SEPARATOR: char = '\u{1f}';

/// Identity of a word-keyed row: (user, language, normalized word)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordKey {
    pub user_id: String,
    pub language: String,
    pub word: String,
}

impl WordKey {
    /// Validate and normalize the parts of a word key.
    ///
    /// The word is trimmed and lowercased so casing and stray whitespace from
    /// the reader do not split one word into several rows.
    pub fn new(user_id: &str, word: &str, language: &str) -> Result<Self> {
        let user_id = required("userId", user_id)?;
        let language = required("language", language)?;
        let word = normalize_word(word);
        if word.is_empty() {
            return Err(TrackerError::InvalidInput("word must not be empty".to_string()));
        }
        if [&user_id, &language, &word]
            .iter()
            .any(|part| part.contains(KEY_SEPARATOR))
        {
            return Err(TrackerError::InvalidInput(
                "key parts must not contain control characters".to_string(),
            ));
        }

        Ok(Self {
            user_id,
            language,
            word,
        })
    }

    /// Row key used by the store
    pub fn row_key(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.user_id,
            self.language,
            self.word,
            sep = KEY_SEPARATOR
        )
    }
}

/// Trim and lowercase a word
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Distinct normalized words of a phrase, in order of first appearance.
///
/// Splits on anything that is not a letter, digit, apostrophe or hyphen, so
/// "Yo estoy cansado." yields `yo`, `estoy`, `cansado`.
pub fn split_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for token in text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-')) {
        let word = normalize_word(token.trim_matches(|c: char| c == '\'' || c == '-'));
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Trim a required field, failing if nothing is left
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TrackerError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

/// Keep an optional text field only if it has content
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
