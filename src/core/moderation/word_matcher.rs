// Banned word matcher.
//
// The banned word list is compiled into an Aho-Corasick automaton so a message
// is scanned once no matter how many words are banned. The compiled automaton
// is immutable; every change to the list builds a brand new one and swaps it in.

use aho_corasick::{AhoCorasick, MatchKind};
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("Failed to build word automaton: {0}")]
    Build(String),
}

/// An immutable snapshot of the banned word list.
pub struct WordAutomaton {
    searcher: AhoCorasick,
    word_count: usize,
}

impl WordAutomaton {
    /// Build an automaton from the given words.
    ///
    /// Words are trimmed and lower-cased. Returns `Ok(None)` when no usable
    /// word is left, since an empty dictionary never matches anything.
    pub fn build<I, S>(words: I) -> Result<Option<Self>, MatcherError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        patterns.sort_unstable();
        patterns.dedup();

        if patterns.is_empty() {
            return Ok(None);
        }

        // Standard semantics are required for overlapping iteration
        let searcher = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| MatcherError::Build(e.to_string()))?;

        Ok(Some(Self {
            searcher,
            word_count: patterns.len(),
        }))
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Does `text` contain a banned word as a whole token?
    pub fn contains_match(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.searcher
            .find_overlapping_iter(&text)
            .any(|m| is_whole_token(&text, m.start(), m.end()))
    }
}

/// True if the characters around `text[start..end]` are not alphanumeric.
fn is_whole_token(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Shared, hot-swappable holder of the current automaton.
///
/// Readers grab the current snapshot without locking; a rebuild publishes a
/// new snapshot in a single atomic store. The old snapshot lives until the
/// last reader holding it is done.
#[derive(Default)]
pub struct WordMatcher {
    current: ArcSwapOption<WordAutomaton>,
}

impl WordMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the automaton with one built from `words`.
    ///
    /// On failure the previous automaton stays in place.
    pub fn rebuild<I, S>(&self, words: I) -> Result<usize, MatcherError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let automaton = WordAutomaton::build(words)?;
        let count = automaton.as_ref().map_or(0, WordAutomaton::word_count);
        self.current.store(automaton.map(Arc::new));
        Ok(count)
    }

    pub fn contains_match(&self, text: &str) -> bool {
        match self.current.load_full() {
            Some(automaton) => automaton.contains_match(text),
            None => false,
        }
    }

    pub fn word_count(&self) -> usize {
        self.current
            .load_full()
            .map_or(0, |automaton| automaton.word_count())
    }
}
