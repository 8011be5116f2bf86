// Banned word list management.
//
// This service handles:
// - Adding and removing banned words
// - Keeping the word matcher in sync with the store
// - Paging through the list for display
//
// NO Telegram dependencies here - just pure domain logic.

use super::moderation_models::WordPage;
use super::word_matcher::WordMatcher;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum WordError {
    #[error("Word must not be empty")]
    EmptyWord,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Matcher error: {0}")]
    MatcherError(String),
}

impl From<super::word_matcher::MatcherError> for WordError {
    fn from(e: super::word_matcher::MatcherError) -> Self {
        WordError::MatcherError(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting the banned word set.
///
/// Words handed to the store are already normalized.
#[async_trait]
pub trait WordStore: Send + Sync {
    async fn exists(&self, word: &str) -> Result<bool, WordError>;

    /// Insert a word. A duplicate (including one inserted concurrently)
    /// is reported as `AlreadyExists`, never stored twice.
    async fn add(&self, word: &str) -> Result<AddOutcome, WordError>;

    async fn remove(&self, word: &str) -> Result<RemoveOutcome, WordError>;

    /// All words, most recently added first.
    async fn list(&self) -> Result<Vec<String>, WordError>;

    async fn count(&self) -> Result<usize, WordError>;
}

/// Lower-case and trim a word the way it is stored and matched.
pub fn normalize_word(raw: &str) -> Result<String, WordError> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() {
        Err(WordError::EmptyWord)
    } else {
        Ok(word)
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct WordListService<S: WordStore> {
    store: S,
    matcher: Arc<WordMatcher>,
    words_per_page: usize,
    // Serializes list+swap so the last rebuild always reflects the last write
    rebuild_lock: Mutex<()>,
    // Set when a write reached the store but the matcher couldn't follow it
    stale: AtomicBool,
}

impl<S: WordStore> WordListService<S> {
    pub fn new(store: S, matcher: Arc<WordMatcher>, words_per_page: usize) -> Self {
        Self {
            store,
            matcher,
            words_per_page: words_per_page.max(1),
            rebuild_lock: Mutex::new(()),
            stale: AtomicBool::new(false),
        }
    }

    /// Build the matcher from whatever is in the store. Called at startup.
    pub async fn load(&self) -> Result<usize, WordError> {
        self.rebuild().await
    }

    async fn rebuild(&self) -> Result<usize, WordError> {
        let _guard = self.rebuild_lock.lock().await;
        let words = self.store.list().await?;
        let count = self.matcher.rebuild(&words)?;
        self.stale.store(false, Ordering::SeqCst);
        tracing::info!(words = count, "Word matcher rebuilt");
        Ok(count)
    }

    /// Rebuild after a write that already reached the store.
    ///
    /// The write stands even if this fails; the next add or remove retries.
    async fn refresh(&self) {
        if let Err(e) = self.rebuild().await {
            self.stale.store(true, Ordering::SeqCst);
            tracing::error!("Word matcher rebuild failed, retrying on next change: {}", e);
        }
    }

    fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    pub async fn add_word(&self, raw: &str) -> Result<AddOutcome, WordError> {
        let word = normalize_word(raw)?;
        let outcome = self.store.add(&word).await?;

        if outcome == AddOutcome::Added || self.is_stale() {
            self.refresh().await;
        }
        Ok(outcome)
    }

    pub async fn remove_word(&self, raw: &str) -> Result<RemoveOutcome, WordError> {
        let word = normalize_word(raw)?;
        let outcome = self.store.remove(&word).await?;

        if outcome == RemoveOutcome::Removed || self.is_stale() {
            self.refresh().await;
        }
        Ok(outcome)
    }

    /// Get one page of the word list, newest first.
    ///
    /// `None` means the first page; an out-of-range page is clamped to the
    /// last one. Returns `None` when there are no words at all.
    pub async fn page(&self, page: Option<usize>) -> Result<Option<WordPage>, WordError> {
        let words = self.store.list().await?;
        if words.is_empty() {
            return Ok(None);
        }

        let total_words = words.len();
        let total_pages = total_words.div_ceil(self.words_per_page);
        let page = page.unwrap_or(0).min(total_pages - 1);

        let words = words
            .into_iter()
            .skip(page * self.words_per_page)
            .take(self.words_per_page)
            .collect();

        Ok(Some(WordPage {
            page,
            total_pages,
            total_words,
            words,
        }))
    }

    pub async fn word_count(&self) -> Result<usize, WordError> {
        self.store.count().await
    }
}

// ============================================================================
// TESTS
// ============================================================================
