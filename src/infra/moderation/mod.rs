// Storage for the content filter.

pub mod sqlite_word_store;

pub use sqlite_word_store::SqliteWordStore;
