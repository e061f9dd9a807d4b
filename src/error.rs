//! Error type returned by the record store.

use thiserror::Error;

/// Result alias used by every store operation.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The `UNIQUE` constraint on `books.author` rejected the write.
    #[error("author {author:?} already has a book")]
    Conflict { author: String },

    /// No row carries the requested id. Only `update` reports this; lookups
    /// return `None` and deletes treat it as success.
    #[error("book {0} not found")]
    NotFound(i64),

    /// Anything else SQLite reports. The controller never recovers from this.
    #[error("storage failure: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Creating the database's parent directory failed.
    #[error("failed to prepare the data directory: {0}")]
    Io(#[from] std::io::Error),

    /// The store could not be closed because request handlers still hold it.
    #[error("store still in use by {0} other handle(s)")]
    StillInUse(usize),
}
