use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use rusqlite::Connection;

use super::{books, connection};
use crate::error::{StoreError, StoreResult};
use crate::models::{Book, NewBook};

/// Owns the single SQLite connection the application talks to. The store is
/// built once at startup and handed to the page controller; requests take
/// the lock for the duration of one statement (or one read-back pair), which
/// keeps each workflow step atomic.
pub struct BookStore {
    conn: Mutex<Connection>,
}

impl BookStore {
    /// Open the database file at `path`, creating it and the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = connection::open_database(path)?;
        info!("opened book store at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database with the same schema. Nothing survives the
    /// store being dropped, which is what tests want.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Close the underlying connection, surfacing any error SQLite reports
    /// while flushing.
    pub fn close(self) -> StoreResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, err)| err)?;
        info!("closed book store");
        Ok(())
    }

    /// Close a store that request handlers may still share. Waits up to
    /// `wait` for every other `Arc` clone to be dropped (blocking workflows
    /// finish on their own), then closes. Gives back
    /// [`StoreError::StillInUse`] if clones outlive the deadline.
    pub fn close_when_released(mut store: Arc<Self>, wait: Duration) -> StoreResult<()> {
        const POLL_INTERVAL: Duration = Duration::from_millis(20);

        let deadline = Instant::now() + wait;
        loop {
            match Arc::try_unwrap(store) {
                Ok(store) => return store.close(),
                Err(shared) => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::StillInUse(Arc::strong_count(&shared) - 1));
                    }
                    debug!(
                        "waiting for {} store handle(s) to drop",
                        Arc::strong_count(&shared) - 1
                    );
                    store = shared;
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }

    // A panic while holding the lock cannot leave the connection half-written:
    // every mutation is a single statement.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every book, highest rating first; equal ratings keep insertion order.
    pub fn list_all_sorted_by_rating_desc(&self) -> StoreResult<Vec<Book>> {
        books::fetch_books_by_rating(&self.lock())
    }

    /// Look a book up by id. A missing id is `Ok(None)`, not an error.
    pub fn get(&self, id: i64) -> StoreResult<Option<Book>> {
        books::fetch_book(&self.lock(), id)
    }

    /// Insert a book with a fresh id and the current time. A duplicate author
    /// yields [`StoreError::Conflict`] and leaves the table unchanged.
    pub fn create(&self, book: &NewBook) -> StoreResult<Book> {
        let created = books::create_book(&self.lock(), book)?;
        debug!("created book {} ({created})", created.id);
        Ok(created)
    }

    /// Overwrite title, author and rating of book `id`. Unknown ids give
    /// [`StoreError::NotFound`]; taking another book's author gives
    /// [`StoreError::Conflict`]. Neither changes anything.
    pub fn update(&self, id: i64, book: &NewBook) -> StoreResult<Book> {
        let updated = books::update_book(&self.lock(), id, book)?;
        debug!("updated book {id} ({updated})");
        Ok(updated)
    }

    /// Idempotent: removing an unknown id succeeds.
    pub fn delete(&self, id: i64) -> StoreResult<()> {
        if books::delete_book(&self.lock(), id)? {
            debug!("deleted book {id}");
        }
        Ok(())
    }
}
