use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use rusqlite::Connection;

use crate::error::StoreResult;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-catalog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "books.sqlite";
/// How long a write waits for another connection's lock before SQLite gives
/// up with `SQLITE_BUSY`. Long enough that a competing insert for the same
/// author reaches the `UNIQUE` check and comes back as a conflict.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the database file at `path` and make sure the `books`
/// table exists. Missing parent directories are created first so a fresh
/// install only needs a writable home directory.
pub fn open_database(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// In-memory variant used by tests; the schema is identical.
pub fn open_in_memory() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `books` table on first run. `AUTOINCREMENT` keeps ids of deleted
/// rows from being reused and the `UNIQUE` on `author` is the only
/// serialization point between concurrent inserts.
pub fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL UNIQUE,
            rating REAL NOT NULL,
            date_added TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Resolve the default database location inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
