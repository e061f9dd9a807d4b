use chrono::Utc;
use rusqlite::{ffi, params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};

use crate::error::{StoreError, StoreResult};
use crate::models::{Book, NewBook};

const BOOK_COLUMNS: &str = "id, title, author, rating, date_added";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        rating: row.get(3)?,
        date_added: row.get(4)?,
    })
}

/// Every book, best rated first. Equal ratings keep insertion order.
pub fn fetch_books_by_rating(conn: &Connection) -> StoreResult<Vec<Book>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY rating DESC, id ASC"))?;

    let books = stmt
        .query_map([], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books)
}

/// Single book by primary key; `None` when the id is unknown.
pub fn fetch_book(conn: &Connection, id: i64) -> StoreResult<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
            params![id],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

/// Insert a new book, returning the hydrated struct. A duplicate author is
/// reported as [`StoreError::Conflict`]; the rejected INSERT leaves no row.
pub fn create_book(conn: &Connection, book: &NewBook) -> StoreResult<Book> {
    let date_added = Utc::now();
    conn.execute(
        "INSERT INTO books (title, author, rating, date_added) VALUES (?1, ?2, ?3, ?4)",
        params![book.title, book.author, book.rating, date_added],
    )
    .map_err(|err| map_unique_constraint(err, &book.author))?;

    let id = conn.last_insert_rowid();
    // Re-read so the timestamp carries the precision SQLite actually stored.
    fetch_book(conn, id)?.ok_or(StoreError::NotFound(id))
}

/// Overwrite title, author and rating. `date_added` is never touched.
pub fn update_book(conn: &Connection, id: i64, book: &NewBook) -> StoreResult<Book> {
    let updated = conn
        .execute(
            "UPDATE books SET title = ?1, author = ?2, rating = ?3 WHERE id = ?4",
            params![book.title, book.author, book.rating, id],
        )
        .map_err(|err| map_unique_constraint(err, &book.author))?;

    if updated == 0 {
        return Err(StoreError::NotFound(id));
    }
    fetch_book(conn, id)?.ok_or(StoreError::NotFound(id))
}

/// Remove a book. Deleting an id that does not exist is a no-op; the returned
/// flag only tells the caller whether a row went away.
pub fn delete_book(conn: &Connection, id: i64) -> StoreResult<bool> {
    let deleted = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

/// Turn the `UNIQUE(author)` violation into a typed conflict. Other
/// constraint failures (NOT NULL and friends) stay storage errors since
/// validated input never triggers them.
fn map_unique_constraint(err: SqlError, author: &str) -> StoreError {
    match &err {
        SqlError::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Conflict {
                author: author.to_string(),
            }
        }
        _ => err.into(),
    }
}
