//! Domain models that mirror the SQLite schema and get passed between the
//! store, the controller, and the HTML pages. They stay plain data holders so
//! the other layers can focus on persistence and presentation.

use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
/// One row of the `books` table.
pub struct Book {
    /// Primary key assigned by SQLite. `AUTOINCREMENT` guarantees ids of
    /// deleted rows are never handed out again.
    pub id: i64,
    pub title: String,
    /// Unique across the catalog.
    pub author: String,
    pub rating: f64,
    /// Stamped once at insert time; edits leave it alone.
    pub date_added: DateTime<Utc>,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" by {}", self.title, self.author)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The mutable fields of a book, already validated. Produced by
/// [`crate::forms::BookForm::validate`] and consumed by the store for both
/// inserts and updates.
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub rating: f64,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, rating: f64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_title_and_author() {
        let book = Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            rating: 4.8,
            date_added: Utc::now(),
        };
        assert_eq!(book.to_string(), "\"Dune\" by Herbert");
    }
}
