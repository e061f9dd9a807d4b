//! Form state for the add and edit pages plus the validation that turns raw
//! submissions into values the store accepts.

use crate::models::{Book, NewBook};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const NOT_A_NUMBER_MESSAGE: &str = "Not a valid float value.";

/// Raw field values exactly as the browser sent them. The web layer fills
/// missing fields with empty strings so they fail validation like blank ones
/// instead of rejecting the whole request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    /// Kept as text so a non-numeric entry can be echoed back for correction.
    pub rating: String,
}

/// Fields available within the book form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Rating,
}

impl BookField {
    pub const ALL: [BookField; 3] = [BookField::Title, BookField::Author, BookField::Rating];

    /// Name used for the HTML input and the form payload.
    pub fn name(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Rating => "rating",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookField::Title => "Book Name",
            BookField::Author => "Book Author",
            BookField::Rating => "Rating",
        }
    }
}

/// Per-field error messages collected during validation. Every failing field
/// is reported, not just the first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<(BookField, &'static str)>,
}

impl ValidationErrors {
    fn push(&mut self, field: BookField, message: &'static str) {
        self.errors.push((field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: BookField) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(failed, _)| *failed == field)
            .map(|(_, message)| *message)
    }

    pub fn fields(&self) -> impl Iterator<Item = BookField> + '_ {
        self.errors.iter().map(|(field, _)| *field)
    }
}

impl BookForm {
    pub fn new(title: &str, author: &str, rating: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            rating: rating.to_string(),
        }
    }

    /// Populate the form from an existing book when editing.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            rating: book.rating.to_string(),
        }
    }

    pub fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Rating => &self.rating,
        }
    }

    /// Validate the inputs and return typed values ready for persistence.
    /// Text fields are trimmed; whitespace-only counts as missing.
    pub fn validate(&self) -> Result<NewBook, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(BookField::Title, REQUIRED_MESSAGE);
        }

        let author = self.author.trim();
        if author.is_empty() {
            errors.push(BookField::Author, REQUIRED_MESSAGE);
        }

        let rating_raw = self.rating.trim();
        let rating = if rating_raw.is_empty() {
            errors.push(BookField::Rating, REQUIRED_MESSAGE);
            None
        } else {
            match rating_raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => {
                    errors.push(BookField::Rating, NOT_A_NUMBER_MESSAGE);
                    None
                }
            }
        };

        match rating {
            Some(rating) if errors.is_empty() => Ok(NewBook::new(title, author, rating)),
            _ => Err(errors),
        }
    }
}
