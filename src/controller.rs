//! The four user-facing workflows (list, add, edit, delete). Each call runs
//! validation and store access to completion and decides what the browser
//! sees next. Duplicate authors, invalid fields and unknown ids are all
//! handled here; only storage failures escape.

use log::{info, warn};

use crate::db::BookStore;
use crate::error::{StoreError, StoreResult};
use crate::forms::{BookForm, ValidationErrors};
use crate::models::Book;

pub const CONFLICT_MESSAGE: &str = "This author already has a book in the database.";

/// Everything a form page needs to render: the values to show, per-field
/// errors, and an optional flash-style message.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormView {
    pub values: BookForm,
    pub errors: ValidationErrors,
    pub flash: Option<String>,
}

impl FormView {
    fn filled(values: BookForm) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    fn invalid(values: BookForm, errors: ValidationErrors) -> Self {
        Self {
            values,
            errors,
            flash: None,
        }
    }

    fn conflict(values: BookForm) -> Self {
        Self {
            values,
            errors: ValidationErrors::default(),
            flash: Some(CONFLICT_MESSAGE.to_string()),
        }
    }
}

/// What to show the user. The web layer turns each variant into one HTML
/// template.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    List(Vec<Book>),
    Add(FormView),
    /// `book` is the stored record (heading and form target); `form` holds
    /// the values being edited, which may differ after a failed submission.
    Edit { book: Book, form: FormView },
}

/// Result of one workflow: render a page in place, or send the browser back
/// to the list (a 303 redirect over HTTP).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(Page),
    RedirectToList,
}

/// Runs the workflows against an injected store. Cheap to build per request.
pub struct Controller<'a> {
    store: &'a BookStore,
}

impl<'a> Controller<'a> {
    pub fn new(store: &'a BookStore) -> Self {
        Self { store }
    }

    /// The catalog, best rated first.
    pub fn list(&self) -> StoreResult<Outcome> {
        let books = self.store.list_all_sorted_by_rating_desc()?;
        Ok(Outcome::Render(Page::List(books)))
    }

    /// A blank add form.
    pub fn add_form(&self) -> Outcome {
        Outcome::Render(Page::Add(FormView::default()))
    }

    /// Validate and insert. Invalid fields or a duplicate author re-show the
    /// add form with the user's input intact; success returns to the list.
    pub fn submit_add(&self, form: BookForm) -> StoreResult<Outcome> {
        let book = match form.validate() {
            Ok(book) => book,
            Err(errors) => return Ok(Outcome::Render(Page::Add(FormView::invalid(form, errors)))),
        };

        match self.store.create(&book) {
            Ok(created) => {
                info!("added book {} ({created})", created.id);
                Ok(Outcome::RedirectToList)
            }
            Err(StoreError::Conflict { author }) => {
                warn!("rejected new book: author {author:?} already has one");
                Ok(Outcome::Render(Page::Add(FormView::conflict(form))))
            }
            Err(err) => Err(err),
        }
    }

    /// Unknown ids quietly fall back to the list.
    pub fn edit_form(&self, id: i64) -> StoreResult<Outcome> {
        Ok(match self.store.get(id)? {
            Some(book) => {
                let form = FormView::filled(BookForm::from_book(&book));
                Outcome::Render(Page::Edit { book, form })
            }
            None => Outcome::RedirectToList,
        })
    }

    /// Validate and overwrite book `id`. Unknown ids return to the list;
    /// invalid input or an author taken by another book re-show the form.
    pub fn submit_edit(&self, id: i64, form: BookForm) -> StoreResult<Outcome> {
        let Some(existing) = self.store.get(id)? else {
            return Ok(Outcome::RedirectToList);
        };

        let book = match form.validate() {
            Ok(book) => book,
            Err(errors) => {
                let form = FormView::invalid(form, errors);
                return Ok(Outcome::Render(Page::Edit { book: existing, form }));
            }
        };

        match self.store.update(id, &book) {
            Ok(updated) => {
                info!("updated book {id} ({updated})");
                Ok(Outcome::RedirectToList)
            }
            // Deleted between the lookup and the write.
            Err(StoreError::NotFound(_)) => Ok(Outcome::RedirectToList),
            Err(StoreError::Conflict { author }) => {
                warn!("rejected edit of book {id}: author {author:?} already has one");
                let form = FormView::conflict(form);
                Ok(Outcome::Render(Page::Edit { book: existing, form }))
            }
            Err(err) => Err(err),
        }
    }

    /// Remove book `id` if it exists and return to the list either way.
    pub fn delete(&self, id: i64) -> StoreResult<Outcome> {
        self.store.delete(id)?;
        info!("delete requested for book {id}");
        Ok(Outcome::RedirectToList)
    }
}
