//! Server-rendered HTML for the list, add, and edit pages.
//!
//! Templates live next to this file as standalone `.html` files and are
//! compiled into the binary as string constants. Because every template name
//! ends in `.html`, minijinja escapes every interpolated value, so user text
//! can never inject markup.

use minijinja::{context, Environment, Error};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::controller::{FormView, Page};
use crate::forms::BookField;
use crate::models::Book;

pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
pub const ADD_TEMPLATE: &str = include_str!("templates/add.html");
pub const EDIT_TEMPLATE: &str = include_str!("templates/edit.html");
pub const BOOK_FORM_TEMPLATE: &str = include_str!("templates/book_form.html");

static TEMPLATES: OnceCell<Environment<'static>> = OnceCell::new();

/// Compile every template once per process. A syntax error in a template is
/// reported on the first render instead of panicking at startup.
fn templates() -> Result<&'static Environment<'static>, Error> {
    TEMPLATES.get_or_try_init(|| {
        let mut env = Environment::new();
        env.add_template("base.html", BASE_TEMPLATE)?;
        env.add_template("index.html", INDEX_TEMPLATE)?;
        env.add_template("add.html", ADD_TEMPLATE)?;
        env.add_template("edit.html", EDIT_TEMPLATE)?;
        env.add_template("book_form.html", BOOK_FORM_TEMPLATE)?;
        Ok(env)
    })
}

/// One table row on the list page.
#[derive(Serialize)]
struct BookRow<'a> {
    id: i64,
    title: &'a str,
    author: &'a str,
    rating: f64,
    /// Pre-formatted so the template does not need a date filter.
    date_added: String,
}

impl<'a> From<&'a Book> for BookRow<'a> {
    fn from(book: &'a Book) -> Self {
        Self {
            id: book.id,
            title: &book.title,
            author: &book.author,
            rating: book.rating,
            date_added: book.date_added.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One input on the add/edit form, with its error message if validation
/// rejected it.
#[derive(Serialize)]
struct FieldView<'a> {
    name: &'static str,
    label: &'static str,
    value: &'a str,
    error: Option<&'static str>,
}

fn field_views(form: &FormView) -> Vec<FieldView<'_>> {
    BookField::ALL
        .iter()
        .map(|&field| FieldView {
            name: field.name(),
            label: field.label(),
            value: form.values.value(field),
            error: form.errors.get(field),
        })
        .collect()
}

/// Render `page` to a full HTML document. `csrf_token` is embedded in every
/// form so state-changing submissions can be verified.
pub fn render(page: &Page, csrf_token: &str) -> Result<String, Error> {
    let env = templates()?;
    match page {
        Page::List(books) => {
            let books: Vec<BookRow<'_>> = books.iter().map(BookRow::from).collect();
            env.get_template("index.html")?
                .render(context! { books => books, csrf_token => csrf_token })
        }
        Page::Add(form) => env.get_template("add.html")?.render(context! {
            fields => field_views(form),
            flash => form.flash,
            submit_label => "Add Book",
            csrf_token => csrf_token,
        }),
        Page::Edit { book, form } => env.get_template("edit.html")?.render(context! {
            book_id => book.id,
            book_title => book.title,
            fields => field_views(form),
            flash => form.flash,
            submit_label => "Save Book",
            csrf_token => csrf_token,
        }),
    }
}
