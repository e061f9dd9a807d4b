//! HTTP surface: axum routes that hand each request to the [`Controller`]
//! and turn its [`Outcome`] into a response.

mod csrf;
mod pages;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use axum_extra::extract::cookie::CookieJar;
use log::error;
use serde::Deserialize;

use crate::controller::{Controller, Outcome};
use crate::db::BookStore;
use crate::error::StoreResult;
use crate::forms::BookForm;

use csrf::CsrfRejection;
pub use csrf::COOKIE_NAME as CSRF_COOKIE;

/// Build the application router around a shared store.
pub fn router(store: Arc<BookStore>) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/add", get(add_form).post(submit_add))
        .route("/edit/{id}", get(edit_form).post(submit_edit))
        .route("/delete/{id}", post(delete))
        .with_state(store)
}

/// Body of the add and edit forms: the book fields plus the CSRF token.
/// Missing fields decode as empty strings so validation reports them.
#[derive(Debug, Deserialize)]
struct BookSubmission {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    rating: String,
    #[serde(default)]
    csrf_token: String,
}

impl BookSubmission {
    fn into_form(self) -> (BookForm, String) {
        let form = BookForm {
            title: self.title,
            author: self.author,
            rating: self.rating,
        };
        (form, self.csrf_token)
    }
}

/// Body of the delete button's form.
#[derive(Debug, Deserialize)]
struct TokenSubmission {
    #[serde(default)]
    csrf_token: String,
}

/// Errors that end a request early.
enum AppError {
    /// Storage or rendering failed; logged and answered with a 500.
    Internal(String),
    Csrf(CsrfRejection),
}

impl From<CsrfRejection> for AppError {
    fn from(rejection: CsrfRejection) -> Self {
        AppError::Csrf(rejection)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(message) => {
                error!("request failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            AppError::Csrf(rejection) => rejection.into_response(),
        }
    }
}

/// Run one workflow on the blocking pool; rusqlite calls must not stall the
/// async executor.
async fn run<F>(store: Arc<BookStore>, csrf_token: &str, workflow: F) -> Result<Response, AppError>
where
    F: FnOnce(&Controller<'_>) -> StoreResult<Outcome> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || workflow(&Controller::new(&store)))
        .await
        .map_err(|err| AppError::Internal(format!("workflow task failed: {err}")))?
        .map_err(|err| AppError::Internal(err.to_string()))?;
    respond(outcome, csrf_token)
}

fn respond(outcome: Outcome, csrf_token: &str) -> Result<Response, AppError> {
    match outcome {
        Outcome::Render(page) => {
            let html = pages::render(&page, csrf_token)
                .map_err(|err| AppError::Internal(format!("template error: {err:#}")))?;
            Ok(Html(html).into_response())
        }
        Outcome::RedirectToList => Ok(Redirect::to("/").into_response()),
    }
}

async fn list(
    State(store): State<Arc<BookStore>>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let (jar, token) = csrf::ensure_token(jar);
    let response = run(store, &token, |controller| controller.list()).await?;
    Ok((jar, response))
}

async fn add_form(
    State(store): State<Arc<BookStore>>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let (jar, token) = csrf::ensure_token(jar);
    let response = respond(Controller::new(&store).add_form(), &token)?;
    Ok((jar, response))
}

async fn submit_add(
    State(store): State<Arc<BookStore>>,
    jar: CookieJar,
    Form(submission): Form<BookSubmission>,
) -> Result<Response, AppError> {
    let (form, submitted) = submission.into_form();
    let token = csrf::verify(&jar, &submitted)?;
    run(store, &token, move |controller| controller.submit_add(form)).await
}

async fn edit_form(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let (jar, token) = csrf::ensure_token(jar);
    let response = run(store, &token, move |controller| controller.edit_form(id)).await?;
    Ok((jar, response))
}

async fn submit_edit(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<i64>,
    jar: CookieJar,
    Form(submission): Form<BookSubmission>,
) -> Result<Response, AppError> {
    let (form, submitted) = submission.into_form();
    let token = csrf::verify(&jar, &submitted)?;
    run(store, &token, move |controller| controller.submit_edit(id, form)).await
}

async fn delete(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<i64>,
    jar: CookieJar,
    Form(submission): Form<TokenSubmission>,
) -> Result<Response, AppError> {
    let token = csrf::verify(&jar, &submission.csrf_token)?;
    run(store, &token, move |controller| controller.delete(id)).await
}
