use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use book_catalog::web::CSRF_COOKIE;
use book_catalog::{web, BookStore, NewBook};
use tower::ServiceExt;

fn app() -> (Arc<BookStore>, Router) {
    let store = Arc::new(BookStore::open_in_memory().unwrap());
    let router = web::router(Arc::clone(&store));
    (store, router)
}

/// A browser session: the token cookie plus the same value for hidden fields.
struct Session {
    token: String,
}

impl Session {
    fn cookie(&self) -> String {
        format!("{CSRF_COOKIE}={}", self.token)
    }
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Submit a form the way the rendered page would: cookie and hidden field.
fn post_with_session(uri: &str, session: &Session, body: &str) -> Request<Body> {
    let body = if body.is_empty() {
        format!("csrf_token={}", session.token)
    } else {
        format!("{body}&csrf_token={}", session.token)
    };
    post_form(uri, Some(&session.cookie()), &body)
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Load the add page and pick up the token from both the cookie and the
/// hidden field, checking they agree.
async fn start_session(router: &Router) -> Session {
    let response = send(router, get("/add")).await;
    let set_cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    let cookie_token = set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix(&format!("{CSRF_COOKIE}=")))
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let html = body_text(response).await;
    assert!(html.contains(&format!("name=\"csrf_token\" value=\"{cookie_token}\"")));
    Session {
        token: cookie_token,
    }
}

fn assert_redirects_to_list(response: &Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn list_shows_books_best_first() {
    let (store, router) = app();
    store.create(&NewBook::new("Emma", "Austen", 3.0)).unwrap();
    store.create(&NewBook::new("Dune", "Herbert", 4.8)).unwrap();

    let response = send(&router, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    let dune = html.find("Dune").unwrap();
    let emma = html.find("Emma").unwrap();
    assert!(dune < emma);
}

#[tokio::test]
async fn add_form_renders() {
    let (_store, router) = app();
    let html = body_text(send(&router, get("/add")).await).await;
    assert!(html.contains("name=\"title\""));
    assert!(html.contains("name=\"author\""));
    assert!(html.contains("name=\"rating\""));
    assert!(html.contains("name=\"csrf_token\""));
}

#[tokio::test]
async fn existing_session_cookie_is_reused() {
    let (_store, router) = app();
    let session = start_session(&router).await;

    let request = Request::builder()
        .uri("/")
        .header(header::COOKIE, session.cookie())
        .body(Body::empty())
        .unwrap();
    let response = send(&router, request).await;
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn valid_add_redirects_and_persists() {
    let (store, router) = app();
    let session = start_session(&router).await;

    let response = send(
        &router,
        post_with_session("/add", &session, "title=Dune&author=Herbert&rating=4.8"),
    )
    .await;
    assert_redirects_to_list(&response);

    let books = store.list_all_sorted_by_rating_desc().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Dune");
    assert_eq!(books[0].rating, 4.8);
}

#[tokio::test]
async fn cross_site_posts_change_nothing() {
    let (store, router) = app();
    let book = store.create(&NewBook::new("Dune", "Herbert", 4.8)).unwrap();
    let session = start_session(&router).await;
    let edit_uri = format!("/edit/{}", book.id);
    let delete_uri = format!("/delete/{}", book.id);

    let mut forged = vec![
        // No cookie, no token: a plain form on another origin.
        post_form("/add", None, "title=Spam&author=Mallory&rating=1"),
        post_form(&edit_uri, None, "title=Spam&author=Mallory&rating=1"),
        post_form(&delete_uri, None, ""),
        // Cookie rides along but the attacker cannot know the token.
        post_form("/add", Some(&session.cookie()), "title=Spam&author=Mallory&rating=1"),
        post_form(
            &delete_uri,
            Some(&session.cookie()),
            "csrf_token=guessed",
        ),
    ];
    for request in &mut forged {
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    }

    for request in forged {
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(store.list_all_sorted_by_rating_desc().unwrap(), vec![book]);
}

#[tokio::test]
async fn add_with_empty_title_re_renders_with_errors() {
    let (store, router) = app();
    let session = start_session(&router).await;

    let response = send(
        &router,
        post_with_session("/add", &session, "title=&author=Herbert&rating=4.8"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("This field is required."));
    assert!(html.contains("value=\"Herbert\""));
    assert!(html.contains(&format!("value=\"{}\"", session.token)));
    assert!(store.list_all_sorted_by_rating_desc().unwrap().is_empty());
}

#[tokio::test]
async fn add_with_missing_fields_is_a_validation_error() {
    let (store, router) = app();
    let session = start_session(&router).await;

    let response = send(&router, post_with_session("/add", &session, "title=Dune")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
    assert!(store.list_all_sorted_by_rating_desc().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_author_flashes_conflict() {
    let (store, router) = app();
    store.create(&NewBook::new("Dune", "Herbert", 4.8)).unwrap();
    let session = start_session(&router).await;

    let response = send(
        &router,
        post_with_session("/add", &session, "title=Children+of+Dune&author=Herbert&rating=3.9"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("This author already has a book in the database."));
    assert!(html.contains("value=\"Children of Dune\""));
    assert_eq!(store.list_all_sorted_by_rating_desc().unwrap().len(), 1);
}

#[tokio::test]
async fn edit_round_trip() {
    let (store, router) = app();
    let book = store.create(&NewBook::new("Dune", "Herbert", 4.8)).unwrap();
    let session = start_session(&router).await;
    let uri = format!("/edit/{}", book.id);

    let html = body_text(send(&router, get(&uri)).await).await;
    assert!(html.contains("value=\"Dune\""));
    assert!(html.contains("value=\"4.8\""));

    let response = send(
        &router,
        post_with_session(&uri, &session, "title=Dune&author=Frank+Herbert&rating=5"),
    )
    .await;
    assert_redirects_to_list(&response);

    let updated = store.get(book.id).unwrap().unwrap();
    assert_eq!(updated.author, "Frank Herbert");
    assert_eq!(updated.rating, 5.0);
    assert_eq!(updated.date_added, book.date_added);
}

#[tokio::test]
async fn edit_of_unknown_id_redirects_to_list() {
    let (_store, router) = app();
    let session = start_session(&router).await;

    assert_redirects_to_list(&send(&router, get("/edit/404")).await);
    assert_redirects_to_list(
        &send(
            &router,
            post_with_session("/edit/404", &session, "title=A&author=B&rating=1"),
        )
        .await,
    );
}

#[tokio::test]
async fn delete_is_post_only_and_idempotent() {
    let (store, router) = app();
    let book = store.create(&NewBook::new("Dune", "Herbert", 4.8)).unwrap();
    let session = start_session(&router).await;
    let uri = format!("/delete/{}", book.id);

    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(store.get(book.id).unwrap().is_some());

    assert_redirects_to_list(&send(&router, post_with_session(&uri, &session, "")).await);
    assert_redirects_to_list(&send(&router, post_with_session(&uri, &session, "")).await);
    assert!(store.get(book.id).unwrap().is_none());
}
