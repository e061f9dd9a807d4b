//! Double-submit CSRF protection for the state-changing routes.
//!
//! Every page that contains a form makes sure the browser holds a random
//! token in a `SameSite=Strict`, `HttpOnly` cookie and embeds the same token
//! in a hidden field. A POST is only accepted when both copies are present
//! and equal, which a cross-site form cannot arrange because it can neither
//! read the cookie nor make the browser send it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use log::warn;
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "csrf_token";

/// Return the session's token, minting one (and the cookie that carries it)
/// on the first visit.
pub fn ensure_token(jar: CookieJar) -> (CookieJar, String) {
    if let Some(existing) = jar.get(COOKIE_NAME).map(|c| c.value().to_string()) {
        if !existing.is_empty() {
            return (jar, existing);
        }
    }

    let token = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((COOKIE_NAME, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict);
    (jar.add(cookie), token)
}

/// Check a submitted token against the cookie. Returns the verified token so
/// a re-rendered form can keep using it.
pub fn verify(jar: &CookieJar, submitted: &str) -> Result<String, CsrfRejection> {
    let Some(expected) = jar.get(COOKIE_NAME).map(|c| c.value()) else {
        return Err(CsrfRejection::MissingCookie);
    };
    if submitted.is_empty() {
        return Err(CsrfRejection::MissingToken);
    }
    if expected.as_bytes().ct_eq(submitted.as_bytes()).into() {
        Ok(submitted.to_string())
    } else {
        Err(CsrfRejection::Mismatch)
    }
}

/// Why a POST was refused. Nothing is written when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfRejection {
    MissingCookie,
    MissingToken,
    Mismatch,
}

impl CsrfRejection {
    fn message(self) -> &'static str {
        match self {
            CsrfRejection::MissingCookie => "The CSRF session token is missing.",
            CsrfRejection::MissingToken => "The CSRF token is missing.",
            CsrfRejection::Mismatch => "The CSRF tokens do not match.",
        }
    }
}

impl IntoResponse for CsrfRejection {
    fn into_response(self) -> Response {
        warn!("rejected form submission: {}", self.message());
        (StatusCode::BAD_REQUEST, self.message()).into_response()
    }
}
