//! Canned error responses.
//!
//! Bodies are short human-readable reasons; the client shows them as-is.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Body for requests no route accepts.
pub const UNSUPPORTED: &str = "Unsupported HTTP-method or Content-Type";

/// 400 with `why` as a plain-text body.
pub fn bad_request(why: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "text/plain")],
        why.into(),
    )
        .into_response()
}

/// 408 for a request whose body did not arrive in time; the connection is not reused.
pub fn request_timeout() -> Response {
    (
        StatusCode::REQUEST_TIMEOUT,
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::CONNECTION, "close"),
        ],
        "Request body timed out",
    )
        .into_response()
}

/// 404 naming the missing target.
pub fn not_found(target: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html")],
        format!("The resource '{target}' was not found."),
    )
        .into_response()
}

/// 500 carrying the underlying error text.
pub fn server_error(what: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/html")],
        format!("An error occurred: '{what}'"),
    )
        .into_response()
}
