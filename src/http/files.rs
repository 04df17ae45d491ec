//! Static file service from the document root.

use std::io;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use crate::http::mime::mime_type;
use crate::http::response::{bad_request, not_found, server_error};

/// Whether `target` may be resolved against the document root.
///
/// It must be absolute and must not contain `..` anywhere.
pub fn is_safe_target(target: &str) -> bool {
    target.starts_with('/') && !target.contains("..")
}

/// Map a request target onto the document root. Directories map to their `index.html`.
pub fn resolve(docs: &Path, target: &str) -> PathBuf {
    let mut path = docs.join(target.trim_start_matches('/'));
    if target.ends_with('/') {
        path.push("index.html");
    }
    path
}

/// Serve `target` from `docs` for a `GET` or `HEAD` request.
pub async fn serve_file(docs: &Path, method: &Method, target: &str) -> Response {
    if !is_safe_target(target) {
        return bad_request("Illegal request-target");
    }

    let path = resolve(docs, target);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return not_found(target),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open file");
            return server_error(e);
        }
    };

    let metadata = match file.metadata().await {
        Ok(metadata) if metadata.is_dir() => return not_found(target),
        Ok(metadata) => metadata,
        Err(e) => return server_error(e),
    };

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from_stream(ReaderStream::new(file))
    };

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(mime_type(&path)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    response
}
