use crate::error_handling::{AppError, AppResult};
use axum::http::{HeaderMap, Method};

/// Rejects the request unless its method is one of `allowed`.
pub fn validate_method(method: &Method, allowed: &[Method]) -> AppResult<()> {
    if allowed.contains(method) {
        return Ok(());
    }

    let allowed = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join("/");
    Err(AppError::MethodNotAllowed { allowed })
}

/// Value of the `Content-Type` header, if present and readable.
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

/// Path plus query string of the request, as sent by the client.
pub fn request_target(uri: &axum::http::Uri) -> &str {
    uri.path_and_query()
        .map(|target| target.as_str())
        .unwrap_or_else(|| uri.path())
}
