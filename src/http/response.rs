//! Response construction.
//!
//! # Responsibilities
//! - Build the 301 trailing-slash redirect
//! - Map resolution failures to appropriate HTTP status codes
//!
//! # Design Decisions
//! - Error bodies are generic; details go to the log, never to the client
//! - Store unavailable → 503, query failure → 500, deadline → 504

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::routing::ResolveError;

/// 301 to `location` with a small HTML body.
pub fn permanent_redirect(location: &str) -> Response {
    let href = escape_html(location);
    let body = format!(
        "<!DOCTYPE html>\n<html><head><title>301 Moved Permanently</title></head>\
         <body><h1>Moved Permanently</h1><p>The document has moved <a href=\"{href}\">here</a>.</p>\
         </body></html>\n"
    );

    (
        StatusCode::MOVED_PERMANENTLY,
        [
            (header::LOCATION, location.to_string()),
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
        ],
        body,
    )
        .into_response()
}

/// Status code surfaced for a failed resolution.
pub fn status_for(error: &ResolveError) -> StatusCode {
    match error {
        ResolveError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        ResolveError::Query { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ResolveError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Generic error response for a failed resolution.
pub fn resolve_error(error: &ResolveError) -> Response {
    let status = status_for(error);
    (status, status.canonical_reason().unwrap_or("Server Error")).into_response()
}

/// Append `query` to `path` when present.
pub fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
