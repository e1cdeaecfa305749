//! Path rewriting and trailing-slash normalization.
//!
//! # Responsibilities
//! - Swap the leading location prefix for the resolved destination
//! - Decide between an internal rewrite and a client redirect
//! - Check the document root for directories
//!
//! # Design Decisions
//! - Only a leading prefix is substituted; later occurrences are left alone
//! - Redirect targets are built from the original path so the client never
//!   sees the destination directory
//! - A path without the prefix passes through unchanged; the HTTP layer
//!   rejects such requests before they get here
//! - The directory check decodes paths exactly like the static file service,
//!   so both agree on which file a URL names

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use serde::Serialize;

/// What the server should do with a resolved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum RewriteDecision {
    /// Continue serving internally from this path.
    InternalRewrite(String),
    /// Answer 301 with this slash-terminated, still-virtual path.
    ClientRedirect(String),
}

/// Replace the leading `virtual_prefix` of `path` with `resolved_prefix`.
pub fn substitute_prefix(path: &str, virtual_prefix: &str, resolved_prefix: &str) -> String {
    match path.strip_prefix(virtual_prefix) {
        Some(rest) => format!("{resolved_prefix}{rest}"),
        None => path.to_string(),
    }
}

/// Decide how to serve `original_path` once its destination is known.
///
/// `is_directory` tells whether the substituted path names a directory
/// under the document root.
pub fn rewrite(
    original_path: &str,
    virtual_prefix: &str,
    resolved_prefix: &str,
    is_directory: bool,
) -> RewriteDecision {
    let candidate = substitute_prefix(original_path, virtual_prefix, resolved_prefix);

    if is_directory && !candidate.ends_with('/') {
        RewriteDecision::ClientRedirect(format!("{original_path}/"))
    } else {
        RewriteDecision::InternalRewrite(candidate)
    }
}

/// Map a percent-encoded URL path onto `document_root`.
///
/// Returns `None` for paths that are not valid UTF-8 once decoded, or that
/// contain `..`, a root or a drive prefix after decoding.
pub fn physical_path(document_root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path.trim_start_matches('/'))
        .decode_utf8()
        .ok()?;

    let mut path = document_root.to_path_buf();
    for component in Path::new(&*decoded).components() {
        match component {
            Component::Normal(segment)
                if Path::new(segment)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_))) =>
            {
                path.push(segment)
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

/// True if `url_path` names an existing directory under `document_root`.
pub async fn is_directory(document_root: &Path, url_path: &str) -> bool {
    let Some(path) = physical_path(document_root, url_path) else {
        return false;
    };
    tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
