//! URL to filesystem path resolution.
//!
//! Resolution order:
//! 1. `/` maps to `index.html`
//! 2. An existing file is served as is
//! 3. A directory serves its `index.html`, or nothing (no listings)
//! 4. An extensionless path falls back to its `.html` sibling, unless it
//!    ends in `/`
//!
//! Anything else, or anything resolving outside the serve root, is not found.

use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Resolve URL to filesystem path under `serve_root`.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;

    // Reject parent segments early; canonicalization below catches symlinks
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let root = serve_root.canonicalize().ok()?;
    if clean.is_empty() {
        return existing_file(&root.join(INDEX_FILE), &root);
    }

    let local = root.join(&clean);
    if let Ok(meta) = fs::metadata(&local) {
        if meta.is_dir() {
            return existing_file(&local.join(INDEX_FILE), &root);
        }
        return existing_file(&local, &root);
    }

    if !clean.ends_with('/') && !has_extension(&clean) {
        return existing_file(&root.join(format!("{clean}.html")), &root);
    }

    None
}

/// Whether the last path segment has a `.` in it.
pub fn has_extension(path: &str) -> bool {
    match (path.rfind('/'), path.rfind('.')) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(slash), Some(dot)) => dot > slash,
    }
}

/// A regular file at `path` whose canonical form stays under `root`.
fn existing_file(path: &Path, root: &Path) -> Option<PathBuf> {
    let canonical = path.canonicalize().ok()?;
    (canonical.is_file() && canonical.starts_with(root)).then_some(canonical)
}

/// Normalize URL: strip query and fragment, decode, trim leading slashes.
///
/// `None` when the decoded path is not valid UTF-8.
fn normalize_url(url: &str) -> Option<String> {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    Some(decoded.trim_start_matches('/').to_string())
}
