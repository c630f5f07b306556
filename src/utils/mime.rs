//! Content types for files served from the output tree.

use std::path::Path;

pub const HTML: &str = "text/html; charset=utf-8";
pub const PLAIN: &str = "text/plain; charset=utf-8";
const FALLBACK: &str = "application/octet-stream";

/// Extensions (lowercase) and the content type they are served with.
const CONTENT_TYPES: &[(&[&str], &str)] = &[
    (&["html", "htm"], HTML),
    (&["txt"], PLAIN),
    (&["md"], "text/markdown; charset=utf-8"),
    (&["css"], "text/css; charset=utf-8"),
    (&["js", "mjs"], "text/javascript; charset=utf-8"),
    (&["json", "map"], "application/json"),
    (&["xml", "rss", "atom"], "application/xml"),
    (&["svg"], "image/svg+xml"),
    (&["png"], "image/png"),
    (&["jpg", "jpeg"], "image/jpeg"),
    (&["gif"], "image/gif"),
    (&["webp"], "image/webp"),
    (&["avif"], "image/avif"),
    (&["ico"], "image/x-icon"),
    (&["mp3"], "audio/mpeg"),
    (&["mp4", "m4v"], "video/mp4"),
    (&["webm"], "video/webm"),
    (&["woff"], "font/woff"),
    (&["woff2"], "font/woff2"),
    (&["ttf"], "font/ttf"),
    (&["otf"], "font/otf"),
    (&["pdf"], "application/pdf"),
    (&["wasm"], "application/wasm"),
];

/// Content type for `path`, by extension. Unknown extensions are binary.
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FALLBACK;
    };
    let ext = ext.to_ascii_lowercase();

    CONTENT_TYPES
        .iter()
        .find(|(exts, _)| exts.iter().any(|e| *e == ext))
        .map_or(FALLBACK, |&(_, content_type)| content_type)
}
