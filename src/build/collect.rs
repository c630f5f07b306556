//! Source tree enumeration.

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

use crate::page::LAYOUT_FILE;
use crate::{debug, log};

/// Extension of source documents.
pub const DOCUMENT_EXT: &str = "md";
/// Assets directory name, directly under the source tree.
pub const ASSETS_DIR: &str = "assets";

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect every document under `source_root`, sorted by path.
///
/// The layout file and the top-level assets subtree are excluded. Entries
/// that cannot be read are logged and skipped.
pub fn collect_documents(source_root: &Path) -> Vec<PathBuf> {
    WalkDir::new(source_root)
        .sort(true)
        .skip_hidden(false)
        .process_read_dir(|_, _, _, children| {
            for child in children.iter_mut().flatten() {
                if child.depth == 1 && child.file_type().is_dir() && child.file_name() == ASSETS_DIR {
                    child.read_children_path = None;
                }
            }
        })
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log!("warning"; "skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| !(e.depth == 1 && e.file_name() == LAYOUT_FILE))
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .filter(|p| is_document(p))
        .inspect(|p| debug!("build"; "found {}", p.display()))
        .collect()
}

/// Whether `path` follows the document naming convention.
fn is_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DOCUMENT_EXT)
}

/// Every directory under `root`, including `root` itself.
pub fn collect_dirs(root: &Path) -> Result<Vec<PathBuf>, jwalk::Error> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).sort(true).skip_hidden(false) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
