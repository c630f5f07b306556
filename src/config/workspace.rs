//! Workspace layout on disk.
//!
//! ```text
//! <root>/
//! ├── src/            # source tree (documents, layout.html, assets/)
//! └── dist/           # output tree, recreated on every build
//! ```

use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::utils::path::normalize_path;

/// Source tree directory name under a workspace root.
pub const SOURCE_DIR: &str = "src";
/// Output tree directory name under a workspace root.
pub const OUTPUT_DIR: &str = "dist";

/// A resolved workspace: a root pairing a source tree with its output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
    pub source: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    /// Open the workspace rooted at `root`.
    ///
    /// Fails when the root has no `src` directory.
    pub fn open(root: &Path) -> Result<Self, ConfigError> {
        let root = normalize_path(root);
        let source = root.join(SOURCE_DIR);
        if !source.is_dir() {
            return Err(ConfigError::MissingSource(root));
        }
        let output = root.join(OUTPUT_DIR);
        Ok(Self {
            root,
            source,
            output,
        })
    }

    /// Path of `path` relative to the source tree, for display.
    pub fn source_relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.source).unwrap_or(path)
    }
}
