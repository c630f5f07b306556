//! Byte-for-byte mirroring of the assets subtree.

use jwalk::WalkDir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Asset mirroring failed. Reported, never fatal to the build.
#[derive(Debug, Error)]
pub enum AssetMirrorError {
    #[error("failed to walk assets under `{}`", .0.display())]
    Walk(PathBuf, #[source] jwalk::Error),

    #[error("failed to create asset directory `{}`", .0.display())]
    CreateDir(PathBuf, #[source] io::Error),

    #[error("failed to copy asset `{}`", .0.display())]
    Copy(PathBuf, #[source] io::Error),
}

/// Mirror `from` into `to`, returning the number of files copied.
///
/// A missing `from` directory is not an error. Stops at the first failure.
pub fn mirror_assets(from: &Path, to: &Path) -> Result<usize, AssetMirrorError> {
    if !from.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(from).sort(true).skip_hidden(false) {
        let entry = entry.map_err(|e| AssetMirrorError::Walk(from.to_path_buf(), e))?;
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(from) else {
            continue;
        };
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| AssetMirrorError::CreateDir(dest, e))?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| AssetMirrorError::CreateDir(parent.to_path_buf(), e))?;
            }
            fs::copy(&path, &dest).map_err(|e| AssetMirrorError::Copy(path, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}
