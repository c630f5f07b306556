//! `arrow new`: create a draft document with a front matter skeleton.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use crate::build::DOCUMENT_EXT;
use crate::config::Workspace;
use crate::log;

const DEFAULT_EDITOR: &str = "nano";

#[derive(Serialize)]
struct Skeleton<'a> {
    title: &'a str,
    desc: &'a str,
    date: String,
    status: bool,
}

/// Front matter for a fresh draft dated today.
fn skeleton(title: &str, desc: &str) -> Result<String> {
    let front = serde_yaml::to_string(&Skeleton {
        title,
        desc,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        status: false,
    })?;
    Ok(format!("---\n{front}---\n"))
}

/// Destination for `name` inside the source tree.
///
/// `name` is source-relative, with or without the `.md` extension, and may
/// not leave the source tree.
fn document_path(source: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    let name = name
        .strip_suffix(&format!(".{DOCUMENT_EXT}"))
        .unwrap_or(name);
    if name.is_empty() {
        bail!("document name cannot be empty");
    }

    let relative = Path::new(name);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        bail!("document name `{name}` must be a relative path inside the source tree");
    }

    Ok(source.join(format!("{name}.{DOCUMENT_EXT}")))
}

/// Create the document, refusing to overwrite. Returns its path.
pub fn create(workspace: &Workspace, name: &str, desc: Option<&str>) -> Result<PathBuf> {
    let path = document_path(&workspace.source, name)?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory `{}`", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("failed to create `{}`", path.display()))?;
    file.write_all(skeleton(&title, desc.unwrap_or_default())?.as_bytes())?;

    Ok(path)
}

pub fn run(workspace: &Workspace, name: &str, desc: Option<&str>, edit: bool) -> Result<()> {
    let path = create(workspace, name, desc)?;
    log!("new"; "created {}", path.display());

    if edit {
        open_in_editor(&path)?;
    }
    Ok(())
}

fn open_in_editor(path: &Path) -> Result<()> {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());

    let status = Command::new(&editor)
        .arg(path)
        .status()
        .with_context(|| format!("failed to launch editor `{editor}`"))?;
    if !status.success() {
        log!("warning"; "editor `{}` exited with {}", editor, status);
    }
    Ok(())
}
