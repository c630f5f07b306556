//! Single document transformation: source markdown to an output page.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Layout, LayoutError, MetaError, PageModel, RenderError, meta, render};
use crate::debug;

/// Extension of output pages.
const PAGE_EXT: &str = "html";

/// Per-document failure. Never aborts sibling documents.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read document")]
    Read(#[source] io::Error),

    #[error("failed to parse front matter")]
    FrontMatter(#[from] MetaError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Layout(LayoutError),

    #[error("document is outside the source tree `{}`", .0.display())]
    OutsideSource(PathBuf),

    #[error("failed to create directory `{}`", .0.display())]
    CreateDir(PathBuf, #[source] io::Error),

    #[error("failed to render layout")]
    Template(#[from] minijinja::Error),

    #[error("failed to write `{}`", .0.display())]
    Write(PathBuf, #[source] io::Error),
}

/// Inputs shared by every document of one build.
pub struct TransformContext<'a> {
    pub source_root: &'a Path,
    pub output_root: &'a Path,
    /// Loaded once per build; a load failure fails each published page.
    pub layout: &'a Result<Layout, LayoutError>,
    pub highlight_style: &'a str,
}

/// Outcome of a successful transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    /// Page written to this output path.
    Written(PathBuf),
    /// Publish flag unset; nothing written.
    Draft,
}

/// Transform one document into its output page.
pub fn transform(path: &Path, ctx: &TransformContext<'_>) -> Result<Transformed, PageError> {
    let content = fs::read_to_string(path).map_err(PageError::Read)?;
    let (meta, body) = meta::extract(&content)?;

    if !meta.status {
        debug!("build"; "skipping draft {}", path.display());
        return Ok(Transformed::Draft);
    }

    let title = meta
        .title()
        .map_or_else(|| default_title(path), str::to_string);
    let html = render::markdown_to_html(body);
    let inline_css = render::highlight_css(ctx.highlight_style)?;

    let page = PageModel::new(meta, title, html, inline_css);
    let dest = dest_path(path, ctx.source_root, ctx.output_root)?;

    let layout = ctx.layout.as_ref().map_err(|e| PageError::Layout(e.clone()))?;
    let rendered = layout.render(&page)?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| PageError::CreateDir(parent.to_path_buf(), e))?;
    }
    fs::write(&dest, rendered).map_err(|e| PageError::Write(dest.clone(), e))?;

    Ok(Transformed::Written(dest))
}

/// File stem of the document, used when front matter has no title.
pub fn default_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Output path: source-relative path re-rooted under `output_root` with an
/// `.html` extension.
pub fn dest_path(path: &Path, source_root: &Path, output_root: &Path) -> Result<PathBuf, PageError> {
    let relative = path
        .strip_prefix(source_root)
        .map_err(|_| PageError::OutsideSource(source_root.to_path_buf()))?;
    Ok(output_root.join(relative).with_extension(PAGE_EXT))
}
