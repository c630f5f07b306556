//! Site build orchestration.
//!
//! Build phases:
//! - **Prepare** - Clear and recreate the output tree (fatal on failure)
//! - **Assets** - Mirror `assets/` into the output tree (best effort)
//! - **Collect** - Enumerate documents under the source tree
//! - **Transform** - Render documents on a bounded worker pool
//!
//! Every build is a full build: nothing from a previous pass survives the
//! prepare phase.

mod assets;
mod collect;

pub use assets::{AssetMirrorError, mirror_assets};
pub use collect::{ASSETS_DIR, DOCUMENT_EXT, collect_dirs, collect_documents};

use rayon::prelude::*;
use std::{
    error::Error as StdError,
    fs, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    thread,
};
use thiserror::Error;

use crate::config::BuildConfig;
use crate::page::{self, LAYOUT_FILE, Layout, PageError, TransformContext, Transformed};
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Build setup failure. Aborts the whole build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("output tree `{}` contains the source tree", .0.display())]
    OutputContainsSource(PathBuf),

    #[error("failed to clear output directory `{}`", .0.display())]
    Clear(PathBuf, #[source] io::Error),

    #[error("failed to create output directory `{}`", .0.display())]
    Create(PathBuf, #[source] io::Error),

    #[error("failed to start build workers")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Build settings.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Highlight theme rendered into each page's inline CSS.
    pub highlight_style: String,
    /// Worker pool size.
    pub workers: NonZeroUsize,
}

impl BuildOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            highlight_style: config.highlight_theme.clone(),
            ..Self::default()
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            highlight_style: BuildConfig::default().highlight_theme,
            workers: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// A document that failed to transform.
#[derive(Debug)]
pub struct PageFailure {
    pub path: PathBuf,
    pub error: PageError,
}

/// Outcome of one build pass.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Output pages written, sorted by path.
    pub written: Vec<PathBuf>,
    /// Documents skipped because their publish flag is unset.
    pub drafts: usize,
    pub failures: Vec<PageFailure>,
    pub assets_copied: usize,
    pub asset_error: Option<AssetMirrorError>,
}

impl BuildReport {
    /// No document failed and assets were mirrored.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.asset_error.is_none()
    }

    /// One-line summary, e.g. `3 pages, 1 draft, 2 assets`.
    pub fn summary(&self) -> String {
        let mut parts = vec![plural_count(self.written.len(), "page")];
        if self.drafts > 0 {
            parts.push(plural_count(self.drafts, "draft"));
        }
        if self.assets_copied > 0 {
            parts.push(plural_count(self.assets_copied, "asset"));
        }
        if !self.failures.is_empty() {
            parts.push(plural_count(self.failures.len(), "failure"));
        }
        parts.join(", ")
    }

    /// One line per failure, paths relative to `source_root`.
    pub fn failure_detail(&self, source_root: &Path) -> String {
        let mut lines: Vec<String> = self
            .failures
            .iter()
            .map(|f| {
                let rel = f.path.strip_prefix(source_root).unwrap_or(&f.path);
                format!("{}: {}", rel.display(), error_chain(&f.error))
            })
            .collect();
        if let Some(e) = &self.asset_error {
            lines.push(format!("assets: {}", error_chain(e)));
        }
        lines.join("\n")
    }
}

/// Build the site from `source_root` into `output_root`.
///
/// Only setup failures are returned as errors; per-document and asset
/// failures are logged and collected into the report.
pub fn build_site(
    source_root: &Path,
    output_root: &Path,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    prepare_output(source_root, output_root)?;

    let mut report = BuildReport::default();
    match mirror_assets(&source_root.join(ASSETS_DIR), &output_root.join(ASSETS_DIR)) {
        Ok(copied) => report.assets_copied = copied,
        Err(e) => {
            log!("warning"; "assets: {}", error_chain(&e));
            report.asset_error = Some(e);
        }
    }

    let documents = collect_documents(source_root);
    let layout = Layout::load(&source_root.join(LAYOUT_FILE));
    if let Err(e) = &layout {
        debug!("build"; "{}", e);
    }

    let ctx = TransformContext {
        source_root,
        output_root,
        layout: &layout,
        highlight_style: &options.highlight_style,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.get())
        .thread_name(|i| format!("arrow-build-{i}"))
        .build()?;

    let outcomes: Vec<(PathBuf, Result<Transformed, PageError>)> = pool.install(|| {
        documents
            .into_par_iter()
            .map(|path| {
                let outcome = page::transform(&path, &ctx);
                (path, outcome)
            })
            .collect()
    });

    for (path, outcome) in outcomes {
        match outcome {
            Ok(Transformed::Written(dest)) => report.written.push(dest),
            Ok(Transformed::Draft) => report.drafts += 1,
            Err(error) => {
                let rel = path.strip_prefix(source_root).unwrap_or(&path);
                log!("error"; "{}: {}", rel.display(), error_chain(&error));
                report.failures.push(PageFailure { path, error });
            }
        }
    }
    report.written.sort();

    Ok(report)
}

/// Delete and recreate the output tree.
fn prepare_output(source_root: &Path, output_root: &Path) -> Result<(), BuildError> {
    if source_root.starts_with(output_root) {
        return Err(BuildError::OutputContainsSource(output_root.to_path_buf()));
    }

    match fs::remove_dir_all(output_root) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::Clear(output_root.to_path_buf(), e)),
    }
    fs::create_dir_all(output_root).map_err(|e| BuildError::Create(output_root.to_path_buf(), e))
}

/// `outer: inner: root cause`
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
