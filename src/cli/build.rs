//! `arrow build`: one full build of a workspace.

use anyhow::{Context, Result};
use std::time::Instant;

use crate::build::{BuildOptions, BuildReport, build_site};
use crate::config::{Config, Workspace};
use crate::log;
use crate::page::render;

/// Build the workspace once and log the outcome.
///
/// Per-document failures are reported but do not fail the command; only
/// setup errors do.
pub fn run(config: &Config, workspace: &Workspace) -> Result<BuildReport> {
    let started = Instant::now();
    let options = BuildOptions::from_config(&config.build);
    if !render::available_styles().any(|s| s == options.highlight_style) {
        let known: Vec<_> = render::available_styles().collect();
        log!("warning"; "unknown highlight theme `{}`, available: {}", options.highlight_style, known.join(", "));
    }

    log!("build"; "{} -> {}", workspace.source.display(), workspace.output.display());
    let report = build_site(&workspace.source, &workspace.output, &options)
        .with_context(|| format!("build of `{}` failed", workspace.root.display()))?;

    if report.written.is_empty() && report.failures.is_empty() {
        log!("warning"; "no published documents, check the `status` field of your front matter");
    }
    log!("build"; "done in {:.2?}: {}", started.elapsed(), report.summary());

    Ok(report)
}
