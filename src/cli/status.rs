//! `arrow status`: list documents and whether they are published.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::build::{collect_documents, error_chain};
use crate::config::Workspace;
use crate::log;
use crate::page::meta;

/// One document row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStatus {
    /// Path relative to the source tree.
    pub path: PathBuf,
    pub published: bool,
}

/// Published documents first, then drafts; each group sorted by path.
///
/// Documents that cannot be read or parsed are logged and left out.
pub fn collect_status(workspace: &Workspace) -> Vec<DocumentStatus> {
    let mut rows: Vec<DocumentStatus> = collect_documents(&workspace.source)
        .into_iter()
        .filter_map(|path| {
            let rel = workspace.source_relative(&path).to_path_buf();
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    log!("error"; "{}: {}", rel.display(), e);
                    return None;
                }
            };
            match meta::extract(&content) {
                Ok((meta, _)) => Some(DocumentStatus {
                    path: rel,
                    published: meta.status,
                }),
                Err(e) => {
                    log!("error"; "{}: {}", rel.display(), error_chain(&e));
                    None
                }
            }
        })
        .collect();

    rows.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| a.path.cmp(&b.path)));
    rows
}

pub fn run(workspace: &Workspace) -> Result<()> {
    let rows = collect_status(workspace);
    let mut out = io::stdout().lock();

    for row in &rows {
        let label = if row.published {
            format!("{:<9}", "published").green().to_string()
        } else {
            format!("{:<9}", "draft").dimmed().to_string()
        };
        writeln!(out, "{label} {}", row.path.display())?;
    }

    let published = rows.iter().filter(|r| r.published).count();
    writeln!(out, "\n{published} of {} published", rows.len())?;
    Ok(())
}
