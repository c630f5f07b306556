//! The shared layout template.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, Value};
use thiserror::Error;

use super::PageModel;

/// Layout file name inside the source tree.
pub const LAYOUT_FILE: &str = "layout.html";

/// The layout could not be loaded.
///
/// Cloneable so a single load failure can be reported against every
/// document of the build.
#[derive(Debug, Clone, Error)]
#[error("layout `{}` unavailable: {reason}", path.display())]
pub struct LayoutError {
    pub path: PathBuf,
    pub reason: String,
}

/// A parsed layout, shared read-only by all build workers.
#[derive(Debug)]
pub struct Layout {
    env: Environment<'static>,
}

impl Layout {
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let unavailable = |reason: String| LayoutError {
            path: path.to_path_buf(),
            reason,
        };

        let source = fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let mut env = Environment::new();
        env.add_template_owned(LAYOUT_FILE, source)
            .map_err(|e| unavailable(e.to_string()))?;

        Ok(Self { env })
    }

    /// Render `page` through the layout.
    pub fn render(&self, page: &PageModel) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(LAYOUT_FILE)?;
        template.render(Value::from_iter([("page", page.to_value())]))
    }
}
