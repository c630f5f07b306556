//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration and workspace resolution errors.
///
/// All of these are fatal setup errors for the command that hits them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at `{}`", .0.display())]
    NotFound(PathBuf),

    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("no workspaces defined in config")]
    NoWorkspaces,

    #[error("workspace '{0}' not found in config")]
    UnknownWorkspace(String),

    #[error("workspace '{key}' does not exist: `{}`", path.display())]
    MissingWorkspace { key: String, path: PathBuf },

    #[error("missing `src` directory in `{}`. specify a valid workspace with --entry", .0.display())]
    MissingSource(PathBuf),
}
