//! User configuration for `arrow.toml`.
//!
//! # Sections
//!
//! | Section             | Purpose                                      |
//! |---------------------|----------------------------------------------|
//! | `[workspaces.<key>]`| Named workspace roots                        |
//! | `[serve]`           | Development server (interface, port)         |
//! | `[build]`           | Build settings (highlight theme)             |
//!
//! # Example
//!
//! ```toml
//! [workspaces.site]
//! path = "~/site"
//!
//! [workspaces.notes]
//! path = "~/notes"
//!
//! [serve]
//! port = 8000
//!
//! [build]
//! highlight_theme = "base16-ocean.dark"
//! ```

mod error;
mod workspace;

pub use error::ConfigError;
pub use workspace::Workspace;

use crate::log;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};

/// Config file name inside the user config directory.
const CONFIG_FILE: &str = "arrow.toml";

/// Root configuration structure representing arrow.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Workspace key -> workspace root.
    ///
    /// Ordered so that the default workspace (empty key) is stable.
    pub workspaces: BTreeMap<String, WorkspaceEntry>,

    /// Development server settings
    pub serve: ServeConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// `[workspaces.<key>]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    /// Workspace root. `~` is expanded; relative paths are resolved
    /// against the config file's directory.
    pub path: PathBuf,
}

/// `[serve]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8000,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Syntax highlighting theme rendered into each page's inline CSS.
    pub highlight_theme: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            highlight_theme: "base16-ocean.dark".to_string(),
        }
    }
}

impl Config {
    /// Default config location: `<config_dir>/arrow/arrow.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("arrow")
            .join(CONFIG_FILE)
    }

    /// Load configuration from `path`, or the default location.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let content = fs::read_to_string(&path).map_err(|err| ConfigError::Io(path.clone(), err))?;
        let (mut config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, &path);
        }

        config.config_path = path;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {} are ignored: {}", path.display(), fields.join(", "));
    }

    /// Resolve a workspace key to its root directory.
    ///
    /// An empty key selects the first workspace in key order.
    pub fn workspace_root(&self, key: &str) -> Result<PathBuf, ConfigError> {
        let key = if key.is_empty() {
            self.workspaces
                .keys()
                .next()
                .ok_or(ConfigError::NoWorkspaces)?
                .as_str()
        } else {
            key
        };

        let entry = self
            .workspaces
            .get(key)
            .ok_or_else(|| ConfigError::UnknownWorkspace(key.to_string()))?;

        let path = self.expand_path(&entry.path);
        if !path.exists() {
            return Err(ConfigError::MissingWorkspace {
                key: key.to_string(),
                path,
            });
        }

        Ok(path)
    }

    /// Expand `~` and anchor relative paths at the config file's directory.
    fn expand_path(&self, path: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        if expanded.is_relative()
            && let Some(dir) = self.config_path.parent()
        {
            return dir.join(expanded);
        }
        expanded
    }
}

/// Resolve `--entry` into a loaded config and an opened workspace.
///
/// An entry naming an existing directory is used directly as the workspace
/// root; the config file is then optional. Otherwise the entry is a
/// workspace key and the config file must exist.
pub fn resolve_workspace(
    entry: Option<&str>,
    config_path: Option<&Path>,
) -> Result<(Config, Workspace), ConfigError> {
    if let Some(dir) = entry.map(Path::new).filter(|p| p.is_dir()) {
        let config = match Config::load(config_path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Config::default(),
            Err(e) => return Err(e),
        };
        return Ok((config, Workspace::open(dir)?));
    }

    let config = Config::load(config_path)?;
    let root = config.workspace_root(entry.unwrap_or_default())?;
    let workspace = Workspace::open(&root)?;
    Ok((config, workspace))
}
