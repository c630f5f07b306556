//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Static site generator for markdown workspaces
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: <config dir>/arrow/arrow.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the workspace into its output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },

    /// Build, then serve the output and rebuild on changes
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List documents with their publish status
    #[command(visible_alias = "st")]
    Status {
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },

    /// Create a new draft document
    #[command(visible_alias = "n")]
    New {
        /// Document name, relative to the source tree (e.g. `notes/rust`)
        name: String,

        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Short description stored in the front matter
        #[arg(short, long)]
        desc: Option<String>,

        /// Open the new document in $EDITOR
        #[arg(long)]
        edit: bool,
    },
}

/// Workspace selection shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Workspace key from the config, or a workspace directory.
    /// Omitted: the first configured workspace.
    #[arg(short, long, value_hint = clap::ValueHint::AnyPath)]
    pub entry: Option<String>,
}
