//! Arrow - a static site generator for markdown workspaces.

mod build;
mod cli;
mod config;
mod logger;
mod page;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, WorkspaceArgs};
use config::resolve_workspace;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let open = |args: &WorkspaceArgs| resolve_workspace(args.entry.as_deref(), cli.config.as_deref());

    match &cli.command {
        Commands::Build { workspace } => {
            let (config, workspace) = open(workspace)?;
            cli::build::run(&config, &workspace).map(|_| ())
        }
        Commands::Serve {
            workspace,
            interface,
            port,
        } => {
            let (config, workspace) = open(workspace)?;
            cli::serve::run(&config, &workspace, *interface, *port)
        }
        Commands::Status { workspace } => {
            let (_, workspace) = open(workspace)?;
            cli::status::run(&workspace)
        }
        Commands::New {
            name,
            workspace,
            desc,
            edit,
        } => {
            let (_, workspace) = open(workspace)?;
            cli::new::run(&workspace, name, desc.as_deref(), *edit)
        }
    }
}
