//! Command-line interface module.

mod args;
pub mod build;
pub mod new;
pub mod serve;
pub mod status;

pub use args::{Cli, Commands, WorkspaceArgs};
