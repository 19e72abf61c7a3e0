//! cli
//!
//! Command-line interface layer for Dockhand.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration once and build the backends from it
//! - Delegate to the library pipelines and format their results
//!
//! The CLI holds no domain logic. Every workflow lives in
//! [`crate::publish`] or [`crate::sync`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;
use std::path::PathBuf;

use crate::ui::output::Verbosity;

/// Per-invocation settings taken from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    /// Output verbosity for this invocation.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application with already parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
