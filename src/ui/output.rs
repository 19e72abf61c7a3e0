//! ui::output
//!
//! Terminal output for command handlers.
//!
//! Results go to stdout and respect the quiet flag. Diagnostics go to
//! stderr. When `--json` is passed, results are machine-readable JSON.

use serde::Serialize;
use std::fmt::Display;

/// How much a command prints, from `--quiet` / `--debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors and requested data only
    Quiet,
    Normal,
    /// Also enables debug logging
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default tracing filter directive for this level.
    pub fn log_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Debug => "debug",
        }
    }
}

/// Print a status line unless quiet.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error to stderr, even when quiet.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning to stderr unless quiet.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a value as pretty JSON (always shown).
pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One item per line, each with `prefix`.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a package reference as `name:tag`.
pub fn format_image(name: impl Display, tag: impl Display) -> String {
    format!("{}:{}", name, tag)
}
