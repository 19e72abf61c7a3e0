//! exec
//!
//! Local side of the publish pipeline: scoped workspaces and build-script
//! target execution.
//!
//! # Modules
//!
//! - `runner`: [`ScriptRunner`] seam, [`MakeRunner`], [`BuildTarget`], [`ExecError`]
//! - `workspace`: [`Workspace`], a temporary directory with guaranteed release
//! - [`mock`]: recording runner for deterministic testing

pub mod mock;
mod runner;
mod workspace;

pub use runner::{BuildTarget, ExecError, ExecOutput, MakeRunner, ScriptRunner};
pub use workspace::Workspace;
