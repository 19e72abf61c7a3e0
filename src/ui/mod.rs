//! ui
//!
//! User-facing output helpers.
//!
//! All command output goes through [`output`] so quiet mode and JSON mode
//! behave the same across commands.

pub mod output;
