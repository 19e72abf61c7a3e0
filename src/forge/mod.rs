//! forge
//!
//! Shared plumbing for remote GitHub backends.
//!
//! # Architecture
//!
//! Each remote concern has its own seam and lives in its own module
//! ([`crate::content`], [`crate::catalog`], [`crate::secrets`]). They share
//! the HTTP client and the error taxonomy defined here:
//!
//! - [`GitHubClient`]: authenticated REST client with uniform status mapping
//! - [`ForgeError`]: `NotFound` / `Conflict` / `Transient` / `Permanent` split
//!
//! Backends never swallow errors. The pipelines decide which ones are benign.

mod errors;
pub mod github;

pub use errors::ForgeError;
pub use github::GitHubClient;
