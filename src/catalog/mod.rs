//! catalog
//!
//! Published container versions, as reported by the registry.
//!
//! # Modules
//!
//! - `traits`: the [`VersionCatalog`] seam, [`PackageVersion`], [`TagIndex`]
//! - [`github`]: GitHub Packages implementation
//! - [`mock`]: in-memory implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use github::GitHubVersionCatalog;
pub use traits::{PackageVersion, TagIndex, VersionCatalog};
