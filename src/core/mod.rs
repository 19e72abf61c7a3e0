//! core
//!
//! Core domain types, configuration and content-tree layout.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PackageName, Tag, VersionKey, SecretName, ContentHash
//! - [`paths`] - Centralized path routing for the package content tree
//! - [`config`] - Configuration schema and loading
//!
//! Nothing in here performs network I/O.

pub mod config;
pub mod paths;
pub mod types;
