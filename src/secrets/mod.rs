//! secrets
//!
//! Where secrets live: a local plaintext mirror and a remote registry that
//! only accepts sealed values.
//!
//! # Architecture
//!
//! - [`SecretStore`] / [`FileSecretStore`]: local mirror in
//!   `~/.dockhand/mirror.toml`, keyed by lower-cased secret name
//! - [`SecretRegistry`] / [`GitHubSecretRegistry`]: GitHub Actions
//!   organization secrets
//! - [`mock`]: in-memory registry (with a real key pair) and mirror
//!
//! The two sides share no transaction. Keeping them consistent is the job
//! of [`crate::sync`].
//!
//! # Security
//!
//! - Values are **never** logged or included in error messages
//! - The file mirror uses 0600 permissions on Unix
//! - All mirror writes are atomic (temp file + rename)

mod file_store;
pub mod github;
pub mod mock;
mod traits;

pub use file_store::FileSecretStore;
pub use github::GitHubSecretRegistry;
pub use traits::{
    EncryptedSecret, PublicKeyInfo, SecretError, SecretMetadata, SecretRegistry, SecretStore,
};
