//! content
//!
//! The package content tree, treated as a content-addressed object store.
//!
//! # Modules
//!
//! - `traits`: the [`ContentStore`] seam and [`ContentNode`]
//! - [`github`]: GitHub Contents API implementation
//! - [`mock`]: in-memory implementation for deterministic testing
//!
//! Callers build paths with [`crate::core::paths::ContentLayout`], never by hand.

pub mod github;
pub mod mock;
mod traits;

pub use github::GitHubContentStore;
pub use traits::{ContentNode, ContentStore, NodeKind};

use sha2::{Digest, Sha256};

use crate::core::types::ContentHash;

/// Hash a directory from its `(path, hash)` descendants.
///
/// Directories are never mutated directly, so this only needs to change
/// whenever something beneath the directory changes.
pub(crate) fn directory_hash<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(b"tree\0");
    for (path, hash) in entries {
        hasher.update(path.as_bytes());
        hasher.update(b" ");
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    ContentHash::from_digest(&hasher.finalize())
}
