//! content::traits
//!
//! ContentStore trait definition.
//!
//! # Design
//!
//! The store is a thin, hash-aware CRUD surface over a remote tree. There is
//! no caching: every call is a round trip. Mutations are compare-and-swap:
//!
//! - `write(path, bytes, None)` creates a new file
//! - `write(path, bytes, Some(hash))` replaces the file iff its hash is still `hash`
//! - `delete(path, hash)` always requires the current hash
//!
//! A stale hash yields `ForgeError::Conflict`. Nothing here merges, diffs or
//! reads history.

use async_trait::async_trait;

use crate::core::types::ContentHash;
use crate::forge::ForgeError;

/// Whether a node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Directory => write!(f, "dir"),
        }
    }
}

/// A file or directory in the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    /// Full path from the tree root
    pub path: String,
    /// File or directory
    pub kind: NodeKind,
    /// Current content hash
    pub hash: ContentHash,
    /// File bytes; `None` for directories and for listing entries
    pub bytes: Option<Vec<u8>>,
}

impl ContentNode {
    /// Final path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Whether this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Whether this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Hash-aware CRUD over a remote content tree.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Cancellation
///
/// Dropping a returned future aborts the in-flight request.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Read a file (with bytes) or a directory node (without bytes).
    ///
    /// Returns `ForgeError::NotFound` if nothing exists at `path`.
    async fn read(&self, path: &str) -> Result<ContentNode, ForgeError>;

    /// List the immediate children of a directory.
    ///
    /// The root of the tree is the empty path. Returned nodes carry no bytes.
    async fn list_children(&self, path: &str) -> Result<Vec<ContentNode>, ForgeError>;

    /// Write a file and return its new hash.
    ///
    /// Without `expected` the file must not exist yet. With `expected` the
    /// file must currently have exactly that hash.
    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash, ForgeError>;

    /// Delete a file whose current hash is `hash`.
    async fn delete(&self, path: &str, hash: &ContentHash) -> Result<(), ForgeError>;
}
