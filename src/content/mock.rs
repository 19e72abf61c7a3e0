//! content::mock
//!
//! In-memory content store for deterministic testing.
//!
//! # Design
//!
//! Files are kept in a sorted map keyed by full path. Directories are
//! implicit, exactly like a Git tree: a directory exists while at least one
//! file lives beneath it and disappears with its last file. File hashes are
//! Git-style blob hashes (over SHA-256), so identical bytes always hash the
//! same and any change produces a new hash.
//!
//! # Example
//!
//! ```
//! use dockhand::content::mock::MockContentStore;
//! use dockhand::content::ContentStore;
//!
//! # tokio_test::block_on(async {
//! let store = MockContentStore::new();
//! let hash = store.write("demo/v1/Dockerfile", b"FROM alpine\n", None).await.unwrap();
//!
//! let node = store.read("demo/v1/Dockerfile").await.unwrap();
//! assert_eq!(node.hash, hash);
//!
//! let children = store.list_children("demo").await.unwrap();
//! assert_eq!(children.len(), 1);
//! assert!(children[0].is_dir());
//! # });
//! ```

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::directory_hash;
use super::traits::{ContentNode, ContentStore, NodeKind};
use crate::core::types::ContentHash;
use crate::forge::ForgeError;

/// Mock content store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockContentStore {
    inner: Arc<Mutex<MockContentInner>>,
}

#[derive(Debug, Default)]
struct MockContentInner {
    /// Stored files by full path.
    files: BTreeMap<String, StoredFile>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    bytes: Vec<u8>,
    hash: ContentHash,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail every read with the given error.
    Read(ForgeError),
    /// Fail every list_children with the given error.
    ListChildren(ForgeError),
    /// Fail every write with the given error.
    Write(ForgeError),
    /// Fail every delete with the given error.
    Delete(ForgeError),
    /// Fail deletes of one specific path with the given error.
    DeleteAt { path: String, error: ForgeError },
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Read {
        path: String,
    },
    ListChildren {
        path: String,
    },
    Write {
        path: String,
        expected: Option<ContentHash>,
    },
    Delete {
        path: String,
        hash: ContentHash,
    },
}

/// Git-style blob hash of `bytes`.
pub fn blob_hash(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    ContentHash::from_digest(&hasher.finalize())
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

impl MockContentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with files.
    pub fn with_files<P, B>(files: impl IntoIterator<Item = (P, B)>) -> Self
    where
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        let store = Self::new();
        for (path, bytes) in files {
            store.insert_file(path, bytes);
        }
        store
    }

    fn state(&self) -> MutexGuard<'_, MockContentInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a file directly, bypassing hash checks and recording.
    pub fn insert_file(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> ContentHash {
        let path = normalize(&path.into()).to_string();
        let bytes = bytes.into();
        let hash = blob_hash(&bytes);
        self.state().files.insert(
            path,
            StoredFile {
                bytes,
                hash: hash.clone(),
            },
        );
        hash
    }

    /// Configure the store to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(Some(fail_on));
        self
    }

    /// Replace (or clear) the failure configuration.
    pub fn set_fail_on(&self, fail_on: Option<FailOn>) {
        self.state().fail_on = fail_on;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Paths of every successful or attempted delete, in call order.
    pub fn deleted_paths(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Delete { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Paths of every attempted write, in call order.
    pub fn written_paths(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Write { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Bytes of a stored file (for test verification).
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state()
            .files
            .get(normalize(path))
            .map(|f| f.bytes.clone())
    }

    /// Current hash of a stored file.
    pub fn hash_of(&self, path: &str) -> Option<ContentHash> {
        self.state()
            .files
            .get(normalize(path))
            .map(|f| f.hash.clone())
    }

    /// All stored file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    fn check_fail(&self, expected: &str, path: &str) -> Result<(), ForgeError> {
        let inner = self.state();
        match &inner.fail_on {
            Some(FailOn::Read(e)) if expected == "read" => Err(e.clone()),
            Some(FailOn::ListChildren(e)) if expected == "list_children" => Err(e.clone()),
            Some(FailOn::Write(e)) if expected == "write" => Err(e.clone()),
            Some(FailOn::Delete(e)) if expected == "delete" => Err(e.clone()),
            Some(FailOn::DeleteAt { path: p, error }) if expected == "delete" && p == path => {
                Err(error.clone())
            }
            _ => Ok(()),
        }
    }
}

/// Files strictly beneath `dir` (the whole tree for the root).
fn descendants<'a>(
    files: &'a BTreeMap<String, StoredFile>,
    dir: &'a str,
) -> impl Iterator<Item = (&'a String, &'a StoredFile)> + 'a {
    files.iter().filter(move |(path, _)| {
        dir.is_empty()
            || path
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

#[async_trait]
impl ContentStore for MockContentStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn read(&self, path: &str) -> Result<ContentNode, ForgeError> {
        let path = normalize(path);
        self.record(MockOperation::Read {
            path: path.to_string(),
        });
        self.check_fail("read", path)?;

        let inner = self.state();
        if let Some(file) = inner.files.get(path) {
            return Ok(ContentNode {
                path: path.to_string(),
                kind: NodeKind::File,
                hash: file.hash.clone(),
                bytes: Some(file.bytes.clone()),
            });
        }

        let entries: Vec<_> = descendants(&inner.files, path)
            .map(|(p, f)| (p.as_str(), f.hash.as_str()))
            .collect();
        if entries.is_empty() && !path.is_empty() {
            return Err(ForgeError::NotFound(path.to_string()));
        }
        Ok(ContentNode {
            path: path.to_string(),
            kind: NodeKind::Directory,
            hash: directory_hash(entries),
            bytes: None,
        })
    }

    async fn list_children(&self, path: &str) -> Result<Vec<ContentNode>, ForgeError> {
        let path = normalize(path);
        self.record(MockOperation::ListChildren {
            path: path.to_string(),
        });
        self.check_fail("list_children", path)?;

        let inner = self.state();
        if inner.files.contains_key(path) {
            return Err(ForgeError::permanent(
                400,
                format!("{} is a file, not a directory", path),
            ));
        }

        let prefix_len = if path.is_empty() { 0 } else { path.len() + 1 };
        let mut children: BTreeMap<String, (NodeKind, Vec<(&str, &str)>)> = BTreeMap::new();
        for (file_path, file) in descendants(&inner.files, path) {
            let rest = &file_path[prefix_len..];
            let (child, kind) = match rest.split_once('/') {
                Some((dir, _)) => (dir, NodeKind::Directory),
                None => (rest, NodeKind::File),
            };
            children
                .entry(child.to_string())
                .or_insert_with(|| (kind, Vec::new()))
                .1
                .push((file_path.as_str(), file.hash.as_str()));
        }

        if children.is_empty() && !path.is_empty() {
            return Err(ForgeError::NotFound(path.to_string()));
        }

        Ok(children
            .into_iter()
            .map(|(child, (kind, entries))| {
                let child_path = if path.is_empty() {
                    child
                } else {
                    format!("{}/{}", path, child)
                };
                let hash = match kind {
                    NodeKind::File => entries
                        .first()
                        .and_then(|(p, _)| inner.files.get(*p))
                        .map(|f| f.hash.clone())
                        .unwrap_or_else(|| directory_hash(entries.iter().copied())),
                    NodeKind::Directory => directory_hash(entries.iter().copied()),
                };
                ContentNode {
                    path: child_path,
                    kind,
                    hash,
                    bytes: None,
                }
            })
            .collect())
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash, ForgeError> {
        let path = normalize(path);
        self.record(MockOperation::Write {
            path: path.to_string(),
            expected: expected.cloned(),
        });
        self.check_fail("write", path)?;

        let mut inner = self.state();
        if path.is_empty() || descendants(&inner.files, path).next().is_some() {
            return Err(ForgeError::permanent(
                422,
                format!("{} is a directory", path),
            ));
        }

        let current = inner.files.get(path).map(|f| f.hash.clone());
        match (current, expected) {
            (None, None) => {}
            (None, Some(_)) => {
                return Err(ForgeError::Conflict(format!(
                    "{} does not exist at the expected hash",
                    path
                )))
            }
            (Some(_), None) => {
                return Err(ForgeError::permanent(
                    422,
                    format!("{} already exists and no hash was supplied", path),
                ))
            }
            (Some(current), Some(expected)) if current != *expected => {
                return Err(ForgeError::Conflict(format!(
                    "{} is at {}, not {}",
                    path,
                    current.short(),
                    expected.short()
                )))
            }
            (Some(_), Some(_)) => {}
        }

        let hash = blob_hash(bytes);
        inner.files.insert(
            path.to_string(),
            StoredFile {
                bytes: bytes.to_vec(),
                hash: hash.clone(),
            },
        );
        Ok(hash)
    }

    async fn delete(&self, path: &str, hash: &ContentHash) -> Result<(), ForgeError> {
        let path = normalize(path);
        self.record(MockOperation::Delete {
            path: path.to_string(),
            hash: hash.clone(),
        });
        self.check_fail("delete", path)?;

        let mut inner = self.state();
        let current = inner.files.get(path).map(|f| f.hash.clone());
        match current {
            None => Err(ForgeError::NotFound(path.to_string())),
            Some(current) if current != *hash => Err(ForgeError::Conflict(format!(
                "{} is at {}, not {}",
                path,
                current.short(),
                hash.short()
            ))),
            Some(_) => {
                inner.files.remove(path);
                Ok(())
            }
        }
    }
}
