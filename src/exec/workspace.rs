//! exec::workspace
//!
//! Scoped temporary build workspace.
//!
//! # Lifecycle
//!
//! A [`Workspace`] is a uniquely named directory under a configured root,
//! prefixed with the caller's version key so concurrent pushes never share
//! a directory. Release is guaranteed:
//!
//! - [`Workspace::release`] removes it explicitly and reports the outcome
//! - `Drop` removes it on every other exit path (errors, panics, cancelled
//!   futures)
//!
//! A failed removal is logged at `warn` and never replaces the result of
//! the operation that used the workspace.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::runner::ExecError;
use crate::core::types::VersionKey;

/// A temporary directory removed when the workspace goes out of scope.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `root` keyed by `key`.
    ///
    /// `root` is created if missing.
    pub fn create(root: &Path, key: &VersionKey) -> Result<Self, ExecError> {
        std::fs::create_dir_all(root).map_err(|source| ExecError::Workspace {
            path: root.to_path_buf(),
            source,
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&key.workspace_prefix())
            .tempdir_in(root)
            .map_err(|source| ExecError::Workspace {
                path: root.to_path_buf(),
                source,
            })?;
        let path = dir.path().to_path_buf();
        tracing::debug!(path = %path.display(), key = %key, "workspace created");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Directory path of the workspace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a file at the top level of the workspace.
    pub async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ExecError> {
        let target = self.path.join(name);
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|source| ExecError::Workspace {
                path: target.clone(),
                source,
            })?;
        Ok(target)
    }

    /// Remove the workspace now.
    ///
    /// Failure is logged and returned for callers that want to report it.
    pub fn release(mut self) -> Result<(), std::io::Error> {
        match self.dir.take() {
            Some(dir) => close(dir, &self.path),
            None => Ok(()),
        }
    }
}

fn close(dir: TempDir, path: &Path) -> Result<(), std::io::Error> {
    match dir.close() {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "workspace released");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to release workspace");
            Err(e)
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let _ = close(dir, &self.path);
        }
    }
}
