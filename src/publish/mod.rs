//! publish
//!
//! Package workflows over the content tree and the container registry.
//!
//! # Modules
//!
//! - `pipeline`: [`PublishPipeline`] create / push / delete workflows
//! - `inventory`: read-side queries (packages, versions, tags, files)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dockhand::catalog::mock::MockVersionCatalog;
//! use dockhand::content::mock::MockContentStore;
//! use dockhand::exec::mock::MockRunner;
//! use dockhand::publish::{PublishPipeline, PublishSettings};
//! use dockhand::templates::ArtifactTemplater;
//!
//! # tokio_test::block_on(async {
//! let root = tempfile::tempdir().unwrap();
//! let content = MockContentStore::new();
//! let pipeline = PublishPipeline::new(
//!     Arc::new(content.clone()),
//!     Arc::new(MockVersionCatalog::new()),
//!     Arc::new(MockRunner::new()),
//!     Arc::new(ArtifactTemplater::new().unwrap()),
//!     PublishSettings::new("ghcr.io", "acme", root.path()),
//! );
//!
//! pipeline.create_package("demo", "latest", b"FROM alpine\n").await.unwrap();
//! pipeline.push_package("demo", "latest", "sha123").await.unwrap();
//! assert!(content.file("demo/latest/Makefile").is_some());
//! # });
//! ```

mod inventory;
mod pipeline;

pub use inventory::{PackageSummary, VersionEntry};
pub use pipeline::{DeleteReport, PublishPipeline, PublishStage, PushReport};

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::types::TypeError;
use crate::exec::ExecError;
use crate::forge::ForgeError;
use crate::templates::TemplateError;

/// Errors from package workflows.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("remote error: {0}")]
    Remote(#[from] ForgeError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("package '{0}' does not exist")]
    UnknownPackage(String),

    #[error("'{0}' is not a file")]
    NotAFile(String),

    #[error("invalid file name '{0}'")]
    InvalidFileName(String),
}

impl PublishError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Remote(e) if e.is_transient())
    }
}

/// Where images go and where builds run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Registry host, e.g. `ghcr.io`
    pub registry: String,
    /// Owning organization; also the provenance author
    pub organization: String,
    /// Parent directory of push workspaces
    pub workspace_root: PathBuf,
}

impl PublishSettings {
    pub fn new(
        registry: impl Into<String>,
        organization: impl Into<String>,
        workspace_root: impl AsRef<Path>,
    ) -> Self {
        Self {
            registry: registry.into(),
            organization: organization.into(),
            workspace_root: workspace_root.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.registry_host(),
            config.organization(),
            config.workspace_root(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(PublishError::Remote(ForgeError::RateLimited).is_transient());
        assert!(!PublishError::Remote(ForgeError::NotFound("x".into())).is_transient());
        assert!(!PublishError::UnknownPackage("x".into()).is_transient());
    }

    #[test]
    fn settings_from_default_config() {
        let settings = PublishSettings::from_config(&Config::default());
        assert_eq!(settings.registry, "ghcr.io");
        assert_eq!(settings.organization, "alpha-omega-corp");
    }
}
