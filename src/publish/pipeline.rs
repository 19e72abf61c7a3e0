//! publish::pipeline
//!
//! Create, push and delete workflows for package versions.
//!
//! # Push state machine
//!
//! ```text
//! Requested -> ContentFetched -> WorkspaceMaterialized -> ScriptExecuted -> Committed
//!     \______________\___________________\______________________\________-> Failed
//! ```
//!
//! Each push runs in its own [`Workspace`], keyed by the caller's version
//! key. The workspace is released on every exit path: explicitly after the
//! targets finish, and from `Drop` when the future errors out early, panics
//! or is cancelled. A failed release is logged and reported but never
//! replaces the push result.
//!
//! # Deletes
//!
//! Content-tree deletes are per file and not transactional. A delete that
//! stops halfway is retried by calling it again: anything already gone
//! reports `NotFound`, which every delete path treats as success.

use std::path::PathBuf;
use std::sync::Arc;

use super::{PublishError, PublishSettings};
use crate::catalog::VersionCatalog;
use crate::content::{ContentNode, ContentStore};
use crate::core::paths::{self, ContentLayout};
use crate::core::types::{ContentHash, PackageName, Tag, VersionKey};
use crate::exec::{BuildTarget, ExecOutput, ScriptRunner, Workspace};
use crate::forge::ForgeError;
use crate::templates::{sanitize_manifest, ArtifactTemplater};

/// Stage of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Requested,
    ContentFetched,
    WorkspaceMaterialized,
    ScriptExecuted,
    Committed,
    Failed,
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PublishStage::Requested => "requested",
            PublishStage::ContentFetched => "content-fetched",
            PublishStage::WorkspaceMaterialized => "workspace-materialized",
            PublishStage::ScriptExecuted => "script-executed",
            PublishStage::Committed => "committed",
            PublishStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a successful push.
#[derive(Debug, Clone)]
pub struct PushReport {
    /// Workspace the targets ran in (already removed)
    pub workspace: PathBuf,
    /// Output of each target, in execution order
    pub outputs: Vec<(BuildTarget, ExecOutput)>,
    /// Whether the build script in the content tree changed
    pub script_committed: bool,
    /// Whether the workspace was removed cleanly
    pub workspace_released: bool,
}

/// Result of a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Content paths removed by this call
    pub deleted: Vec<String>,
    /// Whether the placeholder marker was written afterwards
    pub marker_restored: bool,
}

/// Orchestrates package workflows over the content tree, the registry and
/// the local build runner.
pub struct PublishPipeline {
    pub(super) content: Arc<dyn ContentStore>,
    pub(super) catalog: Arc<dyn VersionCatalog>,
    runner: Arc<dyn ScriptRunner>,
    templater: Arc<ArtifactTemplater>,
    settings: PublishSettings,
}

impl std::fmt::Debug for PublishPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishPipeline")
            .field("content", &self.content.name())
            .field("catalog", &self.catalog.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl PublishPipeline {
    pub fn new(
        content: Arc<dyn ContentStore>,
        catalog: Arc<dyn VersionCatalog>,
        runner: Arc<dyn ScriptRunner>,
        templater: Arc<ArtifactTemplater>,
        settings: PublishSettings,
    ) -> Self {
        Self {
            content,
            catalog,
            runner,
            templater,
            settings,
        }
    }

    /// Settings the pipeline was built with.
    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Seed an empty package with its placeholder marker.
    ///
    /// Returns `false` when the package already has content.
    pub async fn init_package(&self, name: &str) -> Result<bool, PublishError> {
        let name = PackageName::new(name)?;
        match self.content.list_children(&ContentLayout::package_dir(&name)).await {
            Ok(children) if !children.is_empty() => {
                tracing::debug!(package = %name, "package already exists");
                Ok(false)
            }
            Ok(_) => self.write_marker(&name).await.map(|_| true),
            Err(e) if e.is_not_found() => self.write_marker(&name).await.map(|_| true),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the Dockerfile of `name:tag`.
    ///
    /// Fails if the path already holds different content.
    pub async fn create_package(
        &self,
        name: &str,
        tag: &str,
        dockerfile: &[u8],
    ) -> Result<ContentHash, PublishError> {
        let name = PackageName::new(name)?;
        let tag = Tag::new(tag)?;

        let mut content = sanitize_manifest(dockerfile)?;
        content.push('\n');

        let hash = self
            .write_new(&ContentLayout::dockerfile(&name, &tag), content.as_bytes())
            .await?;
        self.retire_marker(&name).await?;
        tracing::info!(package = %name, tag = %tag, hash = %hash.short(), "package created");
        Ok(hash)
    }

    /// Add a tag to an existing package, labelling the Dockerfile with its
    /// provenance.
    pub async fn create_package_version(
        &self,
        name: &str,
        tag: &str,
        content: &[u8],
    ) -> Result<ContentHash, PublishError> {
        let name = PackageName::new(name)?;
        let tag = Tag::new(tag)?;

        match self.content.list_children(&ContentLayout::package_dir(&name)).await {
            Ok(children) if !children.is_empty() => {}
            Ok(_) => return Err(PublishError::UnknownPackage(name.to_string())),
            Err(e) if e.is_not_found() => {
                return Err(PublishError::UnknownPackage(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        let manifest = self.templater.render_image_manifest(
            name.as_str(),
            tag.as_str(),
            &self.settings.organization,
            content,
        )?;
        let hash = self
            .write_new(&ContentLayout::dockerfile(&name, &tag), &manifest)
            .await?;
        self.retire_marker(&name).await?;
        tracing::info!(package = %name, tag = %tag, hash = %hash.short(), "package version created");
        Ok(hash)
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Build, tag and push `name:tag` from a fresh workspace, then commit
    /// the generated build script.
    ///
    /// A failing target aborts the remaining ones; its captured output is in
    /// the returned [`crate::exec::ExecError::Failed`]. Nothing is rolled
    /// back, so the caller retries the whole push.
    pub async fn push_package(
        &self,
        name: &str,
        tag: &str,
        version_key: &str,
    ) -> Result<PushReport, PublishError> {
        let name = PackageName::new(name)?;
        let tag = Tag::new(tag)?;
        let key = VersionKey::new(version_key)?;

        let mut stage = PublishStage::Requested;
        tracing::info!(package = %name, tag = %tag, key = %key, %stage, "push started");

        let result = self.run_push(&name, &tag, &key, &mut stage).await;
        match &result {
            Ok(report) => tracing::info!(
                package = %name,
                tag = %tag,
                stage = %stage,
                committed = report.script_committed,
                "push finished"
            ),
            Err(e) => {
                let failed_at = stage;
                advance(&mut stage, PublishStage::Failed, &name, &tag);
                tracing::warn!(package = %name, tag = %tag, stage = %failed_at, error = %e, "push failed");
            }
        }
        result
    }

    async fn run_push(
        &self,
        name: &PackageName,
        tag: &Tag,
        key: &VersionKey,
        stage: &mut PublishStage,
    ) -> Result<PushReport, PublishError> {
        let script = self.templater.render_build_script(
            name.as_str(),
            tag.as_str(),
            &self.settings.registry,
            &self.settings.organization,
        )?;
        let dockerfile = file_bytes(self.content.read(&ContentLayout::dockerfile(name, tag)).await?)?;
        advance(stage, PublishStage::ContentFetched, name, tag);

        let workspace = Workspace::create(&self.settings.workspace_root, key)?;
        let executed = self
            .execute(&workspace, &script, &dockerfile, stage, name, tag)
            .await;
        let path = workspace.path().to_path_buf();
        let workspace_released = workspace.release().is_ok();
        let outputs = executed?;

        let script_committed = self.commit_script(name, tag, &script).await?;
        advance(stage, PublishStage::Committed, name, tag);

        Ok(PushReport {
            workspace: path,
            outputs,
            script_committed,
            workspace_released,
        })
    }

    async fn execute(
        &self,
        workspace: &Workspace,
        script: &[u8],
        dockerfile: &[u8],
        stage: &mut PublishStage,
        name: &PackageName,
        tag: &Tag,
    ) -> Result<Vec<(BuildTarget, ExecOutput)>, PublishError> {
        workspace.write_file(paths::BUILD_SCRIPT, script).await?;
        workspace.write_file(paths::DOCKERFILE, dockerfile).await?;
        advance(stage, PublishStage::WorkspaceMaterialized, name, tag);

        let mut outputs = Vec::with_capacity(BuildTarget::ALL.len());
        for target in BuildTarget::ALL {
            let output = self.runner.run(target, workspace.path()).await?;
            tracing::debug!(package = %name, tag = %tag, %target, "target finished");
            outputs.push((target, output));
        }
        advance(stage, PublishStage::ScriptExecuted, name, tag);
        Ok(outputs)
    }

    /// Store the rendered build script unless it is already current.
    async fn commit_script(
        &self,
        name: &PackageName,
        tag: &Tag,
        script: &[u8],
    ) -> Result<bool, PublishError> {
        let path = ContentLayout::build_script(name, tag);
        match self.content.read(&path).await {
            Ok(node) if node.bytes.as_deref() == Some(script) => Ok(false),
            Ok(node) => {
                self.content.write(&path, script, Some(&node.hash)).await?;
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                self.content.write(&path, script, None).await?;
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete one version: its registry entry, then every file of its
    /// directory. Safe to repeat.
    pub async fn delete_package_version(
        &self,
        name: &str,
        tag: &str,
        version_id: u64,
    ) -> Result<DeleteReport, PublishError> {
        let name = PackageName::new(name)?;
        let tag = Tag::new(tag)?;

        match self.catalog.delete_version(&name, version_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(package = %name, version_id, "registry version already gone");
            }
            Err(e) => return Err(e.into()),
        }

        let deleted = self
            .delete_tree(&ContentLayout::version_dir(&name, &tag))
            .await?;
        let marker_restored = self.restore_marker(&name).await?;

        tracing::info!(package = %name, tag = %tag, files = deleted.len(), "package version deleted");
        Ok(DeleteReport {
            deleted,
            marker_restored,
        })
    }

    /// Delete every version directory of a package.
    ///
    /// A package holding only its marker loses the marker and nothing else.
    /// Otherwise the marker is restored once the versions are gone, so the
    /// package stays listable.
    pub async fn delete_package(&self, name: &str) -> Result<DeleteReport, PublishError> {
        let name = PackageName::new(name)?;

        let children = match self
            .content
            .list_children(&ContentLayout::package_dir(&name))
            .await
        {
            Ok(children) => children,
            Err(e) if e.is_not_found() => {
                tracing::debug!(package = %name, "package already gone");
                return Ok(DeleteReport::default());
            }
            Err(e) => return Err(e.into()),
        };

        if let [only] = children.as_slice() {
            if only.is_file() && ContentLayout::is_marker(only.name()) {
                let mut deleted = Vec::new();
                if self.delete_file(only).await? {
                    deleted.push(only.path.clone());
                }
                tracing::info!(package = %name, "package marker deleted");
                return Ok(DeleteReport {
                    deleted,
                    marker_restored: false,
                });
            }
        }

        let mut deleted = Vec::new();
        for child in children.iter().filter(|c| c.is_dir()) {
            deleted.extend(self.delete_tree(&child.path).await?);
        }
        let marker_restored = self.restore_marker(&name).await?;

        tracing::info!(package = %name, files = deleted.len(), "package deleted");
        Ok(DeleteReport {
            deleted,
            marker_restored,
        })
    }

    /// Delete every file beneath `dir`, depth first.
    async fn delete_tree(&self, dir: &str) -> Result<Vec<String>, PublishError> {
        let mut deleted = Vec::new();
        let mut pending = vec![dir.to_string()];

        while let Some(dir) = pending.pop() {
            let children = match self.content.list_children(&dir).await {
                Ok(children) => children,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            for child in children {
                if child.is_dir() {
                    pending.push(child.path);
                } else if self.delete_file(&child).await? {
                    deleted.push(child.path);
                }
            }
        }
        Ok(deleted)
    }

    /// Delete one file by its hash. `false` if it was already gone.
    async fn delete_file(&self, node: &ContentNode) -> Result<bool, PublishError> {
        match self.content.delete(&node.path, &node.hash).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %node.path, "file already deleted");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Create `path`, accepting an existing file with identical content.
    async fn write_new(&self, path: &str, bytes: &[u8]) -> Result<ContentHash, PublishError> {
        match self.content.write(path, bytes, None).await {
            Ok(hash) => Ok(hash),
            Err(e @ ForgeError::Permanent { .. }) => match self.content.read(path).await {
                Ok(node) if node.bytes.as_deref() == Some(bytes) => {
                    tracing::debug!(path, "content already present");
                    Ok(node.hash)
                }
                _ => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn write_marker(&self, name: &PackageName) -> Result<ContentHash, PublishError> {
        let hash = self.write_new(&ContentLayout::marker(name), b"").await?;
        tracing::debug!(package = %name, "placeholder marker written");
        Ok(hash)
    }

    /// Write the marker if the package has no children left.
    async fn restore_marker(&self, name: &PackageName) -> Result<bool, PublishError> {
        match self.content.list_children(&ContentLayout::package_dir(name)).await {
            Ok(children) if !children.is_empty() => Ok(false),
            Ok(_) => self.write_marker(name).await.map(|_| true),
            Err(e) if e.is_not_found() => self.write_marker(name).await.map(|_| true),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the marker once the package has a version.
    async fn retire_marker(&self, name: &PackageName) -> Result<(), PublishError> {
        match self.content.read(&ContentLayout::marker(name)).await {
            Ok(node) => self.delete_file(&node).await.map(|_| ()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn advance(stage: &mut PublishStage, next: PublishStage, name: &PackageName, tag: &Tag) {
    tracing::debug!(package = %name, tag = %tag, from = %stage, to = %next, "publish stage");
    *stage = next;
}

/// Bytes of a file node; directories are rejected.
pub(super) fn file_bytes(node: ContentNode) -> Result<Vec<u8>, PublishError> {
    match node.bytes {
        Some(bytes) if node.is_file() => Ok(bytes),
        _ => Err(PublishError::NotAFile(node.path)),
    }
}
