//! publish::inventory
//!
//! Read-side queries joining the content tree with the registry.

use serde::Serialize;

use super::pipeline::{file_bytes, PublishPipeline};
use super::PublishError;
use crate::catalog::{PackageVersion, TagIndex};
use crate::core::paths::{self, ContentLayout};
use crate::core::types::{PackageName, Tag};

/// One tag directory of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub tag: Tag,
    /// File names in the version directory
    pub files: Vec<String>,
    /// Registry version currently holding the tag, if published
    pub version: Option<PackageVersion>,
}

/// A package as seen from the content tree and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub name: PackageName,
    /// Whether only the placeholder marker keeps the package alive
    pub placeholder: bool,
    pub versions: Vec<VersionEntry>,
}

impl PublishPipeline {
    /// Every package in the content tree, sorted.
    ///
    /// Top-level directories whose names are not valid package names are
    /// ignored.
    pub async fn list_packages(&self) -> Result<Vec<PackageName>, PublishError> {
        let mut names: Vec<PackageName> = self
            .content
            .list_children(paths::ROOT)
            .await?
            .into_iter()
            .filter(|node| node.is_dir())
            .filter_map(|node| PackageName::new(node.name()).ok())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Tag directories of a package joined with their registry versions.
    pub async fn describe_package(&self, name: &str) -> Result<PackageSummary, PublishError> {
        let name = PackageName::new(name)?;
        let children = match self
            .content
            .list_children(&ContentLayout::package_dir(&name))
            .await
        {
            Ok(children) => children,
            Err(e) if e.is_not_found() => {
                return Err(PublishError::UnknownPackage(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let index = self.tag_index(&name).await?;

        let placeholder = children
            .iter()
            .any(|c| c.is_file() && ContentLayout::is_marker(c.name()));

        let mut versions = Vec::new();
        for child in children.iter().filter(|c| c.is_dir()) {
            let Ok(tag) = Tag::new(child.name()) else {
                tracing::debug!(path = %child.path, "skipping non-tag directory");
                continue;
            };
            let files = match self.content.list_children(&child.path).await {
                Ok(files) => files.iter().map(|f| f.name().to_string()).collect(),
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            let version = index.get(tag.as_str()).cloned();
            versions.push(VersionEntry {
                tag,
                files,
                version,
            });
        }

        Ok(PackageSummary {
            name,
            placeholder,
            versions,
        })
    }

    /// Every tag the registry knows for a package, sorted.
    pub async fn list_tags(&self, name: &str) -> Result<Vec<String>, PublishError> {
        let name = PackageName::new(name)?;
        let index = self.tag_index(&name).await?;
        Ok(index.tags().map(str::to_string).collect())
    }

    /// Read one file of a version directory.
    pub async fn read_package_file(
        &self,
        name: &str,
        tag: &str,
        file: &str,
    ) -> Result<Vec<u8>, PublishError> {
        let name = PackageName::new(name)?;
        let tag = Tag::new(tag)?;
        if file.is_empty() || file == "." || file == ".." || file.contains(['/', '\\']) {
            return Err(PublishError::InvalidFileName(file.to_string()));
        }

        let node = self
            .content
            .read(&ContentLayout::version_file(&name, &tag, file))
            .await?;
        file_bytes(node)
    }

    /// Tag index of a package; a package never published has none.
    async fn tag_index(&self, name: &PackageName) -> Result<TagIndex, PublishError> {
        match self.catalog.list_versions(name).await {
            Ok(versions) => Ok(TagIndex::build(&versions)),
            Err(e) if e.is_not_found() => Ok(TagIndex::default()),
            Err(e) => Err(e.into()),
        }
    }
}
