//! catalog::github
//!
//! VersionCatalog backed by the GitHub Packages API (container packages
//! owned by an organization).
//!
//! # Endpoints
//!
//! - `GET    /orgs/{org}/packages/container/{name}/versions` (paginated, 100 per page)
//! - `GET    /orgs/{org}/packages/container/{name}/versions/{id}`
//! - `DELETE /orgs/{org}/packages/container/{name}/versions/{id}`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::traits::{PackageVersion, VersionCatalog};
use crate::core::types::PackageName;
use crate::forge::{ForgeError, GitHubClient};

/// Page size for version listings (the API maximum).
const PER_PAGE: usize = 100;

/// Version catalog for one organization's container packages.
#[derive(Debug, Clone)]
pub struct GitHubVersionCatalog {
    client: GitHubClient,
    org: String,
}

impl GitHubVersionCatalog {
    /// Create a catalog for `org`.
    pub fn new(client: GitHubClient, org: impl Into<String>) -> Self {
        Self {
            client,
            org: org.into(),
        }
    }

    fn versions_path(&self, package: &PackageName) -> String {
        format!("orgs/{}/packages/container/{}/versions", self.org, package)
    }

    fn version_path(&self, package: &PackageName, version_id: u64) -> String {
        format!("{}/{}", self.versions_path(package), version_id)
    }
}

#[async_trait]
impl VersionCatalog for GitHubVersionCatalog {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_versions(
        &self,
        package: &PackageName,
    ) -> Result<Vec<PackageVersion>, ForgeError> {
        let path = self.versions_path(package);
        let mut versions = Vec::new();
        let mut page = 1u32;

        loop {
            let batch: Vec<GitHubPackageVersion> = self
                .client
                .get(
                    &path,
                    &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
                )
                .await?;
            let done = batch.len() < PER_PAGE;
            versions.extend(batch.into_iter().map(PackageVersion::from));
            if done {
                break;
            }
            page += 1;
        }

        tracing::debug!(package = %package, count = versions.len(), "listed package versions");
        Ok(versions)
    }

    async fn get_version(
        &self,
        package: &PackageName,
        version_id: u64,
    ) -> Result<PackageVersion, ForgeError> {
        let version: GitHubPackageVersion = self
            .client
            .get(&self.version_path(package, version_id), &[])
            .await?;
        Ok(version.into())
    }

    async fn delete_version(
        &self,
        package: &PackageName,
        version_id: u64,
    ) -> Result<(), ForgeError> {
        self.client
            .delete(&self.version_path(package, version_id))
            .await?;
        tracing::info!(package = %package, version_id, "deleted package version");
        Ok(())
    }
}

// =============================================================================
// GitHub API types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GitHubPackageVersion {
    id: u64,
    name: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    package_html_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    metadata: Option<GitHubVersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct GitHubVersionMetadata {
    #[serde(default)]
    container: Option<GitHubContainerMetadata>,
}

#[derive(Debug, Deserialize)]
struct GitHubContainerMetadata {
    #[serde(default)]
    tags: Vec<String>,
}

impl From<GitHubPackageVersion> for PackageVersion {
    fn from(gh: GitHubPackageVersion) -> Self {
        let tags = gh
            .metadata
            .and_then(|m| m.container)
            .map(|c| c.tags)
            .unwrap_or_default();
        PackageVersion {
            id: gh.id,
            name: gh.name,
            tags: tags.into_iter().collect(),
            created_at: gh.created_at,
            updated_at: gh.updated_at,
            html_url: gh.html_url.or(gh.package_html_url),
        }
    }
}
