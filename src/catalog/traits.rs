//! catalog::traits
//!
//! VersionCatalog trait definition and the tag index built on top of it.
//!
//! # Design
//!
//! The registry, not this crate, is authoritative for published versions.
//! The catalog is read-mostly: list, get, and delete by id. Tag lookups go
//! through [`TagIndex`], which flattens every version's tag set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::PackageName;
use crate::forge::ForgeError;

/// A published version of a container package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Registry-assigned version id
    pub id: u64,
    /// Version name (the image digest for container packages)
    pub name: String,
    /// Tags currently pointing at this version
    pub tags: BTreeSet<String>,
    /// When the version was published
    pub created_at: DateTime<Utc>,
    /// When the version was last changed
    pub updated_at: DateTime<Utc>,
    /// Registry web page for this version
    pub html_url: Option<String>,
}

impl PackageVersion {
    /// Create a version record stamped with the current time.
    pub fn new<T: Into<String>>(
        id: u64,
        name: impl Into<String>,
        tags: impl IntoIterator<Item = T>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            created_at: now,
            updated_at: now,
            html_url: None,
        }
    }

    /// Whether this version carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Query and prune the registry's published versions.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait VersionCatalog: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// List every published version of a package.
    async fn list_versions(&self, package: &PackageName)
        -> Result<Vec<PackageVersion>, ForgeError>;

    /// Get one version by id.
    async fn get_version(
        &self,
        package: &PackageName,
        version_id: u64,
    ) -> Result<PackageVersion, ForgeError>;

    /// Delete one version by id.
    ///
    /// Returns `ForgeError::NotFound` if the version does not exist.
    async fn delete_version(&self, package: &PackageName, version_id: u64)
        -> Result<(), ForgeError>;
}

/// `tag -> PackageVersion` lookup table.
///
/// # Collisions
///
/// The registry gives no ordering guarantee, so when two versions claim the
/// same tag the one seen last in input order wins. This is a tie-break, not
/// a correctness guarantee; collisions are logged.
///
/// # Example
///
/// ```
/// use dockhand::catalog::{PackageVersion, TagIndex};
///
/// let versions = vec![
///     PackageVersion::new(1, "sha256:aaa", ["v1", "latest"]),
///     PackageVersion::new(2, "sha256:bbb", ["v2", "latest"]),
/// ];
/// let index = TagIndex::build(&versions);
///
/// assert_eq!(index.get("v1").unwrap().id, 1);
/// assert_eq!(index.get("latest").unwrap().id, 2);
/// assert_eq!(index.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: BTreeMap<String, PackageVersion>,
}

impl TagIndex {
    /// Flatten every version's tags into one index.
    pub fn build<'a>(versions: impl IntoIterator<Item = &'a PackageVersion>) -> Self {
        let mut by_tag = BTreeMap::new();
        for version in versions {
            for tag in &version.tags {
                if let Some(previous) = by_tag.insert(tag.clone(), version.clone()) {
                    tracing::debug!(
                        tag = %tag,
                        previous = previous.id,
                        winner = version.id,
                        "tag claimed by multiple versions"
                    );
                }
            }
        }
        Self { by_tag }
    }

    /// Version currently holding `tag`.
    pub fn get(&self, tag: &str) -> Option<&PackageVersion> {
        self.by_tag.get(tag)
    }

    /// All indexed tags, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// Number of indexed tags.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether no tags are indexed.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_version_wins_collision() {
        let first = PackageVersion::new(10, "sha256:a", ["latest"]);
        let second = PackageVersion::new(5, "sha256:b", ["latest"]);

        let index = TagIndex::build([&first, &second]);
        assert_eq!(index.get("latest").unwrap().id, 5);

        let index = TagIndex::build([&second, &first]);
        assert_eq!(index.get("latest").unwrap().id, 10);
    }

    #[test]
    fn untagged_versions_are_absent() {
        let untagged = PackageVersion::new(1, "sha256:a", Vec::<String>::new());
        let index = TagIndex::build([&untagged]);
        assert!(index.is_empty());
    }

    #[test]
    fn tags_are_sorted() {
        let v = PackageVersion::new(1, "sha256:a", ["v2", "latest", "v1"]);
        let index = TagIndex::build([&v]);
        assert_eq!(index.tags().collect::<Vec<_>>(), vec!["latest", "v1", "v2"]);
        assert!(v.has_tag("v1"));
    }
}
