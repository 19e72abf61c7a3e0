//! catalog::mock
//!
//! In-memory version catalog for deterministic testing.
//!
//! # Example
//!
//! ```
//! use dockhand::catalog::mock::MockVersionCatalog;
//! use dockhand::catalog::{PackageVersion, VersionCatalog};
//! use dockhand::core::types::PackageName;
//!
//! # tokio_test::block_on(async {
//! let catalog = MockVersionCatalog::new()
//!     .with_version("demo", PackageVersion::new(1, "sha256:aaa", ["latest"]));
//! let demo = PackageName::new("demo").unwrap();
//!
//! assert_eq!(catalog.list_versions(&demo).await.unwrap().len(), 1);
//! catalog.delete_version(&demo, 1).await.unwrap();
//! assert!(catalog.delete_version(&demo, 1).await.unwrap_err().is_not_found());
//! # });
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{PackageVersion, VersionCatalog};
use crate::core::types::PackageName;
use crate::forge::ForgeError;

/// Mock version catalog for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockVersionCatalog {
    inner: Arc<Mutex<MockCatalogInner>>,
}

#[derive(Debug, Default)]
struct MockCatalogInner {
    /// Versions by package name, in insertion order.
    packages: BTreeMap<String, Vec<PackageVersion>>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list_versions with the given error.
    ListVersions(ForgeError),
    /// Fail get_version with the given error.
    GetVersion(ForgeError),
    /// Fail delete_version with the given error.
    DeleteVersion(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListVersions { package: String },
    GetVersion { package: String, version_id: u64 },
    DeleteVersion { package: String, version_id: u64 },
}

impl MockVersionCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a published version of `package`.
    pub fn with_version(self, package: impl Into<String>, version: PackageVersion) -> Self {
        self.insert_version(package, version);
        self
    }

    /// Add a published version of `package` through a shared handle.
    pub fn insert_version(&self, package: impl Into<String>, version: PackageVersion) {
        self.state()
            .packages
            .entry(package.into())
            .or_default()
            .push(version);
    }

    /// Configure the catalog to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Remaining version ids of a package (for test verification).
    pub fn version_ids(&self, package: &str) -> Vec<u64> {
        self.state()
            .packages
            .get(package)
            .map(|v| v.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, MockCatalogInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), ForgeError> {
        match &self.state().fail_on {
            Some(FailOn::ListVersions(e)) if expected == "list_versions" => Err(e.clone()),
            Some(FailOn::GetVersion(e)) if expected == "get_version" => Err(e.clone()),
            Some(FailOn::DeleteVersion(e)) if expected == "delete_version" => Err(e.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VersionCatalog for MockVersionCatalog {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_versions(
        &self,
        package: &PackageName,
    ) -> Result<Vec<PackageVersion>, ForgeError> {
        self.record(MockOperation::ListVersions {
            package: package.to_string(),
        });
        self.check_fail("list_versions")?;

        self.state()
            .packages
            .get(package.as_str())
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("package {}", package)))
    }

    async fn get_version(
        &self,
        package: &PackageName,
        version_id: u64,
    ) -> Result<PackageVersion, ForgeError> {
        self.record(MockOperation::GetVersion {
            package: package.to_string(),
            version_id,
        });
        self.check_fail("get_version")?;

        self.state()
            .packages
            .get(package.as_str())
            .and_then(|versions| versions.iter().find(|v| v.id == version_id))
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("{} version {}", package, version_id)))
    }

    async fn delete_version(
        &self,
        package: &PackageName,
        version_id: u64,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::DeleteVersion {
            package: package.to_string(),
            version_id,
        });
        self.check_fail("delete_version")?;

        let mut inner = self.state();
        let versions = inner
            .packages
            .get_mut(package.as_str())
            .ok_or_else(|| ForgeError::NotFound(format!("package {}", package)))?;
        let before = versions.len();
        versions.retain(|v| v.id != version_id);
        if versions.len() == before {
            return Err(ForgeError::NotFound(format!(
                "{} version {}",
                package, version_id
            )));
        }
        Ok(())
    }
}
