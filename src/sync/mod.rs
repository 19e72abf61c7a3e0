//! sync
//!
//! Keeps the remote secret registry and the local mirror eventually
//! consistent, and regenerates the local secrets artifact.
//!
//! # Data flow
//!
//! ```text
//! create_secret:    value -> seal(current key) -> registry
//!                         -> mirror[lowercase(name)]
//! sync_environment: registry names -> mirror values -> inline
//!                         -> render -> config_output (atomic replace)
//! ```
//!
//! The registry never returns values. The mirror is the only readable
//! plaintext source, so a secret that exists remotely but not in the mirror
//! is skipped (and logged) during regeneration.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::core::types::{SecretName, TypeError};
use crate::forge::ForgeError;
use crate::seal::{self, SealError};
use crate::secrets::{EncryptedSecret, SecretError, SecretMetadata, SecretRegistry, SecretStore};
use crate::templates::{ArtifactTemplater, TemplateError};

/// Errors from secret synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("remote secret store error: {0}")]
    Remote(#[from] ForgeError),

    #[error(transparent)]
    Seal(#[from] SealError),

    #[error(transparent)]
    Mirror(#[from] SecretError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of one `sync_environment` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Secrets written to the artifact
    pub written: Vec<String>,
    /// Remote secrets with no mirrored value
    pub skipped: Vec<String>,
    /// Where the artifact was written
    pub output: PathBuf,
}

/// Collapse a secret value onto one line.
///
/// Carriage returns and newlines are removed, then every `,}` becomes
/// ` }, ` so multi-line map literals survive as a single line.
///
/// ```
/// use dockhand::sync::inline_value;
///
/// assert_eq!(inline_value("abc\ndef,}"), "abcdef }, ");
/// assert_eq!(inline_value("{\r\n  a: 1,\n}"), "{  a: 1 }, ");
/// ```
pub fn inline_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .replace(",}", " }, ")
}

/// Secret synchronization pipeline.
pub struct SecretsSync {
    registry: Arc<dyn SecretRegistry>,
    mirror: Arc<dyn SecretStore>,
    templater: Arc<ArtifactTemplater>,
    output: PathBuf,
    visibility: String,
}

impl std::fmt::Debug for SecretsSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsSync")
            .field("registry", &self.registry.name())
            .field("output", &self.output)
            .field("visibility", &self.visibility)
            .finish()
    }
}

impl SecretsSync {
    /// Create a pipeline writing its artifact to `output`.
    pub fn new(
        registry: Arc<dyn SecretRegistry>,
        mirror: Arc<dyn SecretStore>,
        templater: Arc<ArtifactTemplater>,
        output: impl Into<PathBuf>,
        visibility: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            mirror,
            templater,
            output: output.into(),
            visibility: visibility.into(),
        }
    }

    /// Path of the generated artifact.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Seal `value`, upload it, then mirror it locally.
    ///
    /// The public key is fetched on every call. The mirror is only written
    /// after the upload succeeds.
    pub async fn create_secret(&self, name: &str, value: &str) -> Result<(), SyncError> {
        let name = SecretName::new(name)?;

        let key = self.registry.public_key().await?;
        let recipient = seal::decode_public_key(&key.key)?;
        let encrypted_value = seal::seal(&recipient, value.as_bytes())?;

        self.registry
            .put_secret(&EncryptedSecret {
                name: name.clone(),
                key_id: key.key_id,
                encrypted_value,
                visibility: self.visibility.clone(),
            })
            .await?;

        self.mirror.set(&name.mirror_key(), value)?;
        tracing::info!(secret = %name, "secret created");
        Ok(())
    }

    /// Delete a secret remotely and from the mirror.
    ///
    /// A secret already missing remotely is not an error.
    pub async fn delete_secret(&self, name: &str) -> Result<(), SyncError> {
        let name = SecretName::new(name)?;

        match self.registry.delete_secret(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(secret = %name, "remote secret already absent");
            }
            Err(e) => return Err(e.into()),
        }

        self.mirror.delete(&name.mirror_key())?;
        tracing::info!(secret = %name, "secret deleted");
        Ok(())
    }

    /// Remote secret metadata.
    pub async fn list_secrets(&self) -> Result<Vec<SecretMetadata>, SyncError> {
        Ok(self.registry.list_secrets().await?)
    }

    /// Mirrored plaintext of a secret, if any.
    pub fn local_secret(&self, name: &str) -> Result<Option<String>, SyncError> {
        let name = SecretName::new(name)?;
        Ok(self.mirror.get(&name.mirror_key())?)
    }

    /// Regenerate the local secrets artifact from remote names and mirrored
    /// values, replacing the previous file.
    pub async fn sync_environment(&self) -> Result<SyncReport, SyncError> {
        let remote = self.registry.list_secrets().await?;

        let mut entries = BTreeMap::new();
        let mut skipped = Vec::new();
        for meta in remote {
            let key = meta.name.to_ascii_lowercase();
            match self.mirror.get(&key)? {
                Some(value) => {
                    entries.insert(meta.name, inline_value(&value));
                }
                None => {
                    tracing::warn!(secret = %meta.name, "no local value mirrored, skipping");
                    skipped.push(meta.name);
                }
            }
        }

        let rendered = self.templater.render_config_file(&entries)?;
        let output = self.output.clone();
        tokio::task::spawn_blocking(move || write_atomic(&output, &rendered))
            .await
            .map_err(|e| SyncError::Output {
                path: self.output.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })??;

        let written: Vec<String> = entries.into_keys().collect();
        tracing::info!(
            path = %self.output.display(),
            written = written.len(),
            skipped = skipped.len(),
            "secrets artifact written"
        );
        Ok(SyncReport {
            written,
            skipped,
            output: self.output.clone(),
        })
    }
}

/// Replace `path` with `bytes` via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    let output_err = |source| SyncError::Output {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(output_err)?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(output_err)?;
    temp.write_all(bytes).map_err(output_err)?;
    temp.as_file().sync_all().map_err(output_err)?;
    temp.persist(path).map_err(|e| output_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::mock::{FailOn, MemorySecretStore, MockOperation, MockSecretRegistry};

    struct Fixture {
        _dir: tempfile::TempDir,
        registry: MockSecretRegistry,
        mirror: MemorySecretStore,
        sync: SecretsSync,
    }

    fn fixture(registry: MockSecretRegistry, mirror: MemorySecretStore) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let sync = SecretsSync::new(
            Arc::new(registry.clone()),
            Arc::new(mirror.clone()),
            Arc::new(ArtifactTemplater::new().unwrap()),
            dir.path().join("act/.secrets"),
            "all",
        );
        Fixture {
            _dir: dir,
            registry,
            mirror,
            sync,
        }
    }

    #[test]
    fn inline_strips_newlines_and_rewrites_trailing_commas() {
        assert_eq!(inline_value("plain"), "plain");
        assert_eq!(inline_value("a\r\nb"), "ab");
        assert_eq!(inline_value("{a: 1,}"), "{a: 1 }, ");
    }

    #[tokio::test]
    async fn create_uploads_then_mirrors() {
        let f = fixture(MockSecretRegistry::new(), MemorySecretStore::new());
        f.sync.create_secret("API_KEY", "s3cret").await.unwrap();

        assert_eq!(f.registry.open("API_KEY").unwrap(), b"s3cret");
        assert_eq!(f.mirror.get("api_key").unwrap().as_deref(), Some("s3cret"));
        assert_eq!(
            f.sync.local_secret("API_KEY").unwrap().as_deref(),
            Some("s3cret")
        );
    }

    #[tokio::test]
    async fn create_fetches_key_every_time() {
        let f = fixture(MockSecretRegistry::new(), MemorySecretStore::new());
        f.sync.create_secret("A", "1").await.unwrap();
        f.registry.rotate_key([9u8; 32]);
        f.sync.create_secret("B", "2").await.unwrap();

        let key_fetches = f
            .registry
            .operations()
            .into_iter()
            .filter(|op| *op == MockOperation::PublicKey)
            .count();
        assert_eq!(key_fetches, 2);
        assert_eq!(f.registry.key_id_of("B"), Some(f.registry.key_id()));
        assert_eq!(f.registry.open("B").unwrap(), b"2");
    }

    #[tokio::test]
    async fn failed_upload_leaves_mirror_untouched() {
        let registry =
            MockSecretRegistry::new().fail_on(FailOn::PutSecret(ForgeError::Transient("503".into())));
        let f = fixture(registry, MemorySecretStore::new());

        let err = f.sync.create_secret("API_KEY", "v").await.unwrap_err();
        assert!(matches!(err, SyncError::Remote(ForgeError::Transient(_))));
        assert!(f.mirror.get("api_key").unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_any_call() {
        let f = fixture(MockSecretRegistry::new(), MemorySecretStore::new());
        let err = f.sync.create_secret("bad-name", "v").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidName(_)));
        assert!(f.registry.operations().is_empty());
    }

    #[tokio::test]
    async fn delete_tolerates_missing_remote() {
        let f = fixture(
            MockSecretRegistry::new(),
            MemorySecretStore::new().with("api_key", "v"),
        );
        f.sync.delete_secret("API_KEY").await.unwrap();
        assert!(f.mirror.get("api_key").unwrap().is_none());
    }

    #[tokio::test]
    async fn sync_skips_unmirrored_and_replaces_output() {
        let registry = MockSecretRegistry::new()
            .with_secret("API_KEY", "all")
            .with_secret("ORPHAN", "all");
        let mirror = MemorySecretStore::new().with("api_key", "abc\ndef,}");
        let f = fixture(registry, mirror);

        std::fs::create_dir_all(f.sync.output().parent().unwrap()).unwrap();
        std::fs::write(f.sync.output(), "STALE=1\n").unwrap();

        let report = f.sync.sync_environment().await.unwrap();
        assert_eq!(report.written, vec!["API_KEY"]);
        assert_eq!(report.skipped, vec!["ORPHAN"]);

        let artifact = std::fs::read_to_string(f.sync.output()).unwrap();
        assert_eq!(artifact, "API_KEY=abcdef }, \n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sync_reports_unwritable_output() {
        let f = fixture(
            MockSecretRegistry::new().with_secret("API_KEY", "all"),
            MemorySecretStore::new().with("api_key", "v"),
        );
        std::fs::create_dir_all(f.sync.output()).unwrap();

        let err = f.sync.sync_environment().await.unwrap_err();
        assert!(matches!(err, SyncError::Output { ref path, .. } if path == f.sync.output()));
        assert!(f.sync.output().is_dir());
    }

    #[tokio::test]
    async fn sync_propagates_list_failure() {
        let registry = MockSecretRegistry::new()
            .fail_on(FailOn::ListSecrets(ForgeError::AuthFailed("bad token".into())));
        let f = fixture(registry, MemorySecretStore::new());

        let err = f.sync.sync_environment().await.unwrap_err();
        assert!(matches!(err, SyncError::Remote(ForgeError::AuthFailed(_))));
        assert!(!f.sync.output().exists());
    }
}
