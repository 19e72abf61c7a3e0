//! Secret upload and artifact regeneration against the in-memory registry.

use std::sync::Arc;

use dockhand::forge::ForgeError;
use dockhand::secrets::mock::{FailOn, MemorySecretStore, MockOperation, MockSecretRegistry};
use dockhand::secrets::{FileSecretStore, SecretStore};
use dockhand::sync::{SecretsSync, SyncError};
use dockhand::templates::ArtifactTemplater;
use tempfile::TempDir;

fn pipeline(
    registry: &MockSecretRegistry,
    mirror: Arc<dyn SecretStore>,
    dir: &TempDir,
) -> SecretsSync {
    SecretsSync::new(
        Arc::new(registry.clone()),
        mirror,
        Arc::new(ArtifactTemplater::new().unwrap()),
        dir.path().join("out/secrets.env"),
        "all",
    )
}

#[tokio::test]
async fn create_then_sync_inlines_value() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MockSecretRegistry::new();
    let mirror = MemorySecretStore::new();
    let sync = pipeline(&registry, Arc::new(mirror.clone()), &dir);

    sync.create_secret("API_KEY", "abc\ndef,}").await.unwrap();
    let report = sync.sync_environment().await.unwrap();

    assert_eq!(registry.open("API_KEY").unwrap(), b"abc\ndef,}");
    assert_eq!(registry.visibility_of("API_KEY").as_deref(), Some("all"));
    assert_eq!(mirror.get("api_key").unwrap().as_deref(), Some("abc\ndef,}"));

    let artifact = std::fs::read_to_string(&report.output).unwrap();
    assert_eq!(artifact, "API_KEY=abcdef }, \n");
    assert_eq!(report.written, vec!["API_KEY"]);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn public_key_fetched_for_every_upload() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MockSecretRegistry::new();
    let sync = pipeline(&registry, Arc::new(MemorySecretStore::new()), &dir);

    sync.create_secret("FIRST", "one").await.unwrap();
    registry.rotate_key([9u8; 32]);
    sync.create_secret("SECOND", "two").await.unwrap();

    let key_fetches = registry
        .operations()
        .iter()
        .filter(|op| **op == MockOperation::PublicKey)
        .count();
    assert_eq!(key_fetches, 2);
    assert_eq!(registry.key_id_of("SECOND"), Some(registry.key_id()));
    assert_eq!(registry.open("SECOND").unwrap(), b"two");
}

#[tokio::test]
async fn failed_upload_leaves_mirror_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let registry =
        MockSecretRegistry::new().fail_on(FailOn::PutSecret(ForgeError::Transient("503".into())));
    let mirror = MemorySecretStore::new();
    let sync = pipeline(&registry, Arc::new(mirror.clone()), &dir);

    let err = sync.create_secret("API_KEY", "value").await.unwrap_err();

    assert!(matches!(err, SyncError::Remote(ref e) if e.is_transient()));
    assert_eq!(mirror.get("api_key").unwrap(), None);
}

#[tokio::test]
async fn sync_skips_secrets_without_local_value() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MockSecretRegistry::new()
        .with_secret("DB_URL", "private")
        .with_secret("TOKEN", "all");
    let mirror = MemorySecretStore::new().with("token", "t0k");
    let sync = pipeline(&registry, Arc::new(mirror), &dir);

    let report = sync.sync_environment().await.unwrap();

    assert_eq!(report.written, vec!["TOKEN"]);
    assert_eq!(report.skipped, vec!["DB_URL"]);
    assert_eq!(std::fs::read_to_string(sync.output()).unwrap(), "TOKEN=t0k\n");
}

#[tokio::test]
async fn sync_replaces_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MockSecretRegistry::new();
    let sync = pipeline(&registry, Arc::new(MemorySecretStore::new()), &dir);

    sync.create_secret("OLD", "1").await.unwrap();
    sync.sync_environment().await.unwrap();
    sync.delete_secret("OLD").await.unwrap();
    sync.create_secret("NEW", "2").await.unwrap();
    sync.sync_environment().await.unwrap();

    assert_eq!(registry.secret_names(), vec!["NEW"]);
    assert_eq!(std::fs::read_to_string(sync.output()).unwrap(), "NEW=2\n");
}

#[tokio::test]
async fn delete_tolerates_missing_remote() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MockSecretRegistry::new();
    let mirror = MemorySecretStore::new().with("gone", "x");
    let sync = pipeline(&registry, Arc::new(mirror.clone()), &dir);

    sync.delete_secret("GONE").await.unwrap();

    assert_eq!(mirror.get("gone").unwrap(), None);
}

#[tokio::test]
async fn file_mirror_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mirror_path = dir.path().join("mirror.toml");
    let registry = MockSecretRegistry::new();

    let sync = pipeline(
        &registry,
        Arc::new(FileSecretStore::with_path(mirror_path.clone())),
        &dir,
    );
    sync.create_secret("API_KEY", "s3cret").await.unwrap();

    let reopened = FileSecretStore::with_path(mirror_path.clone());
    assert_eq!(reopened.get("api_key").unwrap().as_deref(), Some("s3cret"));
}

#[tokio::test]
async fn invalid_name_is_rejected_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MockSecretRegistry::new();
    let sync = pipeline(&registry, Arc::new(MemorySecretStore::new()), &dir);

    let err = sync.create_secret("GITHUB_TOKEN", "x").await.unwrap_err();

    assert!(matches!(err, SyncError::InvalidName(_)));
    assert!(registry.operations().is_empty());
}
