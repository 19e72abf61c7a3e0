//! secrets::file_store
//!
//! File-backed local secret mirror.
//!
//! The mirror is one flat TOML table (default `~/.dockhand/mirror.toml`)
//! mapping lower-cased secret names to plaintext values. It is the only
//! readable copy of a value once it has been sealed and uploaded.
//!
//! The file is owner-only (0600 on Unix) and rewritten whole through a
//! sibling `.tmp` file and a rename. Values never appear in logs or errors.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};
use crate::core::config::Config;

/// File-backed secret mirror.
///
/// # Example
///
/// ```
/// use dockhand::secrets::{FileSecretStore, SecretStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FileSecretStore::with_path(dir.path().join("mirror.toml"));
///
/// store.set("api_key", "abc").unwrap();
/// assert_eq!(store.get("api_key").unwrap().as_deref(), Some("abc"));
/// ```
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a mirror at the configured location.
    pub fn from_config(config: &Config) -> Result<Self, SecretError> {
        let path = config
            .mirror_path()
            .map_err(|e| SecretError::ReadError(e.to_string()))?;
        Ok(Self { path })
    }

    /// Create a mirror at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the mirror file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read mirror file: {}", e)))?;

        // The toml error carries a source excerpt, which may hold a value.
        toml::from_str(&content)
            .map_err(|_| SecretError::ReadError("cannot parse mirror file".into()))
    }

    fn write_all(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(secrets)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize mirror: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict before any content lands on disk.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {}", e)))?;

            file.write_all(content.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write mirror: {}", e)))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut secrets = self.read_all()?;
        secrets.insert(key.to_string(), value.to_string());
        self.write_all(&secrets)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut secrets = self.read_all()?;
        if secrets.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror(dir: &tempfile::TempDir) -> FileSecretStore {
        FileSecretStore::with_path(dir.path().join("mirror.toml"))
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = mirror(&dir);

        assert_eq!(store.get("api_key").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn later_value_replaces_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let store = mirror(&dir);

        store.set("api_key", "v1").unwrap();
        store.set("db_url", "postgres://db").unwrap();
        store.set("api_key", "v2").unwrap();

        assert_eq!(store.get("api_key").unwrap().as_deref(), Some("v2"));
        assert!(store.exists("db_url").unwrap());
        assert_eq!(store.get("db_url").unwrap().as_deref(), Some("postgres://db"));
    }

    #[test]
    fn deleting_absent_key_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = mirror(&dir);

        store.delete("api_key").unwrap();
        assert!(!store.path().exists());

        store.set("api_key", "v").unwrap();
        store.delete("api_key").unwrap();
        store.delete("api_key").unwrap();
        assert_eq!(store.get("api_key").unwrap(), None);
    }

    #[test]
    fn nested_path_is_created_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/dockhand/mirror.toml");
        let store = FileSecretStore::with_path(path.clone());

        store.set("api_key", "v").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn mirror_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = mirror(&dir);
        store.set("api_key", "v").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn parse_error_does_not_echo_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = mirror(&dir);
        fs::write(store.path(), "api_key = \"hunter2").unwrap();

        let err = store.get("api_key").unwrap_err().to_string();
        assert!(err.contains("cannot parse"));
        assert!(!err.contains("hunter2"));
    }

    #[test]
    fn multiline_and_brace_values_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = mirror(&dir);
        store.set("api_key", "abc\ndef,}").unwrap();

        let reopened = FileSecretStore::with_path(store.path());
        assert_eq!(reopened.get("api_key").unwrap().as_deref(), Some("abc\ndef,}"));
    }
}
