//! secrets::mock
//!
//! In-memory secret registry and mirror for deterministic testing.
//!
//! [`MockSecretRegistry`] holds a real X25519 key pair so tests can open
//! uploaded ciphertext and check what was sealed. [`MemorySecretStore`] is
//! an in-memory stand-in for the file mirror.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::SecretKey;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{
    EncryptedSecret, PublicKeyInfo, SecretError, SecretMetadata, SecretRegistry, SecretStore,
};
use crate::core::types::SecretName;
use crate::forge::ForgeError;

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    PublicKey(ForgeError),
    ListSecrets(ForgeError),
    PutSecret(ForgeError),
    DeleteSecret(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    PublicKey,
    ListSecrets,
    PutSecret { name: String, key_id: String },
    DeleteSecret { name: String },
}

#[derive(Debug, Clone)]
struct StoredSecret {
    key_id: String,
    encrypted_value: String,
    visibility: String,
}

/// Mock remote secret registry.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Clone)]
pub struct MockSecretRegistry {
    inner: Arc<Mutex<MockRegistryInner>>,
}

struct MockRegistryInner {
    secret_key: SecretKey,
    key_id: u64,
    secrets: BTreeMap<String, StoredSecret>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

impl std::fmt::Debug for MockSecretRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.state();
        f.debug_struct("MockSecretRegistry")
            .field("key_id", &inner.key_id)
            .field("secrets", &inner.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MockSecretRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSecretRegistry {
    /// Create an empty registry with a fixed key pair.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRegistryInner {
                secret_key: SecretKey::from([1u8; 32]),
                key_id: 1,
                secrets: BTreeMap::new(),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Add a secret whose value is unknown to the registry (metadata only).
    pub fn with_secret(self, name: impl Into<String>, visibility: impl Into<String>) -> Self {
        self.state().secrets.insert(
            name.into(),
            StoredSecret {
                key_id: "seed".into(),
                encrypted_value: String::new(),
                visibility: visibility.into(),
            },
        );
        self
    }

    /// Configure the registry to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Replace the key pair, as a remote key rotation would.
    pub fn rotate_key(&self, secret_key: [u8; 32]) {
        let mut inner = self.state();
        inner.secret_key = SecretKey::from(secret_key);
        inner.key_id += 1;
    }

    /// Current key id.
    pub fn key_id(&self) -> String {
        self.state().key_id.to_string()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Names of stored secrets.
    pub fn secret_names(&self) -> Vec<String> {
        self.state().secrets.keys().cloned().collect()
    }

    /// Visibility a secret was uploaded with.
    pub fn visibility_of(&self, name: &str) -> Option<String> {
        self.state().secrets.get(name).map(|s| s.visibility.clone())
    }

    /// Key id a secret was sealed against.
    pub fn key_id_of(&self, name: &str) -> Option<String> {
        self.state().secrets.get(name).map(|s| s.key_id.clone())
    }

    /// Decrypt an uploaded secret with the current private key.
    ///
    /// `None` if the secret is missing or does not open.
    pub fn open(&self, name: &str) -> Option<Vec<u8>> {
        let inner = self.state();
        let stored = inner.secrets.get(name)?;
        let raw = STANDARD.decode(&stored.encrypted_value).ok()?;
        inner.secret_key.unseal(&raw).ok()
    }

    fn state(&self) -> MutexGuard<'_, MockRegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), ForgeError> {
        match &self.state().fail_on {
            Some(FailOn::PublicKey(e)) if expected == "public_key" => Err(e.clone()),
            Some(FailOn::ListSecrets(e)) if expected == "list_secrets" => Err(e.clone()),
            Some(FailOn::PutSecret(e)) if expected == "put_secret" => Err(e.clone()),
            Some(FailOn::DeleteSecret(e)) if expected == "delete_secret" => Err(e.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SecretRegistry for MockSecretRegistry {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn public_key(&self) -> Result<PublicKeyInfo, ForgeError> {
        self.record(MockOperation::PublicKey);
        self.check_fail("public_key")?;

        let inner = self.state();
        Ok(PublicKeyInfo {
            key_id: inner.key_id.to_string(),
            key: STANDARD.encode(inner.secret_key.public_key().as_bytes()),
        })
    }

    async fn list_secrets(&self) -> Result<Vec<SecretMetadata>, ForgeError> {
        self.record(MockOperation::ListSecrets);
        self.check_fail("list_secrets")?;

        Ok(self
            .state()
            .secrets
            .iter()
            .map(|(name, s)| SecretMetadata::new(name.clone(), Some(s.visibility.as_str())))
            .collect())
    }

    async fn put_secret(&self, secret: &EncryptedSecret) -> Result<(), ForgeError> {
        self.record(MockOperation::PutSecret {
            name: secret.name.to_string(),
            key_id: secret.key_id.clone(),
        });
        self.check_fail("put_secret")?;

        let mut inner = self.state();
        if secret.key_id != inner.key_id.to_string() {
            return Err(ForgeError::permanent(
                422,
                format!("key_id {} is not the current key", secret.key_id),
            ));
        }
        inner.secrets.insert(
            secret.name.to_string(),
            StoredSecret {
                key_id: secret.key_id.clone(),
                encrypted_value: secret.encrypted_value.clone(),
                visibility: secret.visibility.clone(),
            },
        );
        Ok(())
    }

    async fn delete_secret(&self, name: &SecretName) -> Result<(), ForgeError> {
        self.record(MockOperation::DeleteSecret {
            name: name.to_string(),
        });
        self.check_fail("delete_secret")?;

        self.state()
            .secrets
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| ForgeError::NotFound(format!("secret {}", name)))
    }
}

/// In-memory secret mirror.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.lock().insert(key.into(), value.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.lock().remove(key);
        Ok(())
    }
}
