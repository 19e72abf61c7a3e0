//! secrets::traits
//!
//! The two places a secret lives.
//!
//! - [`SecretStore`]: the local plaintext mirror, a small key-value store
//!   keyed by the lower-cased secret name. It is the only readable source of
//!   secret values.
//! - [`SecretRegistry`]: the remote organization secret store. It accepts
//!   sealed values and only ever reports metadata back.
//!
//! # Security
//!
//! Implementations MUST never log, print, or include secret values in
//! error messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::types::SecretName;
use crate::forge::ForgeError;

/// Errors from the local secret mirror.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from the mirror.
    #[error("failed to read secret mirror: {0}")]
    ReadError(String),

    /// Failed to write to the mirror.
    #[error("failed to write secret mirror: {0}")]
    WriteError(String),
}

/// Local plaintext key-value mirror.
///
/// Keys are case-normalized secret names (see [`SecretName::mirror_key`]).
pub trait SecretStore: Send + Sync {
    /// Get a value by key. `Ok(None)` when the key is absent.
    ///
    /// # Security
    ///
    /// The returned value is the raw secret. Do not log or print it.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a value, overwriting any existing one.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a value. Idempotent.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

/// The remote store's current sealing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyInfo {
    /// Identifier echoed back on upload
    pub key_id: String,
    /// Base64-encoded 32-byte public key
    pub key: String,
}

/// Remote secret metadata. Values are never returned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMetadata {
    pub name: String,
    pub visibility: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SecretMetadata {
    /// Metadata with only a name and visibility.
    pub fn new(name: impl Into<String>, visibility: Option<&str>) -> Self {
        Self {
            name: name.into(),
            visibility: visibility.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }
}

/// A sealed secret ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    pub name: SecretName,
    pub key_id: String,
    /// Base64 sealed-box ciphertext
    pub encrypted_value: String,
    pub visibility: String,
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("name", &self.name)
            .field("key_id", &self.key_id)
            .field("encrypted_len", &self.encrypted_value.len())
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// The remote secret store.
///
/// The store is write-only for values: [`list_secrets`](Self::list_secrets)
/// returns names and visibility, never plaintext or ciphertext.
#[async_trait]
pub trait SecretRegistry: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch the current sealing key. Keys rotate, so callers fetch this
    /// before every upload.
    async fn public_key(&self) -> Result<PublicKeyInfo, ForgeError>;

    /// List metadata of every secret.
    async fn list_secrets(&self) -> Result<Vec<SecretMetadata>, ForgeError>;

    /// Create or replace a secret.
    async fn put_secret(&self, secret: &EncryptedSecret) -> Result<(), ForgeError>;

    /// Delete a secret. Missing secrets yield `ForgeError::NotFound`.
    async fn delete_secret(&self, name: &SecretName) -> Result<(), ForgeError>;
}
