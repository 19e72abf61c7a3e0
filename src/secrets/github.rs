//! secrets::github
//!
//! SecretRegistry backed by GitHub Actions organization secrets.
//!
//! # Endpoints
//!
//! - `GET    /orgs/{org}/actions/secrets/public-key`
//! - `GET    /orgs/{org}/actions/secrets` (paginated, 100 per page)
//! - `PUT    /orgs/{org}/actions/secrets/{name}`
//! - `DELETE /orgs/{org}/actions/secrets/{name}`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::traits::{EncryptedSecret, PublicKeyInfo, SecretMetadata, SecretRegistry};
use crate::core::types::SecretName;
use crate::forge::{ForgeError, GitHubClient};

const PER_PAGE: usize = 100;

/// Organization secret registry.
#[derive(Debug, Clone)]
pub struct GitHubSecretRegistry {
    client: GitHubClient,
    org: String,
}

impl GitHubSecretRegistry {
    pub fn new(client: GitHubClient, org: impl Into<String>) -> Self {
        Self {
            client,
            org: org.into(),
        }
    }

    fn secrets_path(&self) -> String {
        format!("orgs/{}/actions/secrets", self.org)
    }

    fn secret_path(&self, name: &SecretName) -> String {
        format!("{}/{}", self.secrets_path(), name)
    }
}

#[async_trait]
impl SecretRegistry for GitHubSecretRegistry {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn public_key(&self) -> Result<PublicKeyInfo, ForgeError> {
        let key: GitHubPublicKey = self
            .client
            .get(&format!("{}/public-key", self.secrets_path()), &[])
            .await?;
        tracing::debug!(org = %self.org, key_id = %key.key_id, "fetched secret public key");
        Ok(PublicKeyInfo {
            key_id: key.key_id,
            key: key.key,
        })
    }

    async fn list_secrets(&self) -> Result<Vec<SecretMetadata>, ForgeError> {
        let path = self.secrets_path();
        let mut secrets = Vec::new();
        let mut page = 1u32;

        loop {
            let batch: GitHubSecretList = self
                .client
                .get(
                    &path,
                    &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
                )
                .await?;
            let done = batch.secrets.len() < PER_PAGE
                || secrets.len() + batch.secrets.len() >= batch.total_count;
            secrets.extend(batch.secrets.into_iter().map(SecretMetadata::from));
            if done {
                break;
            }
            page += 1;
        }

        Ok(secrets)
    }

    async fn put_secret(&self, secret: &EncryptedSecret) -> Result<(), ForgeError> {
        let body = PutSecretRequest {
            encrypted_value: &secret.encrypted_value,
            key_id: &secret.key_id,
            visibility: &secret.visibility,
        };
        self.client
            .put_empty(&self.secret_path(&secret.name), &body)
            .await?;
        tracing::info!(org = %self.org, secret = %secret.name, "uploaded secret");
        Ok(())
    }

    async fn delete_secret(&self, name: &SecretName) -> Result<(), ForgeError> {
        self.client.delete(&self.secret_path(name)).await?;
        tracing::info!(org = %self.org, secret = %name, "deleted remote secret");
        Ok(())
    }
}

// =============================================================================
// GitHub API types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GitHubPublicKey {
    key_id: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct GitHubSecretList {
    total_count: usize,
    #[serde(default)]
    secrets: Vec<GitHubSecret>,
}

#[derive(Debug, Deserialize)]
struct GitHubSecret {
    name: String,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<GitHubSecret> for SecretMetadata {
    fn from(gh: GitHubSecret) -> Self {
        SecretMetadata {
            name: gh.name,
            visibility: gh.visibility,
            created_at: gh.created_at,
            updated_at: gh.updated_at,
        }
    }
}

#[derive(Serialize)]
struct PutSecretRequest<'a> {
    encrypted_value: &'a str,
    key_id: &'a str,
    visibility: &'a str,
}
