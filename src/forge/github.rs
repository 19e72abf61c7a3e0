//! forge::github
//!
//! Shared GitHub REST client used by every GitHub-backed store.
//!
//! # Design
//!
//! The content store, the version catalog and the secret registry all talk
//! to the same API with the same headers and the same error mapping. This
//! client owns that plumbing; the backends only know their endpoint paths
//! and JSON shapes.
//!
//! # Rate Limiting
//!
//! Returns `ForgeError::RateLimited` when limits are hit. Retrying is the
//! caller's responsibility.
//!
//! # Example
//!
//! ```ignore
//! use dockhand::forge::GitHubClient;
//! use std::time::Duration;
//!
//! let client = GitHubClient::new(Some(token), "https://api.github.com", Duration::from_secs(30))?;
//! let key: serde_json::Value = client.get("orgs/acme/actions/secrets/public-key", &[]).await?;
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::ForgeError;
use crate::core::config::Config;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("dockhand/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// GitHub REST client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token, if configured
    token: Option<String>,
    /// API base URL without trailing slash (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("has_token", &self.token.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::Permanent` if the HTTP client cannot be built.
    pub fn new(
        token: Option<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ForgeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::permanent(0, format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ForgeError> {
        Self::new(config.token(), config.api_base(), config.timeout())
    }

    /// The API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build the absolute URL for an API path (no leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let token = self.token.as_deref().ok_or(ForgeError::AuthRequired)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// `GET` a JSON document.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ForgeError> {
        let request = self.client.get(self.url(path)).query(query);
        let response = self.send("GET", path, request).await?;
        Self::handle_response(response).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ForgeError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.put(self.url(path)).json(body);
        let response = self.send("PUT", path, request).await?;
        Self::handle_response(response).await
    }

    /// `PUT` a JSON body, ignoring any response body.
    pub async fn put_empty<B>(&self, path: &str, body: &B) -> Result<(), ForgeError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.put(self.url(path)).json(body);
        self.send("PUT", path, request).await.map(|_| ())
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, path: &str) -> Result<(), ForgeError> {
        let request = self.client.delete(self.url(path));
        self.send("DELETE", path, request).await.map(|_| ())
    }

    /// `DELETE` a resource with a JSON body.
    pub async fn delete_with_body<B>(&self, path: &str, body: &B) -> Result<(), ForgeError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.delete(self.url(path)).json(body);
        self.send("DELETE", path, request).await.map(|_| ())
    }

    /// Send a request, mapping transport failures and error statuses.
    ///
    /// Returns the response only when its status is a success.
    async fn send(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Response, ForgeError> {
        tracing::debug!(method, path, "github request");

        let response = request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::Transient(format!("{} {}: {}", method, path, e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::debug!(method, path, status = status.as_u16(), "github error response");
            Self::handle_error_response(response, status).await
        }
    }

    /// Decode a successful JSON response.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ForgeError> {
        let status = response.status();
        response.json().await.map_err(|e| {
            ForgeError::permanent(status.as_u16(), format!("failed to parse response: {}", e))
        })
    }

    /// Map an error response to the error taxonomy.
    async fn handle_error_response<T>(
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        // GitHub Apps use X-Accepted-GitHub-Permissions, classic tokens X-Accepted-OAuth-Scopes.
        let required = response
            .headers()
            .get("X-Accepted-GitHub-Permissions")
            .or_else(|| response.headers().get("X-Accepted-OAuth-Scopes"))
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                let mut msg = format!("permission denied: {}", message);
                if let Some(required) = required {
                    msg.push_str(&format!(" [required: {}]", required));
                }
                ForgeError::AuthFailed(msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::CONFLICT => ForgeError::Conflict(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => {
                ForgeError::Transient(format!("GitHub server error {}: {}", status.as_u16(), message))
            }
            _ => ForgeError::permanent(status.as_u16(), message),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
    message: String,
}
