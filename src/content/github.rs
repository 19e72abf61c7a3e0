//! content::github
//!
//! ContentStore backed by the GitHub Contents API.
//!
//! # Endpoints
//!
//! - `GET    /repos/{owner}/{repo}/contents/{path}` read a file or list a directory
//! - `PUT    /repos/{owner}/{repo}/contents/{path}` create, or replace with `sha`
//! - `DELETE /repos/{owner}/{repo}/contents/{path}` delete with `sha`
//!
//! Every write and delete is a commit on the default branch. File bytes
//! travel base64 encoded. GitHub answers a stale `sha` with 409 (mapped to
//! `Conflict`) and a create over an existing file with 422 (mapped to
//! `Permanent`).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::directory_hash;
use super::traits::{ContentNode, ContentStore, NodeKind};
use crate::core::types::ContentHash;
use crate::forge::{ForgeError, GitHubClient};

/// Content store over one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubContentStore {
    client: GitHubClient,
    owner: String,
    repo: String,
    commit_message: String,
}

impl GitHubContentStore {
    /// Create a store for `owner/repo`.
    pub fn new(
        client: GitHubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
            commit_message: commit_message.into(),
        }
    }

    fn contents_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("repos/{}/{}/contents", self.owner, self.repo)
        } else {
            format!("repos/{}/{}/contents/{}", self.owner, self.repo, path)
        }
    }

    fn message_for(&self, action: &str, path: &str) -> String {
        format!("{} ({} {})", self.commit_message, action, path)
    }
}

fn parse_hash(sha: String) -> Result<ContentHash, ForgeError> {
    ContentHash::new(sha).map_err(|e| ForgeError::permanent(200, e.to_string()))
}

fn entry_to_node(entry: GitHubContent) -> Result<ContentNode, ForgeError> {
    let kind = if entry.kind == "dir" {
        NodeKind::Directory
    } else {
        NodeKind::File
    };
    Ok(ContentNode {
        path: entry.path,
        kind,
        hash: parse_hash(entry.sha)?,
        bytes: None,
    })
}

fn decode_content(entry: &GitHubContent) -> Result<Vec<u8>, ForgeError> {
    match (entry.encoding.as_deref(), entry.content.as_deref()) {
        (Some("base64"), Some(content)) => {
            // The API wraps base64 at 60 columns.
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD.decode(compact).map_err(|e| {
                ForgeError::permanent(200, format!("invalid base64 content for {}: {}", entry.path, e))
            })
        }
        (encoding, _) => Err(ForgeError::permanent(
            200,
            format!(
                "unsupported content encoding {:?} for {}",
                encoding.unwrap_or("none"),
                entry.path
            ),
        )),
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn read(&self, path: &str) -> Result<ContentNode, ForgeError> {
        let response: ContentsResponse = self.client.get(&self.contents_path(path), &[]).await?;

        match response {
            ContentsResponse::Single(entry) => {
                let bytes = decode_content(&entry)?;
                Ok(ContentNode {
                    path: entry.path,
                    kind: NodeKind::File,
                    hash: parse_hash(entry.sha)?,
                    bytes: Some(bytes),
                })
            }
            ContentsResponse::Listing(entries) => Ok(ContentNode {
                path: path.trim_matches('/').to_string(),
                kind: NodeKind::Directory,
                hash: directory_hash(entries.iter().map(|e| (e.path.as_str(), e.sha.as_str()))),
                bytes: None,
            }),
        }
    }

    async fn list_children(&self, path: &str) -> Result<Vec<ContentNode>, ForgeError> {
        let response: ContentsResponse = self.client.get(&self.contents_path(path), &[]).await?;

        match response {
            ContentsResponse::Listing(entries) => entries.into_iter().map(entry_to_node).collect(),
            ContentsResponse::Single(entry) => Err(ForgeError::permanent(
                400,
                format!("{} is a file, not a directory", entry.path),
            )),
        }
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash, ForgeError> {
        let action = if expected.is_some() { "update" } else { "create" };
        let body = PutContentBody {
            message: self.message_for(action, path),
            content: STANDARD.encode(bytes),
            sha: expected.map(|h| h.as_str()),
        };

        let response: PutContentResponse =
            self.client.put(&self.contents_path(path), &body).await?;
        let hash = parse_hash(response.content.sha)?;
        tracing::debug!(path, hash = hash.short(), action, "content written");
        Ok(hash)
    }

    async fn delete(&self, path: &str, hash: &ContentHash) -> Result<(), ForgeError> {
        let body = DeleteContentBody {
            message: self.message_for("delete", path),
            sha: hash.as_str(),
        };
        self.client
            .delete_with_body(&self.contents_path(path), &body)
            .await?;
        tracing::debug!(path, hash = hash.short(), "content deleted");
        Ok(())
    }
}

// =============================================================================
// GitHub API types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<GitHubContent>),
    Single(GitHubContent),
}

#[derive(Debug, Deserialize)]
struct GitHubContent {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentBody<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentResponse {
    content: GitHubContentRef,
}

#[derive(Debug, Deserialize)]
struct GitHubContentRef {
    sha: String,
}

#[derive(Debug, Serialize)]
struct DeleteContentBody<'a> {
    message: String,
    sha: &'a str,
}
