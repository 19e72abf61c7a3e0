//! Integration tests for the GitHub backends.
//!
//! Each test runs the real HTTP implementation against a local wiremock
//! server standing in for the GitHub REST API.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dockhand::catalog::{GitHubVersionCatalog, VersionCatalog};
use dockhand::content::{ContentStore, GitHubContentStore};
use dockhand::core::types::{ContentHash, PackageName, SecretName};
use dockhand::forge::{ForgeError, GitHubClient};
use dockhand::secrets::{EncryptedSecret, GitHubSecretRegistry, SecretRegistry};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(Some("test-token".into()), server.uri(), Duration::from_secs(5)).unwrap()
}

fn content_store(server: &MockServer) -> GitHubContentStore {
    GitHubContentStore::new(client(server), "acme", "images", "dockhand: update")
}

fn hash(s: &str) -> ContentHash {
    ContentHash::new(s).unwrap()
}

// =============================================================================
// Content store
// =============================================================================

mod content_tests {
    use super::*;

    #[tokio::test]
    async fn read_file_decodes_wrapped_base64() {
        let server = MockServer::start().await;
        let encoded = STANDARD.encode("FROM alpine\nRUN apk add curl\n");
        let wrapped = format!("{}\n{}", &encoded[..20], &encoded[20..]);

        Mock::given(method("GET"))
            .and(path("/repos/acme/images/contents/demo/latest/Dockerfile"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-github-api-version", "2022-11-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "path": "demo/latest/Dockerfile",
                "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
                "encoding": "base64",
                "content": wrapped,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let node = content_store(&server)
            .read("demo/latest/Dockerfile")
            .await
            .unwrap();
        assert!(node.is_file());
        assert_eq!(node.hash.as_str(), "3d21ec53a331a6f037a91c368710b99387d012c1");
        assert_eq!(node.bytes.unwrap(), b"FROM alpine\nRUN apk add curl\n");
    }

    #[tokio::test]
    async fn list_children_maps_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/images/contents/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"type": "file", "path": "demo/.gitkeep", "sha": "e69de29"},
                {"type": "dir", "path": "demo/latest", "sha": "4b825dc"},
            ])))
            .mount(&server)
            .await;

        let children = content_store(&server).list_children("demo").await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].is_file());
        assert_eq!(children[0].name(), ".gitkeep");
        assert!(children[1].is_dir());
        assert_eq!(children[1].hash.as_str(), "4b825dc");
    }

    #[tokio::test]
    async fn create_omits_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/images/contents/demo/latest/Dockerfile"))
            .and(body_partial_json(json!({
                "content": STANDARD.encode("FROM alpine\n"),
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "content": {"sha": "newsha1"},
                "commit": {"sha": "commit1"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let new_hash = content_store(&server)
            .write("demo/latest/Dockerfile", b"FROM alpine\n", None)
            .await
            .unwrap();
        assert_eq!(new_hash, hash("newsha1"));

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("sha").is_none());
        assert!(body["message"].as_str().unwrap().starts_with("dockhand: update"));
    }

    #[tokio::test]
    async fn replace_sends_expected_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/images/contents/demo/latest/Makefile"))
            .and(body_partial_json(json!({"sha": "oldsha"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": {"sha": "newsha2"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let new_hash = content_store(&server)
            .write("demo/latest/Makefile", b"build:\n", Some(&hash("oldsha")))
            .await
            .unwrap();
        assert_eq!(new_hash, hash("newsha2"));
    }

    #[tokio::test]
    async fn stale_sha_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "demo/latest/Makefile does not match oldsha",
            })))
            .mount(&server)
            .await;

        let err = content_store(&server)
            .write("demo/latest/Makefile", b"x", Some(&hash("oldsha")))
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::Conflict(ref m) if m.contains("does not match")));
    }

    #[tokio::test]
    async fn delete_sends_sha_and_maps_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/images/contents/demo/.gitkeep"))
            .and(body_partial_json(json!({"sha": "e69de29"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": null})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/images/contents/demo/.gitkeep"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let store = content_store(&server);
        store.delete("demo/.gitkeep", &hash("e69de29")).await.unwrap();
        let err = store.delete("demo/.gitkeep", &hash("e69de29")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = content_store(&server).read("demo").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn bad_token_is_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
            )
            .mount(&server)
            .await;

        let err = content_store(&server).read("demo").await.unwrap_err();
        assert!(matches!(err, ForgeError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn missing_token_makes_no_request() {
        let server = MockServer::start().await;
        let client = GitHubClient::new(None, server.uri(), Duration::from_secs(5)).unwrap();
        let store = GitHubContentStore::new(client, "acme", "images", "m");

        let err = store.read("demo").await.unwrap_err();
        assert_eq!(err, ForgeError::AuthRequired);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

// =============================================================================
// Version catalog
// =============================================================================

mod catalog_tests {
    use super::*;

    fn version_json(id: u64, tags: &[&str]) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("sha256:{:064x}", id),
            "url": "https://api.github.com/...",
            "package_html_url": "https://github.com/orgs/acme/packages/container/package/demo",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T10:00:00Z",
            "metadata": {"package_type": "container", "container": {"tags": tags}},
        })
    }

    #[tokio::test]
    async fn list_versions_paginates() {
        let server = MockServer::start().await;
        let first_page: Vec<_> = (1..=100).map(|id| version_json(id, &[])).collect();

        Mock::given(method("GET"))
            .and(path("/orgs/acme/packages/container/demo/versions"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/packages/container/demo/versions"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([version_json(101, &["latest", "v1"])])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let catalog = GitHubVersionCatalog::new(client(&server), "acme");
        let versions = catalog
            .list_versions(&PackageName::new("demo").unwrap())
            .await
            .unwrap();

        assert_eq!(versions.len(), 101);
        let last = versions.last().unwrap();
        assert_eq!(last.id, 101);
        assert!(last.has_tag("latest"));
        assert!(last.html_url.as_deref().unwrap().contains("packages/container"));
    }

    #[tokio::test]
    async fn delete_version_uses_delimited_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orgs/acme/packages/container/demo/versions/42"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = GitHubVersionCatalog::new(client(&server), "acme");
        catalog
            .delete_version(&PackageName::new("demo").unwrap(), 42)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_missing_version_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/packages/container/demo/versions/7"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Package version not found"})),
            )
            .mount(&server)
            .await;

        let catalog = GitHubVersionCatalog::new(client(&server), "acme");
        let err = catalog
            .get_version(&PackageName::new("demo").unwrap(), 7)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

// =============================================================================
// Secret registry
// =============================================================================

mod secret_tests {
    use super::*;

    #[tokio::test]
    async fn public_key_and_put() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/actions/secrets/public-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key_id": "012345678912345678",
                "key": STANDARD.encode([3u8; 32]),
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/orgs/acme/actions/secrets/API_KEY"))
            .and(body_partial_json(json!({
                "key_id": "012345678912345678",
                "encrypted_value": "c2VhbGVk",
                "visibility": "all",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let registry = GitHubSecretRegistry::new(client(&server), "acme");
        let key = registry.public_key().await.unwrap();
        assert_eq!(key.key_id, "012345678912345678");

        registry
            .put_secret(&EncryptedSecret {
                name: SecretName::new("API_KEY").unwrap(),
                key_id: key.key_id,
                encrypted_value: "c2VhbGVk".into(),
                visibility: "all".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_secrets_reads_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/actions/secrets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 2,
                "secrets": [
                    {"name": "API_KEY", "created_at": "2024-01-10T10:00:00Z",
                     "updated_at": "2024-01-11T10:00:00Z", "visibility": "all"},
                    {"name": "DB_URL", "created_at": "2024-01-10T10:00:00Z",
                     "updated_at": "2024-01-10T10:00:00Z", "visibility": "private"},
                ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = GitHubSecretRegistry::new(client(&server), "acme");
        let secrets = registry.list_secrets().await.unwrap();
        let names: Vec<_> = secrets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["API_KEY", "DB_URL"]);
    }
}
