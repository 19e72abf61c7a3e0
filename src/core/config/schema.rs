//! core::config::schema
//!
//! Configuration schema types.
//!
//! Located at (in order of precedence):
//! 1. `$DOCKHAND_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/dockhand/config.toml`
//! 3. `~/.dockhand/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad organization
//! name or a zero timeout is reported at load time rather than as an
//! obscure HTTP failure later.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// [github]
/// organization = "alpha-omega-corp"
/// repository = "container-images"
///
/// [registry]
/// host = "ghcr.io"
///
/// [publish]
/// workspace_root = "/tmp"
///
/// [secrets]
/// config_output = "~/.config/act/.secrets"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DockhandConfig {
    /// GitHub API and content repository settings
    pub github: Option<GitHubConfig>,

    /// Container registry settings
    pub registry: Option<RegistryConfig>,

    /// Publish pipeline settings
    pub publish: Option<PublishConfig>,

    /// Secret mirror and artifact settings
    pub secrets: Option<SecretsConfig>,
}

impl DockhandConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(github) = &self.github {
            github.validate()?;
        }
        if let Some(registry) = &self.registry {
            registry.validate()?;
        }
        if let Some(publish) = &self.publish {
            publish.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        Ok(())
    }
}

/// GitHub settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// API base URL (GitHub Enterprise installs override this)
    pub api_base: Option<String>,

    /// Organization owning the content repository, packages and secrets
    pub organization: Option<String>,

    /// Repository holding the package content tree
    pub repository: Option<String>,

    /// Environment variable holding the API token
    pub token_env: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl GitHubConfig {
    /// Validate the GitHub settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "github.api_base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }
        for (field, value) in [
            ("github.organization", &self.organization),
            ("github.repository", &self.repository),
            ("github.token_env", &self.token_env),
        ] {
            if let Some(value) = value {
                if value.is_empty() || value.contains('/') || value.contains(char::is_whitespace)
                {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} must be a single non-empty name, got '{}'",
                        field, value
                    )));
                }
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "github.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Container registry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry host images are pushed to (e.g. `ghcr.io`)
    pub host: Option<String>,
}

impl RegistryConfig {
    /// Validate the registry settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            if host.is_empty() || host.contains("://") || host.ends_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "registry.host must be a bare host name, got '{}'",
                    host
                )));
            }
        }
        Ok(())
    }
}

/// Publish pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Directory under which build workspaces are created
    pub workspace_root: Option<String>,

    /// Program that executes build script targets
    pub make_program: Option<String>,

    /// Commit message used for content-tree writes
    pub commit_message: Option<String>,
}

impl PublishConfig {
    /// Validate the publish settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(program) = &self.make_program {
            if program.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "publish.make_program cannot be empty".to_string(),
                ));
            }
        }
        if let Some(message) = &self.commit_message {
            if message.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "publish.commit_message cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Secret mirror and artifact settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Path of the local plaintext mirror
    pub mirror_path: Option<String>,

    /// Path the rendered configuration artifact is written to
    pub config_output: Option<String>,

    /// Visibility assigned to uploaded secrets ("all", "private", "selected")
    pub visibility: Option<String>,
}

impl SecretsConfig {
    /// Valid secret visibilities.
    pub const VALID_VISIBILITIES: &'static [&'static str] = &["all", "private", "selected"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(visibility) = &self.visibility {
            if !Self::VALID_VISIBILITIES.contains(&visibility.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets visibility '{}', must be one of: {}",
                    visibility,
                    Self::VALID_VISIBILITIES.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DockhandConfig::default().validate().is_ok());
    }

    #[test]
    fn roundtrip() {
        let config = DockhandConfig {
            github: Some(GitHubConfig {
                api_base: Some("https://github.example.com/api/v3".to_string()),
                organization: Some("acme".to_string()),
                repository: Some("images".to_string()),
                token_env: Some("ACME_TOKEN".to_string()),
                timeout_secs: Some(10),
            }),
            registry: Some(RegistryConfig {
                host: Some("registry.acme.dev".to_string()),
            }),
            publish: Some(PublishConfig {
                workspace_root: Some("/var/tmp".to_string()),
                make_program: Some("gmake".to_string()),
                commit_message: Some("update".to_string()),
            }),
            secrets: Some(SecretsConfig {
                mirror_path: Some("/etc/dockhand/mirror.toml".to_string()),
                config_output: Some("/etc/act/.secrets".to_string()),
                visibility: Some("private".to_string()),
            }),
        };

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: DockhandConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn api_base_must_be_url() {
        let config = GitHubConfig {
            api_base: Some("api.github.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn organization_cannot_contain_slash() {
        let config = GitHubConfig {
            organization: Some("acme/images".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = GitHubConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn registry_host_without_scheme() {
        let bad = RegistryConfig {
            host: Some("https://ghcr.io".to_string()),
        };
        assert!(bad.validate().is_err());

        let good = RegistryConfig {
            host: Some("ghcr.io".to_string()),
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn unknown_visibility_rejected() {
        let config = SecretsConfig {
            visibility: Some("public".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let parsed: Result<DockhandConfig, _> = toml::from_str("[github]\nowner = \"x\"\n");
        assert!(parsed.is_err());
    }
}
