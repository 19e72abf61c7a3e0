//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first match wins:
//! 1. `$DOCKHAND_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/dockhand/config.toml`
//! 3. `~/.dockhand/config.toml`
//!
//! A missing file is not an error; every value has a default.
//!
//! # Example
//!
//! ```no_run
//! use dockhand::core::config::Config;
//!
//! let result = Config::load().unwrap();
//! let config = result.config;
//!
//! println!("Organization: {}", config.organization());
//! println!("Registry: {}", config.registry_host());
//! ```

pub mod schema;

pub use schema::{DockhandConfig, GitHubConfig, PublishConfig, RegistryConfig, SecretsConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default GitHub REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default organization owning packages, content and secrets.
pub const DEFAULT_ORGANIZATION: &str = "alpha-omega-corp";

/// Default content repository.
pub const DEFAULT_REPOSITORY: &str = "container-images";

/// Default environment variable holding the API token.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default container registry host.
pub const DEFAULT_REGISTRY_HOST: &str = "ghcr.io";

/// Default commit message for content-tree writes.
pub const DEFAULT_COMMIT_MESSAGE: &str = "dockhand: update package content";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path the configuration was read from, if any.
    pub path: Option<PathBuf>,
}

/// Loaded configuration with defaulting accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw file contents
    pub file: DockhandConfig,
}

impl Config {
    /// Wrap an already-parsed configuration.
    pub fn new(file: DockhandConfig) -> Self {
        Self { file }
    }

    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. Missing config files are not an error.
    pub fn load() -> Result<ConfigLoadResult, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(ConfigLoadResult {
                config: Config::default(),
                path: None,
            }),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let file = Self::read_config(path)?;
        file.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(ConfigLoadResult {
            config: Config { file },
            path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in the lookup chain.
    fn locate() -> Option<PathBuf> {
        // 1. Check $DOCKHAND_CONFIG
        if let Ok(path) = std::env::var("DOCKHAND_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/dockhand/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("dockhand/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.dockhand/config.toml
        let path = dirs::home_dir()?.join(".dockhand/config.toml");
        path.exists().then_some(path)
    }

    fn read_config(path: &Path) -> Result<DockhandConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    fn github(&self) -> Option<&GitHubConfig> {
        self.file.github.as_ref()
    }

    fn publish(&self) -> Option<&PublishConfig> {
        self.file.publish.as_ref()
    }

    fn secrets(&self) -> Option<&SecretsConfig> {
        self.file.secrets.as_ref()
    }

    /// GitHub REST API base URL, without trailing slash.
    pub fn api_base(&self) -> &str {
        self.github()
            .and_then(|g| g.api_base.as_deref())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Organization owning packages, content and secrets.
    pub fn organization(&self) -> &str {
        self.github()
            .and_then(|g| g.organization.as_deref())
            .unwrap_or(DEFAULT_ORGANIZATION)
    }

    /// Repository holding the content tree.
    pub fn repository(&self) -> &str {
        self.github()
            .and_then(|g| g.repository.as_deref())
            .unwrap_or(DEFAULT_REPOSITORY)
    }

    /// Name of the environment variable holding the API token.
    pub fn token_env(&self) -> &str {
        self.github()
            .and_then(|g| g.token_env.as_deref())
            .unwrap_or(DEFAULT_TOKEN_ENV)
    }

    /// API token read from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn token(&self) -> Option<String> {
        std::env::var(self.token_env())
            .ok()
            .filter(|t| !t.is_empty())
    }

    /// Per-request HTTP timeout. Defaults to 30 seconds.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.github().and_then(|g| g.timeout_secs).unwrap_or(30))
    }

    /// Container registry host.
    pub fn registry_host(&self) -> &str {
        self.file
            .registry
            .as_ref()
            .and_then(|r| r.host.as_deref())
            .unwrap_or(DEFAULT_REGISTRY_HOST)
    }

    /// Directory under which build workspaces are created.
    ///
    /// Defaults to the system temp directory.
    pub fn workspace_root(&self) -> PathBuf {
        self.publish()
            .and_then(|p| p.workspace_root.as_deref())
            .map(expand_home)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Program that runs build script targets. Defaults to `make`.
    pub fn make_program(&self) -> &str {
        self.publish()
            .and_then(|p| p.make_program.as_deref())
            .unwrap_or("make")
    }

    /// Commit message for content-tree writes.
    pub fn commit_message(&self) -> &str {
        self.publish()
            .and_then(|p| p.commit_message.as_deref())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }

    /// Path of the local plaintext secret mirror.
    pub fn mirror_path(&self) -> Result<PathBuf, ConfigError> {
        match self.secrets().and_then(|s| s.mirror_path.as_deref()) {
            Some(path) => Ok(expand_home(path)),
            None => Ok(dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".dockhand/mirror.toml")),
        }
    }

    /// Path the rendered secrets artifact is written to.
    pub fn config_output(&self) -> Result<PathBuf, ConfigError> {
        match self.secrets().and_then(|s| s.config_output.as_deref()) {
            Some(path) => Ok(expand_home(path)),
            None => Ok(dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".config/act/.secrets")),
        }
    }

    /// Visibility assigned to uploaded secrets. Defaults to `all`.
    pub fn visibility(&self) -> &str {
        self.secrets()
            .and_then(|s| s.visibility.as_deref())
            .unwrap_or("all")
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.api_base(), "https://api.github.com");
        assert_eq!(config.organization(), "alpha-omega-corp");
        assert_eq!(config.repository(), "container-images");
        assert_eq!(config.token_env(), "GITHUB_TOKEN");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.registry_host(), "ghcr.io");
        assert_eq!(config.make_program(), "make");
        assert_eq!(config.visibility(), "all");
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[github]
api_base = "http://localhost:8080/"
organization = "acme"
timeout_secs = 5

[registry]
host = "registry.acme.dev"

[publish]
make_program = "gmake"
workspace_root = "/var/tmp"

[secrets]
config_output = "/etc/act/.secrets"
"#,
        )
        .unwrap();

        let result = Config::load_from(&path).unwrap();
        let config = result.config;
        assert_eq!(result.path.as_deref(), Some(path.as_path()));
        assert_eq!(config.api_base(), "http://localhost:8080");
        assert_eq!(config.organization(), "acme");
        assert_eq!(config.repository(), "container-images");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.registry_host(), "registry.acme.dev");
        assert_eq!(config.make_program(), "gmake");
        assert_eq!(config.workspace_root(), PathBuf::from("/var/tmp"));
        assert_eq!(
            config.config_output().unwrap(),
            PathBuf::from("/etc/act/.secrets")
        );
    }

    #[test]
    fn parse_error_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[github\norganization = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn invalid_value_rejected_at_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[secrets]\nvisibility = \"everyone\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn home_expansion() {
        let expanded = expand_home("/abs/path");
        assert_eq!(expanded, PathBuf::from("/abs/path"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x/y"), home.join("x/y"));
        }
    }
}
