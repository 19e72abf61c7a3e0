//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PackageName`] - Validated container package name (one OCI path component)
//! - [`Tag`] - Validated image tag, also the name of a version directory
//! - [`VersionKey`] - Caller-supplied version identifier used to isolate build workspaces
//! - [`SecretName`] - Validated remote secret name
//! - [`ContentHash`] - Opaque content-tree hash used for compare-and-swap
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a package name can never smuggle a `/` into a
//! content-tree path and a version key can never escape the workspace root.
//!
//! # Examples
//!
//! ```
//! use dockhand::core::types::{PackageName, Tag};
//!
//! let name = PackageName::new("demo").unwrap();
//! let tag = Tag::new("v1.2.0").unwrap();
//! assert_eq!(format!("{}:{}", name, tag), "demo:v1.2.0");
//!
//! assert!(PackageName::new("Demo/../x").is_err());
//! assert!(Tag::new(".hidden").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid tag: {0}")]
    InvalidTag(String),

    #[error("invalid version key: {0}")]
    InvalidVersionKey(String),

    #[error("invalid secret name: {0}")]
    InvalidSecretName(String),

    #[error("invalid content hash: {0}")]
    InvalidHash(String),
}

/// Implements the string plumbing shared by every validated newtype.
macro_rules! string_newtype {
    ($ty:ident) => {
        impl $ty {
            /// Get the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// A validated container package name.
///
/// Package names are a single lower-case OCI repository path component:
/// one or more runs of `[a-z0-9]` separated by a single `.`, `_` or `-`.
/// They double as the top-level directory name in the content tree, so
/// they may never contain `/`.
///
/// # Example
///
/// ```
/// use dockhand::core::types::PackageName;
///
/// assert!(PackageName::new("nginx-proxy").is_ok());
/// assert!(PackageName::new("base_images.v2").is_ok());
///
/// assert!(PackageName::new("").is_err());
/// assert!(PackageName::new("UPPER").is_err());
/// assert!(PackageName::new("a/b").is_err());
/// assert!(PackageName::new("double--dash").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Maximum accepted length.
    const MAX_LEN: usize = 128;

    /// Create a new validated package name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPackageName` if the name is not a valid
    /// repository component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidPackageName(
                "package name cannot be empty".into(),
            ));
        }
        if name.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidPackageName(format!(
                "package name longer than {} characters",
                Self::MAX_LEN
            )));
        }

        let mut previous_separator = true;
        for c in name.chars() {
            match c {
                'a'..='z' | '0'..='9' => previous_separator = false,
                '.' | '_' | '-' => {
                    if previous_separator {
                        return Err(TypeError::InvalidPackageName(format!(
                            "'{}' must separate alphanumeric runs",
                            c
                        )));
                    }
                    previous_separator = true;
                }
                other => {
                    return Err(TypeError::InvalidPackageName(format!(
                        "package name cannot contain '{}'",
                        other
                    )));
                }
            }
        }
        if previous_separator {
            return Err(TypeError::InvalidPackageName(
                "package name cannot end with a separator".into(),
            ));
        }

        Ok(())
    }
}

string_newtype!(PackageName);

/// A validated image tag.
///
/// Follows the OCI tag grammar `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`. A tag
/// names both the registry tag and the version directory under the
/// package in the content tree.
///
/// # Example
///
/// ```
/// use dockhand::core::types::Tag;
///
/// assert!(Tag::new("latest").is_ok());
/// assert!(Tag::new("1.25.3-alpine").is_ok());
/// assert!(Tag::new("-rc").is_err());
/// assert!(Tag::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    const MAX_LEN: usize = 128;

    /// Create a new validated tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTag` if the tag violates the OCI tag grammar.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        Self::validate(&tag)?;
        Ok(Self(tag))
    }

    fn validate(tag: &str) -> Result<(), TypeError> {
        let first = tag
            .chars()
            .next()
            .ok_or_else(|| TypeError::InvalidTag("tag cannot be empty".into()))?;

        if tag.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidTag(format!(
                "tag longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if !(first.is_ascii_alphanumeric() || first == '_') {
            return Err(TypeError::InvalidTag(format!(
                "tag cannot start with '{}'",
                first
            )));
        }
        if let Some(c) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(TypeError::InvalidTag(format!("tag cannot contain '{}'", c)));
        }

        Ok(())
    }
}

string_newtype!(Tag);

/// A caller-supplied version identifier (typically an image digest or a
/// commit SHA).
///
/// Used as the anti-collision key for build workspaces, so it must be safe
/// to embed in a directory name.
///
/// # Example
///
/// ```
/// use dockhand::core::types::VersionKey;
///
/// assert!(VersionKey::new("sha256:4f1c9e").is_ok());
/// assert!(VersionKey::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionKey(String);

impl VersionKey {
    const MAX_LEN: usize = 128;

    /// Create a new validated version key.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersionKey` if the key is empty, too long,
    /// or contains characters unsafe in a directory name.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::InvalidVersionKey(
                "version key cannot be empty".into(),
            ));
        }
        if key.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidVersionKey(format!(
                "version key longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if key.starts_with('.') {
            return Err(TypeError::InvalidVersionKey(
                "version key cannot start with '.'".into(),
            ));
        }
        if let Some(c) = key
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-')))
        {
            return Err(TypeError::InvalidVersionKey(format!(
                "version key cannot contain '{}'",
                c
            )));
        }
        Ok(Self(key))
    }

    /// Directory-name prefix for a workspace keyed by this version.
    ///
    /// `:` is legal in digests but awkward in paths, so it is mapped to `-`.
    pub fn workspace_prefix(&self) -> String {
        format!("{}-", self.0.replace(':', "-"))
    }
}

string_newtype!(VersionKey);

/// A validated remote secret name.
///
/// Secret names are `[A-Za-z_][A-Za-z0-9_]*` and may not use the reserved
/// `GITHUB_` prefix. The local mirror stores them under
/// [`SecretName::mirror_key`].
///
/// # Example
///
/// ```
/// use dockhand::core::types::SecretName;
///
/// let name = SecretName::new("API_KEY").unwrap();
/// assert_eq!(name.mirror_key(), "api_key");
/// assert!(SecretName::new("GITHUB_TOKEN").is_err());
/// assert!(SecretName::new("9LIVES").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretName(String);

impl SecretName {
    /// Create a new validated secret name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSecretName` for names the remote secret
    /// store would reject.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let first = name
            .chars()
            .next()
            .ok_or_else(|| TypeError::InvalidSecretName("secret name cannot be empty".into()))?;

        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(TypeError::InvalidSecretName(format!(
                "secret name cannot start with '{}'",
                first
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(TypeError::InvalidSecretName(format!(
                "secret name cannot contain '{}'",
                c
            )));
        }
        if name.to_ascii_uppercase().starts_with("GITHUB_") {
            return Err(TypeError::InvalidSecretName(
                "secret name cannot start with the reserved GITHUB_ prefix".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Case-normalized key used by the local mirror.
    pub fn mirror_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

string_newtype!(SecretName);

/// An opaque content hash reported by the content store.
///
/// The value is never interpreted locally; it is only echoed back to the
/// store on compare-and-swap writes and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a hash reported by the backing store.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidHash` if the value is empty or contains
    /// whitespace.
    pub fn new(hash: impl Into<String>) -> Result<Self, TypeError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(TypeError::InvalidHash("content hash cannot be empty".into()));
        }
        if hash.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidHash(
                "content hash cannot contain whitespace".into(),
            ));
        }
        Ok(Self(hash))
    }

    /// Hash derived locally from a digest (hex encoded).
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

string_newtype!(ContentHash);

#[cfg(test)]
mod tests {
    use super::*;

    mod package_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(PackageName::new("demo").is_ok());
            assert!(PackageName::new("nginx-proxy").is_ok());
            assert!(PackageName::new("a.b_c-d").is_ok());
            assert!(PackageName::new("0day").is_ok());
        }

        #[test]
        fn rejects_separators_at_edges() {
            assert!(PackageName::new("-demo").is_err());
            assert!(PackageName::new("demo-").is_err());
            assert!(PackageName::new(".demo").is_err());
            assert!(PackageName::new("de..mo").is_err());
        }

        #[test]
        fn rejects_path_and_case() {
            assert!(PackageName::new("demo/latest").is_err());
            assert!(PackageName::new("Demo").is_err());
            assert!(PackageName::new("de mo").is_err());
        }

        #[test]
        fn rejects_overlong() {
            assert!(PackageName::new("a".repeat(129)).is_err());
            assert!(PackageName::new("a".repeat(128)).is_ok());
        }

        #[test]
        fn serde_roundtrip_validates() {
            let parsed: Result<PackageName, _> = serde_json::from_str("\"bad/name\"");
            assert!(parsed.is_err());
            let parsed: PackageName = serde_json::from_str("\"good\"").unwrap();
            assert_eq!(parsed.as_str(), "good");
        }
    }

    mod tag {
        use super::*;

        #[test]
        fn valid_tags() {
            assert!(Tag::new("latest").is_ok());
            assert!(Tag::new("V1.0").is_ok());
            assert!(Tag::new("_internal").is_ok());
            assert!(Tag::new("1.25.3-alpine").is_ok());
        }

        #[test]
        fn invalid_tags() {
            assert!(Tag::new("").is_err());
            assert!(Tag::new(".dot").is_err());
            assert!(Tag::new("-dash").is_err());
            assert!(Tag::new("a:b").is_err());
            assert!(Tag::new("x".repeat(129)).is_err());
        }
    }

    mod version_key {
        use super::*;

        #[test]
        fn digests_are_accepted() {
            let key = VersionKey::new("sha256:abc123").unwrap();
            assert_eq!(key.workspace_prefix(), "sha256-abc123-");
        }

        #[test]
        fn path_like_keys_rejected() {
            assert!(VersionKey::new("").is_err());
            assert!(VersionKey::new("a/b").is_err());
            assert!(VersionKey::new("..").is_err());
            assert!(VersionKey::new("with space").is_err());
        }
    }

    mod secret_name {
        use super::*;

        #[test]
        fn mirror_key_is_lowercase() {
            let name = SecretName::new("Registry_Token").unwrap();
            assert_eq!(name.mirror_key(), "registry_token");
            assert_eq!(name.as_str(), "Registry_Token");
        }

        #[test]
        fn invalid_names() {
            assert!(SecretName::new("").is_err());
            assert!(SecretName::new("1ABC").is_err());
            assert!(SecretName::new("API-KEY").is_err());
            assert!(SecretName::new("github_pat").is_err());
        }
    }

    mod content_hash {
        use super::*;

        #[test]
        fn short_truncates() {
            let hash = ContentHash::new("3b18e512dba79e4c8300dd08aeb37f8e728b8dad").unwrap();
            assert_eq!(hash.short(), "3b18e51");

            let tiny = ContentHash::new("abc").unwrap();
            assert_eq!(tiny.short(), "abc");
        }

        #[test]
        fn rejects_blank() {
            assert!(ContentHash::new("").is_err());
            assert!(ContentHash::new("ab cd").is_err());
        }
    }
}
