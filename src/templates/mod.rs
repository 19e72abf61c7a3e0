//! templates
//!
//! Rendering of build scripts, image manifests and the secrets artifact.
//!
//! # Determinism
//!
//! Every render is a pure function of its arguments. The publish pipeline
//! compares freshly rendered output with what is already committed, so two
//! renders with equal inputs must be byte-identical.
//!
//! # Templates
//!
//! | Name             | Output                                      |
//! |------------------|---------------------------------------------|
//! | `build_script`   | `Makefile` with `build`, `tag`, `push`      |
//! | `image_manifest` | `Dockerfile` with provenance labels appended |
//! | `config_file`    | `NAME=value` lines, sorted by name          |
//!
//! The template sources are compiled into the binary. One
//! [`ArtifactTemplater`] is built at startup and handed to the pipelines.

use minijinja::{context, Environment};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

const BUILD_SCRIPT: &str = "build_script";
const IMAGE_MANIFEST: &str = "image_manifest";
const CONFIG_FILE: &str = "config_file";

/// Prefix of the provenance labels appended to every manifest.
const LABEL_PREFIX: &str = "LABEL org.opencontainers.image.";

/// Label keys owned by the manifest template. Other image labels belong
/// to the user.
const PROVENANCE_KEYS: [&str; 3] = ["authors", "title", "version"];

/// Errors from template rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load template '{name}': {message}")]
    Load { name: String, message: String },

    #[error("failed to render template '{name}': {message}")]
    Render { name: String, message: String },

    #[error("image manifest is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Renders every generated artifact.
#[derive(Debug)]
pub struct ArtifactTemplater {
    env: Environment<'static>,
}

#[derive(Serialize)]
struct ConfigEntry<'a> {
    name: &'a str,
    value: &'a str,
}

impl ArtifactTemplater {
    /// Compile the built-in templates.
    pub fn new() -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);

        for (name, source) in [
            (BUILD_SCRIPT, include_str!("files/Makefile.j2")),
            (IMAGE_MANIFEST, include_str!("files/Dockerfile.j2")),
            (CONFIG_FILE, include_str!("files/secrets.env.j2")),
        ] {
            env.add_template(name, source)
                .map_err(|e| TemplateError::Load {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<Vec<u8>, TemplateError> {
        let render_err = |e: minijinja::Error| TemplateError::Render {
            name: name.to_string(),
            message: e.to_string(),
        };
        let template = self.env.get_template(name).map_err(render_err)?;
        let rendered = template.render(ctx).map_err(render_err)?;
        Ok(rendered.into_bytes())
    }

    /// Render the build script for `registry/org/name:tag`.
    pub fn render_build_script(
        &self,
        name: &str,
        tag: &str,
        registry: &str,
        org: &str,
    ) -> Result<Vec<u8>, TemplateError> {
        self.render(
            BUILD_SCRIPT,
            context! { name => name, tag => tag, registry => registry, org => org },
        )
    }

    /// Render an image manifest from externally supplied content.
    ///
    /// NUL padding is stripped, trailing `authors`, `title` and `version`
    /// labels from an earlier render are dropped, and fresh ones for
    /// `author`, `name` and `tag` are appended. Any other label is kept.
    pub fn render_image_manifest(
        &self,
        name: &str,
        tag: &str,
        author: &str,
        base_content: &[u8],
    ) -> Result<Vec<u8>, TemplateError> {
        let content = sanitize_manifest(base_content)?;
        let content = strip_provenance(&content);
        self.render(
            IMAGE_MANIFEST,
            context! { name => name, tag => tag, author => author, content => content },
        )
    }

    /// Render the secrets artifact: one `NAME=value` line per entry.
    pub fn render_config_file(
        &self,
        entries: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, TemplateError> {
        let entries: Vec<ConfigEntry<'_>> = entries
            .iter()
            .map(|(name, value)| ConfigEntry { name, value })
            .collect();
        self.render(CONFIG_FILE, context! { entries => entries })
    }
}

/// Strip NUL bytes and trailing whitespace from manifest content.
///
/// Transports sometimes pad byte buffers with NULs; they are never
/// meaningful in a Dockerfile.
///
/// ```
/// use dockhand::templates::sanitize_manifest;
///
/// let clean = sanitize_manifest(b"FROM alpine\n\0\0\0").unwrap();
/// assert_eq!(clean, "FROM alpine");
/// ```
pub fn sanitize_manifest(bytes: &[u8]) -> Result<String, TemplateError> {
    let stripped: Vec<u8> = bytes.iter().copied().filter(|b| *b != 0).collect();
    let text = String::from_utf8(stripped)?;
    Ok(text.trim_end().to_string())
}

/// Drop trailing provenance label lines left by an earlier render.
fn strip_provenance(content: &str) -> &str {
    let mut rest = content.trim_end();
    while !rest.is_empty() {
        let (head, last) = match rest.rfind('\n') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => ("", rest),
        };
        if !is_provenance_label(last) {
            break;
        }
        rest = head.trim_end();
    }
    rest
}

fn is_provenance_label(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(LABEL_PREFIX)
        .and_then(|rest| rest.split_once('='))
        .map_or(false, |(key, _)| PROVENANCE_KEYS.contains(&key))
}
