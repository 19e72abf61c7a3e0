//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds the backends it needs
//! 2. Calls a library pipeline
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Every remote call is async. Handlers stay synchronous and run their
//! async body on a fresh `tokio::runtime::Runtime`.

mod completion;
mod package;
mod seal;
mod secret;

pub use completion::completion;

use anyhow::{Context as _, Result};
use std::io::Read;
use std::sync::Arc;

use super::Context;
use crate::catalog::GitHubVersionCatalog;
use crate::cli::args::{Command, PackageAction, SecretAction};
use crate::content::GitHubContentStore;
use crate::core::config::Config;
use crate::exec::MakeRunner;
use crate::forge::GitHubClient;
use crate::publish::{PublishPipeline, PublishSettings};
use crate::secrets::{FileSecretStore, GitHubSecretRegistry};
use crate::sync::SecretsSync;
use crate::templates::ArtifactTemplater;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Package { action } => match action {
            PackageAction::Init { name } => package::init(ctx, &name),
            PackageAction::Create { name, tag, file } => {
                package::create(ctx, &name, &tag, &file, false)
            }
            PackageAction::AddVersion { name, tag, file } => {
                package::create(ctx, &name, &tag, &file, true)
            }
            PackageAction::Push {
                name,
                tag,
                version_key,
                timeout,
            } => package::push(ctx, &name, &tag, &version_key, timeout),
            PackageAction::Delete { name } => package::delete(ctx, &name),
            PackageAction::DeleteVersion { name, tag, id } => {
                package::delete_version(ctx, &name, &tag, id)
            }
            PackageAction::List => package::list(ctx),
            PackageAction::Show { name, json } => package::show(ctx, &name, json),
            PackageAction::Tags { name } => package::tags(ctx, &name),
            PackageAction::Cat { name, tag, file } => package::cat(ctx, &name, &tag, &file),
        },
        Command::Secret { action } => match action {
            SecretAction::Set { name, value } => secret::set(ctx, &name, value),
            SecretAction::Delete { name } => secret::delete(ctx, &name),
            SecretAction::List { json } => secret::list(ctx, json),
            SecretAction::Get { name } => secret::get(ctx, &name),
        },
        Command::Sync => secret::sync(ctx),
        Command::Seal { key, value } => seal::seal(&key, value),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load configuration from `--config` or the default locations.
fn load_config(ctx: &Context) -> Result<Config> {
    let loaded = match &ctx.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    if let Some(path) = &loaded.path {
        tracing::debug!(path = %path.display(), "using config file");
    }
    Ok(loaded.config)
}

/// Build the GitHub client, failing early without a token.
fn github_client(config: &Config) -> Result<GitHubClient> {
    let client = GitHubClient::from_config(config)?;
    if !client.has_token() {
        anyhow::bail!(
            "no API token found. Set {} to a token with packages and contents access.",
            config.token_env()
        );
    }
    Ok(client)
}

/// Build the publish pipeline from configuration.
fn publish_pipeline(config: &Config) -> Result<PublishPipeline> {
    let client = github_client(config)?;
    let content = GitHubContentStore::new(
        client.clone(),
        config.organization(),
        config.repository(),
        config.commit_message(),
    );
    let catalog = GitHubVersionCatalog::new(client, config.organization());

    Ok(PublishPipeline::new(
        Arc::new(content),
        Arc::new(catalog),
        Arc::new(MakeRunner::new(config.make_program())),
        Arc::new(ArtifactTemplater::new()?),
        PublishSettings::from_config(config),
    ))
}

/// Build the secrets pipeline from configuration.
fn secrets_sync(config: &Config) -> Result<SecretsSync> {
    let client = github_client(config)?;
    Ok(SecretsSync::new(
        Arc::new(GitHubSecretRegistry::new(client, config.organization())),
        Arc::new(FileSecretStore::from_config(config)?),
        Arc::new(ArtifactTemplater::new()?),
        config.config_output()?,
        config.visibility(),
    ))
}

/// Use `value` or read all of stdin.
fn value_or_stdin(value: Option<String>) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read value from stdin")?;
            Ok(buf)
        }
    }
}

/// Run an async command body to completion.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(future))
}
