//! secret commands - manage organization secrets and the local artifact

use anyhow::Result;

use super::{block_on, load_config, secrets_sync, value_or_stdin};
use crate::cli::Context;
use crate::core::types::SecretName;
use crate::secrets::{FileSecretStore, SecretStore};
use crate::ui::output;

/// Create or replace a secret.
pub fn set(ctx: &Context, name: &str, value: Option<String>) -> Result<()> {
    let value = value_or_stdin(value)?;
    let sync = secrets_sync(&load_config(ctx)?)?;
    block_on(sync.create_secret(name, &value))??;

    output::print(format!("Secret {} set", name), ctx.verbosity());
    Ok(())
}

/// Delete a secret.
pub fn delete(ctx: &Context, name: &str) -> Result<()> {
    let sync = secrets_sync(&load_config(ctx)?)?;
    block_on(sync.delete_secret(name))??;

    output::print(format!("Secret {} deleted", name), ctx.verbosity());
    Ok(())
}

/// List remote secrets.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let sync = secrets_sync(&load_config(ctx)?)?;
    let secrets = block_on(sync.list_secrets())??;

    if json {
        let rows: Vec<serde_json::Value> = secrets
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "visibility": s.visibility,
                    "updated_at": s.updated_at,
                })
            })
            .collect();
        output::json(&rows)?;
        return Ok(());
    }

    if secrets.is_empty() {
        output::print("No secrets", ctx.verbosity());
    }
    for secret in &secrets {
        println!(
            "{}  {}",
            secret.name,
            secret.visibility.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Print the mirrored value of a secret.
///
/// Reads only the local mirror, so no token is needed.
pub fn get(ctx: &Context, name: &str) -> Result<()> {
    let name = SecretName::new(name)?;
    let mirror = FileSecretStore::from_config(&load_config(ctx)?)?;
    match mirror.get(&name.mirror_key())? {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => anyhow::bail!("no local value for secret {}", name),
    }
}

/// Regenerate the local secrets artifact.
pub fn sync(ctx: &Context) -> Result<()> {
    let sync = secrets_sync(&load_config(ctx)?)?;
    let report = block_on(sync.sync_environment())??;

    for name in &report.skipped {
        output::warn(
            format!("{} has no local value and was skipped", name),
            ctx.verbosity(),
        );
    }
    output::print(
        format!(
            "Wrote {} secret(s) to {}",
            report.written.len(),
            report.output.display()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
