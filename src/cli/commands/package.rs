//! package commands - create, push, delete and inspect packages

use anyhow::{Context as _, Result};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use super::{block_on, load_config, publish_pipeline};
use crate::cli::Context;
use crate::exec::ExecError;
use crate::publish::PublishError;
use crate::ui::output::{self, format_image, format_list};

/// Create an empty package.
pub fn init(ctx: &Context, name: &str) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let created = block_on(pipeline.init_package(name))??;

    if created {
        output::print(format!("Initialized package {}", name), ctx.verbosity());
    } else {
        output::warn(format!("package {} already exists", name), ctx.verbosity());
    }
    Ok(())
}

/// Create a package version (or add one, with provenance labels).
pub fn create(ctx: &Context, name: &str, tag: &str, file: &Path, add_version: bool) -> Result<()> {
    let dockerfile = read_input(file)?;
    let pipeline = publish_pipeline(&load_config(ctx)?)?;

    let hash = block_on(async {
        if add_version {
            pipeline.create_package_version(name, tag, &dockerfile).await
        } else {
            pipeline.create_package(name, tag, &dockerfile).await
        }
    })??;

    output::print(
        format!("Created {} ({})", format_image(name, tag), hash.short()),
        ctx.verbosity(),
    );
    Ok(())
}

/// Build, tag and push an image.
pub fn push(
    ctx: &Context,
    name: &str,
    tag: &str,
    version_key: &str,
    timeout: Option<u64>,
) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;

    let result = block_on(async {
        let push = pipeline.push_package(name, tag, version_key);
        match timeout {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), push)
                .await
                .map_err(|_| anyhow::anyhow!("push timed out after {}s", secs)),
            None => Ok(push.await),
        }
    })??;

    let report = match result {
        Ok(report) => report,
        Err(PublishError::Exec(ExecError::Failed {
            target,
            status,
            stdout,
            stderr,
        })) => {
            // Show the captured build output before failing.
            if !stdout.is_empty() {
                eprintln!("{}", stdout.trim_end());
            }
            if !stderr.is_empty() {
                eprintln!("{}", stderr.trim_end());
            }
            anyhow::bail!("target '{}' failed ({})", target, status);
        }
        Err(e) => return Err(e.into()),
    };

    for (target, out) in &report.outputs {
        tracing::debug!(%target, "{}", out.stdout.trim_end());
    }
    if !report.workspace_released {
        output::warn(
            format!("workspace {} was not removed", report.workspace.display()),
            ctx.verbosity(),
        );
    }
    let suffix = if report.script_committed {
        " (build script updated)"
    } else {
        ""
    };
    output::print(
        format!("Pushed {}{}", format_image(name, tag), suffix),
        ctx.verbosity(),
    );
    Ok(())
}

/// Delete every version directory of a package.
pub fn delete(ctx: &Context, name: &str) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let report = block_on(pipeline.delete_package(name))??;

    output::print(
        format!("Deleted {} file(s) from {}", report.deleted.len(), name),
        ctx.verbosity(),
    );
    if report.marker_restored {
        output::print(format!("Package {} kept as empty placeholder", name), ctx.verbosity());
    }
    Ok(())
}

/// Delete one published version and its directory.
pub fn delete_version(ctx: &Context, name: &str, tag: &str, id: u64) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let report = block_on(pipeline.delete_package_version(name, tag, id))??;

    output::print(
        format!(
            "Deleted {} (version {}, {} file(s))",
            format_image(name, tag),
            id,
            report.deleted.len()
        ),
        ctx.verbosity(),
    );
    Ok(())
}

/// List packages.
pub fn list(ctx: &Context) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let packages = block_on(pipeline.list_packages())??;

    if packages.is_empty() {
        output::print("No packages", ctx.verbosity());
    } else {
        println!("{}", format_list(&packages, ""));
    }
    Ok(())
}

/// Show a package.
pub fn show(ctx: &Context, name: &str, json: bool) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let summary = block_on(pipeline.describe_package(name))??;

    if json {
        output::json(&summary)?;
        return Ok(());
    }

    println!("Package: {}", summary.name);
    if summary.placeholder && summary.versions.is_empty() {
        println!("  (empty)");
    }
    for entry in &summary.versions {
        match &entry.version {
            Some(v) => println!(
                "  {}  version {}  {}  updated {}",
                entry.tag,
                v.id,
                v.name,
                v.updated_at.format("%Y-%m-%d %H:%M")
            ),
            None => println!("  {}  (unpublished)", entry.tag),
        }
        if ctx.debug {
            println!("{}", format_list(&entry.files, "      "));
        }
    }
    Ok(())
}

/// List registry tags of a package.
pub fn tags(ctx: &Context, name: &str) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let tags = block_on(pipeline.list_tags(name))??;

    if tags.is_empty() {
        output::print(format!("No published tags for {}", name), ctx.verbosity());
    } else {
        println!("{}", format_list(&tags, ""));
    }
    Ok(())
}

/// Print a file of a package version.
pub fn cat(ctx: &Context, name: &str, tag: &str, file: &str) -> Result<()> {
    let pipeline = publish_pipeline(&load_config(ctx)?)?;
    let bytes = block_on(pipeline.read_package_file(name, tag, file))??;

    std::io::stdout().write_all(&bytes)?;
    Ok(())
}

/// Read a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))
}
