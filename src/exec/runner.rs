//! exec::runner
//!
//! Build-script target execution.
//!
//! A [`ScriptRunner`] runs one named target of the generated build script
//! with the workspace as its working directory. [`MakeRunner`] shells out to
//! `make` (or a configured replacement).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// A target of the generated build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTarget {
    /// Build the image locally
    Build,
    /// Tag the local image with its remote name
    Tag,
    /// Push the remote tag to the registry
    Push,
}

impl BuildTarget {
    /// Every target, in execution order.
    pub const ALL: [BuildTarget; 3] = [BuildTarget::Build, BuildTarget::Tag, BuildTarget::Push];

    /// Target name as written in the build script.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildTarget::Build => "build",
            BuildTarget::Tag => "tag",
            BuildTarget::Push => "push",
        }
    }
}

impl std::fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from workspace handling and target execution.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The runner program could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A target exited unsuccessfully. Carries the captured output.
    #[error("target '{target}' failed ({status}): {stderr}")]
    Failed {
        target: BuildTarget,
        status: String,
        stdout: String,
        stderr: String,
    },

    /// The scoped workspace could not be created or populated.
    #[error("workspace error at '{path}': {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Captured output of a successful target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs build-script targets.
///
/// # Cancellation
///
/// Dropping the returned future must stop the underlying process.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `target` with `workdir` as the working directory.
    async fn run(&self, target: BuildTarget, workdir: &Path) -> Result<ExecOutput, ExecError>;
}

/// Runs targets through `make` (or a compatible program).
#[derive(Debug, Clone)]
pub struct MakeRunner {
    program: String,
}

impl MakeRunner {
    /// Create a runner invoking `program <target>`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MakeRunner {
    fn default() -> Self {
        Self::new("make")
    }
}

#[async_trait]
impl ScriptRunner for MakeRunner {
    async fn run(&self, target: BuildTarget, workdir: &Path) -> Result<ExecOutput, ExecError> {
        tracing::debug!(program = %self.program, %target, workdir = %workdir.display(), "running target");

        let output = Command::new(&self.program)
            .arg(target.as_str())
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(ExecOutput { stdout, stderr })
        } else {
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            Err(ExecError::Failed {
                target,
                status,
                stdout,
                stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_in_order() {
        let names: Vec<_> = BuildTarget::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["build", "tag", "push"]);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let temp = tempfile::tempdir().unwrap();
        let runner = MakeRunner::new("dockhand-no-such-program");
        let err = runner.run(BuildTarget::Build, temp.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_target_carries_output() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("Makefile"), "build:\n\t@echo out; echo oops >&2; exit 3\n")
            .unwrap();

        let runner = MakeRunner::new("make");
        match runner.run(BuildTarget::Build, temp.path()).await {
            Err(ExecError::Failed { stdout, stderr, .. }) => {
                assert!(stdout.contains("out"));
                assert!(stderr.contains("oops"));
            }
            // Hosts without make cannot exercise the failure path.
            Err(ExecError::Spawn { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
