//! exec::mock
//!
//! Recording script runner for deterministic testing.
//!
//! Each call records the target, the working directory, and the file
//! names present in it at call time. Targets can be made to fail (with
//! captured output) or to hang until the caller gives up.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::runner::{BuildTarget, ExecError, ExecOutput, ScriptRunner};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    /// Target that was run
    pub target: BuildTarget,
    /// Working directory of the call
    pub workdir: PathBuf,
    /// Sorted file names present in `workdir` when the call started
    pub files: Vec<String>,
}

/// Behaviour configured for a target.
#[derive(Debug, Clone)]
enum Behaviour {
    Fail { stdout: String, stderr: String },
    Hang,
}

/// Mock runner for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    inner: Arc<Mutex<MockRunnerInner>>,
}

#[derive(Debug, Default)]
struct MockRunnerInner {
    behaviours: HashMap<BuildTarget, Behaviour>,
    runs: Vec<RunRecord>,
}

impl MockRunner {
    /// Create a runner where every target succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `target` exit unsuccessfully with the given output.
    pub fn fail_on(
        self,
        target: BuildTarget,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.state().behaviours.insert(
            target,
            Behaviour::Fail {
                stdout: stdout.into(),
                stderr: stderr.into(),
            },
        );
        self
    }

    /// Make `target` never complete.
    pub fn hang_on(self, target: BuildTarget) -> Self {
        self.state().behaviours.insert(target, Behaviour::Hang);
        self
    }

    /// All recorded invocations, in call order.
    pub fn runs(&self) -> Vec<RunRecord> {
        self.state().runs.clone()
    }

    /// Targets run so far, in call order.
    pub fn targets(&self) -> Vec<BuildTarget> {
        self.state().runs.iter().map(|r| r.target).collect()
    }

    fn state(&self) -> MutexGuard<'_, MockRunnerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

#[async_trait]
impl ScriptRunner for MockRunner {
    async fn run(&self, target: BuildTarget, workdir: &Path) -> Result<ExecOutput, ExecError> {
        let behaviour = {
            let mut inner = self.state();
            inner.runs.push(RunRecord {
                target,
                workdir: workdir.to_path_buf(),
                files: list_files(workdir),
            });
            inner.behaviours.get(&target).cloned()
        };

        match behaviour {
            None => Ok(ExecOutput {
                stdout: format!("{} ok\n", target),
                stderr: String::new(),
            }),
            Some(Behaviour::Fail { stdout, stderr }) => Err(ExecError::Failed {
                target,
                status: "exit code 2".to_string(),
                stdout,
                stderr,
            }),
            Some(Behaviour::Hang) => std::future::pending().await,
        }
    }
}
