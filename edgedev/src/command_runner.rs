//! Abstraction over external command execution for testability.
//!
//! The container engine is driven through its CLI (`docker` or `podman`).
//! Every invocation goes through the [`CommandRunner`] trait so the engine
//! adapter can be exercised in-process with canned outputs.
//!
//! [`RealCommandRunner`] delegates to [`std::process::Command`] and is the
//! default implementation stored in [`ExecutionPlan`](crate::pipeline::ExecutionPlan).

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// Trait for abstracting external command execution.
///
/// Stored as `Arc<dyn CommandRunner>` in [`ExecutionPlan`](crate::pipeline::ExecutionPlan).
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its full output (stdout + stderr + exit status).
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output>;
}

/// Options for command execution.
#[derive(Default, Clone)]
pub struct CommandOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Data written to the command's stdin (registry passwords).
    pub stdin: Option<String>,
}

impl std::fmt::Debug for CommandOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandOptions")
            .field("cwd", &self.cwd)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CommandOptions {
    /// Create options with a working directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Default::default()
        }
    }

    /// Create options that feed `input` to the command's stdin.
    pub fn with_stdin(input: impl Into<String>) -> Self {
        Self {
            stdin: Some(input.into()),
            ..Default::default()
        }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

/// Production implementation that delegates to [`std::process::Command`].
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output> {
        let mut cmd = options.command(program, args);
        let Some(input) = &options.stdin else {
            return cmd
                .output()
                .with_context(|| format!("Failed to run '{program}'"));
        };

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run '{program}'"))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .with_context(|| format!("Failed to write stdin of '{program}'"))?;
        }
        child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for '{program}'"))
    }
}
