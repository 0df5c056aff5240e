//! Execution pipeline settings.
//!
//! An [`ExecutionPlan`] captures the global options that affect how a
//! command runs: dry-run, which container engine to drive, and the
//! [`CommandRunner`] used to drive it.

use crate::Cli;
use crate::command_runner::{CommandRunner, RealCommandRunner};
use crate::engine::EngineKind;
use std::fmt;
use std::sync::Arc;

/// Execution plan for an edgedev command.
#[derive(Clone)]
pub struct ExecutionPlan {
    /// Whether to perform a dry run
    pub dry_run: bool,
    /// Container engine CLI to drive
    pub engine: EngineKind,
    runner: Arc<dyn CommandRunner>,
}

impl ExecutionPlan {
    /// Create an execution plan from CLI arguments.
    ///
    /// `configured` is the engine named by the environment; `--engine`
    /// overrides it.
    pub fn from_cli(cli: &Cli, configured: EngineKind) -> Self {
        Self {
            dry_run: cli.dry_run,
            engine: cli.engine.unwrap_or(configured),
            ..Default::default()
        }
    }

    /// The command runner engine calls go through.
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    /// Check if this plan allows touching the engine and the filesystem.
    pub fn should_execute(&self) -> bool {
        !self.dry_run
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self {
            dry_run: false,
            engine: EngineKind::default(),
            runner: Arc::new(RealCommandRunner),
        }
    }
}

impl fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("dry_run", &self.dry_run)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
