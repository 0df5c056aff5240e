//! Plan-centric command infrastructure.
//!
//! Commands are split into two phases:
//! 1. **Planning**: read modules and the deployment template and produce an
//!    immutable plan (no side effects)
//! 2. **Execution**: drive the container engine and write the manifest
//!
//! Dry-run prints the plan and skips the second phase.
//!
//! # Example
//!
//! ```rust,ignore
//! let plan = BuildPushCommand::new(BuildMode::BUILD).plan(&ctx)?;
//!
//! // Always show what will happen
//! print!("{}", plan.describe());
//!
//! // Only execute if not dry-run
//! if !dry_run {
//!     let report = plan.execute(&mut exec_ctx)?;
//!     print!("{}", report);
//! }
//! ```

use anyhow::Result;
use owo_colors::OwoColorize;
use std::fmt;

use crate::config::ProjectConfig;
use crate::effects::Executor;
use crate::engine::{CliEngine, ContainerEngine};
use crate::pipeline::ExecutionPlan;

// ============================================================================
// Core Traits
// ============================================================================

/// A command that can produce a plan without side effects.
pub trait Plannable {
    /// The plan type this command produces.
    type Plan: Plan;

    /// Analyze the current state and produce a plan.
    ///
    /// This method MUST NOT have side effects. It may read files but must
    /// not modify anything or talk to the container engine.
    fn plan(&self, ctx: &PlanContext) -> Result<Self::Plan>;
}

/// An immutable description of operations to perform.
pub trait Plan: Sized {
    /// Get a structured description of this plan for display.
    fn describe(&self) -> PlanSummary;

    /// Execute the plan, performing all side effects.
    ///
    /// Consumes the plan since execution is a one-time operation.
    fn execute(self, ctx: &mut ExecuteContext) -> Result<ExecutionReport>;

    /// Returns true if this plan has no operations to perform.
    fn is_empty(&self) -> bool;
}

// ============================================================================
// Context Types
// ============================================================================

/// Context for the planning phase.
///
/// Read-only access to the run's configuration.
pub struct PlanContext {
    config: ProjectConfig,
}

impl PlanContext {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }
}

/// Context for the execution phase.
///
/// Side effects go through the `Executor` (files) and the container engine.
pub struct ExecuteContext {
    executor: Executor,
    engine: Box<dyn ContainerEngine>,
}

impl ExecuteContext {
    /// Context driving the engine CLI named by the execution plan.
    pub fn new(execution_plan: &ExecutionPlan) -> Self {
        let engine = CliEngine::new(execution_plan.engine, execution_plan.runner());
        Self::with_engine(execution_plan, Box::new(engine))
    }

    pub fn with_engine(execution_plan: &ExecutionPlan, engine: Box<dyn ContainerEngine>) -> Self {
        Self {
            executor: Executor::new(execution_plan.dry_run),
            engine,
        }
    }

    pub fn executor(&mut self) -> &mut Executor {
        &mut self.executor
    }

    pub fn engine(&self) -> &dyn ContainerEngine {
        self.engine.as_ref()
    }
}

// ============================================================================
// Operation Types
// ============================================================================

/// A verb describing an operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Build a container image
    Build,
    /// Push an image to its registry
    Push,
    /// Rewrite a generated file
    Update,
    /// Skip (nothing to do, or nothing can be done)
    Skip,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Build => "Build",
            Verb::Push => "Push",
            Verb::Update => "Update",
            Verb::Skip => "Skip",
        }
    }

    pub fn colored(&self) -> String {
        match self {
            Verb::Build => self.as_str().green().to_string(),
            Verb::Push => self.as_str().cyan().to_string(),
            Verb::Update => self.as_str().yellow().to_string(),
            Verb::Skip => self.as_str().dimmed().to_string(),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single operation in a plan.
#[derive(Debug, Clone)]
pub struct Operation {
    pub verb: Verb,
    /// The target of the operation (e.g., "localhost:5000/filtermodule:0.0.1-amd64").
    pub target: String,
    pub details: Option<String>,
}

impl Operation {
    pub fn new(verb: Verb, target: impl Into<String>) -> Self {
        Self {
            verb,
            target: target.into(),
            details: None,
        }
    }

    pub fn with_details(verb: Verb, target: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            verb,
            target: target.into(),
            details: Some(details.into()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb.colored(), self.target)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details.dimmed())?;
        }
        Ok(())
    }
}

// ============================================================================
// Plan Summary
// ============================================================================

/// Structured description of a plan for display.
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub summary: String,
    pub operations: Vec<Operation>,
}

impl PlanSummary {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            operations: Vec::new(),
        }
    }

    pub fn add_operation(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Get count of non-skip operations.
    pub fn action_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|o| o.verb != Verb::Skip)
            .count()
    }

    pub fn has_actions(&self) -> bool {
        self.action_count() > 0
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary.bold())?;

        if self.operations.is_empty() {
            writeln!(f, "  {}", "No operations".dimmed())?;
        } else {
            for op in &self.operations {
                writeln!(f, "  ▸ {}", op)?;
            }
        }

        let action_count = self.action_count();
        if action_count > 0 {
            writeln!(f, "\n{} operation(s) to perform", action_count)?;
        }

        Ok(())
    }
}

// ============================================================================
// Execution Report
// ============================================================================

/// Result of a single operation execution.
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub operation: Operation,
    pub success: bool,
    pub error: Option<String>,
}

impl OperationResult {
    pub fn success(operation: Operation) -> Self {
        Self {
            operation,
            success: true,
            error: None,
        }
    }

    pub fn failure(operation: Operation, error: impl Into<String>) -> Self {
        Self {
            operation,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Report of plan execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub results: Vec<OperationResult>,
}

impl ExecutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, verb: Verb, target: impl Into<String>) {
        self.results
            .push(OperationResult::success(Operation::new(verb, target)));
    }

    pub fn record_failure(
        &mut self,
        verb: Verb,
        target: impl Into<String>,
        error: impl Into<String>,
    ) {
        self.results.push(OperationResult::failure(
            Operation::new(verb, target),
            error,
        ));
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// Successful operations with the given verb.
    pub fn count(&self, verb: Verb) -> usize {
        self.results
            .iter()
            .filter(|r| r.success && r.operation.verb == verb)
            .count()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let success = self.success_count();
        let failed = self.failure_count();

        if failed == 0 {
            writeln!(
                f,
                "{}",
                format!("✓ {} operation(s) completed", success).green()
            )?;
        } else {
            writeln!(
                f,
                "{}",
                format!("⚠ {} succeeded, {} failed", success, failed).yellow()
            )?;
            writeln!(f)?;
            writeln!(f, "Failures:")?;
            for result in &self.results {
                if !result.success {
                    writeln!(
                        f,
                        "  {} {}: {}",
                        "✗".red(),
                        result.operation.target,
                        result.error.as_deref().unwrap_or("Unknown error")
                    )?;
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
