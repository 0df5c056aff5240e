//! `build`, `push` and `genconfig`: the module build/push run.

use crate::config::ProjectConfig;
use crate::modules::{BuildMode, BuildPushCommand};
use crate::output::Output;
use crate::pipeline::ExecutionPlan;
use crate::plan::{ExecuteContext, Plan, PlanContext, Plannable};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Push the images after building them
    #[arg(long)]
    pub push: bool,
}

impl BuildArgs {
    pub fn mode(&self) -> BuildMode {
        if self.push {
            BuildMode::BUILD_AND_PUSH
        } else {
            BuildMode::BUILD
        }
    }
}

#[derive(Debug, Args)]
pub struct PushArgs {
    /// Push images that were already built
    #[arg(long)]
    pub no_build: bool,
}

impl PushArgs {
    pub fn mode(&self) -> BuildMode {
        if self.no_build {
            BuildMode::PUSH
        } else {
            BuildMode::BUILD_AND_PUSH
        }
    }
}

pub fn run(mode: BuildMode, config: ProjectConfig, plan: &ExecutionPlan) -> Result<()> {
    let plan_ctx = PlanContext::new(config);
    let build_plan = BuildPushCommand::new(mode).plan(&plan_ctx)?;

    if build_plan.is_empty() {
        Output::info(format!(
            "Nothing to build; {} is up to date.",
            build_plan.output_path().display()
        ));
        return Ok(());
    }

    // Always show the plan
    print!("{}", build_plan.describe());

    if !plan.should_execute() {
        Output::dry_run("No images built and no files written.");
        return Ok(());
    }

    let mut exec_ctx = ExecuteContext::new(plan);
    let report = build_plan.execute(&mut exec_ctx)?;
    print!("{}", report);
    Ok(())
}
