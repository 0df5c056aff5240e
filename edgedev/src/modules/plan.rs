//! One build/push run as a [`Plannable`] command.
//!
//! Planning resolves modules, computes tags, reconciles the deployment
//! template and selects the build set; nothing is built or written. The
//! plan then drives the engine and, only if every tag succeeded, writes the
//! patched manifest.

use super::descriptor::resolve_modules;
use super::driver::{BuildMode, Driver, TagState};
use super::patch::{self, ReplacementMap, WriteOutcome};
use super::reconcile::reconcile;
use super::select::{BuildSet, select};
use super::tag::TagTable;
use crate::config::RegistryTable;
use crate::error::ManifestError;
use crate::output::Output;
use crate::plan::{
    ExecuteContext, ExecutionReport, Operation, Plan, PlanContext, PlanSummary, Plannable, Verb,
};
use anyhow::{Context, Result};
use edgedev_common::{DeploymentReference, DeploymentTemplate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build and/or push modules, then regenerate the deployment manifest.
#[derive(Debug, Clone, Copy)]
pub struct BuildPushCommand {
    pub mode: BuildMode,
}

impl BuildPushCommand {
    pub fn new(mode: BuildMode) -> Self {
        Self { mode }
    }
}

/// Everything a run will do, computed up front.
#[derive(Debug)]
pub struct BuildPushPlan {
    mode: BuildMode,
    module_count: usize,
    build_set: BuildSet,
    replacements: ReplacementMap,
    unresolved: Vec<DeploymentReference>,
    registries: RegistryTable,
    output_path: PathBuf,
    rendered: String,
    output_up_to_date: bool,
}

impl BuildPushPlan {
    pub fn build_set(&self) -> &BuildSet {
        &self.build_set
    }

    pub fn replacements(&self) -> &ReplacementMap {
        &self.replacements
    }

    pub fn unresolved(&self) -> &[DeploymentReference] {
        &self.unresolved
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

pub fn read_template(path: &Path) -> Result<DeploymentTemplate, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    DeploymentTemplate::from_json(content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Plannable for BuildPushCommand {
    type Plan = BuildPushPlan;

    fn plan(&self, ctx: &PlanContext) -> Result<Self::Plan> {
        let config = ctx.config();

        let modules = resolve_modules(&config.modules_path, &config.vars)?;
        let table = TagTable::compute(&modules, &config.container_tag);
        debug!(
            modules = modules.len(),
            tags = table.len(),
            "Computed image tags"
        );

        let template = read_template(&config.deployment_template)?;
        let references = template.references();
        let reconciliation = reconcile(&references, &table);

        let build_set = select(
            &table,
            &reconciliation.referenced,
            &config.bypass_modules,
            &config.active_platforms,
        );
        info!(
            selected = build_set.len(),
            bypass = %config.bypass_modules,
            platforms = %config.active_platforms,
            "Selected build set"
        );

        let rendered = patch::render(&template, &reconciliation.replacements, &config.vars);
        let output_path = config.deployment_output();
        let output_up_to_date = patch::is_up_to_date(&output_path, &rendered);

        Ok(BuildPushPlan {
            mode: self.mode,
            module_count: modules.len(),
            build_set,
            replacements: reconciliation.replacements,
            unresolved: reconciliation.unresolved,
            registries: config.registries.clone(),
            output_path,
            rendered,
            output_up_to_date,
        })
    }
}

impl Plan for BuildPushPlan {
    fn describe(&self) -> PlanSummary {
        let phases = match (self.mode.build, self.mode.push) {
            (true, true) => "Build and push",
            (true, false) => "Build",
            (false, true) => "Push",
            (false, false) => "Generate config",
        };
        let mut summary = PlanSummary::new(format!(
            "{phases}: {} image(s) from {} module(s)",
            self.build_set.len(),
            self.module_count
        ));

        for (tag, profile) in self.build_set.iter() {
            if self.mode.build {
                summary.add_operation(Operation::with_details(
                    Verb::Build,
                    tag.as_str(),
                    &profile.module,
                ));
            }
            if self.mode.push {
                let registry = match self.registries.find_for_tag(tag) {
                    Some(credentials) => format!("as {}", credentials.username),
                    None => "anonymous".to_string(),
                };
                summary.add_operation(Operation::with_details(Verb::Push, tag.as_str(), registry));
            }
        }

        for reference in &self.unresolved {
            summary.add_operation(Operation::with_details(
                Verb::Skip,
                reference.placeholder(),
                "no local module",
            ));
        }

        let output = self.output_path.display().to_string();
        if self.output_up_to_date {
            summary.add_operation(Operation::with_details(Verb::Skip, output, "up to date"));
        } else {
            summary.add_operation(Operation::with_details(
                Verb::Update,
                output,
                format!("{} replacement(s)", self.replacements.len()),
            ));
        }

        summary
    }

    fn execute(self, ctx: &mut ExecuteContext) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::new();

        if self.mode.build {
            Output::header("BUILDING MODULES");
        }

        if self.mode.touches_engine() {
            let drive = Driver::new(ctx.engine(), &self.registries, self.mode).run(&self.build_set);
            for outcome in &drive.outcomes {
                let target = outcome.tag.as_str();
                match outcome.state {
                    TagState::Built => report.record_success(Verb::Build, target),
                    TagState::Pushed => {
                        if self.mode.build {
                            report.record_success(Verb::Build, target);
                        }
                        report.record_success(Verb::Push, target);
                    }
                    state if state.is_failure() => {
                        let verb = if state == TagState::BuildFailed {
                            Verb::Build
                        } else {
                            Verb::Push
                        };
                        let message = drive
                            .error
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default();
                        report.record_failure(verb, target, message);
                    }
                    _ => {}
                }
            }
            if let Some(error) = drive.error {
                Output::error(error.to_string());
                return Err(error).context("Build/push aborted; deployment manifest not updated");
            }
        }

        if self.mode.build {
            Output::success("BUILD COMPLETE");
        }
        if self.mode.push {
            Output::success("PUSH COMPLETE");
        }

        let target = self.output_path.display().to_string();
        match patch::write_manifest(ctx.executor(), &self.output_path, &self.rendered)? {
            WriteOutcome::Written => {
                Output::success(format!("Wrote {target}"));
                report.record_success(Verb::Update, target);
            }
            WriteOutcome::Unchanged => {
                Output::info(format!("{target} is up to date"));
                report.record_success(Verb::Skip, target);
            }
        }

        Ok(report)
    }

    fn is_empty(&self) -> bool {
        (self.build_set.is_empty() || !self.mode.touches_engine()) && self.output_up_to_date
    }
}
