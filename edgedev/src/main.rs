use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edgedev::commands;
use edgedev::modules::BuildMode;
use edgedev::pipeline;
use edgedev::{Cli, Commands, ProjectConfig};

/// Read the project configuration and apply CLI overrides.
fn load_config(cli: &Cli) -> Result<ProjectConfig> {
    let config = ProjectConfig::from_env().context("Invalid project configuration")?;
    Ok(match &cli.file {
        Some(file) => config.with_template(file),
        None => config,
    })
}

fn main() -> Result<()> {
    // Initialize tracing with RUST_LOG env filter
    // e.g., RUST_LOG=edgedev=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mode = match cli.command {
        Commands::Schema(args) => return commands::schema::run(args),
        Commands::Completions(args) => return commands::completions::run(args),
        Commands::Build(ref args) => args.mode(),
        Commands::Push(ref args) => args.mode(),
        Commands::Genconfig => BuildMode::CONFIG_ONLY,
    };

    let config = load_config(&cli)?;
    let plan = pipeline::ExecutionPlan::from_cli(&cli, config.engine);

    tracing::debug!(
        engine = %plan.engine,
        dry_run = plan.dry_run,
        modules = %config.modules_path.display(),
        template = %config.deployment_template.display(),
        "Execution plan created"
    );

    commands::build::run(mode, config, &plan)
}
