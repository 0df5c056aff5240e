//! CLI argument definitions for edgedev.
//!
//! This module contains the clap-derived `Cli` and `Commands` types.
//! Separated from `main.rs` so that library code (e.g., `pipeline::ExecutionPlan::from_cli`)
//! and shell completion generation can reference these types.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::engine::EngineKind;

#[derive(Debug, Parser)]
#[command(name = "edgedev")]
#[command(about = "Build, push and deploy IoT Edge modules")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show what would be done without building, pushing or writing files
    #[arg(long, short = 'n', global = true)]
    pub dry_run: bool,

    /// Container engine to drive (overrides CONTAINER_ENGINE)
    #[arg(long, value_enum, global = true)]
    pub engine: Option<EngineKind>,

    /// Deployment manifest template (overrides DEPLOYMENT_CONFIG_TEMPLATE_FILE)
    #[arg(long, short = 'f', global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build module images and regenerate the deployment manifest
    Build(commands::build::BuildArgs),

    /// Build and push module images, then regenerate the deployment manifest
    Push(commands::build::PushArgs),

    /// Regenerate the deployment manifest without building or pushing
    #[command(alias = "gen")]
    Genconfig,

    /// Generate JSON schemas for module.json
    Schema(commands::schema::SchemaArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}
