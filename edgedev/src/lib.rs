//! edgedev - build, push and deploy IoT Edge modules
//!
//! A project holds module directories (each with a `module.json`) and a
//! deployment manifest template that refers to module images through
//! `${MODULES.<module>.<platform>}` placeholders. `edgedev` computes an image
//! tag for every (module, platform) pair, builds and pushes the images the
//! run needs, and writes the template with every resolvable placeholder
//! replaced by its tag.
//!
//! ## Commands
//!
//! - `build [--push]`: build images, optionally pushing them
//! - `push [--no-build]`: build and push, or push only
//! - `genconfig`: only regenerate the deployment manifest
//!
//! Every command plans first (see [`plan`]); `--dry-run` stops after
//! printing the plan.

pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod modules;
pub mod output;
pub mod pipeline;
pub mod plan;

pub use cli::{Cli, Commands};
pub use config::ProjectConfig;
