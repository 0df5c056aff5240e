//! Effect system for dry-run support.
//!
//! Provides an `Executor` that either changes the filesystem or reports what
//! would happen.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Represents a filesystem side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateDir { path: PathBuf, description: String },
    WriteFile { path: PathBuf, description: String },
}

impl Effect {
    /// Human-readable description for dry-run output.
    pub fn describe(&self) -> String {
        match self {
            Effect::CreateDir { path, description } => {
                format!("Create directory {}: {}", path.display(), description)
            }
            Effect::WriteFile { path, description } => {
                format!("Write {}: {}", path.display(), description)
            }
        }
    }
}

/// Execution context that tracks and optionally performs effects.
pub struct Executor {
    dry_run: bool,
    effects: Vec<Effect>,
}

impl Executor {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            effects: Vec::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn record(&mut self, effect: Effect) {
        println!("  {} {}", "Would:".cyan(), effect.describe());
        self.effects.push(effect);
    }

    /// Create a directory and its parents, or record the intent in dry-run mode.
    pub fn create_dir_all(&mut self, path: &Path, description: &str) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }
        if self.dry_run {
            self.record(Effect::CreateDir {
                path: path.to_path_buf(),
                description: description.to_string(),
            });
            return Ok(());
        }
        debug!(path = %path.display(), "Creating directory");
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {}", path.display()))
    }

    /// Write a file, or record the intent in dry-run mode.
    pub fn write_file(&mut self, path: &Path, content: &str, description: &str) -> Result<()> {
        if self.dry_run {
            self.record(Effect::WriteFile {
                path: path.to_path_buf(),
                description: description.to_string(),
            });
            return Ok(());
        }
        debug!(path = %path.display(), "Writing file");
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote file");
        Ok(())
    }

    /// Get the list of effects that would be performed.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }
}
