//! Custom error types for edgedev.

use edgedev_common::MetadataError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid values in the externally supplied configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid entry '{entry}' in {variable}: expected a name or '*'")]
    InvalidListEntry { variable: String, entry: String },

    #[error("Unknown container engine '{0}' (expected 'docker' or 'podman')")]
    UnknownEngine(String),
}

/// Failures while reading module descriptors.
///
/// A module directory without `module.json` is not an error; it never
/// reaches this type.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Modules directory not found: {}", .path.display())]
    ModulesRootMissing { path: PathBuf },

    #[error("Failed to read modules directory {}: {source}", .path.display())]
    ModulesRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Failures reading the deployment manifest template.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read deployment template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid deployment template {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Build options in `module.json` that cannot be handed to the engine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildOptionError {
    #[error("'{0}' is set from module.json and cannot be overridden")]
    Reserved(String),

    #[error("cannot split '{0}' into arguments")]
    Unparsable(String),

    #[error("unsupported value for '{option}': {reason}")]
    InvalidValue { option: String, reason: String },
}

/// The phase of a tag's build/push cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Push,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Build => write!(f, "build"),
            Phase::Push => write!(f, "push"),
        }
    }
}

/// Fatal errors from the build/push driver. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Build failed for module '{module}' ({tag}): {message}")]
    Build {
        module: String,
        tag: String,
        message: String,
    },

    #[error("Push failed for {tag}: {message}")]
    Push { tag: String, message: String },

    #[error("Dockerfile for module '{module}' ({tag}) not found: {}", .path.display())]
    MissingDockerfile {
        module: String,
        tag: String,
        path: PathBuf,
    },

    #[error("Invalid build option for module '{module}': {source}")]
    InvalidBuildOption {
        module: String,
        #[source]
        source: BuildOptionError,
    },

    #[error("Container engine could not run the {phase} of {tag}: {message}")]
    Engine {
        phase: Phase,
        tag: String,
        message: String,
    },
}

impl DriverError {
    /// The phase the error was raised in.
    pub fn phase(&self) -> Phase {
        match self {
            DriverError::Push { .. } => Phase::Push,
            DriverError::Engine { phase, .. } => *phase,
            _ => Phase::Build,
        }
    }
}
