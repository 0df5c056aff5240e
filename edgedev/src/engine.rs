//! Container engine capability.
//!
//! The build/push driver only sees the [`ContainerEngine`] trait. The
//! production [`CliEngine`] drives the `docker` or `podman` CLI through a
//! [`CommandRunner`]; each supported engine is described by a static
//! [`EngineSpec`] selected from [`EngineKind`].

use crate::command_runner::{CommandOptions, CommandRunner};
use crate::config::RegistryCredentials;
use crate::error::ConfigError;
use crate::modules::ImageTag;
use anyhow::Result;
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;
use std::process::Output;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Supported container engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EngineKind {
    #[default]
    Docker,
    Podman,
}

/// Per-engine invocation details.
#[derive(Debug)]
pub struct EngineSpec {
    /// Executable name.
    pub program: &'static str,
    /// Arguments added to every `build` before the module's own options.
    pub build_defaults: &'static [&'static str],
}

static DOCKER: EngineSpec = EngineSpec {
    program: "docker",
    build_defaults: &[],
};

// IoT Edge runtimes pull through moby, so keep podman on the docker image format.
static PODMAN: EngineSpec = EngineSpec {
    program: "podman",
    build_defaults: &["--format", "docker"],
};

impl EngineKind {
    pub fn spec(self) -> &'static EngineSpec {
        match self {
            EngineKind::Docker => &DOCKER,
            EngineKind::Podman => &PODMAN,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().program)
    }
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docker" => Ok(EngineKind::Docker),
            "podman" => Ok(EngineKind::Podman),
            _ => Err(ConfigError::UnknownEngine(s.to_string())),
        }
    }
}

/// Everything the engine needs to build one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub tag: ImageTag,
    /// Build context directory.
    pub context: PathBuf,
    /// Dockerfile path relative to `context`, `/`-separated.
    pub dockerfile: String,
    /// Engine-native build options.
    pub options: Vec<String>,
}

/// Aggregated response of one engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResponse {
    /// Output lines in the order the engine reported them.
    pub lines: Vec<String>,
    /// Error reported by the engine, if the call failed.
    pub error: Option<String>,
}

impl EngineResponse {
    pub fn ok(lines: Vec<String>) -> Self {
        Self { lines, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn from_output(output: &Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<String> = stdout
            .lines()
            .chain(stderr.lines())
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();

        let error = (!output.status.success()).then(|| {
            stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| format!("exited with {}", output.status))
        });

        Self { lines, error }
    }
}

/// Build and push capability of a container engine.
///
/// `Err` means the engine could not be invoked at all; an engine that ran
/// and reported a failure returns `Ok` with [`EngineResponse::error`] set.
pub trait ContainerEngine {
    fn build(&self, request: &BuildRequest) -> Result<EngineResponse>;

    fn push(
        &self,
        tag: &ImageTag,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<EngineResponse>;
}

/// Drives the `docker`/`podman` command line.
pub struct CliEngine {
    kind: EngineKind,
    runner: Arc<dyn CommandRunner>,
}

impl CliEngine {
    pub fn new(kind: EngineKind, runner: Arc<dyn CommandRunner>) -> Self {
        Self { kind, runner }
    }

    fn run(&self, args: &[&str], options: &CommandOptions) -> Result<EngineResponse> {
        let program = self.kind.spec().program;
        debug!(
            command = %shlex::try_join(std::iter::once(program).chain(args.iter().copied()))
                .unwrap_or_else(|_| args.join(" ")),
            "Running container engine"
        );
        let output = self.runner.run_output(program, args, options)?;
        Ok(EngineResponse::from_output(&output))
    }
}

impl ContainerEngine for CliEngine {
    fn build(&self, request: &BuildRequest) -> Result<EngineResponse> {
        let spec = self.kind.spec();
        let mut args: Vec<&str> = vec![
            "build",
            "--tag",
            request.tag.as_str(),
            "--file",
            request.dockerfile.as_str(),
        ];
        args.extend(spec.build_defaults);
        args.extend(request.options.iter().map(String::as_str));
        args.push(".");

        self.run(&args, &CommandOptions::with_cwd(&request.context))
    }

    fn push(
        &self,
        tag: &ImageTag,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<EngineResponse> {
        if let Some(creds) = credentials {
            let login = self.run(
                &[
                    "login",
                    creds.server.as_str(),
                    "--username",
                    creds.username.as_str(),
                    "--password-stdin",
                ],
                &CommandOptions::with_stdin(creds.password.clone()),
            )?;
            if let Some(error) = login.error {
                return Ok(EngineResponse {
                    lines: login.lines,
                    error: Some(format!("login to {} failed: {error}", creds.server)),
                });
            }
        }

        self.run(&["push", tag.as_str()], &CommandOptions::default())
    }
}
