//! Sequential build/push over a [`BuildSet`].
//!
//! Each tag moves through [`TagState`]; the run folds over the set in tag
//! order and stops at the first failure, so nothing after a broken image is
//! attempted.

use super::build_options;
use super::select::BuildSet;
use super::tag::{BuildProfile, ImageTag};
use crate::config::RegistryTable;
use crate::engine::{BuildRequest, ContainerEngine};
use crate::error::{DriverError, Phase};
use crate::output::Output;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Which phases the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    pub build: bool,
    pub push: bool,
}

impl BuildMode {
    pub const BUILD: Self = Self {
        build: true,
        push: false,
    };
    pub const BUILD_AND_PUSH: Self = Self {
        build: true,
        push: true,
    };
    pub const PUSH: Self = Self {
        build: false,
        push: true,
    };
    /// Neither phase: only the manifest is regenerated.
    pub const CONFIG_ONLY: Self = Self {
        build: false,
        push: false,
    };

    pub fn touches_engine(self) -> bool {
        self.build || self.push
    }
}

/// Progress of one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    Pending,
    Building,
    Built,
    BuildFailed,
    Pushing,
    Pushed,
    PushFailed,
}

impl TagState {
    pub fn is_failure(self) -> bool {
        matches!(self, TagState::BuildFailed | TagState::PushFailed)
    }
}

impl fmt::Display for TagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagState::Pending => "pending",
            TagState::Building => "building",
            TagState::Built => "built",
            TagState::BuildFailed => "build failed",
            TagState::Pushing => "pushing",
            TagState::Pushed => "pushed",
            TagState::PushFailed => "push failed",
        };
        f.write_str(name)
    }
}

/// Final state of a tag the driver attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutcome {
    pub tag: ImageTag,
    pub module: String,
    pub state: TagState,
}

/// Everything the driver attempted, plus the error that stopped it.
#[derive(Debug)]
pub struct DriveReport {
    pub outcomes: Vec<TagOutcome>,
    pub error: Option<DriverError>,
}

impl DriveReport {
    /// Number of tags the driver started on, including a failed one.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<TagOutcome>, DriverError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.outcomes),
        }
    }
}

/// Drives a container engine over a build set.
pub struct Driver<'a> {
    engine: &'a dyn ContainerEngine,
    registries: &'a RegistryTable,
    mode: BuildMode,
}

impl<'a> Driver<'a> {
    pub fn new(
        engine: &'a dyn ContainerEngine,
        registries: &'a RegistryTable,
        mode: BuildMode,
    ) -> Self {
        Self {
            engine,
            registries,
            mode,
        }
    }

    pub fn run(&self, build_set: &BuildSet) -> DriveReport {
        let folded = build_set
            .iter()
            .try_fold(Vec::new(), |mut outcomes, (tag, profile)| {
                let (state, error) = match self.process(tag, profile) {
                    Ok(state) => (state, None),
                    Err((state, error)) => (state, Some(error)),
                };
                outcomes.push(TagOutcome {
                    tag: tag.clone(),
                    module: profile.module.clone(),
                    state,
                });
                match error {
                    Some(error) => Err((outcomes, error)),
                    None => Ok(outcomes),
                }
            });

        match folded {
            Ok(outcomes) => DriveReport {
                outcomes,
                error: None,
            },
            Err((outcomes, error)) => DriveReport {
                outcomes,
                error: Some(error),
            },
        }
    }

    fn process(
        &self,
        tag: &ImageTag,
        profile: &BuildProfile,
    ) -> Result<TagState, (TagState, DriverError)> {
        let mut state = TagState::Pending;

        if self.mode.build {
            transition(tag, &mut state, TagState::Building);
            match self.build(tag, profile) {
                Ok(()) => transition(tag, &mut state, TagState::Built),
                Err(error) => {
                    transition(tag, &mut state, TagState::BuildFailed);
                    return Err((state, error));
                }
            }
        }

        if self.mode.push {
            transition(tag, &mut state, TagState::Pushing);
            match self.push(tag) {
                Ok(()) => transition(tag, &mut state, TagState::Pushed),
                Err(error) => {
                    transition(tag, &mut state, TagState::PushFailed);
                    return Err((state, error));
                }
            }
        }

        Ok(state)
    }

    fn build(&self, tag: &ImageTag, profile: &BuildProfile) -> Result<(), DriverError> {
        Output::info(format!("BUILDING MODULE: {}", profile.module));
        Output::info(format!("PROCESSING DOCKERFILE: {}", profile.dockerfile.display()));
        Output::info(format!("BUILDING DOCKER IMAGE: {tag}"));

        if !profile.dockerfile.is_file() {
            return Err(DriverError::MissingDockerfile {
                module: profile.module.clone(),
                tag: tag.to_string(),
                path: profile.dockerfile.clone(),
            });
        }

        let options = build_options::translate(&profile.build_options).map_err(|source| {
            DriverError::InvalidBuildOption {
                module: profile.module.clone(),
                source,
            }
        })?;

        let request = BuildRequest {
            tag: tag.clone(),
            context: profile.context.clone(),
            dockerfile: relative_dockerfile(&profile.dockerfile, &profile.context),
            options,
        };
        debug!(?request, "Building image");

        let spinner = Output::spinner(format!("Building {tag}"));
        let response = match self.engine.build(&request) {
            Ok(response) => response,
            Err(e) => {
                spinner.finish_error(format!("Could not build {tag}"));
                return Err(DriverError::Engine {
                    phase: Phase::Build,
                    tag: tag.to_string(),
                    message: format!("{e:#}"),
                });
            }
        };

        if let Some(message) = response.error {
            spinner.finish_error(format!("Build failed: {tag}"));
            response.lines.iter().for_each(Output::list_item);
            return Err(DriverError::Build {
                module: profile.module.clone(),
                tag: tag.to_string(),
                message,
            });
        }

        spinner.finish_success(format!("Built {tag}"));
        for line in &response.lines {
            debug!(tag = %tag, "{line}");
        }
        Ok(())
    }

    fn push(&self, tag: &ImageTag) -> Result<(), DriverError> {
        Output::info(format!("PUSHING DOCKER IMAGE: {tag}"));

        let credentials = self.registries.find_for_tag(tag);
        if credentials.is_none() {
            let host = tag.registry_host().to_lowercase();
            info!(registry = %host, "No registry credentials, pushing anonymously");
            Output::info(format!(
                "Could not find registry credentials with name {host} in environment variable. Pushing anonymously."
            ));
        }

        let spinner = Output::spinner(format!("Pushing {tag}"));
        let response = match self.engine.push(tag, credentials) {
            Ok(response) => response,
            Err(e) => {
                spinner.finish_error(format!("Could not push {tag}"));
                return Err(DriverError::Engine {
                    phase: Phase::Push,
                    tag: tag.to_string(),
                    message: format!("{e:#}"),
                });
            }
        };

        if let Some(message) = response.error {
            spinner.finish_error(format!("Push failed: {tag}"));
            return Err(DriverError::Push {
                tag: tag.to_string(),
                message,
            });
        }

        spinner.finish_success(format!("Pushed {tag}"));
        Ok(())
    }
}

fn transition(tag: &ImageTag, state: &mut TagState, next: TagState) {
    debug!(tag = %tag, from = %state, to = %next, "Tag state");
    *state = next;
}

/// Path of `dockerfile` relative to `context`, `/`-separated.
///
/// Both paths are made absolute against the working directory and then
/// normalised lexically; symlinks are not resolved.
pub fn relative_dockerfile(dockerfile: &Path, context: &Path) -> String {
    let dockerfile = normalize(&absolute(dockerfile));
    let context = normalize(&absolute(context));

    let common = dockerfile
        .iter()
        .zip(context.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let parts: Vec<String> = std::iter::repeat_n("..".to_string(), context.len() - common)
        .chain(dockerfile[common..].iter().cloned())
        .collect();
    parts.join("/")
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn normalize(path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last().map(String::as_str) {
                // `..` at the root stays at the root
                Some("/") => {}
                Some(p) if p != ".." => {
                    parts.pop();
                }
                _ => parts.push("..".to_string()),
            },
            Component::RootDir => parts.push("/".to_string()),
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
        }
    }
    parts
}
